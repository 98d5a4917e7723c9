//! Error types for governance operations.
//!
//! Every rejection is immediate and leaves no partial state behind.

use crate::collaborators::CollaboratorError;
use crate::types::{Address, Amount, BlockNumber, ProposalHash, ProposalType};
use thiserror::Error;

/// Result type for governance operations.
pub type GovernanceResult<T> = Result<T, GovernanceError>;

/// Governance operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    #[error("{operation} does not support proposal type {proposal_type}")]
    InvalidType {
        operation: &'static str,
        proposal_type: ProposalType,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Proposal already exists: {0}")]
    Duplicate(ProposalHash),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Requested amount {amount} exceeds distribution threshold {threshold}")]
    ThresholdExceeded { amount: Amount, threshold: Amount },

    #[error("Proposal not found: {0}")]
    NotFound(ProposalHash),

    #[error("Voting power {power} does not exceed minimum {minimum}")]
    InsufficientPower { power: Amount, minimum: Amount },

    #[error("{approver} already approved proposal {hash}")]
    DuplicateApproval {
        hash: ProposalHash,
        approver: Address,
    },

    #[error("Proposal already moved to vote: {0}")]
    AlreadyMoved(ProposalHash),

    #[error("Approval threshold not met: {approvals} of {required}")]
    ThresholdNotMet { approvals: usize, required: usize },

    #[error("No active voting cycle at block {block}")]
    InactiveCycle { block: BlockNumber },

    #[error(
        "Cycle {cycle} distribution limit exceeded: {distributed} distributed + {requested} requested > {limit}"
    )]
    DistributionLimitExceeded {
        cycle: u64,
        distributed: Amount,
        requested: Amount,
        limit: Amount,
    },

    #[error("Voting cycle {0} is already configured")]
    ImmutableCycle(u64),

    #[error("{0} is not the owner")]
    UnauthorizedAdmin(Address),

    #[error("Collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),
}
