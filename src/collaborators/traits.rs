//! Trait abstractions for external collaborators.
//!
//! Enables mock implementations for unit testing. All calls are treated as
//! blocking request/response; failures are surfaced, never swallowed.

use crate::attestation::Attestation;
use crate::types::{
    Address, Amount, AttestationUid, BlockNumber, Call, GovernorProposalId, ProposalType,
};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for collaborator calls.
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The service could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The service refused the request.
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Decides whether an actor may submit a given proposal type.
#[async_trait]
pub trait AttestationVerifier: Send + Sync {
    /// Returns `Ok(true)` only for a valid, unrevoked attestation of the
    /// proposer schema binding `actor` to `proposal_type`.
    async fn verify(
        &self,
        actor: &Address,
        proposal_type: ProposalType,
        uid: &AttestationUid,
    ) -> CollaboratorResult<bool>;
}

/// Raw attestation lookup (the trusted attestation registry).
#[async_trait]
pub trait AttestationSource: Send + Sync {
    /// Fetch an attestation by uid. `Ok(None)` if the registry has no record.
    async fn attestation(&self, uid: &AttestationUid) -> CollaboratorResult<Option<Attestation>>;
}

/// Point-in-time voting power lookup.
#[async_trait]
pub trait VotingPowerOracle: Send + Sync {
    async fn voting_power(&self, actor: &Address) -> CollaboratorResult<Amount>;
}

/// Sink for proposals that passed move-to-vote.
#[async_trait]
pub trait GovernorForwarder: Send + Sync {
    /// Create the proposal on the external governor. The returned id is
    /// surfaced to the caller verbatim.
    async fn propose(&self, calls: &[Call], description: &str)
        -> CollaboratorResult<GovernorProposalId>;
}

/// Current chain position.
pub trait ChainContext: Send + Sync {
    fn block_number(&self) -> BlockNumber;

    /// Unix timestamp (seconds) of the current block.
    fn timestamp(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_error_display() {
        assert_eq!(
            CollaboratorError::Unavailable("rpc timeout".into()).to_string(),
            "Service unavailable: rpc timeout"
        );
        assert_eq!(
            CollaboratorError::Rejected("nope".into()).to_string(),
            "Rejected: nope"
        );
    }
}
