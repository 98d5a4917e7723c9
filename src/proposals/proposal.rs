//! Proposal records and deterministic proposal identity.

use crate::error::{GovernanceError, GovernanceResult};
use crate::serialization::cbor_digest;
use crate::token::FundingRequest;
use crate::types::{
    Address, Amount, AttestationUid, BlockNumber, Call, GovernorProposalId, ProposalHash,
    ProposalType,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stored lifecycle status. `MovedToVote` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Submitted,
    MovedToVote,
}

/// Status as seen by readers. `Approved` is derived on read from the
/// approval count and the type's current threshold; it is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    Submitted,
    Approved,
    MovedToVote,
}

/// A submitted proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub hash: ProposalHash,
    pub proposal_type: ProposalType,
    pub calls: Vec<Call>,
    pub description: String,
    pub status: ProposalStatus,
    pub approvals: BTreeSet<Address>,
    pub submitter: Address,
    pub created_block: BlockNumber,
    /// Unix seconds at submission.
    pub created_at: u64,
    /// Proposer attestation used at submission; `None` for funding types.
    pub attestation_uid: Option<AttestationUid>,
    /// Recipient and amount; `Some` only for funding types.
    pub funding: Option<FundingRequest>,
    pub governor_proposal_id: Option<GovernorProposalId>,
}

impl Proposal {
    pub fn approval_count(&self) -> usize {
        self.approvals.len()
    }

    pub fn has_approved(&self, approver: &Address) -> bool {
        self.approvals.contains(approver)
    }

    pub fn is_moved(&self) -> bool {
        self.status == ProposalStatus::MovedToVote
    }

    /// Derived state against `threshold`.
    pub fn state(&self, threshold: usize) -> ProposalState {
        match self.status {
            ProposalStatus::MovedToVote => ProposalState::MovedToVote,
            ProposalStatus::Submitted if self.approval_count() >= threshold => {
                ProposalState::Approved
            }
            ProposalStatus::Submitted => ProposalState::Submitted,
        }
    }

    pub(crate) fn mark_moved(&mut self, governor_proposal_id: GovernorProposalId) {
        self.status = ProposalStatus::MovedToVote;
        self.governor_proposal_id = Some(governor_proposal_id);
    }
}

#[derive(Serialize)]
struct HashInput<'a> {
    calls: &'a [Call],
    description: &'a str,
}

/// Identity of a proposal body. Status, approvals and type are excluded, so
/// re-deriving from the same inputs always finds the same record.
pub fn hash_proposal(calls: &[Call], description: &str) -> GovernanceResult<ProposalHash> {
    cbor_digest(&HashInput { calls, description })
        .map(ProposalHash::new)
        .map_err(|e| GovernanceError::Validation(format!("cannot encode proposal: {}", e)))
}

/// Zip parallel target/value/calldata lists into calls.
pub fn assemble_calls(
    targets: &[Address],
    values: &[Amount],
    calldatas: &[Vec<u8>],
) -> GovernanceResult<Vec<Call>> {
    if targets.len() != values.len() || targets.len() != calldatas.len() {
        return Err(GovernanceError::Validation(format!(
            "length mismatch: {} targets, {} values, {} calldatas",
            targets.len(),
            values.len(),
            calldatas.len()
        )));
    }
    Ok(targets
        .iter()
        .zip(values)
        .zip(calldatas)
        .map(|((target, value), calldata)| Call::new(*target, *value, calldata.clone()))
        .collect())
}
