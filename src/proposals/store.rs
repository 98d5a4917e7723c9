//! Authoritative proposal records, keyed by proposal hash.
//!
//! Records are only ever created and mutated through the lifecycle engine.
//! A hash, once stored, is never reused: duplicates are rejected whatever
//! the existing record's status.

use super::proposal::Proposal;
use crate::error::{GovernanceError, GovernanceResult};
use crate::types::{Address, GovernorProposalId, ProposalHash};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ProposalStore {
    proposals: HashMap<ProposalHash, Proposal>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hash: &ProposalHash) -> bool {
        self.proposals.contains_key(hash)
    }

    pub fn get(&self, hash: &ProposalHash) -> Option<&Proposal> {
        self.proposals.get(hash)
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn insert(&mut self, proposal: Proposal) -> GovernanceResult<()> {
        if self.proposals.contains_key(&proposal.hash) {
            return Err(GovernanceError::Duplicate(proposal.hash));
        }
        self.proposals.insert(proposal.hash, proposal);
        Ok(())
    }

    /// Record `approver`; returns the new approval count.
    pub fn add_approval(
        &mut self,
        hash: &ProposalHash,
        approver: Address,
    ) -> GovernanceResult<usize> {
        let proposal = self
            .proposals
            .get_mut(hash)
            .ok_or(GovernanceError::NotFound(*hash))?;
        if proposal.is_moved() {
            return Err(GovernanceError::AlreadyMoved(*hash));
        }
        if !proposal.approvals.insert(approver) {
            return Err(GovernanceError::DuplicateApproval {
                hash: *hash,
                approver,
            });
        }
        Ok(proposal.approval_count())
    }

    /// Terminal transition.
    pub fn mark_moved(
        &mut self,
        hash: &ProposalHash,
        governor_proposal_id: GovernorProposalId,
    ) -> GovernanceResult<()> {
        let proposal = self
            .proposals
            .get_mut(hash)
            .ok_or(GovernanceError::NotFound(*hash))?;
        if proposal.is_moved() {
            return Err(GovernanceError::AlreadyMoved(*hash));
        }
        proposal.mark_moved(governor_proposal_id);
        Ok(())
    }
}
