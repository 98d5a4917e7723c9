//! Owner-only configuration.
//!
//! Setters take an explicit [`AdminContext`] naming the acting account. Each
//! one checks it against the current owner before anything else, applies the
//! change and records an event carrying the old and new values.

use super::events::GovernanceEvent;
use super::lifecycle::{GovernanceState, ProposalManager};
use crate::cycles::VotingCycle;
use crate::error::{GovernanceError, GovernanceResult};
use crate::types::{Address, Amount, BlockNumber, ProposalType};
use tracing::{info, warn};

/// The account performing an administrative call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminContext {
    pub caller: Address,
}

impl AdminContext {
    pub fn new(caller: Address) -> Self {
        Self { caller }
    }

    fn authorize(&self, state: &GovernanceState) -> GovernanceResult<()> {
        if self.caller != state.owner {
            warn!(caller = %self.caller, owner = %state.owner, "admin call from non-owner");
            return Err(GovernanceError::UnauthorizedAdmin(self.caller));
        }
        Ok(())
    }
}

impl ProposalManager {
    /// Set the voting power an approver must exceed.
    pub async fn set_minimum_voting_power(
        &self,
        admin: &AdminContext,
        minimum: Amount,
    ) -> GovernanceResult<()> {
        let mut state = self.state.write().await;
        admin.authorize(&state)?;

        let old = std::mem::replace(&mut state.minimum_voting_power, minimum);
        let block = self.collaborators.chain.block_number();
        state
            .events
            .record(block, GovernanceEvent::MinimumVotingPowerSet { old, new: minimum });
        info!(old, new = minimum, "minimum voting power set");
        Ok(())
    }

    /// Set the largest amount a single funding proposal may request.
    pub async fn set_distribution_threshold(
        &self,
        admin: &AdminContext,
        threshold: Amount,
    ) -> GovernanceResult<()> {
        let mut state = self.state.write().await;
        admin.authorize(&state)?;

        let old = std::mem::replace(&mut state.distribution_threshold, threshold);
        let block = self.collaborators.chain.block_number();
        state.events.record(
            block,
            GovernanceEvent::DistributionThresholdSet {
                old,
                new: threshold,
            },
        );
        info!(old, new = threshold, "distribution threshold set");
        Ok(())
    }

    pub async fn set_proposal_type_approval_threshold(
        &self,
        admin: &AdminContext,
        proposal_type: ProposalType,
        threshold: usize,
    ) -> GovernanceResult<()> {
        let mut state = self.state.write().await;
        admin.authorize(&state)?;

        let old = state
            .registry
            .set_approval_threshold(proposal_type, threshold)?;
        let block = self.collaborators.chain.block_number();
        state.events.record(
            block,
            GovernanceEvent::ProposalTypeApprovalThresholdSet {
                type_id: proposal_type.id(),
                old,
                new: threshold,
            },
        );
        info!(%proposal_type, old, new = threshold, "approval threshold set");
        Ok(())
    }

    /// Configure a voting cycle. Cycles cannot be changed once set.
    pub async fn set_voting_cycle_data(
        &self,
        admin: &AdminContext,
        cycle: u64,
        start: BlockNumber,
        duration: u64,
        distribution_limit: Amount,
    ) -> GovernanceResult<VotingCycle> {
        let mut state = self.state.write().await;
        admin.authorize(&state)?;

        let configured = state
            .cycles
            .set_cycle(cycle, start, duration, distribution_limit)?
            .clone();
        let block = self.collaborators.chain.block_number();
        state.events.record(
            block,
            GovernanceEvent::VotingCycleSet {
                cycle,
                start,
                duration,
                distribution_limit,
            },
        );
        info!(cycle, start, duration, distribution_limit, "voting cycle set");
        Ok(configured)
    }

    pub async fn transfer_ownership(
        &self,
        admin: &AdminContext,
        new_owner: Address,
    ) -> GovernanceResult<()> {
        let mut state = self.state.write().await;
        admin.authorize(&state)?;
        if new_owner.is_zero() {
            return Err(GovernanceError::Validation(
                "new owner is the zero address".to_string(),
            ));
        }

        let old = std::mem::replace(&mut state.owner, new_owner);
        let block = self.collaborators.chain.block_number();
        state.events.record(
            block,
            GovernanceEvent::OwnershipTransferred {
                old,
                new: new_owner,
            },
        );
        info!(%old, new = %new_owner, "ownership transferred");
        Ok(())
    }
}
