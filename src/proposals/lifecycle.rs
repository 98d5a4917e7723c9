//! Proposal lifecycle management.
//!
//! Handles submission, approval and the move-to-vote transition.
//!
//! Steps for a regular proposal:
//! 1. `submit` (attested proposer) or `submit_funding_proposal` (anyone)
//! 2. `approve_proposal` by delegates whose voting power exceeds the minimum
//! 3. `move_to_vote` re-derives the hash from the full body, checks the
//!    type's threshold and, where required, the active voting cycle and its
//!    budget, then forwards to the governor
//!
//! Maintenance upgrades skip step 2 and 3's checks: `submit` moves them to
//! vote in the same call.
//!
//! Every mutating call holds the state write lock from its first check to its
//! last write, including collaborator calls. Checks run before any write, and
//! the governor is called last, so a rejected call leaves no trace.

use super::events::{EventLog, EventQuery, EventRecord, GovernanceEvent};
use super::proposal::{assemble_calls, hash_proposal, Proposal, ProposalState, ProposalStatus};
use super::store::ProposalStore;
use crate::collaborators::{AttestationVerifier, ChainContext, GovernorForwarder, VotingPowerOracle};
use crate::cycles::{VotingCycle, VotingCycleLedger};
use crate::error::{GovernanceError, GovernanceResult};
use crate::registry::ProposalTypeRegistry;
use crate::token::GovernanceToken;
use crate::types::{
    Address, Amount, AttestationUid, Call, GovernorProposalId, ProposalHash, ProposalType,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// The external services the engine consults.
#[derive(Clone)]
pub struct Collaborators {
    pub attestations: Arc<dyn AttestationVerifier>,
    pub voting_power: Arc<dyn VotingPowerOracle>,
    pub governor: Arc<dyn GovernorForwarder>,
    pub chain: Arc<dyn ChainContext>,
}

/// Mutable governance state. Only reachable through the manager's lock.
pub(crate) struct GovernanceState {
    pub(crate) owner: Address,
    pub(crate) minimum_voting_power: Amount,
    pub(crate) distribution_threshold: Amount,
    pub(crate) registry: ProposalTypeRegistry,
    pub(crate) cycles: VotingCycleLedger,
    pub(crate) store: ProposalStore,
    pub(crate) events: EventLog,
}

/// Proposal lifecycle engine.
pub struct ProposalManager {
    pub(crate) state: RwLock<GovernanceState>,
    pub(crate) collaborators: Collaborators,
    token: GovernanceToken,
}

/// Cycle budget a move-to-vote will consume once forwarding succeeds.
struct PendingDistribution {
    cycle: u64,
    amount: Amount,
}

impl ProposalManager {
    /// Create a manager with default thresholds, no cycles, and zero
    /// minimum voting power and distribution threshold.
    pub fn new(owner: Address, token: GovernanceToken, collaborators: Collaborators) -> Self {
        Self {
            state: RwLock::new(GovernanceState {
                owner,
                minimum_voting_power: 0,
                distribution_threshold: 0,
                registry: ProposalTypeRegistry::new(),
                cycles: VotingCycleLedger::new(),
                store: ProposalStore::new(),
                events: EventLog::new(),
            }),
            collaborators,
            token,
        }
    }

    pub fn token(&self) -> &GovernanceToken {
        &self.token
    }

    /// Submit a non-funding proposal.
    ///
    /// Maintenance upgrades are moved to vote within this call; the returned
    /// hash then already refers to a `MovedToVote` proposal.
    pub async fn submit(
        &self,
        caller: &Address,
        targets: &[Address],
        values: &[Amount],
        calldatas: &[Vec<u8>],
        description: &str,
        proposal_type: ProposalType,
        attestation_uid: &AttestationUid,
    ) -> GovernanceResult<ProposalHash> {
        if proposal_type.is_funding() {
            return Err(GovernanceError::InvalidType {
                operation: "submit",
                proposal_type,
            });
        }

        let mut state = self.state.write().await;

        if state.registry.config(proposal_type).requires_attestation {
            self.check_attestation(caller, proposal_type, attestation_uid)
                .await?;
        }

        let calls = assemble_calls(targets, values, calldatas)?;
        let hash = hash_proposal(&calls, description)?;
        if state.store.contains(&hash) {
            warn!(%hash, %caller, "duplicate proposal rejected");
            return Err(GovernanceError::Duplicate(hash));
        }
        state
            .registry
            .validate(proposal_type, &calls, description, &self.token)?;

        let proposal = self.new_proposal(
            hash,
            proposal_type,
            calls,
            description,
            *caller,
            Some(*attestation_uid),
            None,
        );

        if proposal_type == ProposalType::MaintenanceUpgradeProposals {
            self.commit_with_move(&mut state, proposal).await?;
        } else {
            self.commit_submission(&mut state, proposal)?;
        }
        Ok(hash)
    }

    /// Submit a governance token transfer. Open to any caller; the calldata
    /// is built here from `to` and `amount`.
    pub async fn submit_funding_proposal(
        &self,
        caller: &Address,
        to: &Address,
        amount: Amount,
        description: &str,
        proposal_type: ProposalType,
    ) -> GovernanceResult<ProposalHash> {
        if !proposal_type.is_funding() {
            return Err(GovernanceError::InvalidType {
                operation: "submit_funding_proposal",
                proposal_type,
            });
        }

        let mut state = self.state.write().await;

        let calls = self.funding_calls(to, amount);
        let hash = hash_proposal(&calls, description)?;
        if state.store.contains(&hash) {
            warn!(%hash, %caller, "duplicate funding proposal rejected");
            return Err(GovernanceError::Duplicate(hash));
        }
        if amount > state.distribution_threshold {
            warn!(%hash, amount, threshold = state.distribution_threshold, "funding request over threshold");
            return Err(GovernanceError::ThresholdExceeded {
                amount,
                threshold: state.distribution_threshold,
            });
        }
        state
            .registry
            .validate(proposal_type, &calls, description, &self.token)?;

        let funding = self.token.decode_transfer_call(&calls[0]);
        let proposal =
            self.new_proposal(hash, proposal_type, calls, description, *caller, None, funding);
        self.commit_submission(&mut state, proposal)?;
        Ok(hash)
    }

    /// Record `caller`'s approval of a proposal.
    ///
    /// No status change happens here; whether the approvals suffice is only
    /// decided at move-to-vote.
    pub async fn approve_proposal(
        &self,
        caller: &Address,
        hash: &ProposalHash,
    ) -> GovernanceResult<()> {
        let mut state = self.state.write().await;

        if !state.store.contains(hash) {
            return Err(GovernanceError::NotFound(*hash));
        }

        let power = self.collaborators.voting_power.voting_power(caller).await?;
        if !exceeds_minimum(power, state.minimum_voting_power) {
            debug!(%caller, power, minimum = state.minimum_voting_power, "approval power too low");
            return Err(GovernanceError::InsufficientPower {
                power,
                minimum: state.minimum_voting_power,
            });
        }

        let count = state.store.add_approval(hash, *caller)?;
        let block = self.collaborators.chain.block_number();
        state.events.record(
            block,
            GovernanceEvent::ProposalApproved {
                hash: *hash,
                approver: *caller,
            },
        );
        info!(%hash, approver = %caller, approvals = count, "proposal approved");
        Ok(())
    }

    /// Move a proposal to vote. The proposal is located by re-hashing the
    /// supplied body, so the caller must present exactly what was submitted.
    pub async fn move_to_vote(
        &self,
        targets: &[Address],
        values: &[Amount],
        calldatas: &[Vec<u8>],
        description: &str,
    ) -> GovernanceResult<GovernorProposalId> {
        let calls = assemble_calls(targets, values, calldatas)?;
        let hash = hash_proposal(&calls, description)?;

        let mut state = self.state.write().await;

        let proposal = state
            .store
            .get(&hash)
            .cloned()
            .ok_or(GovernanceError::NotFound(hash))?;
        if proposal.is_moved() {
            return Err(GovernanceError::AlreadyMoved(hash));
        }

        let pending = self.check_move_eligibility(&state, &proposal)?;
        let governor_proposal_id = self.forward(&proposal).await?;

        if let Some(PendingDistribution { cycle, amount }) = pending {
            let total = state.cycles.record_distribution(cycle, amount)?;
            info!(cycle, amount, distributed = total, "cycle distribution recorded");
        }
        state.store.mark_moved(&hash, governor_proposal_id)?;
        self.record_moved(&mut state, hash, governor_proposal_id);
        Ok(governor_proposal_id)
    }

    /// Whether `delegate` has enough voting power to approve proposals.
    pub async fn can_sign_off(&self, delegate: &Address) -> GovernanceResult<bool> {
        let minimum = self.state.read().await.minimum_voting_power;
        let power = self
            .collaborators
            .voting_power
            .voting_power(delegate)
            .await?;
        Ok(exceeds_minimum(power, minimum))
    }

    /// Calls a funding proposal for `to`/`amount` would carry.
    pub fn funding_calls(&self, to: &Address, amount: Amount) -> Vec<Call> {
        vec![self.token.transfer_call(to, amount)]
    }

    /// Hash a funding proposal without submitting it.
    pub fn hash_funding_proposal(
        &self,
        to: &Address,
        amount: Amount,
        description: &str,
    ) -> GovernanceResult<ProposalHash> {
        hash_proposal(&self.funding_calls(to, amount), description)
    }

    pub async fn proposal(&self, hash: &ProposalHash) -> Option<Proposal> {
        self.state.read().await.store.get(hash).cloned()
    }

    pub async fn proposal_state(&self, hash: &ProposalHash) -> Option<ProposalState> {
        let state = self.state.read().await;
        let proposal = state.store.get(hash)?;
        Some(proposal.state(state.registry.approval_threshold(proposal.proposal_type)))
    }

    pub async fn approval_count(&self, hash: &ProposalHash) -> Option<usize> {
        let state = self.state.read().await;
        state.store.get(hash).map(Proposal::approval_count)
    }

    pub async fn has_approved(&self, hash: &ProposalHash, approver: &Address) -> bool {
        let state = self.state.read().await;
        state
            .store
            .get(hash)
            .map(|p| p.has_approved(approver))
            .unwrap_or(false)
    }

    pub async fn proposal_count(&self) -> usize {
        self.state.read().await.store.len()
    }

    pub async fn voting_cycle(&self, number: u64) -> Option<VotingCycle> {
        self.state.read().await.cycles.get(number).cloned()
    }

    /// Cycle active at the current block.
    pub async fn active_cycle(&self) -> Option<VotingCycle> {
        let block = self.collaborators.chain.block_number();
        self.state.read().await.cycles.active_at(block).cloned()
    }

    pub async fn minimum_voting_power(&self) -> Amount {
        self.state.read().await.minimum_voting_power
    }

    pub async fn distribution_threshold(&self) -> Amount {
        self.state.read().await.distribution_threshold
    }

    pub async fn approval_threshold(&self, proposal_type: ProposalType) -> usize {
        self.state
            .read()
            .await
            .registry
            .approval_threshold(proposal_type)
    }

    pub async fn owner(&self) -> Address {
        self.state.read().await.owner
    }

    pub async fn events(&self, query: &EventQuery) -> Vec<EventRecord> {
        self.state.read().await.events.query(query)
    }

    async fn check_attestation(
        &self,
        caller: &Address,
        proposal_type: ProposalType,
        uid: &AttestationUid,
    ) -> GovernanceResult<()> {
        match self
            .collaborators
            .attestations
            .verify(caller, proposal_type, uid)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(%caller, %proposal_type, %uid, "proposer attestation invalid");
                Err(GovernanceError::Unauthorized(format!(
                    "{} holds no valid {} attestation",
                    caller, proposal_type
                )))
            }
            Err(e) => {
                warn!(%caller, %proposal_type, error = %e, "attestation check failed");
                Err(GovernanceError::Unauthorized(format!(
                    "attestation check failed: {}",
                    e
                )))
            }
        }
    }

    /// Type-specific move-to-vote checks. Reads only.
    fn check_move_eligibility(
        &self,
        state: &GovernanceState,
        proposal: &Proposal,
    ) -> GovernanceResult<Option<PendingDistribution>> {
        let required = state.registry.approval_threshold(proposal.proposal_type);

        match proposal.proposal_type {
            ProposalType::MaintenanceUpgradeProposals => Ok(None),
            ProposalType::ProtocolOrGovernorUpgrade => {
                require_threshold(proposal, required)?;
                Ok(None)
            }
            ProposalType::CouncilMemberElections
            | ProposalType::GovernanceFund
            | ProposalType::CouncilBudget => {
                require_threshold(proposal, required)?;

                let block = self.collaborators.chain.block_number();
                let cycle = state
                    .cycles
                    .active_at(block)
                    .ok_or(GovernanceError::InactiveCycle { block })?;

                match proposal.funding {
                    Some(request) => {
                        state.cycles.check_distribution(cycle.number, request.amount)?;
                        Ok(Some(PendingDistribution {
                            cycle: cycle.number,
                            amount: request.amount,
                        }))
                    }
                    None => Ok(None),
                }
            }
        }
    }

    async fn forward(&self, proposal: &Proposal) -> GovernanceResult<GovernorProposalId> {
        self.collaborators
            .governor
            .propose(&proposal.calls, &proposal.description)
            .await
            .map_err(|e| {
                warn!(hash = %proposal.hash, error = %e, "governor forwarding failed");
                GovernanceError::from(e)
            })
    }

    #[allow(clippy::too_many_arguments)]
    fn new_proposal(
        &self,
        hash: ProposalHash,
        proposal_type: ProposalType,
        calls: Vec<Call>,
        description: &str,
        submitter: Address,
        attestation_uid: Option<AttestationUid>,
        funding: Option<crate::token::FundingRequest>,
    ) -> Proposal {
        Proposal {
            hash,
            proposal_type,
            calls,
            description: description.to_string(),
            status: ProposalStatus::Submitted,
            approvals: BTreeSet::new(),
            submitter,
            created_block: self.collaborators.chain.block_number(),
            created_at: self.collaborators.chain.timestamp(),
            attestation_uid,
            funding,
            governor_proposal_id: None,
        }
    }

    fn commit_submission(
        &self,
        state: &mut GovernanceState,
        proposal: Proposal,
    ) -> GovernanceResult<()> {
        let (hash, proposal_type, submitter, block) = (
            proposal.hash,
            proposal.proposal_type,
            proposal.submitter,
            proposal.created_block,
        );
        state.store.insert(proposal)?;
        state.events.record(
            block,
            GovernanceEvent::ProposalSubmitted {
                hash,
                proposal_type,
                submitter,
            },
        );
        info!(%hash, %proposal_type, %submitter, "proposal submitted");
        Ok(())
    }

    /// Submit and move in one step. Forwarding happens before anything is
    /// stored, so a governor failure leaves no record behind.
    async fn commit_with_move(
        &self,
        state: &mut GovernanceState,
        mut proposal: Proposal,
    ) -> GovernanceResult<()> {
        self.check_move_eligibility(state, &proposal)?;
        let governor_proposal_id = self.forward(&proposal).await?;
        let hash = proposal.hash;

        proposal.mark_moved(governor_proposal_id);
        self.commit_submission(state, proposal)?;
        self.record_moved(state, hash, governor_proposal_id);
        Ok(())
    }

    fn record_moved(
        &self,
        state: &mut GovernanceState,
        hash: ProposalHash,
        governor_proposal_id: GovernorProposalId,
    ) {
        let block = self.collaborators.chain.block_number();
        state.events.record(
            block,
            GovernanceEvent::ProposalMovedToVote {
                hash,
                governor_proposal_id,
            },
        );
        info!(%hash, %governor_proposal_id, "proposal moved to vote");
    }
}

/// Approval power must be strictly above the configured minimum.
fn exceeds_minimum(power: Amount, minimum: Amount) -> bool {
    power > minimum
}

fn require_threshold(proposal: &Proposal, required: usize) -> GovernanceResult<()> {
    let approvals = proposal.approval_count();
    if approvals < required {
        debug!(hash = %proposal.hash, approvals, required, "approval threshold not met");
        return Err(GovernanceError::ThresholdNotMet {
            approvals,
            required,
        });
    }
    Ok(())
}
