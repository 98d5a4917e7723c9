//! In-memory collaborators for testing.

use super::traits::*;
use crate::attestation::Attestation;
use crate::types::{
    Address, Amount, AttestationUid, BlockNumber, Call, GovernorProposalId, ProposalType,
};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Grants attestations from an in-memory allow list.
#[derive(Clone, Default)]
pub struct MockAttestationVerifier {
    state: Arc<Mutex<VerifierState>>,
}

#[derive(Default)]
struct VerifierState {
    granted: HashSet<(Address, ProposalType, AttestationUid)>,
    failure: Option<CollaboratorError>,
}

impl MockAttestationVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `actor` an attestation for `proposal_type` under `uid`.
    pub fn grant(&self, actor: Address, proposal_type: ProposalType, uid: AttestationUid) {
        let mut s = self.state.lock().unwrap();
        s.granted.insert((actor, proposal_type, uid));
    }

    /// Revoke a previously granted attestation.
    pub fn revoke(&self, actor: Address, proposal_type: ProposalType, uid: AttestationUid) {
        let mut s = self.state.lock().unwrap();
        s.granted.remove(&(actor, proposal_type, uid));
    }

    /// Make every subsequent call fail with `error` (None to recover).
    pub fn set_failure(&self, error: Option<CollaboratorError>) {
        self.state.lock().unwrap().failure = error;
    }
}

#[async_trait]
impl AttestationVerifier for MockAttestationVerifier {
    async fn verify(
        &self,
        actor: &Address,
        proposal_type: ProposalType,
        uid: &AttestationUid,
    ) -> CollaboratorResult<bool> {
        let s = self.state.lock().unwrap();
        if let Some(err) = &s.failure {
            return Err(err.clone());
        }
        Ok(s.granted.contains(&(*actor, proposal_type, *uid)))
    }
}

/// Attestation registry backed by a map.
#[derive(Clone, Default)]
pub struct MockAttestationSource {
    records: Arc<Mutex<HashMap<AttestationUid, Attestation>>>,
}

impl MockAttestationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, attestation: Attestation) {
        let mut records = self.records.lock().unwrap();
        records.insert(attestation.uid, attestation);
    }
}

#[async_trait]
impl AttestationSource for MockAttestationSource {
    async fn attestation(&self, uid: &AttestationUid) -> CollaboratorResult<Option<Attestation>> {
        Ok(self.records.lock().unwrap().get(uid).cloned())
    }
}

/// Voting power table.
#[derive(Clone, Default)]
pub struct MockVotingPowerOracle {
    state: Arc<Mutex<OracleState>>,
}

#[derive(Default)]
struct OracleState {
    power: HashMap<Address, Amount>,
    failure: Option<CollaboratorError>,
    lookups: usize,
}

impl MockVotingPowerOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_power(&self, actor: Address, power: Amount) {
        self.state.lock().unwrap().power.insert(actor, power);
    }

    pub fn set_failure(&self, error: Option<CollaboratorError>) {
        self.state.lock().unwrap().failure = error;
    }

    /// Number of lookups served so far.
    pub fn lookups(&self) -> usize {
        self.state.lock().unwrap().lookups
    }
}

#[async_trait]
impl VotingPowerOracle for MockVotingPowerOracle {
    async fn voting_power(&self, actor: &Address) -> CollaboratorResult<Amount> {
        let mut s = self.state.lock().unwrap();
        s.lookups += 1;
        if let Some(err) = &s.failure {
            return Err(err.clone());
        }
        Ok(s.power.get(actor).copied().unwrap_or(0))
    }
}

/// A proposal received by [`MockGovernor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedProposal {
    pub id: GovernorProposalId,
    pub calls: Vec<Call>,
    pub description: String,
}

/// Records forwarded proposals. Ids are SHA-256 over every call and the
/// description, so the same body always gets the same id.
#[derive(Clone, Default)]
pub struct MockGovernor {
    state: Arc<Mutex<GovernorState>>,
}

#[derive(Default)]
struct GovernorState {
    proposals: Vec<ForwardedProposal>,
    failure: Option<CollaboratorError>,
}

impl MockGovernor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failure(&self, error: Option<CollaboratorError>) {
        self.state.lock().unwrap().failure = error;
    }

    pub fn forwarded(&self) -> Vec<ForwardedProposal> {
        self.state.lock().unwrap().proposals.clone()
    }
}

#[async_trait]
impl GovernorForwarder for MockGovernor {
    async fn propose(
        &self,
        calls: &[Call],
        description: &str,
    ) -> CollaboratorResult<GovernorProposalId> {
        let mut s = self.state.lock().unwrap();
        if let Some(err) = &s.failure {
            return Err(err.clone());
        }

        let mut hasher = Sha256::new();
        for call in calls {
            hasher.update(call.target.as_bytes());
            hasher.update(call.value.to_be_bytes());
            hasher.update(&call.calldata);
        }
        hasher.update(description.as_bytes());
        let id = GovernorProposalId::new(hasher.finalize().into());

        s.proposals.push(ForwardedProposal {
            id,
            calls: calls.to_vec(),
            description: description.to_string(),
        });
        Ok(id)
    }
}

/// Chain clock that only moves when told to.
#[derive(Clone, Default)]
pub struct ManualChain {
    block: Arc<AtomicU64>,
    timestamp: Arc<AtomicU64>,
}

impl ManualChain {
    pub fn at(block: BlockNumber) -> Self {
        let chain = Self::default();
        chain.set_block(block);
        chain
    }

    pub fn set_block(&self, block: BlockNumber) {
        self.block.store(block, Ordering::SeqCst);
        // 12 second blocks
        self.timestamp
            .store(block.saturating_mul(12), Ordering::SeqCst);
    }

    pub fn advance(&self, blocks: u64) {
        self.set_block(self.block.load(Ordering::SeqCst) + blocks);
    }
}

impl ChainContext for ManualChain {
    fn block_number(&self) -> BlockNumber {
        self.block.load(Ordering::SeqCst)
    }

    fn timestamp(&self) -> u64 {
        self.timestamp.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    #[tokio::test]
    async fn test_verifier_grant_and_revoke() {
        let verifier = MockAttestationVerifier::new();
        let uid = AttestationUid::new([9u8; 32]);
        let t = ProposalType::ProtocolOrGovernorUpgrade;

        assert!(!verifier.verify(&addr(1), t, &uid).await.unwrap());
        verifier.grant(addr(1), t, uid);
        assert!(verifier.verify(&addr(1), t, &uid).await.unwrap());
        assert!(!verifier
            .verify(&addr(1), ProposalType::CouncilMemberElections, &uid)
            .await
            .unwrap());
        verifier.revoke(addr(1), t, uid);
        assert!(!verifier.verify(&addr(1), t, &uid).await.unwrap());
    }

    #[tokio::test]
    async fn test_oracle_defaults_to_zero() {
        let oracle = MockVotingPowerOracle::new();
        oracle.set_power(addr(1), 150);
        assert_eq!(oracle.voting_power(&addr(1)).await.unwrap(), 150);
        assert_eq!(oracle.voting_power(&addr(2)).await.unwrap(), 0);
        assert_eq!(oracle.lookups(), 2);
    }

    #[tokio::test]
    async fn test_governor_failure() {
        let governor = MockGovernor::new();
        governor.set_failure(Some(CollaboratorError::Unavailable("down".into())));
        assert!(governor.propose(&[], "x").await.is_err());
        assert!(governor.forwarded().is_empty());
    }

    #[tokio::test]
    async fn test_governor_ids_are_content_derived() {
        let governor = MockGovernor::new();
        let a = governor.propose(&[], "a").await.unwrap();
        let b = governor.propose(&[], "b").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(governor.forwarded().len(), 2);
    }

    #[test]
    fn test_manual_chain_advance() {
        let chain = ManualChain::at(10);
        chain.advance(5);
        assert_eq!(chain.block_number(), 15);
        assert_eq!(chain.timestamp(), 180);
    }

    #[test]
    fn test_manual_chain_timestamp_saturates() {
        let chain = ManualChain::at(u64::MAX);
        assert_eq!(chain.block_number(), u64::MAX);
        assert_eq!(chain.timestamp(), u64::MAX);
    }
}
