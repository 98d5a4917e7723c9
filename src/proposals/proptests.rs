//! Property-based tests for proposal identity and cycle accounting
//!
//! Tests for:
//! - Determinism: the same body always hashes to the same id
//! - Sensitivity: changing the description changes the id
//! - Budget: recorded distributions never exceed a cycle's limit
//! - Uniqueness: approval counts equal the number of distinct approvers

use super::proposal::{assemble_calls, hash_proposal};
use super::store::ProposalStore;
use super::proposal::{Proposal, ProposalStatus};
use crate::cycles::VotingCycleLedger;
use crate::types::{Address, Call, ProposalType};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn address(id: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = id;
    Address::new(bytes)
}

fn arb_calls() -> impl Strategy<Value = Vec<Call>> {
    prop::collection::vec(
        (any::<u8>(), any::<u128>(), prop::collection::vec(any::<u8>(), 0..40)),
        1..6,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .map(|(id, value, calldata)| Call::new(address(id), value, calldata))
            .collect()
    })
}

proptest! {
    /// Property test: Determinism
    /// Hashing the reassembled body yields the stored id
    #[test]
    fn prop_hash_deterministic(calls in arb_calls(), description in ".{0,64}") {
        let targets: Vec<Address> = calls.iter().map(|c| c.target).collect();
        let values: Vec<u128> = calls.iter().map(|c| c.value).collect();
        let calldatas: Vec<Vec<u8>> = calls.iter().map(|c| c.calldata.clone()).collect();

        let rebuilt = assemble_calls(&targets, &values, &calldatas).unwrap();
        prop_assert_eq!(
            hash_proposal(&calls, &description).unwrap(),
            hash_proposal(&rebuilt, &description).unwrap()
        );
    }

    /// Property test: Sensitivity
    /// Distinct descriptions over the same calls never collide
    #[test]
    fn prop_description_changes_hash(
        calls in arb_calls(),
        a in "[a-z]{1,32}",
        b in "[a-z]{1,32}",
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(
            hash_proposal(&calls, &a).unwrap(),
            hash_proposal(&calls, &b).unwrap()
        );
    }

    /// Property test: Budget
    /// Any sequence of distribution requests leaves distributed <= limit,
    /// and the total equals the sum of accepted requests
    #[test]
    fn prop_cycle_budget_never_exceeded(
        limit in 0u128..10_000,
        requests in prop::collection::vec(0u128..3_000, 0..30),
    ) {
        let mut ledger = VotingCycleLedger::new();
        ledger.set_cycle(1, 0, 100, limit).unwrap();

        let mut accepted = 0u128;
        for amount in requests {
            if ledger.record_distribution(1, amount).is_ok() {
                accepted += amount;
            }
            let cycle = ledger.get(1).unwrap();
            prop_assert!(cycle.distributed <= cycle.distribution_limit);
        }
        prop_assert_eq!(ledger.get(1).unwrap().distributed, accepted);
    }

    /// Property test: Uniqueness
    /// Repeated approvals are rejected and never inflate the count
    #[test]
    fn prop_approvals_counted_once(approvers in prop::collection::vec(0u8..16, 0..50)) {
        let calls = vec![Call::new(address(1), 0, vec![1, 2, 3, 4])];
        let hash = hash_proposal(&calls, "p").unwrap();
        let mut store = ProposalStore::new();
        store.insert(Proposal {
            hash,
            proposal_type: ProposalType::ProtocolOrGovernorUpgrade,
            calls,
            description: "p".to_string(),
            status: ProposalStatus::Submitted,
            approvals: BTreeSet::new(),
            submitter: address(0),
            created_block: 0,
            created_at: 0,
            attestation_uid: None,
            funding: None,
            governor_proposal_id: None,
        }).unwrap();

        let mut distinct = BTreeSet::new();
        for id in approvers {
            let fresh = distinct.insert(id);
            prop_assert_eq!(store.add_approval(&hash, address(id)).is_ok(), fresh);
        }
        prop_assert_eq!(store.get(&hash).unwrap().approval_count(), distinct.len());
    }
}
