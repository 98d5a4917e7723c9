//! Integration test for funding proposals and per-cycle budgets.
//!
//! Funding proposals are open to any caller but bounded twice: each request
//! by the distribution threshold at submission, and the sum moved to vote
//! within a cycle by that cycle's distribution limit.

use proposal_gate::collaborators::mock::{
    ManualChain, MockAttestationVerifier, MockGovernor, MockVotingPowerOracle,
};
use proposal_gate::collaborators::CollaboratorError;
use proposal_gate::config::{CycleSettings, GovernanceConfig};
use proposal_gate::token::{decode_transfer_calldata, FundingRequest};
use proposal_gate::{
    AdminContext, Address, Amount, Collaborators, EventQuery, GovernanceError, GovernanceEvent,
    ProposalManager, ProposalState, ProposalType,
};
use std::sync::Arc;

const OWNER: Address = Address::new([0x0f; 20]);
const ADMIN: AdminContext = AdminContext { caller: OWNER };
const TOKEN: Address = Address::new([0x70; 20]);
const ANYONE: Address = Address::new([0x99; 20]);
const DELEGATE: Address = Address::new([0xde; 20]);
const GRANTEE: Address = Address::new([0x67; 20]);

struct Fixture {
    manager: ProposalManager,
    governor: MockGovernor,
    chain: ManualChain,
}

async fn fixture(threshold: Amount, limit: Amount) -> Fixture {
    let oracle = MockVotingPowerOracle::new();
    oracle.set_power(DELEGATE, 10);
    let governor = MockGovernor::new();
    let chain = ManualChain::at(150);

    let mut config = GovernanceConfig::new(OWNER, TOKEN);
    config.governance.distribution_threshold = threshold;
    config.cycles.push(CycleSettings {
        number: 1,
        start: 100,
        duration: 100,
        distribution_limit: limit,
    });

    let manager = ProposalManager::from_config(
        &config,
        Collaborators {
            attestations: Arc::new(MockAttestationVerifier::new()),
            voting_power: Arc::new(oracle),
            governor: Arc::new(governor.clone()),
            chain: Arc::new(chain.clone()),
        },
    )
    .unwrap();

    Fixture {
        manager,
        governor,
        chain,
    }
}

/// Submit, approve once and move a funding proposal.
async fn fund(
    f: &Fixture,
    proposal_type: ProposalType,
    amount: Amount,
    description: &str,
) -> Result<(), GovernanceError> {
    let hash = f
        .manager
        .submit_funding_proposal(&ANYONE, &GRANTEE, amount, description, proposal_type)
        .await?;
    f.manager.approve_proposal(&DELEGATE, &hash).await?;
    move_funding(f, amount, description).await
}

async fn move_funding(f: &Fixture, amount: Amount, description: &str) -> Result<(), GovernanceError> {
    let calls = f.manager.funding_calls(&GRANTEE, amount);
    let targets: Vec<Address> = calls.iter().map(|c| c.target).collect();
    let values: Vec<Amount> = calls.iter().map(|c| c.value).collect();
    let calldatas: Vec<Vec<u8>> = calls.iter().map(|c| c.calldata.clone()).collect();
    f.manager
        .move_to_vote(&targets, &values, &calldatas, description)
        .await
        .map(|_| ())
}

#[tokio::test]
async fn test_funding_submission_open_to_anyone() {
    let f = fixture(1_000, 5_000).await;
    let hash = f
        .manager
        .submit_funding_proposal(&ANYONE, &GRANTEE, 400, "Grant", ProposalType::CouncilBudget)
        .await
        .unwrap();

    let proposal = f.manager.proposal(&hash).await.unwrap();
    assert_eq!(proposal.submitter, ANYONE);
    assert_eq!(proposal.attestation_uid, None);
    assert_eq!(
        proposal.funding,
        Some(FundingRequest {
            recipient: GRANTEE,
            amount: 400
        })
    );
    assert_eq!(proposal.calls.len(), 1);
    assert_eq!(proposal.calls[0].target, TOKEN);
    assert_eq!(
        decode_transfer_calldata(&proposal.calls[0].calldata).unwrap(),
        FundingRequest {
            recipient: GRANTEE,
            amount: 400
        }
    );
    assert_eq!(
        f.manager.hash_funding_proposal(&GRANTEE, 400, "Grant").unwrap(),
        hash
    );
}

#[tokio::test]
async fn test_funding_type_checks() {
    let f = fixture(1_000, 5_000).await;
    assert!(matches!(
        f.manager
            .submit_funding_proposal(
                &ANYONE,
                &GRANTEE,
                1,
                "x",
                ProposalType::ProtocolOrGovernorUpgrade
            )
            .await,
        Err(GovernanceError::InvalidType { .. })
    ));
    assert!(matches!(
        f.manager
            .submit_funding_proposal(&ANYONE, &Address::ZERO, 1, "x", ProposalType::GovernanceFund)
            .await,
        Err(GovernanceError::Validation(_))
    ));
    assert!(matches!(
        f.manager
            .submit_funding_proposal(&ANYONE, &GRANTEE, 0, "x", ProposalType::GovernanceFund)
            .await,
        Err(GovernanceError::Validation(_))
    ));
}

#[tokio::test]
async fn test_threshold_enforced_at_submit() {
    let f = fixture(1_000, 5_000).await;
    assert_eq!(
        f.manager
            .submit_funding_proposal(&ANYONE, &GRANTEE, 1_001, "Big grant", ProposalType::GovernanceFund)
            .await,
        Err(GovernanceError::ThresholdExceeded {
            amount: 1_001,
            threshold: 1_000
        })
    );
    // Exactly the threshold is fine
    assert!(f
        .manager
        .submit_funding_proposal(&ANYONE, &GRANTEE, 1_000, "Big grant", ProposalType::GovernanceFund)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_duplicate_funding_rejected() {
    let f = fixture(1_000, 5_000).await;
    let hash = f
        .manager
        .submit_funding_proposal(&ANYONE, &GRANTEE, 10, "Grant", ProposalType::GovernanceFund)
        .await
        .unwrap();
    // Same transfer under the other funding type is the same body
    assert_eq!(
        f.manager
            .submit_funding_proposal(&DELEGATE, &GRANTEE, 10, "Grant", ProposalType::CouncilBudget)
            .await,
        Err(GovernanceError::Duplicate(hash))
    );
}

#[tokio::test]
async fn test_cycle_budget_accumulates() {
    let f = fixture(1_000, 1_500).await;

    fund(&f, ProposalType::GovernanceFund, 1_000, "first").await.unwrap();
    assert_eq!(f.manager.voting_cycle(1).await.unwrap().distributed, 1_000);

    // 1_000 + 600 > 1_500
    assert_eq!(
        fund(&f, ProposalType::GovernanceFund, 600, "second").await,
        Err(GovernanceError::DistributionLimitExceeded {
            cycle: 1,
            distributed: 1_000,
            requested: 600,
            limit: 1_500,
        })
    );
    let hash = f.manager.hash_funding_proposal(&GRANTEE, 600, "second").unwrap();
    assert_eq!(f.manager.proposal_state(&hash).await, Some(ProposalState::Approved));

    fund(&f, ProposalType::GovernanceFund, 500, "third").await.unwrap();
    let cycle = f.manager.voting_cycle(1).await.unwrap();
    assert_eq!(cycle.distributed, 1_500);
    assert_eq!(cycle.remaining(), 0);
    assert_eq!(f.governor.forwarded().len(), 2);
}

#[tokio::test]
async fn test_council_budget_draws_on_cycle() {
    let f = fixture(1_000, 1_500).await;

    fund(&f, ProposalType::CouncilBudget, 900, "council q1").await.unwrap();
    assert_eq!(f.manager.voting_cycle(1).await.unwrap().distributed, 900);

    // Both funding types share the cycle budget
    assert_eq!(
        fund(&f, ProposalType::CouncilBudget, 700, "council q2").await,
        Err(GovernanceError::DistributionLimitExceeded {
            cycle: 1,
            distributed: 900,
            requested: 700,
            limit: 1_500,
        })
    );
    fund(&f, ProposalType::GovernanceFund, 600, "fund q1").await.unwrap();
    assert_eq!(f.manager.voting_cycle(1).await.unwrap().remaining(), 0);
    assert_eq!(f.governor.forwarded().len(), 2);
}

#[tokio::test]
async fn test_budget_is_per_cycle() {
    let f = fixture(1_000, 1_000).await;
    fund(&f, ProposalType::GovernanceFund, 1_000, "spend cycle one").await.unwrap();

    // Cycle 2 starts where cycle 1 ends
    f.manager
        .set_voting_cycle_data(&ADMIN, 2, 200, 100, 1_000)
        .await
        .unwrap();
    f.chain.set_block(200);
    fund(&f, ProposalType::GovernanceFund, 700, "spend cycle two").await.unwrap();

    assert_eq!(f.manager.voting_cycle(1).await.unwrap().distributed, 1_000);
    assert_eq!(f.manager.voting_cycle(2).await.unwrap().distributed, 700);
}

#[tokio::test]
async fn test_funding_outside_cycle() {
    let f = fixture(1_000, 1_000).await;
    f.chain.set_block(99);
    assert_eq!(
        fund(&f, ProposalType::GovernanceFund, 10, "too early").await,
        Err(GovernanceError::InactiveCycle { block: 99 })
    );
    f.chain.set_block(200);
    assert_eq!(
        move_funding(&f, 10, "too early").await,
        Err(GovernanceError::InactiveCycle { block: 200 })
    );
    f.chain.set_block(199);
    assert!(move_funding(&f, 10, "too early").await.is_ok());
}

#[tokio::test]
async fn test_governor_failure_leaves_budget_untouched() {
    let f = fixture(1_000, 1_000).await;
    f.governor
        .set_failure(Some(CollaboratorError::Unavailable("rpc down".into())));
    assert!(matches!(
        fund(&f, ProposalType::GovernanceFund, 800, "grant").await,
        Err(GovernanceError::Collaborator(_))
    ));
    assert_eq!(f.manager.voting_cycle(1).await.unwrap().distributed, 0);

    f.governor.set_failure(None);
    move_funding(&f, 800, "grant").await.unwrap();
    assert_eq!(f.manager.voting_cycle(1).await.unwrap().distributed, 800);
}

#[tokio::test]
async fn test_config_changes_are_events() {
    let f = fixture(1_000, 1_000).await;
    // Genesis settings from the config are not events
    assert!(f.manager.events(&EventQuery::default()).await.is_empty());

    f.manager.set_distribution_threshold(&ADMIN, 2_000).await.unwrap();
    f.manager
        .set_voting_cycle_data(&ADMIN, 3, 500, 10, 99)
        .await
        .unwrap();
    assert_eq!(
        f.manager
            .set_voting_cycle_data(&ADMIN, 1, 0, 10, 99)
            .await,
        Err(GovernanceError::ImmutableCycle(1))
    );

    let events: Vec<GovernanceEvent> = f
        .manager
        .events(&EventQuery::default())
        .await
        .into_iter()
        .map(|r| r.event)
        .collect();
    assert_eq!(
        events,
        vec![
            GovernanceEvent::DistributionThresholdSet {
                old: 1_000,
                new: 2_000
            },
            GovernanceEvent::VotingCycleSet {
                cycle: 3,
                start: 500,
                duration: 10,
                distribution_limit: 99
            },
        ]
    );
}
