//! Proposal Gate - proposal governance engine
//!
//! Proposals are submitted, optionally approved by delegates, then moved to
//! an external governor for voting. Each proposal type carries its own
//! rules:
//!
//! - Protocol/governor upgrades: attested proposer, approval threshold
//! - Maintenance upgrades: attested proposer, moved to vote on submission
//! - Council elections: attested proposer, threshold, active voting cycle
//! - Governance fund / council budget: open submission of a token transfer,
//!   threshold, active cycle and the cycle's distribution budget
//!
//! Proposals are identified by a hash of their calls and description, so
//! resubmitting an identical body is rejected and moving to vote requires
//! presenting the exact body that was submitted.
//!
//! External services (attestation registry, voting power, governor, chain
//! clock) sit behind the traits in [`collaborators`].

pub mod abi;
pub mod attestation;
pub mod collaborators;
pub mod config;
pub mod cycles;
pub mod error;
pub mod logging;
pub mod proposals;
pub mod registry;
pub mod serialization;
pub mod token;
pub mod types;

pub use config::GovernanceConfig;
pub use error::{GovernanceError, GovernanceResult};
pub use proposals::{
    AdminContext, Collaborators, EventQuery, GovernanceEvent, Proposal, ProposalManager, ProposalState,
    ProposalStatus,
};
pub use types::{Address, Amount, AttestationUid, Call, ProposalHash, ProposalType};
