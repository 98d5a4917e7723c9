//! External collaborators consumed by the proposal engine.
//!
//! Attestation checks, voting power, governor forwarding and the chain clock
//! live outside this crate. The engine only sees the traits below, which
//! keeps it testable against the in-memory mocks.

pub mod mock;
pub mod traits;

pub use traits::{
    AttestationSource, AttestationVerifier, ChainContext, CollaboratorError, CollaboratorResult,
    GovernorForwarder, VotingPowerOracle,
};
