//! Proposal governance.
//!
//! - `proposal`: records, derived state and content hashing
//! - `store`: hash-keyed proposal records
//! - `events`: append-only event log
//! - `lifecycle`: submit, approve and move-to-vote
//! - `admin`: owner-only configuration

pub mod admin;
pub mod events;
pub mod lifecycle;
pub mod proposal;
pub mod store;

#[cfg(test)]
mod proptests;

pub use admin::AdminContext;
pub use events::{EventLog, EventQuery, EventRecord, GovernanceEvent};
pub use lifecycle::{Collaborators, ProposalManager};
pub use proposal::{assemble_calls, hash_proposal, Proposal, ProposalState, ProposalStatus};
pub use store::ProposalStore;
