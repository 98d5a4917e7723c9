//! Governance event log.
//!
//! Immutable append-only log of everything the engine emits. Entries carry the
//! block at which they were emitted so consumers can page through them.

use crate::types::{Address, Amount, BlockNumber, GovernorProposalId, ProposalHash, ProposalType};
use serde::{Deserialize, Serialize};

/// Emitted events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum GovernanceEvent {
    ProposalSubmitted {
        hash: ProposalHash,
        proposal_type: ProposalType,
        submitter: Address,
    },
    ProposalApproved {
        hash: ProposalHash,
        approver: Address,
    },
    ProposalMovedToVote {
        hash: ProposalHash,
        governor_proposal_id: GovernorProposalId,
    },
    MinimumVotingPowerSet {
        old: Amount,
        new: Amount,
    },
    VotingCycleSet {
        cycle: u64,
        start: BlockNumber,
        duration: u64,
        distribution_limit: Amount,
    },
    DistributionThresholdSet {
        old: Amount,
        new: Amount,
    },
    ProposalTypeApprovalThresholdSet {
        type_id: u8,
        old: usize,
        new: usize,
    },
    OwnershipTransferred {
        old: Address,
        new: Address,
    },
}

impl GovernanceEvent {
    /// Proposal the event refers to, if any.
    pub fn proposal_hash(&self) -> Option<&ProposalHash> {
        match self {
            GovernanceEvent::ProposalSubmitted { hash, .. }
            | GovernanceEvent::ProposalApproved { hash, .. }
            | GovernanceEvent::ProposalMovedToVote { hash, .. } => Some(hash),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GovernanceEvent::ProposalSubmitted { .. } => "ProposalSubmitted",
            GovernanceEvent::ProposalApproved { .. } => "ProposalApproved",
            GovernanceEvent::ProposalMovedToVote { .. } => "ProposalMovedToVote",
            GovernanceEvent::MinimumVotingPowerSet { .. } => "MinimumVotingPowerSet",
            GovernanceEvent::VotingCycleSet { .. } => "VotingCycleSet",
            GovernanceEvent::DistributionThresholdSet { .. } => "DistributionThresholdSet",
            GovernanceEvent::ProposalTypeApprovalThresholdSet { .. } => {
                "ProposalTypeApprovalThresholdSet"
            }
            GovernanceEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
        }
    }
}

/// Single log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    pub block: BlockNumber,
    pub event: GovernanceEvent,
}

/// Query options for the event log.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Only events about this proposal.
    pub proposal: Option<ProposalHash>,
    /// Only events with this name (e.g. `"ProposalApproved"`).
    pub name: Option<&'static str>,
    /// Only events emitted at or after this block.
    pub from_block: Option<BlockNumber>,
    /// Keep at most this many (most recent).
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, block: BlockNumber, event: GovernanceEvent) {
        let sequence = self.entries.len() as u64;
        self.entries.push(EventRecord {
            sequence,
            block,
            event,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[EventRecord] {
        &self.entries
    }

    /// Filtered entries in emission order. With a limit, the most recent
    /// matching entries are kept.
    pub fn query(&self, query: &EventQuery) -> Vec<EventRecord> {
        let mut filtered: Vec<EventRecord> = self
            .entries
            .iter()
            .filter(|record| {
                if let Some(ref hash) = query.proposal {
                    if record.event.proposal_hash() != Some(hash) {
                        return false;
                    }
                }
                if let Some(name) = query.name {
                    if record.event.name() != name {
                        return false;
                    }
                }
                if let Some(from) = query.from_block {
                    if record.block < from {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        if let Some(limit) = query.limit {
            let skip = filtered.len().saturating_sub(limit);
            filtered.drain(..skip);
        }

        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(b: u8) -> ProposalHash {
        ProposalHash::new([b; 32])
    }

    fn sample_log() -> EventLog {
        let mut log = EventLog::new();
        log.record(
            1,
            GovernanceEvent::ProposalSubmitted {
                hash: hash(1),
                proposal_type: ProposalType::ProtocolOrGovernorUpgrade,
                submitter: Address::new([1u8; 20]),
            },
        );
        log.record(2, GovernanceEvent::MinimumVotingPowerSet { old: 0, new: 100 });
        log.record(
            3,
            GovernanceEvent::ProposalApproved {
                hash: hash(1),
                approver: Address::new([2u8; 20]),
            },
        );
        log.record(
            4,
            GovernanceEvent::ProposalApproved {
                hash: hash(2),
                approver: Address::new([2u8; 20]),
            },
        );
        log
    }

    #[test]
    fn test_sequence_numbers() {
        let log = sample_log();
        let seqs: Vec<u64> = log.entries().iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_query_by_proposal() {
        let log = sample_log();
        let results = log.query(&EventQuery {
            proposal: Some(hash(1)),
            ..Default::default()
        });
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].event.name(), "ProposalSubmitted");
        assert_eq!(results[1].event.name(), "ProposalApproved");
    }

    #[test]
    fn test_query_by_name_and_block() {
        let log = sample_log();
        let results = log.query(&EventQuery {
            name: Some("ProposalApproved"),
            from_block: Some(4),
            ..Default::default()
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].block, 4);
    }

    #[test]
    fn test_query_limit_keeps_most_recent() {
        let log = sample_log();
        let results = log.query(&EventQuery {
            limit: Some(2),
            ..Default::default()
        });
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].sequence, 2);
        assert_eq!(results[1].sequence, 3);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = GovernanceEvent::DistributionThresholdSet { old: 1, new: 2 };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"DistributionThresholdSet\""));
    }
}
