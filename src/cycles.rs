//! Voting cycles and per-cycle distribution budgets.
//!
//! A cycle is a block window `[start, start + duration)` with a cap on how
//! many governance tokens funding proposals may move to vote while it is
//! active. Cycle windows are write-once; only the distributed total changes
//! afterwards, and it only grows.

use crate::error::{GovernanceError, GovernanceResult};
use crate::types::{Amount, BlockNumber};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn unknown_cycle(number: u64) -> GovernanceError {
    GovernanceError::Validation(format!("cycle {} is not configured", number))
}

/// One configured voting cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingCycle {
    pub number: u64,
    pub start: BlockNumber,
    pub duration: u64,
    pub distribution_limit: Amount,
    pub distributed: Amount,
}

impl VotingCycle {
    /// First block after the window. Saturates rather than wrapping.
    pub fn end(&self) -> BlockNumber {
        self.start.saturating_add(self.duration)
    }

    pub fn is_active_at(&self, block: BlockNumber) -> bool {
        self.start <= block && block < self.end()
    }

    pub fn remaining(&self) -> Amount {
        self.distribution_limit.saturating_sub(self.distributed)
    }
}

/// Owns every cycle record.
#[derive(Debug, Clone, Default)]
pub struct VotingCycleLedger {
    cycles: BTreeMap<u64, VotingCycle>,
}

impl VotingCycleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure cycle `number`. Fails if the cycle already exists.
    pub fn set_cycle(
        &mut self,
        number: u64,
        start: BlockNumber,
        duration: u64,
        distribution_limit: Amount,
    ) -> GovernanceResult<&VotingCycle> {
        if self.cycles.contains_key(&number) {
            return Err(GovernanceError::ImmutableCycle(number));
        }
        if duration == 0 {
            return Err(GovernanceError::Validation(format!(
                "cycle {} has zero duration",
                number
            )));
        }
        Ok(self.cycles.entry(number).or_insert(VotingCycle {
            number,
            start,
            duration,
            distribution_limit,
            distributed: 0,
        }))
    }

    pub fn get(&self, number: u64) -> Option<&VotingCycle> {
        self.cycles.get(&number)
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// The cycle whose window contains `block`. With overlapping windows the
    /// highest-numbered one wins.
    pub fn active_at(&self, block: BlockNumber) -> Option<&VotingCycle> {
        self.cycles.values().rev().find(|c| c.is_active_at(block))
    }

    /// Check that `amount` fits the cycle's remaining budget.
    pub fn check_distribution(&self, number: u64, amount: Amount) -> GovernanceResult<()> {
        let cycle = self
            .cycles
            .get(&number)
            .ok_or_else(|| unknown_cycle(number))?;
        match cycle.distributed.checked_add(amount) {
            Some(total) if total <= cycle.distribution_limit => Ok(()),
            _ => Err(GovernanceError::DistributionLimitExceeded {
                cycle: number,
                distributed: cycle.distributed,
                requested: amount,
                limit: cycle.distribution_limit,
            }),
        }
    }

    /// Add `amount` to the cycle's distributed total after checking the limit.
    pub fn record_distribution(&mut self, number: u64, amount: Amount) -> GovernanceResult<Amount> {
        self.check_distribution(number, amount)?;
        let cycle = self
            .cycles
            .get_mut(&number)
            .ok_or_else(|| unknown_cycle(number))?;
        cycle.distributed += amount;
        Ok(cycle.distributed)
    }
}
