//! Per-type proposal configuration.
//!
//! The proposal types form a closed set, so the registry is a fixed table
//! indexed by type id. Each entry names its approval threshold, whether the
//! type needs a proposer attestation, and which [`Configurator`] validates
//! its body.

use crate::error::{GovernanceError, GovernanceResult};
use crate::token::GovernanceToken;
use crate::types::{Call, ProposalType};

/// Approval threshold used for types the configuration does not mention.
pub const DEFAULT_APPROVAL_THRESHOLD: usize = 1;

/// Upper bound on calls in one proposal body.
pub const MAX_CALLS: usize = 16;

/// Structural validation strategy for a proposal body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Configurator {
    /// Protocol or governor upgrades: arbitrary calls, each must invoke a function.
    Upgrade,
    /// Maintenance upgrades: function calls only, no value attached.
    Maintenance,
    /// Council elections: function calls only, no value attached.
    Election,
    /// Funding: exactly one governance token transfer built by the engine.
    TokenTransfer,
}

impl Configurator {
    /// Check `calls` and `description` against this strategy.
    pub fn validate(
        self,
        calls: &[Call],
        description: &str,
        token: &GovernanceToken,
    ) -> GovernanceResult<()> {
        if description.trim().is_empty() {
            return Err(GovernanceError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        if calls.is_empty() {
            return Err(GovernanceError::Validation(
                "proposal has no calls".to_string(),
            ));
        }
        if calls.len() > MAX_CALLS {
            return Err(GovernanceError::Validation(format!(
                "{} calls exceeds maximum of {}",
                calls.len(),
                MAX_CALLS
            )));
        }
        if let Some(i) = calls.iter().position(|c| c.target.is_zero()) {
            return Err(GovernanceError::Validation(format!(
                "call {} targets the zero address",
                i
            )));
        }

        match self {
            Configurator::Upgrade => require_calldata(calls),
            Configurator::Maintenance | Configurator::Election => {
                require_calldata(calls)?;
                if let Some(i) = calls.iter().position(|c| c.value != 0) {
                    return Err(GovernanceError::Validation(format!(
                        "call {} attaches value",
                        i
                    )));
                }
                Ok(())
            }
            Configurator::TokenTransfer => {
                if calls.len() != 1 {
                    return Err(GovernanceError::Validation(format!(
                        "funding proposal must have exactly one call, got {}",
                        calls.len()
                    )));
                }
                let request = token.decode_transfer_call(&calls[0]).ok_or_else(|| {
                    GovernanceError::Validation(
                        "call is not a governance token transfer".to_string(),
                    )
                })?;
                if request.recipient.is_zero() {
                    return Err(GovernanceError::Validation(
                        "recipient is the zero address".to_string(),
                    ));
                }
                if request.amount == 0 {
                    return Err(GovernanceError::Validation(
                        "amount must be positive".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

fn require_calldata(calls: &[Call]) -> GovernanceResult<()> {
    match calls.iter().position(|c| c.calldata.len() < 4) {
        Some(i) => Err(GovernanceError::Validation(format!(
            "call {} has no function selector",
            i
        ))),
        None => Ok(()),
    }
}

/// Configuration of one proposal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposalTypeConfig {
    pub approval_threshold: usize,
    pub requires_attestation: bool,
    pub configurator: Configurator,
}

impl ProposalTypeConfig {
    fn default_for(proposal_type: ProposalType) -> Self {
        let (approval_threshold, configurator) = match proposal_type {
            ProposalType::ProtocolOrGovernorUpgrade => {
                (DEFAULT_APPROVAL_THRESHOLD, Configurator::Upgrade)
            }
            ProposalType::MaintenanceUpgradeProposals => (0, Configurator::Maintenance),
            ProposalType::CouncilMemberElections => {
                (DEFAULT_APPROVAL_THRESHOLD, Configurator::Election)
            }
            ProposalType::GovernanceFund | ProposalType::CouncilBudget => {
                (DEFAULT_APPROVAL_THRESHOLD, Configurator::TokenTransfer)
            }
        };
        Self {
            approval_threshold,
            requires_attestation: !proposal_type.is_funding(),
            configurator,
        }
    }
}

/// Table of per-type configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalTypeRegistry {
    configs: [ProposalTypeConfig; 5],
}

impl Default for ProposalTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalTypeRegistry {
    pub fn new() -> Self {
        Self {
            configs: ProposalType::ALL.map(ProposalTypeConfig::default_for),
        }
    }

    pub fn config(&self, proposal_type: ProposalType) -> &ProposalTypeConfig {
        &self.configs[usize::from(proposal_type.id())]
    }

    pub fn approval_threshold(&self, proposal_type: ProposalType) -> usize {
        self.config(proposal_type).approval_threshold
    }

    /// Overwrite a type's approval threshold, returning the previous value.
    ///
    /// Maintenance proposals skip approval entirely, so their threshold is
    /// pinned at zero.
    pub fn set_approval_threshold(
        &mut self,
        proposal_type: ProposalType,
        threshold: usize,
    ) -> GovernanceResult<usize> {
        if proposal_type == ProposalType::MaintenanceUpgradeProposals && threshold != 0 {
            return Err(GovernanceError::InvalidType {
                operation: "set_proposal_type_approval_threshold",
                proposal_type,
            });
        }
        let config = &mut self.configs[usize::from(proposal_type.id())];
        let old = config.approval_threshold;
        config.approval_threshold = threshold;
        Ok(old)
    }

    /// Run the type's configurator.
    pub fn validate(
        &self,
        proposal_type: ProposalType,
        calls: &[Call],
        description: &str,
        token: &GovernanceToken,
    ) -> GovernanceResult<()> {
        self.config(proposal_type)
            .configurator
            .validate(calls, description, token)
    }
}
