//! Governance configuration file handling
//!
//! Configuration files are TOML. They describe the initial governance state
//! (owner, token, thresholds, voting cycles) plus operator settings such as
//! logging. Once a manager is built from a config, later changes go through
//! the owner-only setters and are recorded as events; the file is not
//! consulted again.
//!
//! Token amounts are `u128` and may exceed what TOML integers hold, so every
//! amount field accepts either an integer or a decimal string.

use crate::attestation::RegistryAttestationVerifier;
use crate::collaborators::{AttestationSource, ChainContext};
use crate::error::GovernanceError;
use crate::proposals::{Collaborators, ProposalManager};
use crate::token::GovernanceToken;
use crate::types::{Address, Amount, BlockNumber, ProposalType, SchemaId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown proposal type '{0}'")]
    UnknownProposalType(String),

    #[error("Invalid governance settings: {0}")]
    Governance(#[from] GovernanceError),
}

/// Full configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    pub governance: GovernanceSettings,

    /// Approval threshold overrides keyed by proposal type name
    /// (e.g. `council_member_elections = 3`). Missing types keep the default.
    #[serde(default)]
    pub approval_thresholds: BTreeMap<String, usize>,

    /// Registry-backed attestation checking; absent when the verifier is
    /// supplied some other way.
    #[serde(default)]
    pub attestation: Option<AttestationSettings>,

    #[serde(default)]
    pub cycles: Vec<CycleSettings>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSettings {
    pub owner: Address,
    pub governance_token: Address,

    #[serde(default, with = "amount")]
    pub minimum_voting_power: Amount,

    #[serde(default, with = "amount")]
    pub distribution_threshold: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationSettings {
    pub schema: SchemaId,
    pub trusted_attester: Address,
}

impl AttestationSettings {
    /// Verifier that trusts `trusted_attester` for records under `schema`.
    pub fn verifier(
        &self,
        source: Arc<dyn AttestationSource>,
        chain: Arc<dyn ChainContext>,
    ) -> RegistryAttestationVerifier {
        RegistryAttestationVerifier::new(source, chain, self.schema, self.trusted_attester)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSettings {
    pub number: u64,
    pub start: BlockNumber,
    pub duration: u64,
    #[serde(with = "amount")]
    pub distribution_limit: Amount,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

/// `u128` amounts as TOML integers when they fit, decimal strings otherwise.
mod amount {
    use crate::types::Amount;
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        match i64::try_from(*value) {
            Ok(small) => serializer.serialize_i64(small),
            Err(_) => serializer.serialize_str(&value.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Amount::try_from(n)
                .map_err(|_| de::Error::custom(format!("amount {} is negative", n))),
            Raw::Str(s) => s
                .trim()
                .replace('_', "")
                .parse::<Amount>()
                .map_err(|e| de::Error::custom(format!("invalid amount '{}': {}", s, e))),
        }
    }
}

/// Look up a proposal type by its configuration name.
pub fn proposal_type_by_name(name: &str) -> Option<ProposalType> {
    ProposalType::ALL.into_iter().find(|t| t.name() == name)
}

impl GovernanceConfig {
    /// Minimal configuration: defaults everywhere except the two addresses.
    pub fn new(owner: Address, governance_token: Address) -> Self {
        Self {
            governance: GovernanceSettings {
                owner,
                governance_token,
                minimum_voting_power: 0,
                distribution_threshold: 0,
            },
            approval_thresholds: BTreeMap::new(),
            attestation: None,
            cycles: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Threshold overrides with names resolved.
    pub fn resolved_thresholds(&self) -> Result<Vec<(ProposalType, usize)>, ConfigError> {
        self.approval_thresholds
            .iter()
            .map(|(name, threshold)| {
                proposal_type_by_name(name)
                    .map(|t| (t, *threshold))
                    .ok_or_else(|| ConfigError::UnknownProposalType(name.clone()))
            })
            .collect()
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(owner: &Address, governance_token: &Address) -> String {
        format!(
            r#"# Proposal governance configuration
#
# Initial governance state. After startup, changes are made by the owner
# through the admin operations and recorded in the event log.

[governance]
# Account allowed to change thresholds and configure voting cycles
owner = "{owner}"

# Token that funding proposals transfer
governance_token = "{governance_token}"

# Approvers need strictly more voting power than this
minimum_voting_power = 0

# Largest amount a single funding proposal may request.
# Amounts beyond 2^63 - 1 must be written as strings, e.g. "1000000000000000000000"
distribution_threshold = 0

[approval_thresholds]
# Approvals required before move-to-vote. Maintenance upgrades are pinned at 0.
protocol_or_governor_upgrade = 1
council_member_elections = 1
governance_fund = 1
council_budget = 1

# Registry-backed proposer attestations (optional)
# [attestation]
# schema = "0x0000000000000000000000000000000000000000000000000000000000000000"
# trusted_attester = "0x0000000000000000000000000000000000000000"

# Voting cycles. Each is write-once.
# [[cycles]]
# number = 1
# start = 0
# duration = 50400
# distribution_limit = 0

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/proposal-gate.log"
"#
        )
    }
}

impl ProposalManager {
    /// Build a manager whose initial state comes from `config`.
    ///
    /// The initial state is genesis: no events are recorded for it.
    pub fn from_config(
        config: &GovernanceConfig,
        collaborators: Collaborators,
    ) -> Result<Self, ConfigError> {
        let thresholds = config.resolved_thresholds()?;
        let mut manager = ProposalManager::new(
            config.governance.owner,
            GovernanceToken::new(config.governance.governance_token),
            collaborators,
        );

        let state = manager.state.get_mut();
        state.minimum_voting_power = config.governance.minimum_voting_power;
        state.distribution_threshold = config.governance.distribution_threshold;
        for (proposal_type, threshold) in thresholds {
            state.registry.set_approval_threshold(proposal_type, threshold)?;
        }
        for cycle in &config.cycles {
            state.cycles.set_cycle(
                cycle.number,
                cycle.start,
                cycle.duration,
                cycle.distribution_limit,
            )?;
        }

        tracing::info!(
            owner = %config.governance.owner,
            token = %config.governance.governance_token,
            cycles = config.cycles.len(),
            "governance configured"
        );
        Ok(manager)
    }
}
