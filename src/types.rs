//! Core identifiers shared by every component.
//!
//! Addresses and hashes are fixed-size byte arrays rendered as `0x`-prefixed
//! hex. They serialize as strings so TOML configs and JSON event dumps stay
//! human readable.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Block height reported by the chain context.
pub type BlockNumber = u64;

/// Token amounts and call values.
pub type Amount = u128;

/// Errors from parsing hex identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

fn parse_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseIdError> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(trimmed).map_err(|e| ParseIdError::InvalidHex(e.to_string()))?;
    if bytes.len() != N {
        return Err(ParseIdError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Byte length of this identifier.
            pub const LEN: usize = $len;

            /// Wrap raw bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Get bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_fixed::<$len>(s).map(Self)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_id!(
    /// 20-byte account address.
    Address,
    20
);

hex_id!(
    /// Deterministic proposal identity (SHA-256 over the calls and description).
    ProposalHash,
    32
);

hex_id!(
    /// Identifier returned by the external governor on forwarding.
    GovernorProposalId,
    32
);

hex_id!(
    /// Attestation record identifier.
    AttestationUid,
    32
);

hex_id!(
    /// Attestation schema identifier.
    SchemaId,
    32
);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

/// Proposal categories. The set is closed; each one selects its own checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ProposalType {
    ProtocolOrGovernorUpgrade = 0,
    MaintenanceUpgradeProposals = 1,
    CouncilMemberElections = 2,
    GovernanceFund = 3,
    CouncilBudget = 4,
}

impl ProposalType {
    /// Every proposal type, in discriminant order.
    pub const ALL: [ProposalType; 5] = [
        ProposalType::ProtocolOrGovernorUpgrade,
        ProposalType::MaintenanceUpgradeProposals,
        ProposalType::CouncilMemberElections,
        ProposalType::GovernanceFund,
        ProposalType::CouncilBudget,
    ];

    /// Numeric id used in attestation payloads and events.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Funding types move tokens and are budgeted per voting cycle.
    pub fn is_funding(self) -> bool {
        matches!(
            self,
            ProposalType::GovernanceFund | ProposalType::CouncilBudget
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ProposalType::ProtocolOrGovernorUpgrade => "protocol_or_governor_upgrade",
            ProposalType::MaintenanceUpgradeProposals => "maintenance_upgrade_proposals",
            ProposalType::CouncilMemberElections => "council_member_elections",
            ProposalType::GovernanceFund => "governance_fund",
            ProposalType::CouncilBudget => "council_budget",
        }
    }
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for ProposalType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ProposalType::ALL
            .iter()
            .copied()
            .find(|t| t.id() == value)
            .ok_or(value)
    }
}

/// A single (target, value, calldata) triple of a proposal body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    pub target: Address,
    pub value: Amount,
    #[serde(with = "hex_bytes")]
    pub calldata: Vec<u8>,
}

impl Call {
    pub fn new(target: Address, value: Amount, calldata: Vec<u8>) -> Self {
        Self {
            target,
            value,
            calldata,
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
