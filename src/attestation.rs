//! Proposer attestations.
//!
//! A proposer attestation binds an address to one proposal type. It is issued
//! elsewhere; this module only reads records from the trusted registry and
//! decides whether a record authorizes a submission.
//!
//! ## Schema
//!
//! The attestation payload is the ABI encoding of
//! `{address approvedProposer, uint8 proposalType}` (two words, 64 bytes).
//!
//! ## Checks
//!
//! - record exists and carries the configured schema
//! - issued by the trusted attester
//! - not revoked, not expired at the current chain timestamp
//! - recipient and `approvedProposer` both equal the submitting actor
//! - `proposalType` equals the submitted type

use crate::abi::{self, AbiError};
use crate::collaborators::{
    AttestationSource, AttestationVerifier, ChainContext, CollaboratorResult,
};
use crate::types::{Address, AttestationUid, ProposalType, SchemaId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// An attestation record as stored by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub uid: AttestationUid,
    pub schema: SchemaId,
    pub attester: Address,
    pub recipient: Address,
    /// Issuance time (unix seconds).
    pub time: u64,
    /// Expiry (unix seconds); 0 means no expiry.
    pub expiration_time: u64,
    /// Revocation time (unix seconds); 0 means not revoked.
    pub revocation_time: u64,
    pub data: Vec<u8>,
}

impl Attestation {
    pub fn is_revoked(&self) -> bool {
        self.revocation_time != 0
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expiration_time != 0 && self.expiration_time <= now
    }
}

/// Decoded proposer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposerClaim {
    pub approved_proposer: Address,
    pub proposal_type: u8,
}

impl ProposerClaim {
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(2 * abi::WORD);
        data.extend_from_slice(&abi::encode_address(&self.approved_proposer));
        data.extend_from_slice(&abi::encode_uint(u128::from(self.proposal_type)));
        data
    }

    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        if data.len() != 2 * abi::WORD {
            return Err(AbiError::LengthMismatch {
                expected: 2 * abi::WORD,
                actual: data.len(),
            });
        }
        Ok(Self {
            approved_proposer: abi::decode_address(data, 0)?,
            proposal_type: abi::decode_u8(data, 1)?,
        })
    }
}

/// Verifier backed by an attestation registry.
pub struct RegistryAttestationVerifier {
    source: Arc<dyn AttestationSource>,
    chain: Arc<dyn ChainContext>,
    schema: SchemaId,
    trusted_attester: Address,
}

impl RegistryAttestationVerifier {
    pub fn new(
        source: Arc<dyn AttestationSource>,
        chain: Arc<dyn ChainContext>,
        schema: SchemaId,
        trusted_attester: Address,
    ) -> Self {
        Self {
            source,
            chain,
            schema,
            trusted_attester,
        }
    }

    /// Reason the record does not authorize `(actor, proposal_type)`, if any.
    fn rejection(
        &self,
        record: &Attestation,
        actor: &Address,
        proposal_type: ProposalType,
    ) -> Option<String> {
        if record.schema != self.schema {
            return Some(format!("schema {} is not the proposer schema", record.schema));
        }
        if record.attester != self.trusted_attester {
            return Some(format!("attester {} is not trusted", record.attester));
        }
        if record.is_revoked() {
            return Some("attestation revoked".to_string());
        }
        if record.is_expired_at(self.chain.timestamp()) {
            return Some("attestation expired".to_string());
        }
        if record.recipient != *actor {
            return Some(format!("attestation recipient is {}", record.recipient));
        }

        let claim = match ProposerClaim::decode(&record.data) {
            Ok(claim) => claim,
            Err(e) => return Some(format!("malformed payload: {}", e)),
        };
        if claim.approved_proposer != *actor {
            return Some(format!("approved proposer is {}", claim.approved_proposer));
        }
        if claim.proposal_type != proposal_type.id() {
            return Some(format!(
                "attested proposal type {} does not match {}",
                claim.proposal_type, proposal_type
            ));
        }
        None
    }
}

#[async_trait]
impl AttestationVerifier for RegistryAttestationVerifier {
    async fn verify(
        &self,
        actor: &Address,
        proposal_type: ProposalType,
        uid: &AttestationUid,
    ) -> CollaboratorResult<bool> {
        let Some(record) = self.source.attestation(uid).await? else {
            debug!(%uid, "attestation not found");
            return Ok(false);
        };

        match self.rejection(&record, actor, proposal_type) {
            Some(reason) => {
                debug!(%uid, %actor, reason = %reason, "attestation rejected");
                Ok(false)
            }
            None => Ok(true),
        }
    }
}
