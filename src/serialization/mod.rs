//! CBOR serialization for hashing and snapshots.
//!
//! - CBOR via `ciborium`
//! - Deterministic output for identical values (struct fields in declaration
//!   order, sequences in order), which proposal identity depends on

use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Serialization errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// CBOR encoding failed.
    #[error("CBOR encoding failed: {0}")]
    Encode(String),

    /// CBOR decoding failed.
    #[error("CBOR decoding failed: {0}")]
    Decode(String),
}

/// Serialize to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| SerializationError::Encode(format!("{:?}", e)))?;
    Ok(bytes)
}

/// Deserialize from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    ciborium::from_reader(bytes).map_err(|e| SerializationError::Decode(format!("{:?}", e)))
}

/// SHA-256 of the CBOR encoding of `value`.
pub fn cbor_digest<T: Serialize>(value: &T) -> Result<[u8; 32], SerializationError> {
    let bytes = to_cbor(value)?;
    Ok(Sha256::digest(&bytes).into())
}
