//! Governance token transfer calldata.
//!
//! Funding proposals never accept caller-supplied calldata. The body is
//! always a single `transfer(address,uint256)` call against the canonical
//! governance token, built here.

use crate::abi::{self, AbiError};
use crate::types::{Address, Amount, Call};
use serde::{Deserialize, Serialize};

/// `bytes4(keccak256("transfer(address,uint256)"))`
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Selector plus two argument words.
pub const TRANSFER_CALLDATA_LEN: usize = 4 + 2 * abi::WORD;

/// Recipient and amount of a funding proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FundingRequest {
    pub recipient: Address,
    pub amount: Amount,
}

/// The canonical governance token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernanceToken {
    address: Address,
}

impl GovernanceToken {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Single-call proposal body transferring `amount` to `to`.
    pub fn transfer_call(&self, to: &Address, amount: Amount) -> Call {
        Call::new(self.address, 0, transfer_calldata(to, amount))
    }

    /// Recover the funding request from a call, if it is a well-formed
    /// transfer against this token with no attached value.
    pub fn decode_transfer_call(&self, call: &Call) -> Option<FundingRequest> {
        if call.target != self.address || call.value != 0 {
            return None;
        }
        decode_transfer_calldata(&call.calldata).ok()
    }
}

/// `transfer(to, amount)` calldata.
pub fn transfer_calldata(to: &Address, amount: Amount) -> Vec<u8> {
    let mut data = Vec::with_capacity(TRANSFER_CALLDATA_LEN);
    data.extend_from_slice(&TRANSFER_SELECTOR);
    data.extend_from_slice(&abi::encode_address(to));
    data.extend_from_slice(&abi::encode_uint(amount));
    data
}

/// Parse `transfer(to, amount)` calldata. Extra trailing bytes are rejected.
pub fn decode_transfer_calldata(data: &[u8]) -> Result<FundingRequest, AbiError> {
    if data.len() != TRANSFER_CALLDATA_LEN {
        return Err(AbiError::LengthMismatch {
            expected: TRANSFER_CALLDATA_LEN,
            actual: data.len(),
        });
    }
    if data[..4] != TRANSFER_SELECTOR {
        return Err(AbiError::UnexpectedSelector(hex::encode(&data[..4])));
    }
    let args = &data[4..];
    Ok(FundingRequest {
        recipient: abi::decode_address(args, 0)?,
        amount: abi::decode_uint(args, 1)?,
    })
}
