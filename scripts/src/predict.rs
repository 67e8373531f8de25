//! Prediction of the address a contract creation transaction will deploy to.
//!
//! A contract created by a transaction (rather than by `CREATE2`) is deployed at
//! `keccak256(rlp([sender, nonce]))[12..]`. Knowing this lets a script hand a
//! contract the address of a dependency that will only be deployed a few
//! transactions later.

use alloy_primitives::{keccak256, Address};

use crate::{
    constants::{
        MAX_NONCE, NUM_BYTES_ADDRESS, NUM_BYTES_DIGEST, RLP_ADDRESS_PREFIX, RLP_EMPTY_STRING,
        RLP_SHORT_LIST_PREFIX, RLP_SINGLE_BYTE_MAX,
    },
    errors::ScriptError,
};

/// Compute the address at which `sender` will deploy a contract when sending
/// a creation transaction with the given `nonce`
pub fn predict_address(sender: Address, nonce: u64) -> Result<Address, ScriptError> {
    let packed = pack_sender_and_nonce(sender, nonce)?;
    let digest = keccak256(&packed);
    Ok(Address::from_slice(
        &digest[NUM_BYTES_DIGEST - NUM_BYTES_ADDRESS..],
    ))
}

/// RLP-encode the list `[sender, nonce]`.
///
/// The nonce is encoded minimally: zero is the empty string, values up to
/// `0x7f` are their own single byte, and wider values are prefixed with
/// `0x80 + width`. Every extra nonce byte grows the list header by one.
fn pack_sender_and_nonce(sender: Address, nonce: u64) -> Result<Vec<u8>, ScriptError> {
    if nonce >= MAX_NONCE {
        return Err(ScriptError::Prediction(format!(
            "cannot deploy from an account with nonce {nonce:#x}"
        )));
    }

    let mut packed = Vec::with_capacity(2 + NUM_BYTES_ADDRESS + 1 + 8);
    match nonce {
        0 => {
            packed.extend([RLP_SHORT_LIST_PREFIX, RLP_ADDRESS_PREFIX]);
            packed.extend_from_slice(sender.as_slice());
            packed.push(RLP_EMPTY_STRING);
        }
        n if n <= RLP_SINGLE_BYTE_MAX => {
            packed.extend([RLP_SHORT_LIST_PREFIX, RLP_ADDRESS_PREFIX]);
            packed.extend_from_slice(sender.as_slice());
            packed.push(n as u8);
        }
        n => {
            let width = nonce_width(n);
            packed.extend([RLP_SHORT_LIST_PREFIX + width, RLP_ADDRESS_PREFIX]);
            packed.extend_from_slice(sender.as_slice());
            packed.push(RLP_EMPTY_STRING + width);
            packed.extend_from_slice(&n.to_be_bytes()[8 - width as usize..]);
        }
    }

    Ok(packed)
}

/// The number of bytes in the minimal big-endian encoding of a nonzero nonce
fn nonce_width(nonce: u64) -> u8 {
    (8 - nonce.leading_zeros() / 8) as u8
}
