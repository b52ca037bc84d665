//! Tuple/ABI codec for hub and EVM-spoke cross-chain messages
//!
//! Wire layouts are pinned contracts with the on-chain side:
//!
//! - cross-chain message: `(uint256 tokenId, address receiver, string uri,
//!   address creator, address originalOwner, address destination)`
//! - revert message: `(uint256 tokenId, address originalOwner, string uri,
//!   address creator)`
//!
//! An absent destination encodes as the zero address and decodes back to
//! `None`. Malformed input always fails with `MalformedPayload`; nothing is
//! coerced or truncated.

use ethereum_types::{Address, U256};
use web3::ethabi::{self, ParamType, Token};

use crate::error::BridgeError;
use crate::types::{CrossChainMessage, RevertMessage};

/// Serialize a cross-chain message in fixed tuple order.
pub fn encode_cross_chain_message(message: &CrossChainMessage) -> Vec<u8> {
    ethabi::encode(&[
        Token::Uint(message.token_id),
        Token::Address(message.receiver),
        Token::String(message.uri.clone()),
        Token::Address(message.creator),
        Token::Address(message.original_owner),
        Token::Address(message.destination.unwrap_or_else(Address::zero)),
    ])
}

/// Exact inverse of [`encode_cross_chain_message`].
pub fn decode_cross_chain_message(data: &[u8]) -> Result<CrossChainMessage, BridgeError> {
    let tokens = decode_tuple(
        &[
            ParamType::Uint(256),
            ParamType::Address,
            ParamType::String,
            ParamType::Address,
            ParamType::Address,
            ParamType::Address,
        ],
        data,
        "cross-chain message",
    )?;
    let mut tokens = tokens.into_iter();
    let token_id = take_uint(tokens.next(), "tokenId")?;
    let receiver = take_address(tokens.next(), "receiver")?;
    let uri = take_string(tokens.next(), "uri")?;
    let creator = take_address(tokens.next(), "creator")?;
    let original_owner = take_address(tokens.next(), "originalOwner")?;
    let destination = take_address(tokens.next(), "destination")?;
    Ok(CrossChainMessage {
        token_id,
        receiver,
        uri,
        creator,
        original_owner,
        destination: if destination.is_zero() {
            None
        } else {
            Some(destination)
        },
    })
}

/// Serialize a revert message in fixed tuple order.
pub fn encode_revert_message(message: &RevertMessage) -> Vec<u8> {
    ethabi::encode(&[
        Token::Uint(message.token_id),
        Token::Address(message.original_owner),
        Token::String(message.uri.clone()),
        Token::Address(message.creator),
    ])
}

/// Exact inverse of [`encode_revert_message`].
pub fn decode_revert_message(data: &[u8]) -> Result<RevertMessage, BridgeError> {
    let tokens = decode_tuple(
        &[
            ParamType::Uint(256),
            ParamType::Address,
            ParamType::String,
            ParamType::Address,
        ],
        data,
        "revert message",
    )?;
    let mut tokens = tokens.into_iter();
    Ok(RevertMessage {
        token_id: take_uint(tokens.next(), "tokenId")?,
        original_owner: take_address(tokens.next(), "originalOwner")?,
        uri: take_string(tokens.next(), "uri")?,
        creator: take_address(tokens.next(), "creator")?,
    })
}

pub(crate) fn decode_tuple(
    shape: &[ParamType],
    data: &[u8],
    what: &str,
) -> Result<Vec<Token>, BridgeError> {
    let tokens = ethabi::decode(shape, data)
        .map_err(|e| BridgeError::MalformedPayload(format!("{}: {}", what, e)))?;
    // ethabi tolerates truncated tail padding and trailing junk; the wire
    // contract does not. Canonical re-encoding must reproduce the input
    // byte for byte.
    if ethabi::encode(&tokens) != data {
        return Err(BridgeError::MalformedPayload(format!(
            "{}: byte length does not match the canonical encoding",
            what
        )));
    }
    Ok(tokens)
}

pub(crate) fn take_uint(token: Option<Token>, field: &str) -> Result<U256, BridgeError> {
    token
        .and_then(Token::into_uint)
        .ok_or_else(|| shape_mismatch(field))
}

pub(crate) fn take_u64(token: Option<Token>, field: &str) -> Result<u64, BridgeError> {
    let value = take_uint(token, field)?;
    if value > U256::from(u64::MAX) {
        return Err(BridgeError::MalformedPayload(format!(
            "{} exceeds 64 bits",
            field
        )));
    }
    Ok(value.as_u64())
}

pub(crate) fn take_u16(token: Option<Token>, field: &str) -> Result<u16, BridgeError> {
    let value = take_uint(token, field)?;
    if value > U256::from(u16::MAX) {
        return Err(BridgeError::MalformedPayload(format!(
            "{} exceeds 16 bits",
            field
        )));
    }
    Ok(value.as_u32() as u16)
}

pub(crate) fn take_address(token: Option<Token>, field: &str) -> Result<Address, BridgeError> {
    token
        .and_then(Token::into_address)
        .ok_or_else(|| shape_mismatch(field))
}

pub(crate) fn take_string(token: Option<Token>, field: &str) -> Result<String, BridgeError> {
    token
        .and_then(Token::into_string)
        .ok_or_else(|| shape_mismatch(field))
}

pub(crate) fn take_fixed_bytes(
    token: Option<Token>,
    field: &str,
    width: usize,
) -> Result<Vec<u8>, BridgeError> {
    let bytes = token
        .and_then(Token::into_fixed_bytes)
        .ok_or_else(|| shape_mismatch(field))?;
    if bytes.len() != width {
        return Err(BridgeError::MalformedPayload(format!(
            "{}: expected {} bytes, got {}",
            field,
            width,
            bytes.len()
        )));
    }
    Ok(bytes)
}

pub(crate) fn take_bytes(token: Option<Token>, field: &str) -> Result<Vec<u8>, BridgeError> {
    token
        .and_then(Token::into_bytes)
        .ok_or_else(|| shape_mismatch(field))
}

fn shape_mismatch(field: &str) -> BridgeError {
    BridgeError::MalformedPayload(format!("tuple shape mismatch at {}", field))
}
