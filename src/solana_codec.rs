//! Instruction codec for the account-model (Solana) spoke
//!
//! Two encoding worlds meet here. Instruction payloads and account lists are
//! ABI-encoded so the hub's EVM side can build them; the instruction itself
//! is framed as `[1-byte discriminant][payload]` for the receiving program:
//!
//! - `0` = `MintFromUniversal`, payload `(uint64 tokenId, bytes32 recipient,
//!   string uri, string name, string symbol, bytes20 creator,
//!   uint16 royaltyBps)`
//! - `1` = `UpdateMetadata`, payload `(uint64 tokenId, string newUri,
//!   string newName)`
//!
//! Field order and widths are a hard wire contract with the on-chain
//! program. A deviation is undetectable locally and only surfaces as a
//! remote deserialization failure, so the layouts here never change without
//! a coordinated program upgrade.

use ethereum_types::Address;
use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use web3::ethabi::{self, ParamType, Token};

use crate::error::BridgeError;
use crate::evm_codec::{
    decode_tuple, take_bytes, take_fixed_bytes, take_string, take_u16, take_u64,
};
use crate::pda::PdaGenerator;
use crate::types::UniversalTokenId;

/// SPL token program
pub const TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
/// SPL associated token account program
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");
/// Metaplex token metadata program
pub const METADATA_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// One entry of the positional account list consumed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayAccount {
    pub address: Pubkey,
    pub is_writable: bool,
}

impl GatewayAccount {
    pub fn writable(address: Pubkey) -> Self {
        Self {
            address,
            is_writable: true,
        }
    }

    pub fn readonly(address: Pubkey) -> Self {
        Self {
            address,
            is_writable: false,
        }
    }
}

/// Cross-chain instruction for the universal NFT program.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossChainInstruction {
    MintFromUniversal(MintFromUniversalPayload),
    UpdateMetadata(UpdateMetadataPayload),
}

impl CrossChainInstruction {
    pub fn discriminant(&self) -> u8 {
        match self {
            CrossChainInstruction::MintFromUniversal(_) => 0,
            CrossChainInstruction::UpdateMetadata(_) => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MintFromUniversalPayload {
    pub token_id: UniversalTokenId,
    pub recipient: Pubkey,
    pub uri: String,
    pub name: String,
    pub symbol: String,
    /// Original creator on the EVM side.
    pub creator: Address,
    pub royalty_bps: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateMetadataPayload {
    pub token_id: UniversalTokenId,
    pub new_uri: String,
    pub new_name: String,
}

/// Positional account list for a `MintFromUniversal` call. Order is part of
/// the wire contract; `token_account` is the only optional slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MintAccountKeys {
    pub program_state: Pubkey,
    pub nft_state: Pubkey,
    pub mint: Pubkey,
    pub token_account: Option<Pubkey>,
    pub recipient: Pubkey,
    pub gateway_authority: Pubkey,
    pub token_program: Pubkey,
    pub associated_token_program: Pubkey,
    pub metadata_program: Pubkey,
    pub system_program: Pubkey,
    pub rent_sysvar: Pubkey,
}

/// Encode a `MintFromUniversal` payload in pinned field order.
pub fn encode_mint_from_universal_payload(payload: &MintFromUniversalPayload) -> Vec<u8> {
    ethabi::encode(&[
        Token::Uint(U256::from(payload.token_id)),
        Token::FixedBytes(payload.recipient.to_bytes().to_vec()),
        Token::String(payload.uri.clone()),
        Token::String(payload.name.clone()),
        Token::String(payload.symbol.clone()),
        Token::FixedBytes(payload.creator.as_bytes().to_vec()),
        Token::Uint(U256::from(payload.royalty_bps)),
    ])
}

/// Exact inverse of [`encode_mint_from_universal_payload`].
pub fn decode_mint_from_universal_payload(
    data: &[u8],
) -> Result<MintFromUniversalPayload, BridgeError> {
    let tokens = decode_tuple(
        &[
            ParamType::Uint(64),
            ParamType::FixedBytes(32),
            ParamType::String,
            ParamType::String,
            ParamType::String,
            ParamType::FixedBytes(20),
            ParamType::Uint(16),
        ],
        data,
        "mint payload",
    )?;
    let mut tokens = tokens.into_iter();
    let token_id = take_u64(tokens.next(), "tokenId")?;
    let recipient = take_pubkey(tokens.next(), "recipient")?;
    let uri = take_string(tokens.next(), "uri")?;
    let name = take_string(tokens.next(), "name")?;
    let symbol = take_string(tokens.next(), "symbol")?;
    let creator_bytes = take_fixed_bytes(tokens.next(), "creator", 20)?;
    let royalty_bps = take_u16(tokens.next(), "royaltyBps")?;
    Ok(MintFromUniversalPayload {
        token_id,
        recipient,
        uri,
        name,
        symbol,
        creator: Address::from_slice(&creator_bytes),
        royalty_bps,
    })
}

/// Encode an `UpdateMetadata` payload in pinned field order.
pub fn encode_update_metadata_payload(payload: &UpdateMetadataPayload) -> Vec<u8> {
    ethabi::encode(&[
        Token::Uint(U256::from(payload.token_id)),
        Token::String(payload.new_uri.clone()),
        Token::String(payload.new_name.clone()),
    ])
}

/// Exact inverse of [`encode_update_metadata_payload`].
pub fn decode_update_metadata_payload(data: &[u8]) -> Result<UpdateMetadataPayload, BridgeError> {
    let tokens = decode_tuple(
        &[ParamType::Uint(64), ParamType::String, ParamType::String],
        data,
        "update-metadata payload",
    )?;
    let mut tokens = tokens.into_iter();
    Ok(UpdateMetadataPayload {
        token_id: take_u64(tokens.next(), "tokenId")?,
        new_uri: take_string(tokens.next(), "newUri")?,
        new_name: take_string(tokens.next(), "newName")?,
    })
}

/// Frame an instruction as `[discriminant][payload]`.
pub fn encode_instruction(instruction: &CrossChainInstruction) -> Vec<u8> {
    let payload = match instruction {
        CrossChainInstruction::MintFromUniversal(p) => encode_mint_from_universal_payload(p),
        CrossChainInstruction::UpdateMetadata(p) => encode_update_metadata_payload(p),
    };
    let mut data = Vec::with_capacity(1 + payload.len());
    data.push(instruction.discriminant());
    data.extend_from_slice(&payload);
    data
}

/// Exact inverse of [`encode_instruction`]. Unknown discriminants fail with
/// `UnknownInstructionType`; an empty frame is `MalformedPayload`.
pub fn decode_instruction(data: &[u8]) -> Result<CrossChainInstruction, BridgeError> {
    let (&discriminant, payload) = data
        .split_first()
        .ok_or_else(|| BridgeError::MalformedPayload("empty instruction frame".into()))?;
    match discriminant {
        0 => Ok(CrossChainInstruction::MintFromUniversal(
            decode_mint_from_universal_payload(payload)?,
        )),
        1 => Ok(CrossChainInstruction::UpdateMetadata(
            decode_update_metadata_payload(payload)?,
        )),
        other => Err(BridgeError::UnknownInstructionType(other)),
    }
}

/// Encode an ordered account list as `tuple(bytes32,bool)[]`.
pub fn encode_account_list(accounts: &[GatewayAccount]) -> Vec<u8> {
    let entries = accounts
        .iter()
        .map(|account| {
            Token::Tuple(vec![
                Token::FixedBytes(account.address.to_bytes().to_vec()),
                Token::Bool(account.is_writable),
            ])
        })
        .collect();
    ethabi::encode(&[Token::Array(entries)])
}

/// Decode a `tuple(bytes32,bool)[]` account list, preserving order.
pub fn decode_account_list(data: &[u8]) -> Result<Vec<GatewayAccount>, BridgeError> {
    let tokens = decode_tuple(
        &[ParamType::Array(Box::new(ParamType::Tuple(vec![
            ParamType::FixedBytes(32),
            ParamType::Bool,
        ])))],
        data,
        "account list",
    )?;
    let entries = tokens
        .into_iter()
        .next()
        .and_then(Token::into_array)
        .ok_or_else(|| BridgeError::MalformedPayload("account list: not an array".into()))?;
    entries
        .into_iter()
        .map(|entry| {
            let mut fields = entry
                .into_tuple()
                .ok_or_else(|| {
                    BridgeError::MalformedPayload("account list: entry is not a tuple".into())
                })?
                .into_iter();
            let address = take_pubkey(fields.next(), "account address")?;
            let is_writable = fields
                .next()
                .and_then(Token::into_bool)
                .ok_or_else(|| {
                    BridgeError::MalformedPayload("account list: missing writable flag".into())
                })?;
            Ok(GatewayAccount {
                address,
                is_writable,
            })
        })
        .collect()
}

/// Interpret an encoded account list as the positional `MintFromUniversal`
/// account set. Lists of 10 omit the optional `tokenAccount` slot; anything
/// else is malformed.
pub fn decode_accounts(data: &[u8]) -> Result<MintAccountKeys, BridgeError> {
    let accounts = decode_account_list(data)?;
    let (with_token_account, token_account) = match accounts.len() {
        11 => (true, Some(accounts[3].address)),
        10 => (false, None),
        n => {
            return Err(BridgeError::MalformedPayload(format!(
                "mint account list: expected 10 or 11 accounts, got {}",
                n
            )))
        }
    };
    let tail = if with_token_account { 4 } else { 3 };
    Ok(MintAccountKeys {
        program_state: accounts[0].address,
        nft_state: accounts[1].address,
        mint: accounts[2].address,
        token_account,
        recipient: accounts[tail].address,
        gateway_authority: accounts[tail + 1].address,
        token_program: accounts[tail + 2].address,
        associated_token_program: accounts[tail + 3].address,
        metadata_program: accounts[tail + 4].address,
        system_program: accounts[tail + 5].address,
        rent_sysvar: accounts[tail + 6].address,
    })
}

/// Build the ordered, writable-flagged account list for a mint, deriving the
/// program accounts and the recipient's associated token account.
pub fn generate_mint_accounts(
    generator: &PdaGenerator,
    token_id: UniversalTokenId,
    recipient: Pubkey,
    gateway_authority: Pubkey,
) -> Vec<GatewayAccount> {
    let (program_state, _) = generator.program_state();
    let (nft_state, _) = generator.nft_state(token_id);
    let (mint, _) = generator.nft_mint(token_id);
    let token_account = generator.associated_token_account(&recipient, &mint);
    vec![
        GatewayAccount::writable(program_state),
        GatewayAccount::writable(nft_state),
        GatewayAccount::writable(mint),
        GatewayAccount::writable(token_account),
        GatewayAccount::readonly(recipient),
        GatewayAccount::readonly(gateway_authority),
        GatewayAccount::readonly(TOKEN_PROGRAM_ID),
        GatewayAccount::readonly(ASSOCIATED_TOKEN_PROGRAM_ID),
        GatewayAccount::readonly(METADATA_PROGRAM_ID),
        GatewayAccount::readonly(solana_sdk::system_program::ID),
        GatewayAccount::readonly(solana_sdk::sysvar::rent::ID),
    ]
}

/// Concatenate account-list and instruction encodings into the single blob
/// the hub's cross-environment call primitive consumes. This is the only
/// function bridging the two encoding worlds.
pub fn encode_withdraw_and_call_payload(
    accounts: &[GatewayAccount],
    instruction: &CrossChainInstruction,
) -> Vec<u8> {
    ethabi::encode(&[
        Token::Bytes(encode_account_list(accounts)),
        Token::Bytes(encode_instruction(instruction)),
    ])
}

/// Exact inverse of [`encode_withdraw_and_call_payload`].
pub fn decode_withdraw_and_call_payload(
    data: &[u8],
) -> Result<(Vec<GatewayAccount>, CrossChainInstruction), BridgeError> {
    let tokens = decode_tuple(
        &[ParamType::Bytes, ParamType::Bytes],
        data,
        "withdraw-and-call payload",
    )?;
    let mut tokens = tokens.into_iter();
    let accounts_data = take_bytes(tokens.next(), "accounts")?;
    let instruction_data = take_bytes(tokens.next(), "instruction")?;
    Ok((
        decode_account_list(&accounts_data)?,
        decode_instruction(&instruction_data)?,
    ))
}

fn take_pubkey(token: Option<Token>, field: &str) -> Result<Pubkey, BridgeError> {
    let bytes = take_fixed_bytes(token, field, 32)?;
    Pubkey::try_from(bytes.as_slice())
        .map_err(|_| BridgeError::MalformedPayload(format!("{}: invalid public key", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mint_payload() -> MintFromUniversalPayload {
        MintFromUniversalPayload {
            token_id: 42,
            recipient: Pubkey::new_unique(),
            uri: "ipfs://QmMint".to_string(),
            name: "Universal NFT #42".to_string(),
            symbol: "UNFT".to_string(),
            creator: Address::repeat_byte(0x77),
            royalty_bps: 500,
        }
    }

    #[test]
    fn mint_payload_round_trips() {
        let payload = sample_mint_payload();
        let decoded =
            decode_mint_from_universal_payload(&encode_mint_from_universal_payload(&payload))
                .unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn mint_payload_boundary_values_round_trip() {
        let payload = MintFromUniversalPayload {
            token_id: u64::MAX,
            recipient: Pubkey::default(),
            uri: String::new(),
            name: String::new(),
            symbol: String::new(),
            creator: Address::zero(),
            royalty_bps: u16::MAX,
        };
        let decoded =
            decode_mint_from_universal_payload(&encode_mint_from_universal_payload(&payload))
                .unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn mint_payload_encoding_is_byte_identical() {
        let payload = sample_mint_payload();
        assert_eq!(
            encode_mint_from_universal_payload(&payload),
            encode_mint_from_universal_payload(&payload)
        );
    }

    #[test]
    fn update_metadata_round_trips() {
        let payload = UpdateMetadataPayload {
            token_id: 7,
            new_uri: "ipfs://QmNew".to_string(),
            new_name: "Renamed".to_string(),
        };
        let decoded =
            decode_update_metadata_payload(&encode_update_metadata_payload(&payload)).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn instruction_frame_starts_with_discriminant() {
        let mint = CrossChainInstruction::MintFromUniversal(sample_mint_payload());
        assert_eq!(encode_instruction(&mint)[0], 0);

        let update = CrossChainInstruction::UpdateMetadata(UpdateMetadataPayload {
            token_id: 1,
            new_uri: "u".to_string(),
            new_name: "n".to_string(),
        });
        assert_eq!(encode_instruction(&update)[0], 1);
    }

    #[test]
    fn instruction_round_trips() {
        let instruction = CrossChainInstruction::MintFromUniversal(sample_mint_payload());
        assert_eq!(
            decode_instruction(&encode_instruction(&instruction)).unwrap(),
            instruction
        );
    }

    #[test]
    fn unknown_discriminant_is_rejected() {
        let mut data = encode_instruction(&CrossChainInstruction::MintFromUniversal(
            sample_mint_payload(),
        ));
        data[0] = 7;
        assert!(matches!(
            decode_instruction(&data),
            Err(BridgeError::UnknownInstructionType(7))
        ));
    }

    #[test]
    fn empty_instruction_is_malformed() {
        assert!(matches!(
            decode_instruction(&[]),
            Err(BridgeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn account_list_round_trips() {
        let accounts = vec![
            GatewayAccount::writable(Pubkey::new_unique()),
            GatewayAccount::readonly(Pubkey::new_unique()),
            GatewayAccount::writable(Pubkey::new_unique()),
        ];
        let decoded = decode_account_list(&encode_account_list(&accounts)).unwrap();
        assert_eq!(decoded, accounts);
    }

    #[test]
    fn generated_accounts_decode_positionally() {
        let generator = PdaGenerator::new(Pubkey::new_unique());
        let recipient = Pubkey::new_unique();
        let gateway_authority = Pubkey::new_unique();
        let accounts = generate_mint_accounts(&generator, 42, recipient, gateway_authority);
        assert_eq!(accounts.len(), 11);

        let keys = decode_accounts(&encode_account_list(&accounts)).unwrap();
        assert_eq!(keys.program_state, generator.program_state().0);
        assert_eq!(keys.nft_state, generator.nft_state(42).0);
        assert_eq!(keys.mint, generator.nft_mint(42).0);
        assert_eq!(
            keys.token_account,
            Some(generator.associated_token_account(&recipient, &generator.nft_mint(42).0))
        );
        assert_eq!(keys.recipient, recipient);
        assert_eq!(keys.gateway_authority, gateway_authority);
        assert_eq!(keys.token_program, TOKEN_PROGRAM_ID);
        assert_eq!(keys.associated_token_program, ASSOCIATED_TOKEN_PROGRAM_ID);
        assert_eq!(keys.metadata_program, METADATA_PROGRAM_ID);
        assert_eq!(keys.system_program, solana_sdk::system_program::ID);
        assert_eq!(keys.rent_sysvar, solana_sdk::sysvar::rent::ID);
    }

    #[test]
    fn ten_account_list_omits_token_account() {
        let generator = PdaGenerator::new(Pubkey::new_unique());
        let mut accounts =
            generate_mint_accounts(&generator, 1, Pubkey::new_unique(), Pubkey::new_unique());
        accounts.remove(3);
        let keys = decode_accounts(&encode_account_list(&accounts)).unwrap();
        assert_eq!(keys.token_account, None);
        assert_eq!(keys.system_program, solana_sdk::system_program::ID);
    }

    #[test]
    fn short_account_list_is_malformed() {
        let accounts = vec![
            GatewayAccount::writable(Pubkey::new_unique()),
            GatewayAccount::writable(Pubkey::new_unique()),
        ];
        assert!(matches!(
            decode_accounts(&encode_account_list(&accounts)),
            Err(BridgeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn writable_flags_follow_the_contract() {
        let generator = PdaGenerator::new(Pubkey::new_unique());
        let accounts =
            generate_mint_accounts(&generator, 9, Pubkey::new_unique(), Pubkey::new_unique());
        let flags: Vec<bool> = accounts.iter().map(|a| a.is_writable).collect();
        assert_eq!(
            flags,
            vec![true, true, true, true, false, false, false, false, false, false, false]
        );
    }

    #[test]
    fn withdraw_and_call_round_trips() {
        let generator = PdaGenerator::new(Pubkey::new_unique());
        let accounts =
            generate_mint_accounts(&generator, 3, Pubkey::new_unique(), Pubkey::new_unique());
        let instruction = CrossChainInstruction::MintFromUniversal(sample_mint_payload());
        let blob = encode_withdraw_and_call_payload(&accounts, &instruction);
        let (decoded_accounts, decoded_instruction) =
            decode_withdraw_and_call_payload(&blob).unwrap();
        assert_eq!(decoded_accounts, accounts);
        assert_eq!(decoded_instruction, instruction);
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let encoded = encode_mint_from_universal_payload(&sample_mint_payload());
        assert!(matches!(
            decode_mint_from_universal_payload(&encoded[..encoded.len() - 9]),
            Err(BridgeError::MalformedPayload(_))
        ));
    }
}
