//! Program Derived Address (PDA) utilities
//!
//! Centralized derivation for every program account the bridge touches. The
//! seed layout is a wire contract with the on-chain program: UTF-8 literal
//! seeds plus raw little-endian token-id bytes. Changing either silently
//! breaks cross-chain mints, so all derivation goes through this module.

use solana_sdk::pubkey::Pubkey;

/// PDA seeds for the universal NFT program accounts
pub mod seeds {
    pub const PROGRAM_STATE: &[u8] = b"program_state";
    pub const NFT_STATE: &[u8] = b"nft_state";
    pub const NFT_MINT: &[u8] = b"nft_mint";
}

/// PDA generator bound to one program id
#[derive(Debug, Clone, Copy)]
pub struct PdaGenerator {
    program_id: Pubkey,
}

impl PdaGenerator {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// Singleton program state account
    pub fn program_state(&self) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[seeds::PROGRAM_STATE], &self.program_id)
    }

    /// Per-token NFT state account
    pub fn nft_state(&self, token_id: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[seeds::NFT_STATE, &token_id.to_le_bytes()],
            &self.program_id,
        )
    }

    /// Per-token mint account
    pub fn nft_mint(&self, token_id: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[seeds::NFT_MINT, &token_id.to_le_bytes()],
            &self.program_id,
        )
    }

    /// Standard owner+mint associated token account
    pub fn associated_token_account(&self, owner: &Pubkey, mint: &Pubkey) -> Pubkey {
        spl_associated_token_account::get_associated_token_address(owner, mint)
    }
}
