//! Account-model spoke adapter
//!
//! Reads derived program state and submits `burn_to_universal` transactions
//! through the Solana JSON-RPC. Mints on this ledger are gateway-driven
//! (they arrive as cross-chain calls), so the local mint capability reports
//! failure instead of submitting anything.

use std::sync::Arc;

use borsh::{BorshDeserialize, BorshSerialize};
use ethereum_types::Address;
use sha2::{Digest, Sha256};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;
use tracing::{debug, warn};

use crate::adapter::{ChainAdapter, Ledger};
use crate::config::{BridgeConfig, SolanaChainConfig};
use crate::error::BridgeError;
use crate::pda::PdaGenerator;
use crate::solana_codec::TOKEN_PROGRAM_ID;
use crate::types::{LedgerPresence, NftMetadata, TransferResult, UniversalTokenId};

/// On-chain `nft_state` account layout (Anchor discriminator stripped).
/// Every field must stay in program order for borsh, including the ones
/// the client never reads.
#[derive(Debug, Clone, BorshDeserialize)]
#[allow(dead_code)]
struct NftStateAccount {
    universal_token_id: u64,
    mint: Pubkey,
    original_owner: Vec<u8>,
    current_owner: Pubkey,
    uri: String,
    creator: Vec<u8>,
    name: String,
    symbol: String,
    royalty_bps: u16,
    bump: u8,
}

pub struct SolanaClient {
    rpc: Arc<RpcClient>,
    chain_id: u64,
    pda: PdaGenerator,
    payer: Keypair,
    commitment: CommitmentConfig,
}

impl SolanaClient {
    pub fn new(
        config: &SolanaChainConfig,
        program_id: Pubkey,
        payer: Keypair,
        commitment: CommitmentConfig,
    ) -> Self {
        Self {
            rpc: Arc::new(RpcClient::new_with_commitment(
                config.rpc_url.clone(),
                commitment,
            )),
            chain_id: config.chain_id,
            pda: PdaGenerator::new(program_id),
            payer,
            commitment,
        }
    }

    pub fn from_bridge_config(
        config: &BridgeConfig,
        payer: Keypair,
    ) -> Result<Self, BridgeError> {
        let program_id = config.solana_program_id()?;
        Ok(Self::new(
            &config.solana,
            program_id,
            payer,
            config.solana_commitment(),
        ))
    }

    pub fn payer_pubkey(&self) -> Pubkey {
        self.payer.pubkey()
    }

    /// Burn the local representation and emit the return message toward the
    /// hub. `destination_chain` is the target's ZRC-20 address; `receiver`
    /// the raw receiver bytes on that chain.
    pub async fn transfer_in(
        &self,
        token_id: UniversalTokenId,
        destination_chain: Address,
        receiver: Vec<u8>,
    ) -> TransferResult {
        let data = match burn_instruction_data(token_id, destination_chain, &receiver) {
            Ok(data) => data,
            Err(e) => {
                warn!(token_id, error = %e, "cannot build burn instruction");
                return TransferResult::failed();
            }
        };
        let (program_state, _) = self.pda.program_state();
        let (nft_state, _) = self.pda.nft_state(token_id);
        let (mint, _) = self.pda.nft_mint(token_id);
        let instruction = Instruction {
            program_id: self.pda.program_id(),
            accounts: vec![
                AccountMeta::new(program_state, false),
                AccountMeta::new(nft_state, false),
                AccountMeta::new(mint, false),
                AccountMeta::new(self.payer.pubkey(), true),
                AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            ],
            data,
        };

        let blockhash = match self.rpc.get_latest_blockhash().await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(token_id, error = %e, "burn submission failed: no recent blockhash");
                return TransferResult::failed();
            }
        };
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.payer.pubkey()),
            &[&self.payer],
            blockhash,
        );
        match self.rpc.send_and_confirm_transaction(&transaction).await {
            Ok(signature) => {
                debug!(token_id, %signature, "burn confirmed, return message in flight");
                TransferResult::pending(signature.to_string(), Some(token_id))
            }
            Err(e) => {
                warn!(token_id, error = %e, "burn submission rejected");
                TransferResult::failed()
            }
        }
    }
}

#[async_trait::async_trait]
impl ChainAdapter for SolanaClient {
    fn ledger(&self) -> Ledger {
        Ledger::SolanaSpoke
    }

    async fn mint(&self, _to: &str, _metadata: &NftMetadata) -> TransferResult {
        warn!(chain_id = self.chain_id, "local mints are gateway-driven on the account-model spoke");
        TransferResult::failed()
    }

    async fn transfer_out(
        &self,
        token_id: UniversalTokenId,
        receiver: Vec<u8>,
        destination: Address,
    ) -> TransferResult {
        self.transfer_in(token_id, destination, receiver).await
    }

    async fn query(
        &self,
        token_id: UniversalTokenId,
    ) -> Result<Option<LedgerPresence>, BridgeError> {
        let (state_address, _) = self.pda.nft_state(token_id);
        let response = self
            .rpc
            .get_account_with_commitment(&state_address, self.commitment)
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        let account = match response.value {
            Some(account) => account,
            None => return Ok(None),
        };
        let state = decode_nft_state(&account.data)?;
        Ok(Some(LedgerPresence::SolanaSpoke {
            state_address,
            owner: Some(state.current_owner),
            mint: Some(state.mint),
            uri: Some(state.uri),
        }))
    }
}

/// `[8-byte Anchor discriminator][borsh args]` for `burn_to_universal`.
fn burn_instruction_data(
    token_id: UniversalTokenId,
    destination_chain: Address,
    receiver: &[u8],
) -> Result<Vec<u8>, BridgeError> {
    let mut data = anchor_discriminator("global:burn_to_universal").to_vec();
    let io_err = |e: std::io::Error| BridgeError::MalformedPayload(e.to_string());
    token_id.serialize(&mut data).map_err(io_err)?;
    destination_chain
        .as_bytes()
        .to_vec()
        .serialize(&mut data)
        .map_err(io_err)?;
    receiver.to_vec().serialize(&mut data).map_err(io_err)?;
    Ok(data)
}

fn decode_nft_state(data: &[u8]) -> Result<NftStateAccount, BridgeError> {
    let expected = anchor_discriminator("account:NFTState");
    if data.len() < 8 || data[..8] != expected {
        return Err(BridgeError::MalformedPayload(
            "nft_state account has an unexpected discriminator".into(),
        ));
    }
    // Anchor accounts are padded to their allocated size; trailing bytes are
    // expected.
    NftStateAccount::deserialize(&mut &data[8..])
        .map_err(|e| BridgeError::MalformedPayload(format!("nft_state account: {}", e)))
}

fn anchor_discriminator(preimage: &str) -> [u8; 8] {
    let digest = Sha256::digest(preimage.as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&digest[..8]);
    discriminator
}
