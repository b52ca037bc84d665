//! Hub chain adapter
//!
//! The hub holds the canonical token record and is the entry point for every
//! cross-chain relay, including withdraw-and-call transfers into the
//! account-model spoke. The hub is EVM-compatible, so the ERC-721 plumbing
//! is shared with the spoke client.

use ethereum_types::{Address, U256};

use crate::adapter::{ChainAdapter, Ledger};
use crate::config::{EvmChainConfig, TimeoutConfig};
use crate::error::BridgeError;
use crate::eth_rpc::EthRpc;
use crate::evm_client::{
    fetch_token_record, submit_safe_mint, submit_transfer_cross_chain,
};
use crate::types::{LedgerPresence, NftMetadata, TokenRecord, TransferResult, UniversalTokenId};

pub struct ZetaChainClient {
    rpc: EthRpc,
    chain_id: u64,
    nft_contract: Address,
}

impl ZetaChainClient {
    pub fn new(
        config: &EvmChainConfig,
        private_key: &str,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            rpc: EthRpc::connect(&config.rpc_url, config.chain_id, private_key, timeouts)?,
            chain_id: config.chain_id,
            nft_contract: config.nft_contract_address()?,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn signer_address(&self) -> Address {
        self.rpc.account()
    }
}

#[async_trait::async_trait]
impl ChainAdapter for ZetaChainClient {
    fn ledger(&self) -> Ledger {
        Ledger::Hub
    }

    async fn mint(&self, to: &str, metadata: &NftMetadata) -> TransferResult {
        submit_safe_mint(&self.rpc, self.nft_contract, to, metadata).await
    }

    async fn transfer_out(
        &self,
        token_id: UniversalTokenId,
        receiver: Vec<u8>,
        destination: Address,
    ) -> TransferResult {
        submit_transfer_cross_chain(&self.rpc, self.nft_contract, token_id, receiver, destination)
            .await
    }

    async fn query(
        &self,
        token_id: UniversalTokenId,
    ) -> Result<Option<LedgerPresence>, BridgeError> {
        let record = fetch_token_record(&self.rpc, self.nft_contract, token_id, false).await?;
        Ok(record.map(|record| LedgerPresence::Hub {
            owner: record.owner,
            uri: record.uri,
            creator: record.creator,
        }))
    }

    /// Canonical record, including collection name/symbol for mint payloads.
    async fn token_record(
        &self,
        token_id: UniversalTokenId,
    ) -> Result<Option<TokenRecord>, BridgeError> {
        fetch_token_record(&self.rpc, self.nft_contract, token_id, true).await
    }

    async fn gas_price(&self) -> Result<U256, BridgeError> {
        self.rpc.gas_price().await
    }
}
