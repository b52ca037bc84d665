//! Cross-chain orchestrator
//!
//! `UniversalNftSdk` owns one adapter per configured ledger plus the injected
//! chain registry, and composes them into the user-facing operations: mints,
//! hub-routed transfers, the query fan-out, and transfer watching.
//!
//! Error discipline: caller mistakes (an unconfigured chain id) surface as
//! `Err` before any network traffic; failures of submitted work land in
//! `TransferResult::status`.
//!
//! Concurrent mutating calls for the *same* token id are the caller's to
//! serialize; the receiving ledgers reject duplicates, but interleaved
//! submissions waste gas.

use std::collections::HashMap;
use std::sync::Arc;

use ethereum_types::{Address, U256};
use futures::future::join_all;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use tracing::{debug, info, warn};

use crate::adapter::{ChainAdapter, Ledger};
use crate::chain_registry::ChainRegistry;
use crate::config::{BridgeConfig, TimeoutConfig};
use crate::error::BridgeError;
use crate::eth_rpc::{CROSS_CHAIN_FEE_WEI, CROSS_CHAIN_GAS_LIMIT};
use crate::evm_client::EvmClient;
use crate::monitor::TransferMonitor;
use crate::pda::PdaGenerator;
use crate::solana_client::SolanaClient;
use crate::solana_codec::{
    encode_withdraw_and_call_payload, generate_mint_accounts, CrossChainInstruction,
    MintFromUniversalPayload,
};
use crate::types::{
    GasEstimate, NftMetadata, NftQueryResult, TransferResult, UniversalTokenId,
    DEFAULT_ROYALTY_BPS,
};
use crate::zetachain_client::ZetaChainClient;

pub struct UniversalNftSdk {
    hub: Arc<dyn ChainAdapter>,
    evm_spokes: HashMap<u64, Arc<dyn ChainAdapter>>,
    solana: Arc<dyn ChainAdapter>,
    registry: ChainRegistry,
    pda: PdaGenerator,
    gateway_authority: Pubkey,
    hub_chain_id: u64,
    solana_chain_id: u64,
    timeouts: TimeoutConfig,
}

impl UniversalNftSdk {
    /// Build the full adapter set from a validated configuration. One EVM
    /// signing key serves the hub and every EVM spoke; the Solana payer
    /// signs burns on the account-model spoke.
    pub fn new(
        config: &BridgeConfig,
        evm_private_key: &str,
        solana_payer: Keypair,
    ) -> Result<Self, BridgeError> {
        config.validate()?;
        let registry = ChainRegistry::from_config(config)?;
        let hub = ZetaChainClient::new(&config.hub, evm_private_key, &config.timeouts)?;
        let mut evm_spokes: HashMap<u64, Arc<dyn ChainAdapter>> = HashMap::new();
        for spoke in &config.evm_spokes {
            let client = EvmClient::new(spoke, evm_private_key, &config.timeouts)?;
            evm_spokes.insert(spoke.chain_id, Arc::new(client));
        }
        let solana = SolanaClient::from_bridge_config(config, solana_payer)?;
        info!(
            hub_chain = config.hub.chain_id,
            evm_spokes = evm_spokes.len(),
            solana_chain = config.solana.chain_id,
            "bridge SDK initialized"
        );
        Ok(Self {
            hub: Arc::new(hub),
            evm_spokes,
            solana: Arc::new(solana),
            registry,
            pda: PdaGenerator::new(config.solana_program_id()?),
            gateway_authority: config.solana_gateway_authority()?,
            hub_chain_id: config.hub.chain_id,
            solana_chain_id: config.solana.chain_id,
            timeouts: config.timeouts.clone(),
        })
    }

    /// Assemble an orchestrator from pre-built adapters. Test seam; also the
    /// escape hatch for embedders with their own transport.
    #[allow(clippy::too_many_arguments)]
    pub fn with_adapters(
        hub: Arc<dyn ChainAdapter>,
        evm_spokes: HashMap<u64, Arc<dyn ChainAdapter>>,
        solana: Arc<dyn ChainAdapter>,
        registry: ChainRegistry,
        program_id: Pubkey,
        gateway_authority: Pubkey,
        hub_chain_id: u64,
        solana_chain_id: u64,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            hub,
            evm_spokes,
            solana,
            registry,
            pda: PdaGenerator::new(program_id),
            gateway_authority,
            hub_chain_id,
            solana_chain_id,
            timeouts,
        }
    }

    /// Mint a new universal token on the hub. The hub contract assigns the
    /// token id; it is reported back through `TransferResult::token_id`.
    pub async fn mint_on_hub(&self, to: &str, metadata: &NftMetadata) -> TransferResult {
        self.hub.mint(to, metadata).await
    }

    /// Mint directly on a configured EVM spoke.
    pub async fn mint_on_evm(
        &self,
        chain_id: u64,
        to: &str,
        metadata: &NftMetadata,
    ) -> Result<TransferResult, BridgeError> {
        let spoke = self
            .evm_spokes
            .get(&chain_id)
            .ok_or(BridgeError::UnsupportedDestination(chain_id))?;
        Ok(spoke.mint(to, metadata).await)
    }

    /// Move a hub token to the account-model spoke.
    ///
    /// Reads the canonical record, derives the full account set for the
    /// destination program, packs the mint instruction into a
    /// withdraw-and-call blob, and submits the hub-side transfer. Returns on
    /// hub confirmation; the spoke-side mint belongs to the relay.
    pub async fn transfer_to_solana(
        &self,
        token_id: UniversalTokenId,
        recipient: Pubkey,
    ) -> Result<TransferResult, BridgeError> {
        let destination = self.registry.encode_destination(self.solana_chain_id);
        if destination.is_zero() {
            return Err(BridgeError::UnsupportedDestination(self.solana_chain_id));
        }
        let record = match self.hub.token_record(token_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(token_id, "no canonical record on the hub, nothing to transfer");
                return Ok(TransferResult::failed());
            }
            Err(e) => {
                warn!(token_id, error = %e, "hub record unavailable");
                return Ok(TransferResult::failed());
            }
        };

        let accounts =
            generate_mint_accounts(&self.pda, token_id, recipient, self.gateway_authority);
        let payload = MintFromUniversalPayload {
            token_id,
            recipient,
            uri: record.uri,
            name: record
                .name
                .unwrap_or_else(|| format!("Universal NFT #{}", token_id)),
            symbol: record.symbol.unwrap_or_else(|| "UNFT".to_string()),
            creator: record.creator,
            royalty_bps: if record.royalty_bps == 0 {
                DEFAULT_ROYALTY_BPS
            } else {
                record.royalty_bps
            },
        };
        let blob = encode_withdraw_and_call_payload(
            &accounts,
            &CrossChainInstruction::MintFromUniversal(payload),
        );
        debug!(
            token_id,
            %recipient,
            blob_len = blob.len(),
            "submitting hub-side transfer toward the account-model spoke"
        );
        Ok(self.hub.transfer_out(token_id, blob, destination).await)
    }

    /// Burn the token on the account-model spoke and route it to an EVM
    /// destination through the hub. The registry check runs before any
    /// network call.
    pub async fn transfer_from_solana(
        &self,
        token_id: UniversalTokenId,
        destination_chain_id: u64,
        recipient: Address,
    ) -> Result<TransferResult, BridgeError> {
        if !self.registry.is_registered(destination_chain_id) {
            return Err(BridgeError::UnsupportedDestination(destination_chain_id));
        }
        let destination = self.registry.encode_destination(destination_chain_id);
        Ok(self
            .solana
            .transfer_out(token_id, recipient.as_bytes().to_vec(), destination)
            .await)
    }

    /// Hub-routed transfer between two EVM-style ledgers. The source may be
    /// the hub itself or any configured EVM spoke.
    pub async fn transfer_between_evm(
        &self,
        source_chain_id: u64,
        destination_chain_id: u64,
        token_id: UniversalTokenId,
        recipient: Address,
    ) -> Result<TransferResult, BridgeError> {
        if !self.registry.is_registered(destination_chain_id) {
            return Err(BridgeError::UnsupportedDestination(destination_chain_id));
        }
        let source = self.evm_adapter(source_chain_id)?;
        let destination = self.registry.encode_destination(destination_chain_id);
        Ok(source
            .transfer_out(token_id, recipient.as_bytes().to_vec(), destination)
            .await)
    }

    /// Concurrent presence fan-out across every configured ledger.
    ///
    /// Each adapter gets its own timeout; unreachable ledgers contribute no
    /// entry and never fail the aggregate.
    pub async fn query_nft(&self, token_id: UniversalTokenId) -> NftQueryResult {
        let mut adapters: Vec<Arc<dyn ChainAdapter>> = Vec::with_capacity(2 + self.evm_spokes.len());
        adapters.push(self.hub.clone());
        adapters.extend(self.evm_spokes.values().cloned());
        adapters.push(self.solana.clone());

        let budget = self.timeouts.query_timeout();
        let lookups = adapters.iter().map(|adapter| {
            let adapter = adapter.clone();
            async move {
                let ledger = adapter.ledger();
                match tokio::time::timeout(budget, adapter.query(token_id)).await {
                    Ok(Ok(presence)) => presence,
                    Ok(Err(e)) => {
                        debug!(token_id, ?ledger, error = %e, "ledger query failed");
                        None
                    }
                    Err(_) => {
                        debug!(token_id, ?ledger, "ledger query timed out");
                        None
                    }
                }
            }
        });
        let entries = join_all(lookups).await.into_iter().flatten().collect();
        NftQueryResult { entries }
    }

    /// Source-side cost of a cross-chain transfer: live gas price times the
    /// fixed cross-chain gas limit, plus the flat relay fee.
    pub async fn estimate_transfer_gas(
        &self,
        source_chain_id: u64,
        destination_chain_id: u64,
    ) -> Result<GasEstimate, BridgeError> {
        if !self.registry.is_registered(destination_chain_id) {
            return Err(BridgeError::UnsupportedDestination(destination_chain_id));
        }
        let source = self.evm_adapter(source_chain_id)?;
        let gas_price = source.gas_price().await?;
        let gas_limit = U256::from(CROSS_CHAIN_GAS_LIMIT);
        Ok(GasEstimate {
            gas_limit,
            gas_price,
            total_cost: gas_price * gas_limit + U256::from(CROSS_CHAIN_FEE_WEI),
        })
    }

    /// Chain ids reachable as transfer destinations, as injected at startup.
    pub fn supported_chains(&self) -> Vec<u64> {
        self.registry.registered_chain_ids()
    }

    /// Watch the destination ledger until `token_id` appears there, the
    /// confirmation deadline passes, or the returned monitor is cancelled.
    pub fn watch_transfer(
        &self,
        token_id: UniversalTokenId,
        destination_chain_id: u64,
    ) -> Result<TransferMonitor, BridgeError> {
        let destination = self.adapter_for(destination_chain_id)?;
        Ok(TransferMonitor::spawn(
            destination,
            token_id,
            self.timeouts.poll_interval(),
            self.timeouts.confirmation_timeout(),
        ))
    }

    pub fn hub_ledger(&self) -> Ledger {
        self.hub.ledger()
    }

    fn evm_adapter(&self, chain_id: u64) -> Result<Arc<dyn ChainAdapter>, BridgeError> {
        if chain_id == self.hub_chain_id {
            return Ok(self.hub.clone());
        }
        self.evm_spokes
            .get(&chain_id)
            .cloned()
            .ok_or(BridgeError::UnsupportedDestination(chain_id))
    }

    fn adapter_for(&self, chain_id: u64) -> Result<Arc<dyn ChainAdapter>, BridgeError> {
        if chain_id == self.solana_chain_id {
            return Ok(self.solana.clone());
        }
        self.evm_adapter(chain_id)
    }
}
