//! Universal NFT cross-chain SDK
//!
//! Client-side toolkit for a hub-and-spoke NFT bridge: canonical token
//! records live on an EVM-compatible hub chain, representations travel to
//! EVM spoke chains and to a Solana program through the hub's cross-chain
//! gateway.
//!
//! The crate splits into three layers:
//! - pure codecs and derivation (`evm_codec`, `solana_codec`, `pda`,
//!   `chain_registry`) with no I/O;
//! - one [`adapter::ChainAdapter`] per ledger (`zetachain_client`,
//!   `evm_client`, `solana_client`) over JSON-RPC;
//! - the [`sdk::UniversalNftSdk`] orchestrator plus the
//!   [`monitor::TransferMonitor`] polling watcher.

pub mod adapter;
pub mod chain_registry;
pub mod config;
pub mod error;
pub mod eth_rpc;
pub mod evm_client;
pub mod evm_codec;
pub mod monitor;
pub mod pda;
pub mod sdk;
pub mod solana_client;
pub mod solana_codec;
pub mod types;
pub mod zetachain_client;

pub use adapter::{ChainAdapter, Ledger};
pub use chain_registry::{ChainRegistry, UNRESOLVED_CHAIN_ID};
pub use config::{BridgeConfig, EvmChainConfig, SolanaChainConfig, TimeoutConfig};
pub use error::BridgeError;
pub use evm_client::EvmClient;
pub use monitor::{TransferMonitor, TransferStage};
pub use pda::PdaGenerator;
pub use sdk::UniversalNftSdk;
pub use solana_client::SolanaClient;
pub use solana_codec::{CrossChainInstruction, GatewayAccount, MintFromUniversalPayload};
pub use types::{
    CrossChainMessage, GasEstimate, LedgerPresence, NftMetadata, NftQueryResult, RevertMessage,
    TokenRecord, TransferResult, TransferStatus, UniversalTokenId,
};
pub use zetachain_client::ZetaChainClient;
