//! Shared data model for cross-chain NFT identity

use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Token identity minted once on the hub, immutable for the token's life.
pub type UniversalTokenId = u64;

/// Royalty applied when a hub record does not carry one of its own.
pub const DEFAULT_ROYALTY_BPS: u16 = 500;

/// Canonical token record as read from a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token_id: UniversalTokenId,
    pub owner: Address,
    pub uri: String,
    pub creator: Address,
    pub royalty_bps: u16,
    /// Collection name, when the ledger exposes it.
    pub name: Option<String>,
    /// Collection symbol, when the ledger exposes it.
    pub symbol: Option<String>,
}

/// Transient message carried by a hub/EVM cross-chain transfer.
///
/// Field order is the wire contract; see [`crate::evm_codec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossChainMessage {
    pub token_id: U256,
    pub receiver: Address,
    pub uri: String,
    pub creator: Address,
    pub original_owner: Address,
    /// `None` encodes as the zero-address sentinel.
    pub destination: Option<Address>,
}

/// Message rolling back a failed outbound transfer to its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevertMessage {
    pub token_id: U256,
    pub original_owner: Address,
    pub uri: String,
    pub creator: Address,
}

/// Outcome of every mutating adapter operation.
///
/// Adapters never raise past this boundary: failures land in `status` with an
/// empty `tx_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferResult {
    pub tx_hash: String,
    pub token_id: Option<UniversalTokenId>,
    pub status: TransferStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Source-side transaction confirmed; cross-chain leg still in flight.
    Pending,
    Success,
    Failed,
}

impl TransferResult {
    pub fn success(tx_hash: String, token_id: Option<UniversalTokenId>) -> Self {
        Self {
            tx_hash,
            token_id,
            status: TransferStatus::Success,
        }
    }

    pub fn pending(tx_hash: String, token_id: Option<UniversalTokenId>) -> Self {
        Self {
            tx_hash,
            token_id,
            status: TransferStatus::Pending,
        }
    }

    /// Failure result with an empty transaction hash.
    pub fn failed() -> Self {
        Self {
            tx_hash: String::new(),
            token_id: None,
            status: TransferStatus::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == TransferStatus::Failed
    }
}

/// Off-chain NFT metadata used when minting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub attributes: Vec<NftAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftAttribute {
    pub trait_type: String,
    pub value: serde_json::Value,
}

impl NftMetadata {
    /// Deterministic content-addressed placeholder URI for this metadata.
    ///
    /// Real deployments pin the JSON to IPFS; the URI only has to be stable
    /// for identical metadata.
    pub fn metadata_uri(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        let digest = keccak_hash::keccak(json.as_bytes());
        format!("ipfs://Qm{}", hex::encode(&digest.as_bytes()[..23]))
    }
}

/// Presence of a token on one ledger, tagged by environment.
///
/// Replaces the dynamically-keyed aggregate of earlier designs: every entry
/// names its ledger and carries only the fields that ledger can report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerPresence {
    Hub {
        owner: Address,
        uri: String,
        creator: Address,
    },
    EvmSpoke {
        chain_id: u64,
        owner: Address,
        uri: String,
        creator: Address,
    },
    SolanaSpoke {
        /// Derived `nft_state` account address.
        state_address: Pubkey,
        owner: Option<Pubkey>,
        mint: Option<Pubkey>,
        uri: Option<String>,
    },
}

/// Aggregated cross-chain view of one token id.
///
/// Best-effort: unreachable ledgers contribute no entry. In steady state
/// exactly one entry is expected; double presence is an in-flight transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NftQueryResult {
    pub entries: Vec<LedgerPresence>,
}

impl NftQueryResult {
    pub fn hub(&self) -> Option<&LedgerPresence> {
        self.entries
            .iter()
            .find(|e| matches!(e, LedgerPresence::Hub { .. }))
    }

    pub fn evm_spoke(&self, chain_id: u64) -> Option<&LedgerPresence> {
        self.entries
            .iter()
            .find(|e| matches!(e, LedgerPresence::EvmSpoke { chain_id: id, .. } if *id == chain_id))
    }

    pub fn solana_spoke(&self) -> Option<&LedgerPresence> {
        self.entries
            .iter()
            .find(|e| matches!(e, LedgerPresence::SolanaSpoke { .. }))
    }

    /// True when exactly one ledger holds the token.
    pub fn is_steady_state(&self) -> bool {
        self.entries.len() == 1
    }
}

/// Cost estimate for a cross-chain transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasEstimate {
    pub gas_limit: U256,
    pub gas_price: U256,
    pub total_cost: U256,
}
