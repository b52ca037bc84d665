//! Chain adapter trait
//!
//! One adapter per ledger. Mutating operations never raise past this
//! boundary: failures land in `TransferResult::status`. Queries distinguish
//! absence (`Ok(None)`) from transport failure (`Err`).

use async_trait::async_trait;
use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::types::{LedgerPresence, NftMetadata, TokenRecord, TransferResult, UniversalTokenId};

/// Identity of one ledger in the hub-and-spoke topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ledger {
    Hub,
    EvmSpoke(u64),
    SolanaSpoke,
}

#[async_trait]
pub trait ChainAdapter: Send + Sync {
    fn ledger(&self) -> Ledger;

    /// Mint a token locally. Adapters for ledgers where minting is
    /// gateway-driven return a failed result.
    async fn mint(&self, to: &str, metadata: &NftMetadata) -> TransferResult;

    /// Move the token off this ledger in one atomic source-side transaction.
    /// `receiver` is the destination-specific receiver encoding (an address
    /// string's bytes, or a withdraw-and-call blob for the account-model
    /// spoke); `destination` is the ZRC-20 address of the target chain.
    ///
    /// `Pending` means the source transaction confirmed; the spoke-side leg
    /// belongs to the relay infrastructure.
    async fn transfer_out(
        &self,
        token_id: UniversalTokenId,
        receiver: Vec<u8>,
        destination: Address,
    ) -> TransferResult;

    /// Presence of the token on this ledger. Absence is `Ok(None)`.
    async fn query(&self, token_id: UniversalTokenId)
        -> Result<Option<LedgerPresence>, BridgeError>;

    /// Full token record, on ledgers that hold one.
    async fn token_record(
        &self,
        _token_id: UniversalTokenId,
    ) -> Result<Option<TokenRecord>, BridgeError> {
        Ok(None)
    }

    /// Current gas price, on ledgers with an EVM fee model.
    async fn gas_price(&self) -> Result<U256, BridgeError> {
        Err(BridgeError::Submission(
            "gas estimation is not supported on this ledger".into(),
        ))
    }
}
