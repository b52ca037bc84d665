//! Shared EVM JSON-RPC plumbing
//!
//! One connection per chain: HTTP transport, a secp256k1 signing key, and
//! the helpers the hub/spoke clients build on (read-only calls, signed
//! submission, receipt polling with a deadline).

use std::time::{Duration, Instant};

use ethereum_types::{Address, H256, U256};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use tracing::{debug, warn};
use web3::ethabi::{self, Token};
use web3::transports::Http;
use web3::types::{
    BlockNumber, Bytes, CallRequest, TransactionParameters, TransactionReceipt, U64,
};
use web3::Web3;

use crate::config::TimeoutConfig;
use crate::error::BridgeError;

/// Gas limit for a plain contract transaction (mint, metadata update).
pub const DEFAULT_GAS_LIMIT: u64 = 500_000;
/// Gas limit for a cross-chain transfer entry call.
pub const CROSS_CHAIN_GAS_LIMIT: u64 = 300_000;
/// Value attached to cross-chain entry calls to fund the destination leg.
pub const CROSS_CHAIN_FEE_WEI: u128 = 10_000_000_000_000_000; // 0.01 ether

pub struct EthRpc {
    web3: Web3<Http>,
    chain_id: u64,
    account: Address,
    key: SecretKey,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl EthRpc {
    /// Connect to an EVM endpoint with a hex-encoded private key.
    pub fn connect(
        rpc_url: &str,
        chain_id: u64,
        private_key: &str,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, BridgeError> {
        let transport = Http::new(rpc_url)
            .map_err(|e| BridgeError::Config(format!("invalid RPC endpoint {}: {}", rpc_url, e)))?;
        let key_bytes = hex::decode(private_key.trim_start_matches("0x"))
            .map_err(|_| BridgeError::Config("private key is not valid hex".into()))?;
        let key = SecretKey::from_slice(&key_bytes)
            .map_err(|e| BridgeError::Config(format!("invalid private key: {}", e)))?;
        let account = derive_address(&key);
        Ok(Self {
            web3: Web3::new(transport),
            chain_id,
            account,
            key,
            confirmation_timeout: timeouts.confirmation_timeout(),
            poll_interval: timeouts.poll_interval(),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// Read-only contract call. Execution reverts map to `Submission`,
    /// everything else to `Transport`.
    pub async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, BridgeError> {
        let request = CallRequest {
            to: Some(to),
            data: Some(Bytes(data)),
            ..Default::default()
        };
        let response = self
            .web3
            .eth()
            .call(request, None)
            .await
            .map_err(map_web3_error)?;
        Ok(response.0)
    }

    /// Sign and submit a contract transaction, then wait for its receipt.
    pub async fn submit(
        &self,
        to: Address,
        data: Vec<u8>,
        value: U256,
        gas: u64,
    ) -> Result<TransactionReceipt, BridgeError> {
        let nonce = self
            .web3
            .eth()
            .transaction_count(self.account, Some(BlockNumber::Pending))
            .await
            .map_err(map_web3_error)?;
        let gas_price = self.web3.eth().gas_price().await.map_err(map_web3_error)?;
        let params = TransactionParameters {
            nonce: Some(nonce),
            to: Some(to),
            gas: U256::from(gas),
            gas_price: Some(gas_price),
            value,
            data: Bytes(data),
            chain_id: Some(self.chain_id),
            ..Default::default()
        };
        let signed = self
            .web3
            .accounts()
            .sign_transaction(params, &self.key)
            .await
            .map_err(map_web3_error)?;
        let tx_hash = self
            .web3
            .eth()
            .send_raw_transaction(signed.raw_transaction)
            .await
            .map_err(map_web3_error)?;
        debug!(chain_id = self.chain_id, tx = %format!("{:#x}", tx_hash), "transaction submitted");
        self.wait_for_receipt(tx_hash).await
    }

    /// Current gas price on this chain.
    pub async fn gas_price(&self) -> Result<U256, BridgeError> {
        self.web3.eth().gas_price().await.map_err(map_web3_error)
    }

    /// Poll for a transaction receipt until the confirmation deadline.
    /// Abandoning the wait does not cancel the transaction itself.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<TransactionReceipt, BridgeError> {
        let deadline = Instant::now() + self.confirmation_timeout;
        loop {
            match self.web3.eth().transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    if receipt.status == Some(U64::from(1u64)) {
                        return Ok(receipt);
                    }
                    return Err(BridgeError::Submission(format!(
                        "transaction {:#x} reverted",
                        tx_hash
                    )));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(tx = %format!("{:#x}", tx_hash), error = %e, "receipt poll failed");
                }
            }
            if Instant::now() >= deadline {
                return Err(BridgeError::Transport(format!(
                    "transaction {:#x} not confirmed within {:?}",
                    tx_hash, self.confirmation_timeout
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// 4-byte function selector for a canonical signature string.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak_hash::keccak(signature.as_bytes());
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&digest.as_bytes()[..4]);
    sel
}

/// Selector plus ABI-encoded arguments.
pub fn call_data(signature: &str, params: &[Token]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&ethabi::encode(params));
    data
}

/// Uncompressed-pubkey keccak address derivation.
pub fn derive_address(key: &SecretKey) -> Address {
    let secp = Secp256k1::new();
    let public_key = PublicKey::from_secret_key(&secp, key);
    let uncompressed = public_key.serialize_uncompressed();
    let digest = keccak_hash::keccak(&uncompressed[1..]);
    Address::from_slice(&digest.as_bytes()[12..])
}

fn map_web3_error(error: web3::Error) -> BridgeError {
    match error {
        web3::Error::Rpc(rpc) => BridgeError::Submission(rpc.message),
        other => BridgeError::Transport(other.to_string()),
    }
}
