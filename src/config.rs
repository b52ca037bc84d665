//! Startup configuration with validation
//!
//! The chain-id-to-ZRC-20 table and every endpoint are injected here at
//! process start; nothing chain-specific is compiled in.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ethereum_types::Address;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

use crate::error::BridgeError;

/// Top-level bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Hub chain (canonical token records, cross-chain relay).
    pub hub: EvmChainConfig,

    /// EVM-compatible spoke chains.
    #[serde(default)]
    pub evm_spokes: Vec<EvmChainConfig>,

    /// Account-model spoke chain.
    pub solana: SolanaChainConfig,

    /// Chain id to ZRC-20 gas-token address (hex) for every reachable
    /// destination, including the Solana spoke's id. Keys are decimal chain
    /// ids as strings; TOML tables cannot carry integer keys.
    pub zrc20_gas_tokens: HashMap<String, String>,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmChainConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    /// Cross-chain gateway contract.
    pub gateway_address: String,
    /// Universal (hub) or connected (spoke) NFT contract.
    pub nft_contract: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaChainConfig {
    /// Chain id the hub uses to address this spoke.
    pub chain_id: u64,
    pub rpc_url: String,
    pub program_id: String,
    /// Gateway authority account the program expects on cross-chain calls.
    pub gateway_authority: String,
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Per-adapter budget for a single query during fan-out.
    pub query_timeout_ms: u64,
    /// How long to wait for a submitted transaction to confirm locally.
    pub confirmation_timeout_ms: u64,
    /// Receipt/monitor polling interval.
    pub poll_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 5_000,
            confirmation_timeout_ms: 60_000,
            poll_interval_ms: 1_000,
        }
    }
}

impl TimeoutConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl BridgeConfig {
    /// Load and validate a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BridgeError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| BridgeError::Config(format!("cannot read config file: {}", e)))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| BridgeError::Config(format!("cannot parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate addresses, ids, and cross-references.
    pub fn validate(&self) -> Result<(), BridgeError> {
        self.hub.validate("hub")?;
        let mut seen = vec![self.hub.chain_id];
        for spoke in &self.evm_spokes {
            spoke.validate("evm_spokes")?;
            if seen.contains(&spoke.chain_id) {
                return Err(BridgeError::Config(format!(
                    "duplicate chain id {}",
                    spoke.chain_id
                )));
            }
            seen.push(spoke.chain_id);
        }
        if self.solana.chain_id == 0 {
            return Err(BridgeError::Config("solana.chain_id must be non-zero".into()));
        }
        if seen.contains(&self.solana.chain_id) {
            return Err(BridgeError::Config(format!(
                "duplicate chain id {}",
                self.solana.chain_id
            )));
        }
        self.solana_program_id()?;
        self.solana_gateway_authority()?;
        let table = self.gas_token_table()?;
        if !table.contains_key(&self.solana.chain_id) {
            return Err(BridgeError::Config(format!(
                "no ZRC-20 entry for solana chain id {}",
                self.solana.chain_id
            )));
        }
        Ok(())
    }

    /// Parsed chain-id-to-ZRC-20 address table.
    pub fn gas_token_table(&self) -> Result<HashMap<u64, Address>, BridgeError> {
        let mut table = HashMap::with_capacity(self.zrc20_gas_tokens.len());
        for (raw_id, raw_address) in &self.zrc20_gas_tokens {
            let chain_id: u64 = raw_id
                .parse()
                .map_err(|_| BridgeError::Config(format!("invalid chain id key {}", raw_id)))?;
            if chain_id == 0 {
                return Err(BridgeError::Config(
                    "chain id 0 is reserved as the unresolved sentinel".into(),
                ));
            }
            let address = parse_eth_address(raw_address).map_err(|_| {
                BridgeError::Config(format!("invalid ZRC-20 address {}", raw_address))
            })?;
            table.insert(chain_id, address);
        }
        Ok(table)
    }

    pub fn solana_program_id(&self) -> Result<Pubkey, BridgeError> {
        parse_pubkey(&self.solana.program_id)
    }

    pub fn solana_gateway_authority(&self) -> Result<Pubkey, BridgeError> {
        parse_pubkey(&self.solana.gateway_authority)
    }

    pub fn solana_commitment(&self) -> CommitmentConfig {
        match self.solana.commitment.as_str() {
            "processed" => CommitmentConfig::processed(),
            "finalized" => CommitmentConfig::finalized(),
            _ => CommitmentConfig::confirmed(),
        }
    }
}

impl EvmChainConfig {
    fn validate(&self, section: &str) -> Result<(), BridgeError> {
        if self.chain_id == 0 {
            return Err(BridgeError::Config(format!(
                "{}: chain_id must be non-zero",
                section
            )));
        }
        if self.rpc_url.is_empty() {
            return Err(BridgeError::Config(format!("{}: rpc_url is empty", section)));
        }
        parse_eth_address(&self.gateway_address).map_err(|_| {
            BridgeError::Config(format!("{}: invalid gateway address", section))
        })?;
        parse_eth_address(&self.nft_contract)
            .map_err(|_| BridgeError::Config(format!("{}: invalid NFT contract", section)))?;
        Ok(())
    }

    pub fn nft_contract_address(&self) -> Result<Address, BridgeError> {
        parse_eth_address(&self.nft_contract)
    }

    pub fn gateway(&self) -> Result<Address, BridgeError> {
        parse_eth_address(&self.gateway_address)
    }
}

/// Parse a 20-byte hex address, with or without the `0x` prefix.
pub fn parse_eth_address(raw: &str) -> Result<Address, BridgeError> {
    Address::from_str(raw.trim_start_matches("0x"))
        .map_err(|_| BridgeError::Config(format!("invalid EVM address: {}", raw)))
}

/// Parse a base58 Solana public key.
pub fn parse_pubkey(raw: &str) -> Result<Pubkey, BridgeError> {
    Pubkey::from_str(raw).map_err(|_| BridgeError::Config(format!("invalid public key: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_config() -> BridgeConfig {
        BridgeConfig {
            hub: EvmChainConfig {
                chain_id: 7000,
                rpc_url: "http://localhost:8545".to_string(),
                gateway_address: "0x0000000000000000000000000000000000000001".to_string(),
                nft_contract: "0x0000000000000000000000000000000000000002".to_string(),
            },
            evm_spokes: vec![EvmChainConfig {
                chain_id: 11155111,
                rpc_url: "http://localhost:8546".to_string(),
                gateway_address: "0x0000000000000000000000000000000000000003".to_string(),
                nft_contract: "0x0000000000000000000000000000000000000004".to_string(),
            }],
            solana: SolanaChainConfig {
                chain_id: 901,
                rpc_url: "http://localhost:8899".to_string(),
                program_id: Pubkey::new_unique().to_string(),
                gateway_authority: Pubkey::new_unique().to_string(),
                commitment: "confirmed".to_string(),
            },
            zrc20_gas_tokens: HashMap::from([
                (
                    "11155111".to_string(),
                    "0x65a45c57636f9BcCeD4fe193A602008578BcA90b".to_string(),
                ),
                (
                    "901".to_string(),
                    "0x1234567890123456789012345678901234567890".to_string(),
                ),
            ]),
            timeouts: TimeoutConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        sample_config().validate().unwrap();
    }

    #[test]
    fn duplicate_chain_id_rejected() {
        let mut config = sample_config();
        config.evm_spokes[0].chain_id = config.hub.chain_id;
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn missing_solana_zrc20_rejected() {
        let mut config = sample_config();
        config
            .zrc20_gas_tokens
            .remove(&config.solana.chain_id.to_string());
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn bad_zrc20_address_rejected() {
        let mut config = sample_config();
        config
            .zrc20_gas_tokens
            .insert("137".to_string(), "not-an-address".to_string());
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn loads_from_toml_file() {
        let config = sample_config();
        let raw = toml::to_string(&config).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(raw.as_bytes()).unwrap();
        let loaded = BridgeConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded.hub.chain_id, 7000);
        assert_eq!(loaded.evm_spokes.len(), 1);
        assert_eq!(loaded.timeouts.query_timeout(), Duration::from_millis(5_000));
    }

    #[test]
    fn address_parsing_accepts_prefixed_and_bare() {
        let with_prefix = parse_eth_address("0x65a45c57636f9BcCeD4fe193A602008578BcA90b").unwrap();
        let bare = parse_eth_address("65a45c57636f9BcCeD4fe193A602008578BcA90b").unwrap();
        assert_eq!(with_prefix, bare);
        assert!(parse_eth_address("0x123").is_err());
    }
}
