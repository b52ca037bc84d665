//! Chain id to ZRC-20 address registry, and back
//!
//! Built once at startup from injected configuration. Lookups never fail:
//! unknown addresses resolve to the chain-id sentinel `0`, unknown chain ids
//! to the zero address. Callers must treat both sentinels as "unresolved".

use std::collections::HashMap;

use ethereum_types::Address;

use crate::config::BridgeConfig;
use crate::error::BridgeError;

/// Sentinel returned for addresses that map to no registered chain.
pub const UNRESOLVED_CHAIN_ID: u64 = 0;

#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    by_chain_id: HashMap<u64, Address>,
    by_address: HashMap<Address, u64>,
}

impl ChainRegistry {
    /// Build the registry from the configured gas-token table.
    pub fn from_config(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let mut registry = Self::default();
        for (chain_id, address) in config.gas_token_table()? {
            registry.register(chain_id, address)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, chain_id: u64, address: Address) -> Result<(), BridgeError> {
        if chain_id == UNRESOLVED_CHAIN_ID {
            return Err(BridgeError::Config(
                "chain id 0 is reserved as the unresolved sentinel".into(),
            ));
        }
        if address.is_zero() {
            return Err(BridgeError::Config(
                "the zero address is reserved as the unresolved sentinel".into(),
            ));
        }
        // keep the two maps inverse: displace stale entries on both sides
        if let Some(previous_address) = self.by_chain_id.insert(chain_id, address) {
            if previous_address != address {
                self.by_address.remove(&previous_address);
            }
        }
        if let Some(previous_id) = self.by_address.insert(address, chain_id) {
            if previous_id != chain_id {
                self.by_chain_id.remove(&previous_id);
            }
        }
        Ok(())
    }

    /// Chain id for a ZRC-20 address; [`UNRESOLVED_CHAIN_ID`] when unknown.
    pub fn extract_chain_id(&self, token_address: Address) -> u64 {
        self.by_address
            .get(&token_address)
            .copied()
            .unwrap_or(UNRESOLVED_CHAIN_ID)
    }

    /// ZRC-20 address for a destination chain id; the zero address when the
    /// chain is not registered. Validation of the sentinel is deferred to the
    /// receiving side, so mutating callers should check [`is_registered`]
    /// first.
    ///
    /// [`is_registered`]: Self::is_registered
    pub fn encode_destination(&self, chain_id: u64) -> Address {
        self.by_chain_id
            .get(&chain_id)
            .copied()
            .unwrap_or_else(Address::zero)
    }

    pub fn is_registered(&self, chain_id: u64) -> bool {
        self.by_chain_id.contains_key(&chain_id)
    }

    pub fn registered_chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.by_chain_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
