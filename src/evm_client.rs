//! EVM spoke adapter
//!
//! Talks to a connected NFT contract on one EVM chain. Also hosts the
//! ERC-721 read/submit helpers shared with the hub client, since the hub is
//! itself an EVM environment.

use ethereum_types::{Address, H256, U256};
use tracing::{debug, warn};
use web3::ethabi::{ParamType, Token};
use web3::types::TransactionReceipt;

use crate::adapter::{ChainAdapter, Ledger};
use crate::config::{EvmChainConfig, TimeoutConfig};
use crate::error::BridgeError;
use crate::eth_rpc::{call_data, EthRpc, CROSS_CHAIN_FEE_WEI, CROSS_CHAIN_GAS_LIMIT, DEFAULT_GAS_LIMIT};
use crate::evm_codec::{decode_tuple, take_address, take_string};
use crate::types::{
    LedgerPresence, NftMetadata, TokenRecord, TransferResult, UniversalTokenId,
    DEFAULT_ROYALTY_BPS,
};

pub struct EvmClient {
    rpc: EthRpc,
    chain_id: u64,
    nft_contract: Address,
}

impl EvmClient {
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

    pub fn signer_address(&self) -> Address {
        self.rpc.account()
    }
}

#[async_trait::async_trait]
impl ChainAdapter for EvmClient {
    fn ledger(&self) -> Ledger {
        Ledger::EvmSpoke(self.chain_id)
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
        Ok(record.map(|record| LedgerPresence::EvmSpoke {
            chain_id: self.chain_id,
            owner: record.owner,
            uri: record.uri,
            creator: record.creator,
        }))
    }

    async fn token_record(
        &self,
        token_id: UniversalTokenId,
    ) -> Result<Option<TokenRecord>, BridgeError> {
        fetch_token_record(&self.rpc, self.nft_contract, token_id, false).await
    }

    async fn gas_price(&self) -> Result<U256, BridgeError> {
        self.rpc.gas_price().await
    }
}

/// Read one token's record from an ERC-721-style contract. A revert on any
/// of the per-token views means the token is not on this ledger.
pub(crate) async fn fetch_token_record(
    rpc: &EthRpc,
    contract: Address,
    token_id: UniversalTokenId,
    with_collection: bool,
) -> Result<Option<TokenRecord>, BridgeError> {
    let id = Token::Uint(U256::from(token_id));

    let owner = match rpc
        .call(contract, call_data("ownerOf(uint256)", &[id.clone()]))
        .await
    {
        Ok(bytes) => decode_address_return(&bytes)?,
        Err(BridgeError::Submission(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    let uri = match rpc
        .call(contract, call_data("tokenURI(uint256)", &[id.clone()]))
        .await
    {
        Ok(bytes) => decode_string_return(&bytes)?,
        Err(BridgeError::Submission(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    let creator = match rpc
        .call(contract, call_data("getCreator(uint256)", &[id]))
        .await
    {
        Ok(bytes) => decode_address_return(&bytes)?,
        Err(BridgeError::Submission(_)) => return Ok(None),
        Err(e) => return Err(e),
    };

    // collection name/symbol are best-effort extras
    let (name, symbol) = if with_collection {
        let name = rpc
            .call(contract, call_data("name()", &[]))
            .await
            .ok()
            .and_then(|bytes| decode_string_return(&bytes).ok());
        let symbol = rpc
            .call(contract, call_data("symbol()", &[]))
            .await
            .ok()
            .and_then(|bytes| decode_string_return(&bytes).ok());
        (name, symbol)
    } else {
        (None, None)
    };

    Ok(Some(TokenRecord {
        token_id,
        owner,
        uri,
        creator,
        royalty_bps: DEFAULT_ROYALTY_BPS,
        name,
        symbol,
    }))
}

pub(crate) async fn submit_safe_mint(
    rpc: &EthRpc,
    contract: Address,
    to: &str,
    metadata: &NftMetadata,
) -> TransferResult {
    let to: Address = match to.trim_start_matches("0x").parse() {
        Ok(address) => address,
        Err(_) => {
            warn!(chain_id = rpc.chain_id(), to, "mint recipient is not a valid EVM address");
            return TransferResult::failed();
        }
    };
    let uri = metadata.metadata_uri();
    let data = call_data(
        "safeMint(address,string)",
        &[Token::Address(to), Token::String(uri)],
    );
    match rpc.submit(contract, data, U256::zero(), DEFAULT_GAS_LIMIT).await {
        Ok(receipt) => {
            let token_id = minted_token_id(&receipt);
            debug!(chain_id = rpc.chain_id(), ?token_id, "mint confirmed");
            TransferResult::success(format!("{:#x}", receipt.transaction_hash), token_id)
        }
        Err(e) => {
            warn!(chain_id = rpc.chain_id(), error = %e, "mint failed");
            TransferResult::failed()
        }
    }
}

pub(crate) async fn submit_transfer_cross_chain(
    rpc: &EthRpc,
    contract: Address,
    token_id: UniversalTokenId,
    receiver: Vec<u8>,
    destination: Address,
) -> TransferResult {
    let data = call_data(
        "transferCrossChain(uint256,bytes,address)",
        &[
            Token::Uint(U256::from(token_id)),
            Token::Bytes(receiver),
            Token::Address(destination),
        ],
    );
    match rpc
        .submit(
            contract,
            data,
            U256::from(CROSS_CHAIN_FEE_WEI),
            CROSS_CHAIN_GAS_LIMIT,
        )
        .await
    {
        Ok(receipt) => {
            debug!(chain_id = rpc.chain_id(), token_id, "cross-chain transfer accepted at source");
            TransferResult::pending(format!("{:#x}", receipt.transaction_hash), Some(token_id))
        }
        Err(e) => {
            warn!(chain_id = rpc.chain_id(), token_id, error = %e, "cross-chain transfer failed");
            TransferResult::failed()
        }
    }
}

/// Token id from the ERC-721 `Transfer(address,address,uint256)` mint event
/// (zero `from` topic).
pub(crate) fn minted_token_id(receipt: &TransactionReceipt) -> Option<UniversalTokenId> {
    let transfer_topic: H256 =
        keccak_hash::keccak("Transfer(address,address,uint256)".as_bytes());
    receipt.logs.iter().find_map(|log| {
        if log.topics.len() == 4
            && log.topics[0] == transfer_topic
            && log.topics[1] == H256::zero()
        {
            let id = U256::from_big_endian(log.topics[3].as_bytes());
            if id <= U256::from(u64::MAX) {
                return Some(id.as_u64());
            }
        }
        None
    })
}

fn decode_address_return(data: &[u8]) -> Result<Address, BridgeError> {
    let tokens = decode_tuple(&[ParamType::Address], data, "address return")?;
    take_address(tokens.into_iter().next(), "return value")
}

fn decode_string_return(data: &[u8]) -> Result<String, BridgeError> {
    let tokens = decode_tuple(&[ParamType::String], data, "string return")?;
    take_string(tokens.into_iter().next(), "return value")
}
