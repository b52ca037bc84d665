//! End-to-end orchestrator flows over mock ledger adapters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ethereum_types::Address;
use solana_sdk::pubkey::Pubkey;

use universal_nft_sdk::adapter::{ChainAdapter, Ledger};
use universal_nft_sdk::chain_registry::ChainRegistry;
use universal_nft_sdk::config::TimeoutConfig;
use universal_nft_sdk::error::BridgeError;
use universal_nft_sdk::pda::PdaGenerator;
use universal_nft_sdk::solana_codec::{decode_withdraw_and_call_payload, CrossChainInstruction};
use universal_nft_sdk::types::{
    LedgerPresence, NftMetadata, TokenRecord, TransferResult, UniversalTokenId,
};
use universal_nft_sdk::{TransferStage, UniversalNftSdk};

const HUB_CHAIN: u64 = 7000;
const EVM_SPOKE_CHAIN: u64 = 97;
const SOLANA_CHAIN: u64 = 901;

/// Scriptable in-memory ledger.
struct MockAdapter {
    ledger: Ledger,
    presence: Mutex<Option<LedgerPresence>>,
    record: Option<TokenRecord>,
    query_delay: Option<Duration>,
    fail_queries: bool,
    network_calls: AtomicUsize,
    last_transfer: Mutex<Option<(UniversalTokenId, Vec<u8>, Address)>>,
}

impl MockAdapter {
    fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            presence: Mutex::new(None),
            record: None,
            query_delay: None,
            fail_queries: false,
            network_calls: AtomicUsize::new(0),
            last_transfer: Mutex::new(None),
        }
    }

    fn with_presence(mut self, presence: LedgerPresence) -> Self {
        self.presence = Mutex::new(Some(presence));
        self
    }

    fn with_record(mut self, record: TokenRecord) -> Self {
        self.record = Some(record);
        self
    }

    fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }

    fn failing(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    fn network_calls(&self) -> usize {
        self.network_calls.load(Ordering::SeqCst)
    }

    fn last_transfer(&self) -> Option<(UniversalTokenId, Vec<u8>, Address)> {
        self.last_transfer.lock().unwrap().clone()
    }

    fn set_presence(&self, presence: LedgerPresence) {
        *self.presence.lock().unwrap() = Some(presence);
    }
}

#[async_trait]
impl ChainAdapter for MockAdapter {
    fn ledger(&self) -> Ledger {
        self.ledger
    }

    async fn mint(&self, _to: &str, _metadata: &NftMetadata) -> TransferResult {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        TransferResult::success("0xmint".to_string(), Some(7))
    }

    async fn transfer_out(
        &self,
        token_id: UniversalTokenId,
        receiver: Vec<u8>,
        destination: Address,
    ) -> TransferResult {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_transfer.lock().unwrap() = Some((token_id, receiver, destination));
        TransferResult::pending("0xtransfer".to_string(), Some(token_id))
    }

    async fn query(
        &self,
        _token_id: UniversalTokenId,
    ) -> Result<Option<LedgerPresence>, BridgeError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.query_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_queries {
            return Err(BridgeError::Transport("connection refused".to_string()));
        }
        Ok(self.presence.lock().unwrap().clone())
    }

    async fn token_record(
        &self,
        _token_id: UniversalTokenId,
    ) -> Result<Option<TokenRecord>, BridgeError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.record.clone())
    }
}

struct Harness {
    sdk: UniversalNftSdk,
    hub: Arc<MockAdapter>,
    spoke: Arc<MockAdapter>,
    solana: Arc<MockAdapter>,
    program_id: Pubkey,
    solana_zrc20: Address,
}

fn registry() -> ChainRegistry {
    let mut registry = ChainRegistry::default();
    registry
        .register(EVM_SPOKE_CHAIN, Address::repeat_byte(0x61))
        .unwrap();
    registry
        .register(SOLANA_CHAIN, Address::repeat_byte(0x50))
        .unwrap();
    registry
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn harness(hub: MockAdapter, spoke: MockAdapter, solana: MockAdapter) -> Harness {
    init_tracing();
    let hub = Arc::new(hub);
    let spoke = Arc::new(spoke);
    let solana = Arc::new(solana);
    let program_id = Pubkey::new_unique();
    let mut evm_spokes: HashMap<u64, Arc<dyn ChainAdapter>> = HashMap::new();
    evm_spokes.insert(EVM_SPOKE_CHAIN, spoke.clone());
    let sdk = UniversalNftSdk::with_adapters(
        hub.clone(),
        evm_spokes,
        solana.clone(),
        registry(),
        program_id,
        Pubkey::new_unique(),
        HUB_CHAIN,
        SOLANA_CHAIN,
        TimeoutConfig {
            query_timeout_ms: 100,
            confirmation_timeout_ms: 500,
            poll_interval_ms: 10,
        },
    );
    Harness {
        sdk,
        hub,
        spoke,
        solana,
        program_id,
        solana_zrc20: Address::repeat_byte(0x50),
    }
}

fn hub_presence() -> LedgerPresence {
    LedgerPresence::Hub {
        owner: Address::repeat_byte(0x0A),
        uri: "ipfs://QmHubToken".to_string(),
        creator: Address::repeat_byte(0x0B),
    }
}

fn hub_record(token_id: UniversalTokenId) -> TokenRecord {
    TokenRecord {
        token_id,
        owner: Address::repeat_byte(0x0A),
        uri: "ipfs://QmHubToken".to_string(),
        creator: Address::repeat_byte(0x0B),
        royalty_bps: 250,
        name: None,
        symbol: None,
    }
}

fn metadata() -> NftMetadata {
    NftMetadata {
        name: "Universal NFT".to_string(),
        symbol: "UNFT".to_string(),
        description: "cross-chain test token".to_string(),
        image: "ipfs://QmImage".to_string(),
        attributes: vec![],
    }
}

#[tokio::test]
async fn mint_then_query_shows_hub_only_presence() {
    let h = harness(
        MockAdapter::new(Ledger::Hub),
        MockAdapter::new(Ledger::EvmSpoke(EVM_SPOKE_CHAIN)),
        MockAdapter::new(Ledger::SolanaSpoke),
    );

    let minted = h.sdk.mint_on_hub("0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a", &metadata()).await;
    assert!(!minted.is_failed());
    let token_id = minted.token_id.unwrap();
    h.hub.set_presence(hub_presence());

    let result = h.sdk.query_nft(token_id).await;
    assert!(result.is_steady_state());
    assert!(result.hub().is_some());
    assert!(result.evm_spoke(EVM_SPOKE_CHAIN).is_none());
    assert!(result.solana_spoke().is_none());
}

#[tokio::test]
async fn query_fan_out_tolerates_unreachable_ledgers() {
    let h = harness(
        MockAdapter::new(Ledger::Hub).with_presence(hub_presence()),
        // answers far beyond the per-adapter budget
        MockAdapter::new(Ledger::EvmSpoke(EVM_SPOKE_CHAIN))
            .with_query_delay(Duration::from_millis(400)),
        MockAdapter::new(Ledger::SolanaSpoke).with_presence(LedgerPresence::SolanaSpoke {
            state_address: Pubkey::new_unique(),
            owner: Some(Pubkey::new_unique()),
            mint: Some(Pubkey::new_unique()),
            uri: Some("ipfs://QmHubToken".to_string()),
        }),
    );

    let started = std::time::Instant::now();
    let result = h.sdk.query_nft(7).await;

    // the unreachable spoke is simply absent from the aggregate
    assert_eq!(result.entries.len(), 2);
    assert!(result.hub().is_some());
    assert!(result.solana_spoke().is_some());
    assert!(result.evm_spoke(EVM_SPOKE_CHAIN).is_none());
    // the slow spoke was cut off at its budget, not awaited to completion
    assert!(started.elapsed() < Duration::from_millis(350));
    assert_eq!(h.spoke.network_calls(), 1);
}

#[tokio::test]
async fn query_fan_out_swallows_transport_errors() {
    let h = harness(
        MockAdapter::new(Ledger::Hub).with_presence(hub_presence()),
        MockAdapter::new(Ledger::EvmSpoke(EVM_SPOKE_CHAIN)),
        MockAdapter::new(Ledger::SolanaSpoke).failing(),
    );

    let result = h.sdk.query_nft(7).await;
    assert_eq!(result.entries.len(), 1);
    assert!(result.hub().is_some());
    assert_eq!(h.solana.network_calls(), 1);
}

#[tokio::test]
async fn transfer_from_solana_rejects_unknown_destination_before_any_network_call() {
    let h = harness(
        MockAdapter::new(Ledger::Hub),
        MockAdapter::new(Ledger::EvmSpoke(EVM_SPOKE_CHAIN)),
        MockAdapter::new(Ledger::SolanaSpoke),
    );

    let err = h
        .sdk
        .transfer_from_solana(7, 424242, Address::repeat_byte(0x0C))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedDestination(424242)));
    assert_eq!(h.solana.network_calls(), 0);
    assert_eq!(h.hub.network_calls(), 0);
}

#[tokio::test]
async fn transfer_from_solana_routes_through_registered_destination() {
    let h = harness(
        MockAdapter::new(Ledger::Hub),
        MockAdapter::new(Ledger::EvmSpoke(EVM_SPOKE_CHAIN)),
        MockAdapter::new(Ledger::SolanaSpoke),
    );

    let recipient = Address::repeat_byte(0x0C);
    let result = h
        .sdk
        .transfer_from_solana(7, EVM_SPOKE_CHAIN, recipient)
        .await
        .unwrap();
    assert!(!result.is_failed());

    let (token_id, receiver, destination) = h.solana.last_transfer().unwrap();
    assert_eq!(token_id, 7);
    assert_eq!(receiver, recipient.as_bytes());
    assert_eq!(destination, Address::repeat_byte(0x61));
}

#[tokio::test]
async fn transfer_to_solana_packs_a_decodable_withdraw_and_call_blob() {
    let token_id: UniversalTokenId = 7;
    let h = harness(
        MockAdapter::new(Ledger::Hub).with_record(hub_record(token_id)),
        MockAdapter::new(Ledger::EvmSpoke(EVM_SPOKE_CHAIN)),
        MockAdapter::new(Ledger::SolanaSpoke),
    );
    let recipient = Pubkey::new_unique();

    let result = h.sdk.transfer_to_solana(token_id, recipient).await.unwrap();
    assert!(!result.is_failed());

    let (sent_id, blob, destination) = h.hub.last_transfer().unwrap();
    assert_eq!(sent_id, token_id);
    assert_eq!(destination, h.solana_zrc20);

    let (accounts, instruction) = decode_withdraw_and_call_payload(&blob).unwrap();
    let pda = PdaGenerator::new(h.program_id);
    assert_eq!(accounts.len(), 11);
    assert_eq!(accounts[0].address, pda.program_state().0);
    assert_eq!(accounts[1].address, pda.nft_state(token_id).0);
    assert_eq!(accounts[2].address, pda.nft_mint(token_id).0);
    assert!(accounts[1].is_writable);
    assert!(!accounts[4].is_writable);

    let payload = match instruction {
        CrossChainInstruction::MintFromUniversal(payload) => payload,
        other => panic!("unexpected instruction {:?}", other),
    };
    assert_eq!(payload.token_id, token_id);
    assert_eq!(payload.recipient, recipient);
    assert_eq!(payload.uri, "ipfs://QmHubToken");
    // collection name/symbol fall back when the hub record lacks them
    assert_eq!(payload.name, "Universal NFT #7");
    assert_eq!(payload.symbol, "UNFT");
    assert_eq!(payload.creator, Address::repeat_byte(0x0B));
    assert_eq!(payload.royalty_bps, 250);

    // once the relay lands the mint, the spoke entry reports the same
    // derived state account the blob addressed
    let (nft_state, _) = pda.nft_state(token_id);
    h.solana.set_presence(LedgerPresence::SolanaSpoke {
        state_address: nft_state,
        owner: Some(recipient),
        mint: Some(pda.nft_mint(token_id).0),
        uri: Some("ipfs://QmHubToken".to_string()),
    });
    let queried = h.sdk.query_nft(token_id).await;
    match queried.solana_spoke() {
        Some(LedgerPresence::SolanaSpoke { state_address, .. }) => {
            assert_eq!(*state_address, nft_state);
        }
        other => panic!("expected a solana entry, got {:?}", other),
    }
}

#[tokio::test]
async fn transfer_to_solana_without_hub_record_fails_without_submitting() {
    let h = harness(
        MockAdapter::new(Ledger::Hub),
        MockAdapter::new(Ledger::EvmSpoke(EVM_SPOKE_CHAIN)),
        MockAdapter::new(Ledger::SolanaSpoke),
    );

    let result = h.sdk.transfer_to_solana(7, Pubkey::new_unique()).await.unwrap();
    assert!(result.is_failed());
    assert!(h.hub.last_transfer().is_none());
}

#[tokio::test]
async fn watch_transfer_completes_when_destination_reports_presence() {
    let token_id: UniversalTokenId = 7;
    let h = harness(
        MockAdapter::new(Ledger::Hub),
        MockAdapter::new(Ledger::EvmSpoke(EVM_SPOKE_CHAIN)),
        MockAdapter::new(Ledger::SolanaSpoke),
    );

    let monitor = h.sdk.watch_transfer(token_id, SOLANA_CHAIN).unwrap();
    // simulate the relay landing the mint a few polls in
    tokio::time::sleep(Duration::from_millis(25)).await;
    h.solana.set_presence(LedgerPresence::SolanaSpoke {
        state_address: Pubkey::new_unique(),
        owner: Some(Pubkey::new_unique()),
        mint: Some(Pubkey::new_unique()),
        uri: Some("ipfs://QmHubToken".to_string()),
    });

    assert_eq!(monitor.wait().await, TransferStage::Completed);
    assert!(h.solana.network_calls() >= 1);
}

#[tokio::test]
async fn supported_chains_echo_the_injected_registry() {
    let h = harness(
        MockAdapter::new(Ledger::Hub),
        MockAdapter::new(Ledger::EvmSpoke(EVM_SPOKE_CHAIN)),
        MockAdapter::new(Ledger::SolanaSpoke),
    );
    assert_eq!(h.sdk.supported_chains(), vec![EVM_SPOKE_CHAIN, SOLANA_CHAIN]);
}
