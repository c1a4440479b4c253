//! Shared utilities for integration testing.

#![allow(dead_code)]

use alloy::primitives::{keccak256, Address, TxHash, U256};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use eth_faucet::blockchain::rpc::LedgerRpc;
use eth_faucet::blockchain::types::{BlockchainError, BlockchainResult, ChainId};
use eth_faucet::blockchain::wallet::{parse_signer, NonceRefreshPolicy};
use eth_faucet::blockchain::TxBuilder;
use eth_faucet::dispatch::Dispatcher;
use eth_faucet::http::HttpServer;
use eth_faucet::lifecycle::Shutdown;
use eth_faucet::security::ClaimLimiter;
use eth_faucet::Faucet;

pub const CHAIN_ID: ChainId = ChainId(31337);

/// Valid secp256k1 test keys. Never funded anywhere.
pub const TEST_KEYS: [&str; 3] = [
    "0x0000000000000000000000000000000000000000000000000000000000000001",
    "0x0000000000000000000000000000000000000000000000000000000000000002",
    "0x0000000000000000000000000000000000000000000000000000000000000003",
];

pub fn signer(index: usize) -> PrivateKeySigner {
    parse_signer(TEST_KEYS[index]).unwrap()
}

/// Distinct, checksummed-compatible recipient addresses.
pub fn recipient(n: u8) -> Address {
    Address::repeat_byte(n)
}

/// In-memory ledger.
pub struct MockLedger {
    pub nonce: AtomicU64,
    pub nonce_calls: AtomicUsize,
    pub base_fee: Mutex<Option<u128>>,
    pub send_error: Mutex<Option<String>>,
    /// When set, each submission waits for one permit.
    pub hold: Option<Semaphore>,
    pub sent: Mutex<Vec<Vec<u8>>>,
}

impl MockLedger {
    pub fn new(nonce: u64) -> Self {
        Self {
            nonce: AtomicU64::new(nonce),
            nonce_calls: AtomicUsize::new(0),
            base_fee: Mutex::new(Some(7_000_000_000)),
            send_error: Mutex::new(None),
            hold: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Submissions block until `release` is called.
    pub fn held(nonce: u64) -> Self {
        Self { hold: Some(Semaphore::new(0)), ..Self::new(nonce) }
    }

    pub fn release(&self, n: usize) {
        if let Some(hold) = &self.hold {
            hold.add_permits(n);
        }
    }

    pub fn fail_with(&self, msg: Option<&str>) {
        *self.send_error.lock().unwrap() = msg.map(str::to_string);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn chain_id(&self) -> BlockchainResult<ChainId> {
        Ok(CHAIN_ID)
    }

    async fn pending_nonce(&self, _address: Address) -> BlockchainResult<u64> {
        self.nonce_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.nonce.load(Ordering::SeqCst))
    }

    async fn latest_base_fee(&self) -> BlockchainResult<Option<u128>> {
        Ok(*self.base_fee.lock().unwrap())
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        Ok(2_000_000_000)
    }

    async fn max_priority_fee(&self) -> BlockchainResult<u128> {
        Ok(1_000_000_000)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        if let Some(hold) = &self.hold {
            hold.acquire().await.unwrap().forget();
        }
        if let Some(msg) = self.send_error.lock().unwrap().clone() {
            return Err(BlockchainError::Submission(msg));
        }
        self.sent.lock().unwrap().push(raw.to_vec());
        Ok(keccak256(raw))
    }

    async fn balance(&self, _address: Address) -> BlockchainResult<U256> {
        Ok(U256::ZERO)
    }
}

pub async fn builder(ledger: Arc<MockLedger>, key_index: usize) -> Arc<TxBuilder> {
    Arc::new(
        TxBuilder::connect(ledger, signer(key_index), CHAIN_ID, NonceRefreshPolicy::never())
            .await
            .unwrap(),
    )
}

/// Faucet paying 1 ether per claim from a single builder.
pub fn faucet_with(builder: Arc<TxBuilder>, queue_capacity: usize, cooldown: Duration) -> Arc<Faucet> {
    let dispatcher = Arc::new(Dispatcher::new(
        builder,
        U256::from(10).pow(U256::from(18)),
        queue_capacity,
        Duration::from_secs(5),
    ));
    let limiter = Arc::new(ClaimLimiter::new(cooldown));
    Arc::new(Faucet::new(dispatcher, limiter, "devnet", "ETH"))
}

/// Serve `faucet` on an ephemeral port. Returns the base URL.
pub async fn spawn_server(faucet: Arc<Faucet>, proxy_count: usize, shutdown: &Shutdown) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let server = HttpServer::new(faucet, proxy_count, Duration::from_secs(5));
    tokio::spawn(server.run(listener, shutdown.wait()));
    format!("http://{}", addr)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Poll `condition` until it holds or the timeout expires.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(timeout, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
