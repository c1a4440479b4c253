//! Round-robin rotation across funding identities.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

use crate::blockchain::transaction::Transfer;
use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Round-robin selector over independent transfer paths.
/// Stores an internal counter to rotate through them.
pub struct RoundRobin {
    builders: Vec<Arc<dyn Transfer>>,
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new(builders: Vec<Arc<dyn Transfer>>) -> BlockchainResult<Self> {
        if builders.is_empty() {
            return Err(BlockchainError::NoSigningKeys);
        }
        Ok(Self { builders, counter: AtomicUsize::new(0) })
    }

    fn next_builder(&self) -> &Arc<dyn Transfer> {
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % self.builders.len();
        &self.builders[index]
    }

    /// Sender the next transfer will probably use. Approximate under concurrency.
    pub fn sender_at_current(&self) -> Address {
        let index = self.counter.load(Ordering::Relaxed) % self.builders.len();
        self.builders[index].sender()
    }

    /// Every address in rotation, in order.
    pub fn senders(&self) -> Vec<Address> {
        self.builders.iter().map(|b| b.sender()).collect()
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

#[async_trait]
impl Transfer for RoundRobin {
    fn sender(&self) -> Address {
        self.sender_at_current()
    }

    async fn transfer(&self, to: Address, value: U256, deadline: Instant) -> BlockchainResult<TxHash> {
        self.next_builder().transfer(to, value, deadline).await
    }
}

impl std::fmt::Debug for RoundRobin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundRobin")
            .field("senders", &self.senders())
            .field("counter", &self.counter.load(Ordering::Relaxed))
            .finish()
    }
}
