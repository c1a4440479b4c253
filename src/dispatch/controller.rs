//! Admission controller: fund immediately when idle, otherwise queue.

use alloy::primitives::{Address, TxHash, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::blockchain::transaction::Transfer;
use crate::dispatch::gate::DispatchGate;
use crate::dispatch::queue::ClaimQueue;
use crate::error::{ClaimError, ClaimResult};

/// How an accepted claim was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Sent synchronously; the hash of the broadcast transaction.
    Funded(TxHash),
    /// Accepted into the backlog at this 1-based position.
    Queued { position: usize },
}

pub struct Dispatcher {
    transfer: Arc<dyn Transfer>,
    queue: ClaimQueue,
    gate: DispatchGate,
    payout: U256,
    deadline: Duration,
}

impl Dispatcher {
    /// `deadline` bounds each individual transfer, queued or not.
    pub fn new(transfer: Arc<dyn Transfer>, payout: U256, queue_capacity: usize, deadline: Duration) -> Self {
        Self {
            transfer,
            queue: ClaimQueue::new(queue_capacity),
            gate: DispatchGate::new(),
            payout,
            deadline,
        }
    }

    /// Fund `recipient` now if nothing is pending, otherwise append to the backlog.
    pub async fn submit(&self, recipient: Address) -> ClaimResult<Dispatch> {
        // The backlog is checked while holding the gate; the drain only pops under it.
        if let Some(_permit) = self.gate.try_acquire().filter(|_| self.queue.is_empty()) {
            let tx_hash = self
                .transfer
                .transfer(recipient, self.payout, Instant::now() + self.deadline)
                .await?;
            tracing::info!(tx_hash = %tx_hash, address = %recipient, "Funded directly");
            return Ok(Dispatch::Funded(tx_hash));
        }

        match self.queue.try_enqueue(recipient) {
            Some(position) => {
                tracing::info!(address = %recipient, position, "Claim queued");
                Ok(Dispatch::Queued { position })
            }
            None => {
                tracing::warn!(capacity = self.queue.capacity(), "Claim queue full");
                Err(ClaimError::QueueFull)
            }
        }
    }

    /// Background task that empties the backlog one transfer at a time.
    pub fn spawn_drain(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = self.queue.wait_ready() => {}
                    _ = shutdown.recv() => break,
                }
                if self.queue.is_empty() {
                    continue;
                }
                let Some(_permit) = self.gate.acquire().await else {
                    break;
                };
                self.drain_backlog().await;
            }
            tracing::debug!(pending = self.queue.len(), "Dispatch drain stopped");
        })
    }

    async fn drain_backlog(&self) {
        while let Some(recipient) = self.queue.pop() {
            let deadline = Instant::now() + self.deadline;
            match self.transfer.transfer(recipient, self.payout, deadline).await {
                Ok(tx_hash) => {
                    tracing::info!(tx_hash = %tx_hash, address = %recipient, "Funded from queue");
                }
                Err(e) => {
                    tracing::error!(address = %recipient, error = %e, "Queued transfer failed");
                }
            }
        }
    }

    pub fn sender(&self) -> Address {
        self.transfer.sender()
    }

    pub fn payout(&self) -> U256 {
        self.payout
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn gate(&self) -> &DispatchGate {
        &self.gate
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sender", &self.transfer.sender())
            .field("payout", &self.payout)
            .field("queued", &self.queue.len())
            .field("gate_held", &self.gate.is_held())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{BlockchainError, BlockchainResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    /// Transfer that blocks until the test hands out a release permit.
    struct HeldTransfer {
        release: Semaphore,
        paid: Mutex<Vec<Address>>,
        started: AtomicUsize,
        fail: bool,
    }

    impl HeldTransfer {
        fn new(initial_permits: usize) -> Self {
            Self {
                release: Semaphore::new(initial_permits),
                paid: Mutex::new(Vec::new()),
                started: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Transfer for HeldTransfer {
        fn sender(&self) -> Address {
            Address::repeat_byte(0xfa)
        }

        async fn transfer(&self, to: Address, _value: U256, _deadline: Instant) -> BlockchainResult<TxHash> {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.release.acquire().await.unwrap().forget();
            if self.fail {
                return Err(BlockchainError::Submission("insufficient funds".into()));
            }
            let mut paid = self.paid.lock().unwrap();
            paid.push(to);
            Ok(TxHash::repeat_byte(paid.len() as u8))
        }
    }

    fn dispatcher(transfer: Arc<HeldTransfer>, capacity: usize) -> Arc<Dispatcher> {
        Arc::new(Dispatcher::new(transfer, U256::from(1), capacity, Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn test_idle_claim_is_funded_synchronously() {
        let transfer = Arc::new(HeldTransfer::new(10));
        let d = dispatcher(transfer.clone(), 2);

        let outcome = d.submit(Address::repeat_byte(1)).await.unwrap();
        assert_eq!(outcome, Dispatch::Funded(TxHash::repeat_byte(1)));
        assert!(!d.gate().is_held());
        assert_eq!(d.queue_len(), 0);
    }

    #[tokio::test]
    async fn test_backpressure_while_gate_held() {
        let transfer = Arc::new(HeldTransfer::new(0));
        let d = dispatcher(transfer.clone(), 2);

        let first = tokio::spawn({
            let d = d.clone();
            async move { d.submit(Address::repeat_byte(1)).await }
        });
        while !d.gate().is_held() {
            tokio::task::yield_now().await;
        }

        assert_eq!(d.submit(Address::repeat_byte(2)).await.unwrap(), Dispatch::Queued { position: 1 });
        assert_eq!(d.submit(Address::repeat_byte(3)).await.unwrap(), Dispatch::Queued { position: 2 });
        assert!(matches!(d.submit(Address::repeat_byte(4)).await, Err(ClaimError::QueueFull)));

        transfer.release.add_permits(1);
        assert!(matches!(first.await.unwrap().unwrap(), Dispatch::Funded(_)));
        assert_eq!(d.queue_len(), 2);
    }

    #[tokio::test]
    async fn test_non_empty_queue_forces_queueing() {
        let transfer = Arc::new(HeldTransfer::new(0));
        let d = dispatcher(transfer.clone(), 4);

        let first = tokio::spawn({
            let d = d.clone();
            async move { d.submit(Address::repeat_byte(1)).await }
        });
        while !d.gate().is_held() {
            tokio::task::yield_now().await;
        }
        d.submit(Address::repeat_byte(2)).await.unwrap();
        transfer.release.add_permits(1);
        first.await.unwrap().unwrap();

        // Gate is free but the backlog is not empty.
        assert!(!d.gate().is_held());
        assert_eq!(d.submit(Address::repeat_byte(3)).await.unwrap(), Dispatch::Queued { position: 2 });
        // The fast path gave the gate back for the drain.
        assert!(!d.gate().is_held());
        assert_eq!(transfer.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drain_pays_in_fifo_order() {
        let transfer = Arc::new(HeldTransfer::new(0));
        let d = dispatcher(transfer.clone(), 4);
        let (shutdown_tx, _) = broadcast::channel(1);

        let first = tokio::spawn({
            let d = d.clone();
            async move { d.submit(Address::repeat_byte(1)).await }
        });
        while !d.gate().is_held() {
            tokio::task::yield_now().await;
        }
        d.submit(Address::repeat_byte(2)).await.unwrap();
        d.submit(Address::repeat_byte(3)).await.unwrap();

        let drain = d.clone().spawn_drain(shutdown_tx.subscribe());
        transfer.release.add_permits(3);
        first.await.unwrap().unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while transfer.paid.lock().unwrap().len() < 3 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(
            *transfer.paid.lock().unwrap(),
            vec![Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3)]
        );

        shutdown_tx.send(()).unwrap();
        drain.await.unwrap();
    }

    #[tokio::test]
    async fn test_drain_survives_failed_transfer() {
        let mut held = HeldTransfer::new(0);
        held.fail = true;
        let transfer = Arc::new(held);
        let d = dispatcher(transfer.clone(), 4);
        let (shutdown_tx, _) = broadcast::channel(1);

        let permit = d.gate().try_acquire().unwrap();
        d.submit(Address::repeat_byte(2)).await.unwrap();
        d.submit(Address::repeat_byte(3)).await.unwrap();

        let drain = d.clone().spawn_drain(shutdown_tx.subscribe());
        transfer.release.add_permits(2);
        drop(permit);

        tokio::time::timeout(Duration::from_secs(5), async {
            while transfer.started.load(Ordering::SeqCst) < 2 || d.gate().is_held() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(d.queue_len(), 0);

        shutdown_tx.send(()).unwrap();
        drain.await.unwrap();
    }
}
