//! Optional minimum-balance requirement on a second chain.
//!
//! Recipients must already hold `min_balance` on the reference chain (usually
//! mainnet). Lookups are cached per address for a short TTL.

use alloy::primitives::{Address, U256};
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::rpc::LedgerRpc;
use crate::blockchain::types::BlockchainResult;
use crate::security::ttl_cache::TtlCache;

pub struct BalanceGate {
    rpc: Arc<dyn LedgerRpc>,
    min_balance: U256,
    cache: TtlCache<U256>,
}

impl BalanceGate {
    pub fn new(rpc: Arc<dyn LedgerRpc>, min_balance: U256, ttl: Duration, capacity: usize) -> Self {
        Self { rpc, min_balance, cache: TtlCache::with_capacity(ttl, capacity) }
    }

    /// Whether `address` holds at least the required balance.
    pub async fn is_eligible(&self, address: Address) -> BlockchainResult<bool> {
        Ok(self.balance_of(address).await? >= self.min_balance)
    }

    async fn balance_of(&self, address: Address) -> BlockchainResult<U256> {
        let key = address.to_string();
        if let Some((balance, _)) = self.cache.get(&key) {
            return Ok(balance);
        }
        let balance = self.rpc.balance(address).await?;
        self.cache.insert(key, balance);
        Ok(balance)
    }

    pub fn min_balance(&self) -> U256 {
        self.min_balance
    }
}

impl std::fmt::Debug for BalanceGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceGate")
            .field("min_balance", &self.min_balance)
            .field("cached", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::rpc::testing::MockLedger;
    use std::sync::atomic::Ordering;

    #[tokio::test(start_paused = true)]
    async fn test_threshold_and_cache() {
        let rich = Address::repeat_byte(1);
        let poor = Address::repeat_byte(2);
        let ledger = Arc::new(MockLedger::default());
        ledger.balances.lock().unwrap().push((rich, U256::from(500)));
        ledger.balances.lock().unwrap().push((poor, U256::from(10)));

        let gate = BalanceGate::new(ledger.clone(), U256::from(100), Duration::from_secs(60), 16);

        assert!(gate.is_eligible(rich).await.unwrap());
        assert!(!gate.is_eligible(poor).await.unwrap());
        assert!(gate.is_eligible(rich).await.unwrap());
        assert_eq!(ledger.balance_calls.load(Ordering::SeqCst), 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(gate.is_eligible(rich).await.unwrap());
        assert_eq!(ledger.balance_calls.load(Ordering::SeqCst), 3);
    }
}
