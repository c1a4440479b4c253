//! Per-address and per-client cooldown between successful claims.
//!
//! A claim holds a [`ClaimSlot`] from admission until its dispatch settles, so a
//! repeat claim for the same keys cannot slip in before the cooldown is written.

use dashmap::DashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::observability::metrics;
use crate::security::ttl_cache::TtlCache;

/// Exclusive hold on an address and origin while their claim is dispatched.
#[derive(Debug)]
pub struct ClaimSlot<'a> {
    limiter: &'a ClaimLimiter,
    address: String,
    origin: String,
}

impl ClaimSlot<'_> {
    /// Start the cooldown for both keys, then release them.
    pub fn complete(self) {
        self.limiter.record_success(&self.address, &self.origin);
    }
}

impl Drop for ClaimSlot<'_> {
    fn drop(&mut self) {
        self.limiter.in_flight_addresses.remove(&self.address);
        self.limiter.in_flight_origins.remove(&self.origin);
    }
}

/// Result of checking a claim against the cooldown store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    /// Time left before the key may claim again.
    Deny(Duration),
}

/// Cooldown store shared by all request handlers.
#[derive(Debug)]
pub struct ClaimLimiter {
    entries: TtlCache<()>,
    in_flight_addresses: DashSet<String>,
    in_flight_origins: DashSet<String>,
}

impl ClaimLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            entries: TtlCache::new(cooldown),
            in_flight_addresses: DashSet::new(),
            in_flight_origins: DashSet::new(),
        }
    }

    /// Admit a claim and hold both keys until the returned slot is dropped.
    ///
    /// A key with a claim still in flight is denied for a full cooldown, since
    /// that claim starts one when it succeeds.
    pub fn reserve(&self, address: &str, origin: &str) -> Result<ClaimSlot<'_>, Duration> {
        // Keys are taken before the cooldown is read: a finishing claim writes its
        // cooldown before releasing them.
        if !self.in_flight_addresses.insert(address.to_string()) {
            return Err(self.deny_in_flight("address", address));
        }
        if !self.in_flight_origins.insert(origin.to_string()) {
            self.in_flight_addresses.remove(address);
            return Err(self.deny_in_flight("origin", origin));
        }

        let slot = ClaimSlot { limiter: self, address: address.to_string(), origin: origin.to_string() };
        match self.admit(address, origin) {
            Admission::Allow => Ok(slot),
            Admission::Deny(remaining) => Err(remaining),
        }
    }

    fn deny_in_flight(&self, kind: &'static str, key: &str) -> Duration {
        tracing::warn!(client = %key, kind, "Claim already in flight");
        metrics::record_rate_limited(kind);
        self.cooldown()
    }

    /// Keys with a claim currently between admission and dispatch.
    pub fn in_flight(&self) -> usize {
        self.in_flight_addresses.len()
    }

    /// Deny while either key has a live entry. Read only.
    pub fn admit(&self, address: &str, origin: &str) -> Admission {
        for (kind, key) in [("address", address), ("origin", origin)] {
            if let Some(((), remaining)) = self.entries.get(key) {
                tracing::warn!(client = %key, kind, remaining_ms = remaining.as_millis() as u64, "Rate limit exceeded");
                metrics::record_rate_limited(kind);
                return Admission::Deny(remaining);
            }
        }
        Admission::Allow
    }

    /// Start the cooldown for both keys after a dispatch went through.
    pub fn record_success(&self, address: &str, origin: &str) {
        self.entries.insert(address, ());
        self.entries.insert(origin, ());
    }

    pub fn cooldown(&self) -> Duration {
        self.entries.ttl()
    }

    /// Periodically drop expired entries until shutdown.
    pub fn spawn_janitor(
        self: Arc<Self>,
        every: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let purged = self.entries.purge_expired();
                        if purged > 0 {
                            tracing::debug!(purged, "Expired rate limit entries removed");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B";

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_window() {
        let limiter = ClaimLimiter::new(Duration::from_millis(100));
        assert_eq!(limiter.admit(ADDR, "10.0.0.1"), Admission::Allow);
        limiter.record_success(ADDR, "10.0.0.1");

        tokio::time::advance(Duration::from_millis(10)).await;
        assert_eq!(limiter.admit(ADDR, "10.0.0.9"), Admission::Deny(Duration::from_millis(90)));

        tokio::time::advance(Duration::from_millis(140)).await;
        assert_eq!(limiter.admit(ADDR, "10.0.0.1"), Admission::Allow);
    }

    #[tokio::test(start_paused = true)]
    async fn test_origin_is_limited_independently() {
        let limiter = ClaimLimiter::new(Duration::from_secs(60));
        limiter.record_success(ADDR, "10.0.0.1");

        let other = "0x0000000000000000000000000000000000000001";
        assert!(matches!(limiter.admit(other, "10.0.0.1"), Admission::Deny(_)));
        assert_eq!(limiter.admit(other, "10.0.0.2"), Admission::Allow);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reserved_keys_block_repeat_claims() {
        let limiter = ClaimLimiter::new(Duration::from_secs(60));
        let slot = limiter.reserve(ADDR, "10.0.0.1").unwrap();
        assert_eq!(limiter.in_flight(), 1);

        assert_eq!(limiter.reserve(ADDR, "10.0.0.2").unwrap_err(), Duration::from_secs(60));
        assert_eq!(limiter.reserve("0x01", "10.0.0.1").unwrap_err(), Duration::from_secs(60));
        // The rejected origin check released the address it had taken.
        assert_eq!(limiter.in_flight(), 1);

        slot.complete();
        assert_eq!(limiter.in_flight(), 0);
        assert!(limiter.reserve(ADDR, "10.0.0.2").is_err());
        assert!(limiter.reserve("0x01", "10.0.0.1").is_err());
        assert!(limiter.reserve("0x01", "10.0.0.2").is_ok());
    }

    #[tokio::test]
    async fn test_dropped_slot_starts_no_cooldown() {
        let limiter = ClaimLimiter::new(Duration::from_secs(60));
        drop(limiter.reserve(ADDR, "10.0.0.1").unwrap());

        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(limiter.admit(ADDR, "10.0.0.1"), Admission::Allow);
        assert!(limiter.reserve(ADDR, "10.0.0.1").is_ok());
    }

    #[tokio::test]
    async fn test_admit_does_not_record() {
        let limiter = ClaimLimiter::new(Duration::from_secs(60));
        assert_eq!(limiter.admit(ADDR, "10.0.0.1"), Admission::Allow);
        assert_eq!(limiter.admit(ADDR, "10.0.0.1"), Admission::Allow);
    }
}
