//! Named monotonic sequence counters.
//!
//! The counter is the only truly shared mutable resource in this core: the
//! human-facing sale number comes out of it. The contract is atomic
//! increment-and-fetch — implementations must never expose a
//! read-then-write window where two callers can observe the same value.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

/// Counter backend failure (storage, connectivity).
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("counter backend failure: {0}")]
    Backend(String),
}

/// Atomic, monotonically increasing integer generator keyed by name.
#[async_trait]
pub trait SequenceCounter: Send + Sync {
    /// Issue the next value for `name`. No two callers ever receive the
    /// same value, regardless of concurrency.
    async fn next(&self, name: &str) -> Result<u64, CounterError>;

    /// Repair the counter after external drift (e.g. a number written
    /// directly to the store). Never moves the counter backwards, so
    /// concurrent resyncs cannot reopen a duplicate window.
    async fn resync(&self, name: &str, observed_max: u64) -> Result<(), CounterError>;
}

/// In-memory counter: increment-and-fetch under a single lock.
#[derive(Debug, Default)]
pub struct InMemorySequenceCounter {
    counters: Mutex<HashMap<String, u64>>,
}

impl InMemorySequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a counter to a known value (test/dev wiring).
    pub fn seed(&self, name: &str, value: u64) {
        if let Ok(mut counters) = self.counters.lock() {
            counters.insert(name.to_string(), value);
        }
    }
}

#[async_trait]
impl SequenceCounter for InMemorySequenceCounter {
    async fn next(&self, name: &str) -> Result<u64, CounterError> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| CounterError::Backend("counter lock poisoned".to_string()))?;
        let value = counters.entry(name.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn resync(&self, name: &str, observed_max: u64) -> Result<(), CounterError> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| CounterError::Backend("counter lock poisoned".to_string()))?;
        let value = counters.entry(name.to_string()).or_insert(0);
        if observed_max > *value {
            *value = observed_max;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn concurrent_next_never_duplicates() {
        let counter = Arc::new(InMemorySequenceCounter::new());

        let mut handles = Vec::new();
        for _ in 0..64 {
            let counter = counter.clone();
            handles.push(tokio::spawn(async move { counter.next("sales").await.unwrap() }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
        assert_eq!(seen.len(), 64);
        assert_eq!(*seen.iter().max().unwrap(), 64);
    }

    #[tokio::test]
    async fn resync_never_moves_backwards() {
        let counter = InMemorySequenceCounter::new();
        counter.resync("sales", 10).await.unwrap();
        counter.resync("sales", 3).await.unwrap();
        assert_eq!(counter.next("sales").await.unwrap(), 11);
    }

    #[tokio::test]
    async fn counters_are_independent_per_name() {
        let counter = InMemorySequenceCounter::new();
        assert_eq!(counter.next("sales").await.unwrap(), 1);
        assert_eq!(counter.next("offers").await.unwrap(), 1);
        assert_eq!(counter.next("sales").await.unwrap(), 2);
    }
}
