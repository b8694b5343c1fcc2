// In-process key-value store with lease expiry
// Provides the same atomic primitives as the Redis adapter for single-process use and tests

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::traits::KeyValueStore;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// A stored value with its lease
pub(crate) struct Record {
    value: String,
    inserted_at: Instant,
    ttl: Duration,
}

impl Record {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            inserted_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// In-memory `KeyValueStore` backed by DashMap.
///
/// Expired records are invisible to every operation; `with_sweeper` also
/// removes them in the background so idle keys do not accumulate.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub(crate) records: Arc<DashMap<String, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a background task removing expired records every `interval`
    /// (at least 1ms).
    ///
    /// Must be called inside a tokio runtime. The task stops once the last
    /// handle to the store is dropped.
    pub fn with_sweeper(self, interval: Duration) -> Self {
        let interval = interval.max(MIN_SWEEP_INTERVAL);
        let records = Arc::downgrade(&self.records);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(records) = Weak::upgrade(&records) else {
                    break;
                };
                let removed = purge(&records);
                if removed > 0 {
                    debug!(count = removed, "Swept expired lock records");
                }
            }
        });

        info!(interval_ms = interval.as_millis() as u64, "MemoryStore sweeper started");
        self
    }

    /// Remove expired records now, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        purge(&self.records)
    }

    /// Number of live (unexpired) records
    pub fn len(&self) -> usize {
        self.records.iter().filter(|r| !r.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn purge(records: &DashMap<String, Record>) -> usize {
    let before = records.len();
    records.retain(|_, record| !record.is_expired());
    before.saturating_sub(records.len())
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn try_set(&self, key: &str, value: &str, ttl: Duration) -> bool {
        // The entry guard holds the shard lock, so check-and-insert is atomic
        match self.records.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_expired() {
                    return false;
                }
                occupied.insert(Record::new(value, ttl));
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Record::new(value, ttl));
                true
            }
        }
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.records
            .get(key)
            .filter(|record| !record.is_expired())
            .map(|record| record.value.clone())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> bool {
        self.records
            .remove_if(key, |_, record| {
                !record.is_expired() && record.value == expected
            })
            .is_some()
    }
}
