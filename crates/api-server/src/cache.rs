//! Calculation Cache
//!
//! Bounded memoization of calculation results, keyed by calculation kind and
//! the JSON form of the input. Oldest entries are evicted first. Failed
//! calculations are never stored.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;
use immo_core::TaxResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub lookups: u64,
    pub hits: u64,
    pub hit_rate: f64,
}

pub struct CalculationCache<V> {
    capacity: usize,
    entries: DashMap<String, V>,
    /// Insertion order, oldest first
    order: Mutex<VecDeque<String>>,
    lookups: AtomicU64,
    hits: AtomicU64,
}

impl<V: Clone> CalculationCache<V> {
    /// A capacity of 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: DashMap::with_capacity(capacity),
            order: Mutex::new(VecDeque::with_capacity(capacity)),
            lookups: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Return the cached result for `input`, or run `compute` and remember
    /// a successful result.
    pub fn get_or_compute<I, F>(&self, kind: &str, input: &I, compute: F) -> TaxResult<V>
    where
        I: Serialize,
        F: FnOnce() -> TaxResult<V>,
    {
        if !self.is_enabled() {
            return compute();
        }
        let key = match serde_json::to_string(input) {
            Ok(json) => format!("{kind}:{json}"),
            Err(e) => {
                tracing::warn!("Cannot build cache key for {}: {}", kind, e);
                return compute();
            }
        };

        self.lookups.fetch_add(1, Ordering::Relaxed);
        if let Some(hit) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Cache hit for {}", kind);
            return Ok(hit.value().clone());
        }

        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    fn insert(&self, key: String, value: V) {
        let mut order = match self.order.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.entries.insert(key.clone(), value).is_none() {
            order.push_back(key);
        }
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.lookups.load(Ordering::Relaxed);
        let hits = self.hits.load(Ordering::Relaxed);
        CacheStats {
            size: self.entries.len(),
            lookups,
            hits,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
        }
    }
}
