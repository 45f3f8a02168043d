//! Conversion cache
//!
//! Memoises formatted conversion pairs. Keys carry every input that
//! affects the output, so a hit is always interchangeable with a fresh
//! computation. The default store is bounded and evicts the oldest
//! inserted key first.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use serde::Serialize;
use tracing::trace;
use unitext_core::{ConversionResult, FormatOptions, QuantityType, Unit};

/// Capacity used by [`FifoCache::default`]
pub const DEFAULT_CAPACITY: usize = 500;

/// Everything a conversion's output depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub quantity: QuantityType,
    /// Value bits, so `0.1` and `0.10000000000000001` share a key
    pub value_bits: u64,
    pub from: Unit,
    pub to: Unit,
    pub options: FormatOptions,
}

impl CacheKey {
    pub fn new(quantity: QuantityType, value: f64, from: Unit, to: Unit, options: FormatOptions) -> Self {
        CacheKey {
            quantity,
            value_bits: value.to_bits(),
            from,
            to,
            options,
        }
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.value_bits)
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Storage for conversion results.
///
/// Implementations may drop entries at any time; callers recompute on a
/// miss.
pub trait ConversionCache {
    fn get(&mut self, key: &CacheKey) -> Option<ConversionResult>;

    fn put(&mut self, key: CacheKey, result: ConversionResult);

    /// Drop the entry next in line for eviction
    fn evict(&mut self) -> Option<CacheKey>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> CacheStats;
}

/// Bounded map with first-in first-out eviction.
///
/// Re-inserting a present key replaces its value without moving it in the
/// eviction order. A capacity of zero disables storage.
#[derive(Debug, Clone)]
pub struct FifoCache {
    capacity: usize,
    entries: HashMap<CacheKey, ConversionResult>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl FifoCache {
    pub fn new(capacity: usize) -> Self {
        FifoCache {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for FifoCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ConversionCache for FifoCache {
    fn get(&mut self, key: &CacheKey) -> Option<ConversionResult> {
        let found = self.entries.get(key).cloned();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    fn put(&mut self, key: CacheKey, result: ConversionResult) {
        if self.capacity == 0 {
            return;
        }
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = result;
            return;
        }
        while self.entries.len() >= self.capacity {
            if self.evict().is_none() {
                break;
            }
        }
        self.order.push_back(key);
        self.entries.insert(key, result);
    }

    fn evict(&mut self) -> Option<CacheKey> {
        let oldest = self.order.pop_front()?;
        self.entries.remove(&oldest);
        trace!(from = %oldest.from, to = %oldest.to, value = oldest.value(), "evicted cached conversion");
        Some(oldest)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Cache that stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ConversionCache for NoCache {
    fn get(&mut self, _key: &CacheKey) -> Option<ConversionResult> {
        None
    }

    fn put(&mut self, _key: CacheKey, _result: ConversionResult) {}

    fn evict(&mut self) -> Option<CacheKey> {
        None
    }

    fn len(&self) -> usize {
        0
    }

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// Shared cache for engines running on several threads
impl<C: ConversionCache> ConversionCache for Arc<Mutex<C>> {
    fn get(&mut self, key: &CacheKey) -> Option<ConversionResult> {
        self.lock().unwrap_or_else(PoisonError::into_inner).get(key)
    }

    fn put(&mut self, key: CacheKey, result: ConversionResult) {
        self.lock().unwrap_or_else(PoisonError::into_inner).put(key, result)
    }

    fn evict(&mut self) -> Option<CacheKey> {
        self.lock().unwrap_or_else(PoisonError::into_inner).evict()
    }

    fn len(&self) -> usize {
        self.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn stats(&self) -> CacheStats {
        self.lock().unwrap_or_else(PoisonError::into_inner).stats()
    }
}
