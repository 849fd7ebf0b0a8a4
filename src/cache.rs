//! Caller-owned memoization in front of [`crate::analyze`]
//!
//! Entries are keyed by display name and byte length, the file identity the
//! upload layer has at hand. Analysis itself keeps no state between calls.
//!
//! The cache is bounded two ways: entries older than the time-to-live are
//! treated as misses, and once `capacity` entries are held the oldest insert
//! is evicted first.

use crate::analysis::result::AnalysisOutcome;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Entry limit used by [`AnalysisCache::new`]
pub const DEFAULT_CAPACITY: usize = 256;

/// Time-to-live used by [`AnalysisCache::new`] (one hour)
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

type CacheKey = (String, usize);

#[derive(Debug)]
struct CacheEntry {
    outcome: AnalysisOutcome,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    // Insertion order, oldest first
    order: VecDeque<CacheKey>,
}

impl CacheState {
    fn insert(&mut self, key: CacheKey, outcome: AnalysisOutcome, capacity: usize, ttl: Duration) {
        let now = Instant::now();
        if self.entries.contains_key(&key) {
            self.order.retain(|k| k != &key);
        }
        self.entries.insert(
            key.clone(),
            CacheEntry {
                outcome,
                stored_at: now,
            },
        );
        self.order.push_back(key);

        while let Some(oldest) = self.order.front() {
            let expired = match self.entries.get(oldest) {
                Some(entry) => now.duration_since(entry.stored_at) >= ttl,
                None => true,
            };
            if !expired && self.entries.len() <= capacity {
                break;
            }
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}

/// In-memory outcome cache bound to one configuration
#[derive(Debug)]
pub struct AnalysisCache {
    config: AnalysisConfig,
    capacity: usize,
    ttl: Duration,
    state: RwLock<CacheState>,
}

impl AnalysisCache {
    /// Empty cache analyzing with `config`, holding at most
    /// [`DEFAULT_CAPACITY`] outcomes for [`DEFAULT_TTL`]
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_limits(config, DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Empty cache with explicit bounds
    ///
    /// A `capacity` of 0 disables caching.
    pub fn with_limits(config: AnalysisConfig, capacity: usize, ttl: Duration) -> Self {
        Self {
            config,
            capacity,
            ttl,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Configuration used for misses
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Maximum number of outcomes held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Age after which an outcome is no longer served
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn live(&self, entry: &CacheEntry) -> bool {
        entry.stored_at.elapsed() < self.ttl
    }

    /// Cached outcome for a file, if any and not expired
    pub fn get(&self, name: &str, len: usize) -> Option<AnalysisOutcome> {
        self.read()
            .entries
            .get(&(name.to_string(), len))
            .filter(|e| self.live(e))
            .map(|e| e.outcome.clone())
    }

    /// Cached outcome, or analyze and remember it
    ///
    /// # Errors
    ///
    /// Propagates analysis errors; failed analyses are not cached.
    pub fn get_or_analyze(&self, bytes: &[u8], name: &str) -> Result<AnalysisOutcome, AnalysisError> {
        if let Some(hit) = self.get(name, bytes.len()) {
            log::debug!("Cache hit for {} ({} bytes)", name, bytes.len());
            return Ok(hit);
        }

        let outcome = crate::analyze(bytes, name, &self.config)?;
        self.insert((name.to_string(), bytes.len()), outcome.clone());
        Ok(outcome)
    }

    fn insert(&self, key: CacheKey, outcome: AnalysisOutcome) {
        self.write().insert(key, outcome, self.capacity, self.ttl);
    }

    /// Number of cached outcomes that have not expired
    pub fn len(&self) -> usize {
        self.read().entries.values().filter(|e| self.live(e)).count()
    }

    /// True when no live outcome is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached outcome
    pub fn clear(&self) {
        let mut state = self.write();
        state.entries.clear();
        state.order.clear();
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
