// SPDX-License-Identifier: MPL-2.0
//! Memory-bounded caching of render-heavy artifacts with tiered
//! reclamation under memory pressure.
//!
//! Two stores are maintained: a render-node cache evicted by priority then
//! recency, and a decoded-image cache with plain LRU eviction. A periodic,
//! tick-driven monitor compares current usage against a warn threshold and
//! a hard limit and reacts with one of three escalating cleanup tiers:
//!
//! - **Routine**: drop stale nodes, trim the image cache to half capacity
//! - **Aggressive**: empty both caches (host backgrounded, repeated
//!   threshold breaches)
//! - **Emergency**: aggressive plus releasing retained map capacity, when
//!   usage exceeds the hard limit
//!
//! Usage is read from the host's [`MemoryProbe`] when one is installed;
//! otherwise a count-weighted estimate stands in. No operation here ever
//! fails the host: capacity pressure resolves through eviction and a
//! missing probe degrades to the estimate.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use lru::LruCache;
use serde::Serialize;

use crate::config::{
    DEFAULT_EVENT_BUFFER_CAPACITY, DEFAULT_MAX_CACHED_IMAGES, DEFAULT_MAX_CACHED_NODES,
    DEFAULT_MEMORY_CHECK_INTERVAL_MS, DEFAULT_MEMORY_HARD_LIMIT_MB, DEFAULT_STALE_ENTRY_MS,
    IMAGE_SIZE_ESTIMATE_BYTES, MAX_MAX_CACHED_IMAGES, MAX_MAX_CACHED_NODES,
    MAX_MEMORY_CHECK_INTERVAL_MS, MAX_MEMORY_HARD_LIMIT_MB, MIN_MAX_CACHED_IMAGES,
    MIN_MAX_CACHED_NODES, MIN_MEMORY_CHECK_INTERVAL_MS, MIN_MEMORY_HARD_LIMIT_MB,
    NODE_SIZE_ESTIMATE_BYTES, WARNING_ESCALATION_BREACHES, WARN_THRESHOLD_FRACTION,
};
use crate::diagnostics::{CircularBuffer, CleanupTier, EngineEvent, EventRecord};
use crate::port::{Clock, Disposable, MemoryProbe, MonotonicClock};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Configuration for the resource cache and its memory monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of cached render nodes.
    pub max_nodes: usize,
    /// Maximum number of cached decoded images.
    pub max_images: usize,
    /// Hard memory limit in MB; usage above it triggers an emergency
    /// cleanup unconditionally.
    pub hard_limit_mb: u32,
    /// Warn threshold in MB; usage above it fires a warning and, with
    /// `auto_cleanup`, a routine cleanup.
    pub warn_threshold_mb: u32,
    /// Cadence of the periodic memory check.
    pub check_interval_ms: u64,
    /// Idle time after which a node is stale for routine cleanup.
    pub stale_after_ms: u64,
    /// Run a routine cleanup automatically on warning-band checks.
    pub auto_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_HARD_LIMIT_MB)
    }
}

impl CacheConfig {
    /// Creates a configuration from a hard limit, deriving the warn
    /// threshold and clamping to the valid range.
    #[must_use]
    pub fn new(hard_limit_mb: u32) -> Self {
        let hard_limit_mb = hard_limit_mb.clamp(MIN_MEMORY_HARD_LIMIT_MB, MAX_MEMORY_HARD_LIMIT_MB);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let warn_threshold_mb = (f64::from(hard_limit_mb) * WARN_THRESHOLD_FRACTION) as u32;
        Self {
            max_nodes: DEFAULT_MAX_CACHED_NODES,
            max_images: DEFAULT_MAX_CACHED_IMAGES,
            hard_limit_mb,
            warn_threshold_mb,
            check_interval_ms: DEFAULT_MEMORY_CHECK_INTERVAL_MS,
            stale_after_ms: DEFAULT_STALE_ENTRY_MS,
            auto_cleanup: true,
        }
    }

    /// Clamps entry capacities and the check interval into their valid
    /// ranges, returning the adjusted configuration.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.max_nodes = self.max_nodes.clamp(MIN_MAX_CACHED_NODES, MAX_MAX_CACHED_NODES);
        self.max_images = self
            .max_images
            .clamp(MIN_MAX_CACHED_IMAGES, MAX_MAX_CACHED_IMAGES);
        self.check_interval_ms = self
            .check_interval_ms
            .clamp(MIN_MEMORY_CHECK_INTERVAL_MS, MAX_MEMORY_CHECK_INTERVAL_MS);
        self
    }
}

/// Hit/miss/eviction counters for both stores combined.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub insertions: u64,
}

impl CacheStats {
    /// Cache hit rate as a percentage (0.0 - 100.0).
    // Allow cast_precision_loss: hit/miss counts won't exceed the f64
    // mantissa in any realistic session.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Point-in-time memory snapshot.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MemoryStats {
    pub current_usage_mb: f64,
    pub warn_threshold_mb: f64,
    pub hard_limit_mb: f64,
    pub node_count: usize,
    pub image_count: usize,
}

/// Result of one periodic memory check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemoryCheckOutcome {
    /// Monitoring stopped, or the interval has not elapsed yet.
    Skipped,
    /// Usage at or below the warn threshold.
    Idle,
    /// Usage in the warning band; a routine cleanup ran if auto-cleanup is
    /// enabled.
    Warning { usage_mb: f64 },
    /// Repeated warning-band checks escalated to an aggressive cleanup.
    Escalated { usage_mb: f64, freed_mb: f64 },
    /// Usage above the hard limit; an emergency cleanup ran.
    Emergency { usage_mb: f64, freed_mb: f64 },
}

#[derive(Debug)]
struct NodeEntry<N> {
    payload: N,
    priority: i32,
    last_accessed_at: u64,
    size_estimate: usize,
}

#[derive(Debug)]
struct ImageEntry<I> {
    payload: I,
    size_estimate: usize,
}

/// Bounded cache of render artifacts with a tick-driven memory monitor.
///
/// `N` is the host's render-node payload, `I` its decoded-image payload;
/// both must implement [`Disposable`] so eviction can release backing
/// resources uniformly.
pub struct ResourceCache<N: Disposable, I: Disposable> {
    config: CacheConfig,
    nodes: HashMap<u64, NodeEntry<N>>,
    images: LruCache<String, ImageEntry<I>>,
    clock: Box<dyn Clock>,
    probe: Option<Box<dyn MemoryProbe>>,
    stats: CacheStats,
    events: CircularBuffer<EventRecord>,
    monitoring: bool,
    destroyed: bool,
    last_check_at: Option<u64>,
    consecutive_warnings: u32,
}

impl<N: Disposable, I: Disposable> ResourceCache<N, I> {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Box::new(MonotonicClock::default()))
    }

    #[must_use]
    pub fn with_clock(config: CacheConfig, clock: Box<dyn Clock>) -> Self {
        let config = config.clamped();
        let image_capacity = NonZeroUsize::new(config.max_images)
            .unwrap_or(NonZeroUsize::new(DEFAULT_MAX_CACHED_IMAGES).expect("default is non-zero"));
        Self {
            config,
            nodes: HashMap::new(),
            images: LruCache::new(image_capacity),
            clock,
            probe: None,
            stats: CacheStats::default(),
            events: CircularBuffer::new(DEFAULT_EVENT_BUFFER_CAPACITY),
            monitoring: false,
            destroyed: false,
            last_check_at: None,
            consecutive_warnings: 0,
        }
    }

    /// Installs host heap introspection. Without a probe, usage falls back
    /// to the count-weighted estimate.
    pub fn set_memory_probe(&mut self, probe: Box<dyn MemoryProbe>) {
        self.probe = Some(probe);
    }

    // ======================================================================
    // Node cache
    // ======================================================================

    /// Inserts or replaces a render node. At capacity, exactly one entry —
    /// the oldest among the lowest-priority ones — is evicted first.
    pub fn cache_node(&mut self, id: u64, node: N, priority: i32) {
        let now = self.clock.now_ms();
        if let Some(existing) = self.nodes.get_mut(&id) {
            existing.payload.dispose();
            existing.payload = node;
            existing.priority = priority;
            existing.last_accessed_at = now;
            self.stats.insertions += 1;
            return;
        }
        if self.nodes.len() >= self.config.max_nodes {
            self.evict_one_node();
        }
        self.nodes.insert(
            id,
            NodeEntry {
                payload: node,
                priority,
                last_accessed_at: now,
                size_estimate: NODE_SIZE_ESTIMATE_BYTES,
            },
        );
        self.stats.insertions += 1;
    }

    /// Looks up a cached node, refreshing its recency on a hit.
    pub fn get_cached_node(&mut self, id: u64) -> Option<&N> {
        let now = self.clock.now_ms();
        match self.nodes.get_mut(&id) {
            Some(entry) => {
                entry.last_accessed_at = now;
                self.stats.hits += 1;
                Some(&entry.payload)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Removes a node, disposing its payload. Returns whether it existed.
    pub fn remove_cached_node(&mut self, id: u64) -> bool {
        match self.nodes.remove(&id) {
            Some(mut entry) => {
                entry.payload.dispose();
                true
            }
            None => false,
        }
    }

    // ======================================================================
    // Image cache
    // ======================================================================

    /// Inserts or replaces a decoded image; the LRU entry is evicted when
    /// the cache is full.
    pub fn cache_image(&mut self, url: &str, image: I) {
        let entry = ImageEntry {
            payload: image,
            size_estimate: IMAGE_SIZE_ESTIMATE_BYTES,
        };
        if let Some((evicted_url, mut evicted)) = self.images.push(url.to_string(), entry) {
            evicted.payload.dispose();
            if evicted_url != url {
                self.stats.evictions += 1;
                let at = self.clock.now_ms();
                self.record(at, EngineEvent::ImageEvicted { url: evicted_url });
            }
        }
        self.stats.insertions += 1;
    }

    /// Looks up a cached image, refreshing its recency on a hit.
    pub fn get_cached_image(&mut self, url: &str) -> Option<&I> {
        if self.images.contains(url) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        self.images.get(url).map(|entry| &entry.payload)
    }

    /// Removes an image, disposing its payload. Returns whether it existed.
    pub fn remove_image_from_cache(&mut self, url: &str) -> bool {
        match self.images.pop(url) {
            Some(mut entry) => {
                entry.payload.dispose();
                true
            }
            None => false,
        }
    }

    // ======================================================================
    // Memory accounting
    // ======================================================================

    /// Current usage in MB: the host probe when installed, otherwise a
    /// count-weighted estimate over both stores.
    #[allow(clippy::cast_precision_loss)]
    pub fn current_memory_usage(&mut self) -> f64 {
        let bytes = match self.probe.as_mut().and_then(|probe| probe.used_bytes()) {
            Some(bytes) => bytes as f64,
            None => self.estimated_bytes() as f64,
        };
        bytes / BYTES_PER_MB
    }

    /// Usage as a fraction of the hard limit, clamped to 0..=1.
    pub fn relative_memory_usage(&mut self) -> f64 {
        let usage = self.current_memory_usage();
        (usage / f64::from(self.config.hard_limit_mb)).clamp(0.0, 1.0)
    }

    pub fn memory_stats(&mut self) -> MemoryStats {
        MemoryStats {
            current_usage_mb: self.current_memory_usage(),
            warn_threshold_mb: f64::from(self.config.warn_threshold_mb),
            hard_limit_mb: f64::from(self.config.hard_limit_mb),
            node_count: self.nodes.len(),
            image_count: self.images.len(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Recorded pressure/cleanup events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &EventRecord> {
        self.events.iter()
    }

    // ======================================================================
    // Cleanup tiers
    // ======================================================================

    /// Routine cleanup: drops nodes idle past the staleness window and
    /// trims the image cache to half capacity. Returns freed MB.
    pub fn perform_cleanup(&mut self) -> f64 {
        let before = self.estimated_bytes();
        let now = self.clock.now_ms();

        let stale: Vec<u64> = self
            .nodes
            .iter()
            .filter(|(_, entry)| {
                now.saturating_sub(entry.last_accessed_at) > self.config.stale_after_ms
            })
            .map(|(&id, _)| id)
            .collect();
        for id in stale {
            if let Some(mut entry) = self.nodes.remove(&id) {
                entry.payload.dispose();
                self.stats.evictions += 1;
            }
        }

        let half_capacity = self.config.max_images / 2;
        while self.images.len() > half_capacity {
            if let Some((_, mut entry)) = self.images.pop_lru() {
                entry.payload.dispose();
                self.stats.evictions += 1;
            }
        }

        let freed_mb = self.freed_mb_since(before);
        self.record(
            now,
            EngineEvent::CleanupRun {
                tier: CleanupTier::Routine,
                freed_mb,
            },
        );
        freed_mb
    }

    /// Aggressive cleanup: unconditionally empties both caches.
    pub fn perform_aggressive_cleanup(&mut self) -> f64 {
        let before = self.estimated_bytes();
        self.clear_all();
        let freed_mb = self.freed_mb_since(before);
        let at = self.clock.now_ms();
        self.record(
            at,
            EngineEvent::CleanupRun {
                tier: CleanupTier::Aggressive,
                freed_mb,
            },
        );
        freed_mb
    }

    /// Emergency cleanup: aggressive cleanup plus releasing retained map
    /// capacity back to the allocator.
    pub fn perform_emergency_cleanup(&mut self) -> f64 {
        let before = self.estimated_bytes();
        self.clear_all();
        self.nodes.shrink_to_fit();
        let freed_mb = self.freed_mb_since(before);
        let at = self.clock.now_ms();
        self.record(
            at,
            EngineEvent::CleanupRun {
                tier: CleanupTier::Emergency,
                freed_mb,
            },
        );
        freed_mb
    }

    // ======================================================================
    // Monitor lifecycle
    // ======================================================================

    /// Arms the periodic memory check. The host drives it by calling
    /// [`ResourceCache::maybe_check`] at its own cadence (per frame is
    /// fine; checks self-throttle to the configured interval).
    pub fn start(&mut self) {
        self.monitoring = true;
        self.last_check_at = None;
    }

    /// Disarms the periodic check only; caches stay intact.
    pub fn stop(&mut self) {
        self.monitoring = false;
    }

    /// Stops monitoring and empties both caches. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop();
        self.perform_aggressive_cleanup();
        self.destroyed = true;
    }

    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Host lifecycle signal: visibility loss empties the caches while the
    /// canvas cannot be seen anyway.
    pub fn handle_visibility_change(&mut self, hidden: bool) {
        if hidden {
            self.perform_aggressive_cleanup();
        }
    }

    /// Host lifecycle signal: page/application teardown.
    pub fn handle_unload(&mut self) {
        self.destroy();
    }

    /// Runs the periodic check if monitoring is armed and the interval has
    /// elapsed since the last one.
    pub fn maybe_check(&mut self) -> MemoryCheckOutcome {
        if !self.monitoring {
            return MemoryCheckOutcome::Skipped;
        }
        let now = self.clock.now_ms();
        if let Some(last) = self.last_check_at {
            if now.saturating_sub(last) < self.config.check_interval_ms {
                return MemoryCheckOutcome::Skipped;
            }
        }
        self.last_check_at = Some(now);
        self.run_memory_check()
    }

    /// Compares usage against the thresholds and reacts immediately,
    /// regardless of monitor cadence.
    pub fn run_memory_check(&mut self) -> MemoryCheckOutcome {
        let usage_mb = self.current_memory_usage();
        let warn = f64::from(self.config.warn_threshold_mb);
        let hard = f64::from(self.config.hard_limit_mb);

        if usage_mb > hard {
            self.consecutive_warnings = 0;
            let freed_mb = self.perform_emergency_cleanup();
            return MemoryCheckOutcome::Emergency { usage_mb, freed_mb };
        }

        if usage_mb > warn {
            self.consecutive_warnings += 1;
            let at = self.clock.now_ms();
            self.record(at, EngineEvent::MemoryWarning { usage_mb });
            if self.consecutive_warnings >= WARNING_ESCALATION_BREACHES {
                self.consecutive_warnings = 0;
                let freed_mb = self.perform_aggressive_cleanup();
                return MemoryCheckOutcome::Escalated { usage_mb, freed_mb };
            }
            if self.config.auto_cleanup {
                self.perform_cleanup();
            }
            return MemoryCheckOutcome::Warning { usage_mb };
        }

        self.consecutive_warnings = 0;
        MemoryCheckOutcome::Idle
    }

    // ======================================================================
    // Internals
    // ======================================================================

    fn estimated_bytes(&self) -> usize {
        let node_bytes: usize = self.nodes.values().map(|entry| entry.size_estimate).sum();
        let image_bytes: usize = self
            .images
            .iter()
            .map(|(_, entry)| entry.size_estimate)
            .sum();
        node_bytes + image_bytes
    }

    #[allow(clippy::cast_precision_loss)]
    fn freed_mb_since(&self, before_bytes: usize) -> f64 {
        before_bytes.saturating_sub(self.estimated_bytes()) as f64 / BYTES_PER_MB
    }

    /// Evicts the oldest entry among the lowest-priority nodes.
    fn evict_one_node(&mut self) {
        let victim = self
            .nodes
            .iter()
            .min_by_key(|(_, entry)| (entry.priority, entry.last_accessed_at))
            .map(|(&id, _)| id);
        if let Some(id) = victim {
            if let Some(mut entry) = self.nodes.remove(&id) {
                entry.payload.dispose();
            }
            self.stats.evictions += 1;
            let at = self.clock.now_ms();
            self.record(at, EngineEvent::NodeEvicted { id });
        }
    }

    fn clear_all(&mut self) {
        for (_, mut entry) in self.nodes.drain() {
            entry.payload.dispose();
        }
        while let Some((_, mut entry)) = self.images.pop_lru() {
            entry.payload.dispose();
        }
    }

    fn record(&mut self, at_ms: u64, event: EngineEvent) {
        self.events.push(EventRecord::new(at_ms, event));
    }
}

impl<N: Disposable, I: Disposable> Drop for ResourceCache<N, I> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<N: Disposable, I: Disposable> std::fmt::Debug for ResourceCache<N, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("node_count", &self.nodes.len())
            .field("image_count", &self.images.len())
            .field("monitoring", &self.monitoring)
            .field("destroyed", &self.destroyed)
            .field("stats", &self.stats)
            .finish()
    }
}
