// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! These traits isolate the engine from its host platform so unit tests can
//! run deterministically without real timers or a real memory subsystem.
//!
//! # Available Ports
//!
//! - [`Clock`]: monotonic time source for LRU bookkeeping and the memory
//!   monitor cadence
//! - [`MemoryProbe`]: optional host heap introspection
//! - [`Disposable`]: disposal capability required of cached payloads
//!
//! # Design Notes
//!
//! - All traits use plain domain types only
//! - A missing [`MemoryProbe`] is not an error; the cache degrades to a
//!   count-weighted usage estimate

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use sysinfo::System;

/// Monotonic milliseconds source.
///
/// Wall-clock adjustments must not affect readings, so implementations
/// should derive from a monotonic origin rather than system time.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Default clock backed by [`std::time::Instant`], measuring milliseconds
/// since construction.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Hand-driven clock for deterministic tests.
///
/// Clones share the same underlying instant, so a test can keep one handle
/// while the component under test owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Host heap introspection. Returns `None` when the host cannot report
/// usage, in which case callers fall back to an estimate.
pub trait MemoryProbe {
    fn used_bytes(&mut self) -> Option<u64>;
}

/// Default probe reading used system memory via `sysinfo`.
pub struct SystemMemoryProbe {
    system: System,
}

impl SystemMemoryProbe {
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn used_bytes(&mut self) -> Option<u64> {
        self.system.refresh_memory();
        Some(self.system.used_memory())
    }
}

/// Disposal capability for cached payloads.
///
/// The cache calls `dispose` exactly once on every payload it drops,
/// whether through eviction, explicit removal, or a cleanup tier.
pub trait Disposable {
    fn dispose(&mut self);
}

/// Payload-less cache slots (e.g., an engine that only caches images).
impl Disposable for () {
    fn dispose(&mut self) {}
}
