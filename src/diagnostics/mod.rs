// SPDX-License-Identifier: MPL-2.0
//! Engine activity events and their bounded storage.
//!
//! The engine has no global logger; noteworthy runtime events (memory
//! pressure, cleanup runs, evictions) are recorded into a bounded ring
//! buffer the host can drain into its own telemetry, or export as a JSON
//! report for bug-report tooling.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::{MAX_EVENT_BUFFER_CAPACITY, MIN_EVENT_BUFFER_CAPACITY};
use crate::error::Result;

/// A fixed-capacity ring buffer. Pushing onto a full buffer evicts the
/// oldest entry; iteration is chronological (oldest first).
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T> CircularBuffer<T> {
    /// Creates a buffer with `capacity` clamped to the valid range.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(MIN_EVENT_BUFFER_CAPACITY, MAX_EVENT_BUFFER_CAPACITY);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.data.len() >= self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// Escalation level of a cache cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupTier {
    Routine,
    Aggressive,
    Emergency,
}

/// Noteworthy engine occurrences captured for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Memory usage crossed the warn threshold.
    MemoryWarning { usage_mb: f64 },

    /// A cleanup tier ran.
    CleanupRun { tier: CleanupTier, freed_mb: f64 },

    /// A render node was evicted to make room for an insertion.
    NodeEvicted { id: u64 },

    /// A decoded image was evicted to make room for an insertion.
    ImageEvicted { url: String },
}

/// An [`EngineEvent`] stamped with engine-relative milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: EngineEvent,
}

impl EventRecord {
    #[must_use]
    pub fn new(at_ms: u64, event: EngineEvent) -> Self {
        Self { at_ms, event }
    }
}

/// Serializes a diagnostics report: a creation timestamp, an arbitrary
/// stats snapshot and the recorded events, as pretty-printed JSON.
pub fn export_report<S: Serialize>(stats: &S, events: &[EventRecord]) -> Result<String> {
    let report = serde_json::json!({
        "created_at": chrono::Utc::now().to_rfc3339(),
        "stats": stats,
        "events": events,
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EVENT_BUFFER_CAPACITY;

    #[test]
    fn push_and_retrieve_in_order() {
        let mut buffer: CircularBuffer<i32> = CircularBuffer::new(MIN_EVENT_BUFFER_CAPACITY);
        buffer.push(1);
        buffer.push(2);
        buffer.push(3);

        let items: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut buffer: CircularBuffer<i32> = CircularBuffer::new(MIN_EVENT_BUFFER_CAPACITY);
        for i in 0..=MIN_EVENT_BUFFER_CAPACITY as i32 {
            buffer.push(i);
        }
        assert_eq!(buffer.len(), MIN_EVENT_BUFFER_CAPACITY);
        assert_eq!(buffer.iter().next(), Some(&1)); // 0 was evicted
    }

    #[test]
    fn capacity_clamps_to_valid_range() {
        let tiny: CircularBuffer<i32> = CircularBuffer::new(0);
        assert_eq!(tiny.capacity(), MIN_EVENT_BUFFER_CAPACITY);

        let huge: CircularBuffer<i32> = CircularBuffer::new(usize::MAX);
        assert_eq!(huge.capacity(), MAX_EVENT_BUFFER_CAPACITY);

        let normal: CircularBuffer<i32> = CircularBuffer::new(DEFAULT_EVENT_BUFFER_CAPACITY);
        assert_eq!(normal.capacity(), DEFAULT_EVENT_BUFFER_CAPACITY);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buffer: CircularBuffer<i32> = CircularBuffer::new(MIN_EVENT_BUFFER_CAPACITY);
        buffer.push(1);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), MIN_EVENT_BUFFER_CAPACITY);
    }

    #[test]
    fn events_serialize_with_snake_case_tags() {
        let record = EventRecord::new(
            1_000,
            EngineEvent::CleanupRun {
                tier: CleanupTier::Emergency,
                freed_mb: 12.5,
            },
        );
        let json = serde_json::to_string(&record).expect("serialization should succeed");
        assert!(json.contains("\"event\":\"cleanup_run\""));
        assert!(json.contains("\"tier\":\"emergency\""));
        assert!(json.contains("\"at_ms\":1000"));
    }

    #[test]
    fn export_report_embeds_stats_and_events() {
        #[derive(Serialize)]
        struct Stats {
            visible: usize,
        }

        let events = vec![EventRecord::new(
            5,
            EngineEvent::MemoryWarning { usage_mb: 85.0 },
        )];
        let json = export_report(&Stats { visible: 7 }, &events).expect("export should succeed");
        assert!(json.contains("\"created_at\""));
        assert!(json.contains("\"visible\": 7"));
        assert!(json.contains("\"memory_warning\""));
    }
}
