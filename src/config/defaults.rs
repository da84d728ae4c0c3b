// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all engine tunables.
//!
//! This module is the single source of truth for default values used
//! across the engine. Constants are organized by category.
//!
//! # Categories
//!
//! - **Gesture**: touch classification thresholds and timing windows
//! - **Culling**: viewport padding, grid geometry, rebuild thresholds
//! - **Cache**: capacity bounds and artifact size weights
//! - **Memory**: pressure thresholds and monitor cadence
//! - **Diagnostics**: event buffer capacity
//! - **Platform**: resource-constrained host detection

// ==========================================================================
// Gesture Defaults
// ==========================================================================

/// Maximum displacement (px) for a touch session to still classify as a tap.
pub const DEFAULT_TAP_THRESHOLD_PX: f32 = 10.0;

/// Displacement (px) past which a single-touch session upgrades to a pan.
pub const DEFAULT_PAN_THRESHOLD_PX: f32 = 10.0;

/// Maximum duration (ms) for a touch session to still classify as a tap.
pub const DEFAULT_TAP_DURATION_MS: u64 = 500;

/// Window (ms) after a tap within which a second tap becomes a double-tap.
pub const DEFAULT_DOUBLE_TAP_DELAY_MS: u64 = 300;

/// Touch events carrying more points than this are ignored entirely.
pub const DEFAULT_MAX_TOUCH_POINTS: usize = 2;

// ==========================================================================
// Culling Defaults
// ==========================================================================

/// Screen-space padding (px) around the viewport so items near the edge
/// don't pop in abruptly during pan/zoom.
pub const DEFAULT_VIEWPORT_PADDING_PX: f32 = 100.0;

/// Minimum allowed viewport padding.
pub const MIN_VIEWPORT_PADDING_PX: f32 = 0.0;

/// Maximum allowed viewport padding.
pub const MAX_VIEWPORT_PADDING_PX: f32 = 400.0;

/// Edge length of one spatial grid cell, in world units.
pub const DEFAULT_GRID_CELL_SIZE: f32 = 100.0;

/// Minimum allowed grid cell size.
pub const MIN_GRID_CELL_SIZE: f32 = 16.0;

/// Maximum allowed grid cell size.
pub const MAX_GRID_CELL_SIZE: f32 = 1024.0;

/// Viewport translation (px) since the last index build that forces a
/// wholesale rebuild.
pub const DEFAULT_REBUILD_TRANSLATION_PX: f32 = 50.0;

/// Scale change since the last index build that forces a wholesale rebuild.
pub const DEFAULT_REBUILD_SCALE_DELTA: f32 = 0.1;

// ==========================================================================
// Cache Defaults
// ==========================================================================

/// Default capacity of the render-node cache (entry count).
pub const DEFAULT_MAX_CACHED_NODES: usize = 200;

/// Minimum node cache capacity.
pub const MIN_MAX_CACHED_NODES: usize = 16;

/// Maximum node cache capacity.
pub const MAX_MAX_CACHED_NODES: usize = 2048;

/// Default capacity of the decoded-image cache (entry count).
pub const DEFAULT_MAX_CACHED_IMAGES: usize = 50;

/// Minimum image cache capacity.
pub const MIN_MAX_CACHED_IMAGES: usize = 8;

/// Maximum image cache capacity.
pub const MAX_MAX_CACHED_IMAGES: usize = 512;

/// Weight of one cached render node in the count-based usage estimate.
pub const NODE_SIZE_ESTIMATE_BYTES: usize = 32 * 1024;

/// Weight of one cached decoded image in the count-based usage estimate.
pub const IMAGE_SIZE_ESTIMATE_BYTES: usize = 512 * 1024;

// ==========================================================================
// Memory Pressure Defaults
// ==========================================================================

/// Default hard memory limit in megabytes. Usage above this triggers an
/// emergency cleanup unconditionally.
pub const DEFAULT_MEMORY_HARD_LIMIT_MB: u32 = 100;

/// Minimum hard memory limit.
pub const MIN_MEMORY_HARD_LIMIT_MB: u32 = 32;

/// Maximum hard memory limit.
pub const MAX_MEMORY_HARD_LIMIT_MB: u32 = 1024;

/// Warn threshold as a fraction of the hard limit.
pub const WARN_THRESHOLD_FRACTION: f64 = 0.8;

/// Interval between periodic memory checks while monitoring is active.
pub const DEFAULT_MEMORY_CHECK_INTERVAL_MS: u64 = 10_000;

/// Minimum memory check interval.
pub const MIN_MEMORY_CHECK_INTERVAL_MS: u64 = 1_000;

/// Maximum memory check interval.
pub const MAX_MEMORY_CHECK_INTERVAL_MS: u64 = 120_000;

/// Idle time after which a cached node is considered stale and eligible for
/// routine cleanup.
pub const DEFAULT_STALE_ENTRY_MS: u64 = 5 * 60 * 1000;

/// Consecutive warning-band checks before escalating to an aggressive
/// cleanup.
pub const WARNING_ESCALATION_BREACHES: u32 = 3;

// ==========================================================================
// Diagnostics Defaults
// ==========================================================================

/// Default capacity of the engine event buffer.
pub const DEFAULT_EVENT_BUFFER_CAPACITY: usize = 256;

/// Minimum event buffer capacity.
pub const MIN_EVENT_BUFFER_CAPACITY: usize = 16;

/// Maximum event buffer capacity.
pub const MAX_EVENT_BUFFER_CAPACITY: usize = 4096;

// ==========================================================================
// Platform Defaults
// ==========================================================================

/// Hosts with at most this much total RAM are treated as
/// resource-constrained.
pub const RESOURCE_CONSTRAINED_TOTAL_MB: u64 = 4096;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    // Gesture validation
    assert!(DEFAULT_TAP_THRESHOLD_PX > 0.0);
    assert!(DEFAULT_PAN_THRESHOLD_PX > 0.0);
    assert!(DEFAULT_TAP_DURATION_MS > 0);
    assert!(DEFAULT_DOUBLE_TAP_DELAY_MS > 0);
    assert!(DEFAULT_MAX_TOUCH_POINTS >= 2);

    // Culling validation
    assert!(DEFAULT_VIEWPORT_PADDING_PX >= MIN_VIEWPORT_PADDING_PX);
    assert!(DEFAULT_VIEWPORT_PADDING_PX <= MAX_VIEWPORT_PADDING_PX);
    assert!(MIN_GRID_CELL_SIZE > 0.0);
    assert!(MAX_GRID_CELL_SIZE >= MIN_GRID_CELL_SIZE);
    assert!(DEFAULT_GRID_CELL_SIZE >= MIN_GRID_CELL_SIZE);
    assert!(DEFAULT_GRID_CELL_SIZE <= MAX_GRID_CELL_SIZE);
    assert!(DEFAULT_REBUILD_TRANSLATION_PX > 0.0);
    assert!(DEFAULT_REBUILD_SCALE_DELTA > 0.0);

    // Cache validation
    assert!(MIN_MAX_CACHED_NODES > 0);
    assert!(MAX_MAX_CACHED_NODES >= MIN_MAX_CACHED_NODES);
    assert!(DEFAULT_MAX_CACHED_NODES >= MIN_MAX_CACHED_NODES);
    assert!(DEFAULT_MAX_CACHED_NODES <= MAX_MAX_CACHED_NODES);
    assert!(MIN_MAX_CACHED_IMAGES > 0);
    assert!(MAX_MAX_CACHED_IMAGES >= MIN_MAX_CACHED_IMAGES);
    assert!(DEFAULT_MAX_CACHED_IMAGES >= MIN_MAX_CACHED_IMAGES);
    assert!(DEFAULT_MAX_CACHED_IMAGES <= MAX_MAX_CACHED_IMAGES);
    assert!(NODE_SIZE_ESTIMATE_BYTES > 0);
    assert!(IMAGE_SIZE_ESTIMATE_BYTES > 0);

    // Memory validation
    assert!(MIN_MEMORY_HARD_LIMIT_MB > 0);
    assert!(MAX_MEMORY_HARD_LIMIT_MB >= MIN_MEMORY_HARD_LIMIT_MB);
    assert!(DEFAULT_MEMORY_HARD_LIMIT_MB >= MIN_MEMORY_HARD_LIMIT_MB);
    assert!(DEFAULT_MEMORY_HARD_LIMIT_MB <= MAX_MEMORY_HARD_LIMIT_MB);
    assert!(WARN_THRESHOLD_FRACTION > 0.0);
    assert!(WARN_THRESHOLD_FRACTION < 1.0);
    assert!(MIN_MEMORY_CHECK_INTERVAL_MS > 0);
    assert!(MAX_MEMORY_CHECK_INTERVAL_MS >= MIN_MEMORY_CHECK_INTERVAL_MS);
    assert!(DEFAULT_MEMORY_CHECK_INTERVAL_MS >= MIN_MEMORY_CHECK_INTERVAL_MS);
    assert!(DEFAULT_MEMORY_CHECK_INTERVAL_MS <= MAX_MEMORY_CHECK_INTERVAL_MS);
    assert!(DEFAULT_STALE_ENTRY_MS > 0);
    assert!(WARNING_ESCALATION_BREACHES > 1);

    // Diagnostics validation
    assert!(MIN_EVENT_BUFFER_CAPACITY > 0);
    assert!(MAX_EVENT_BUFFER_CAPACITY >= MIN_EVENT_BUFFER_CAPACITY);
    assert!(DEFAULT_EVENT_BUFFER_CAPACITY >= MIN_EVENT_BUFFER_CAPACITY);
    assert!(DEFAULT_EVENT_BUFFER_CAPACITY <= MAX_EVENT_BUFFER_CAPACITY);
};
