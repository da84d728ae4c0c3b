// SPDX-License-Identifier: MPL-2.0
//! `plan_canvas` keeps large interactive plan canvases responsive on
//! mobile devices.
//!
//! It combines a spatial-index-accelerated viewport culler, a tiered
//! resource cache with memory-pressure monitoring, and a multi-touch
//! gesture recognizer, composed behind a single configuration by
//! [`engine::CanvasEngine`]. The host render loop asks the engine for the
//! visible item subset each frame, caches heavy render artifacts through
//! it, and forwards raw touch events to the recognizer.

#![doc(html_root_url = "https://docs.rs/plan_canvas/0.2.0")]

pub mod cache;
pub mod config;
pub mod culler;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod port;

#[cfg(test)]
mod test_utils;
