// SPDX-License-Identifier: MPL-2.0
//! Multi-touch gesture recognition for the plan canvas.
//!
//! Classifies raw touch-point streams into exactly one active gesture per
//! session (tap, pan, pinch, double-tap) and reports deltas, velocity and
//! pinch scale. A session spans one continuous interaction from touch-start
//! to touch-end/cancel; the classification only moves forward within a
//! session and resets atomically at the session boundary.
//!
//! Timing is taken from the timestamps the platform attaches to touch
//! points, so classification is fully deterministic and no wall clock is
//! consulted.

use crate::config::{
    DEFAULT_DOUBLE_TAP_DELAY_MS, DEFAULT_MAX_TOUCH_POINTS, DEFAULT_PAN_THRESHOLD_PX,
    DEFAULT_TAP_DURATION_MS, DEFAULT_TAP_THRESHOLD_PX,
};
use crate::geometry::{Point, Vector};

/// One raw touch point as delivered by the platform input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub x: f32,
    pub y: f32,
    pub timestamp_ms: u64,
}

impl TouchSample {
    #[must_use]
    pub fn new(x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self { x, y, timestamp_ms }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Classification of the current gesture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureKind {
    #[default]
    None,
    Tap,
    Pan,
    Pinch,
    DoubleTap,
}

/// Tunables for touch classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Maximum total displacement for a session to classify as a tap.
    pub tap_threshold_px: f32,
    /// Displacement past which a tap candidate upgrades to a pan.
    pub pan_threshold_px: f32,
    /// Maximum session duration for a tap.
    pub tap_duration_ms: u64,
    /// Window after a tap within which a second tap becomes a double-tap.
    pub double_tap_delay_ms: u64,
    /// Touch events carrying more points than this are ignored.
    pub max_touch_points: usize,
    pub enable_tap: bool,
    pub enable_pan: bool,
    pub enable_pinch: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_threshold_px: DEFAULT_TAP_THRESHOLD_PX,
            pan_threshold_px: DEFAULT_PAN_THRESHOLD_PX,
            tap_duration_ms: DEFAULT_TAP_DURATION_MS,
            double_tap_delay_ms: DEFAULT_DOUBLE_TAP_DELAY_MS,
            max_touch_points: DEFAULT_MAX_TOUCH_POINTS,
            enable_tap: true,
            enable_pan: true,
            enable_pinch: true,
        }
    }
}

/// Outcome of feeding one touch event into the recognizer.
///
/// The host maps these onto its own tap/pan/zoom handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEffect {
    /// Nothing to report for this event.
    None,
    /// A completed tap at the given position.
    Tap(Point),
    /// A completed double-tap at the given position.
    DoubleTap(Point),
    /// An in-progress pan step.
    Pan {
        /// Movement since the previous event, in px.
        delta: Vector,
        /// Instantaneous velocity in px/s.
        velocity: Vector,
    },
    /// An in-progress pinch step.
    PinchZoom {
        /// Current distance divided by the distance at pinch start.
        scale: f32,
        /// Arithmetic mean of the active touch points.
        centroid: Point,
    },
}

/// Mutable state of one gesture session.
#[derive(Debug, Clone)]
struct GestureState {
    active: bool,
    kind: GestureKind,
    start_samples: Vec<TouchSample>,
    current_samples: Vec<TouchSample>,
    velocity: Vector,
    pinch_start_distance: f32,
    pinch_scale: f32,
    start_time_ms: u64,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            active: false,
            kind: GestureKind::None,
            start_samples: Vec::new(),
            current_samples: Vec::new(),
            velocity: Vector::default(),
            pinch_start_distance: 0.0,
            pinch_scale: 1.0,
            start_time_ms: 0,
        }
    }
}

impl GestureState {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Converts touch-point streams into classified gestures.
///
/// Exactly one session is live at a time; a touch-start during an active
/// session extends that session rather than opening a second one. Malformed
/// input (empty arrays, non-finite coordinates, too many points) never
/// mutates state and never panics.
#[derive(Debug, Default)]
pub struct GestureRecognizer {
    config: GestureConfig,
    state: GestureState,
    /// Timestamp of the previous completed tap, for double-tap detection.
    /// Survives session resets; cleared after a double-tap so a stray third
    /// tap is not double-counted.
    last_tap_at: Option<u64>,
}

impl GestureRecognizer {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: GestureState::default(),
            last_tap_at: None,
        }
    }

    /// Starts or extends a gesture session.
    pub fn on_touch_start(&mut self, points: &[TouchSample]) -> GestureEffect {
        if !Self::points_are_valid(points) || points.len() > self.config.max_touch_points {
            return GestureEffect::None;
        }

        if self.state.active {
            // A new finger extends the running session. A second finger on a
            // tap candidate turns the session into a pinch with the distance
            // recorded at the moment both fingers are down.
            self.state.current_samples = points.to_vec();
            if points.len() == 2
                && self.config.enable_pinch
                && matches!(self.state.kind, GestureKind::None | GestureKind::Tap)
            {
                self.state.kind = GestureKind::Pinch;
                self.state.pinch_start_distance =
                    points[0].position().distance(points[1].position());
                self.state.pinch_scale = 1.0;
            }
            return GestureEffect::None;
        }

        self.state.reset();
        self.state.active = true;
        self.state.start_time_ms = points[0].timestamp_ms;
        self.state.start_samples = points.to_vec();
        self.state.current_samples = points.to_vec();
        match points.len() {
            1 if self.config.enable_tap => self.state.kind = GestureKind::Tap,
            2 if self.config.enable_pinch => {
                self.state.kind = GestureKind::Pinch;
                self.state.pinch_start_distance =
                    points[0].position().distance(points[1].position());
            }
            _ => {}
        }
        GestureEffect::None
    }

    /// Updates the session with moved touch points.
    pub fn on_touch_move(&mut self, points: &[TouchSample]) -> GestureEffect {
        if !self.state.active
            || !Self::points_are_valid(points)
            || points.len() > self.config.max_touch_points
        {
            return GestureEffect::None;
        }

        let previous = self.state.current_samples[0];
        let next = points[0];
        let delta = Vector::new(next.x - previous.x, next.y - previous.y);
        let dt_ms = next.timestamp_ms.saturating_sub(previous.timestamp_ms);
        let velocity = if dt_ms > 0 {
            Vector::new(
                delta.x / dt_ms as f32 * 1000.0,
                delta.y / dt_ms as f32 * 1000.0,
            )
        } else {
            Vector::default()
        };
        self.state.velocity = velocity;
        self.state.current_samples = points.to_vec();

        match self.state.kind {
            GestureKind::Tap => {
                let start = self.state.start_samples[0].position();
                let displacement = start.distance(next.position());
                if self.config.enable_pan && displacement > self.config.pan_threshold_px {
                    self.state.kind = GestureKind::Pan;
                    return GestureEffect::Pan { delta, velocity };
                }
                GestureEffect::None
            }
            GestureKind::Pan => GestureEffect::Pan { delta, velocity },
            GestureKind::Pinch => {
                if points.len() < 2 || self.state.pinch_start_distance <= 0.0 {
                    return GestureEffect::None;
                }
                let current_distance = points[0].position().distance(points[1].position());
                let scale = current_distance / self.state.pinch_start_distance;
                self.state.pinch_scale = scale;
                let centroid = Self::centroid(points);
                GestureEffect::PinchZoom { scale, centroid }
            }
            GestureKind::None | GestureKind::DoubleTap => GestureEffect::None,
        }
    }

    /// Ends the session and classifies it.
    ///
    /// `timestamp_ms` is the platform timestamp of the touch-end event.
    /// Pan and pinch sessions simply terminate; a short, stationary session
    /// classifies as a tap, or a double-tap when it lands within the
    /// double-tap window of the previous tap.
    pub fn on_touch_end(&mut self, timestamp_ms: u64) -> GestureEffect {
        if !self.state.active {
            return GestureEffect::None;
        }

        let mut effect = GestureEffect::None;
        if self.state.kind == GestureKind::Tap {
            let duration = timestamp_ms.saturating_sub(self.state.start_time_ms);
            if let (Some(start), Some(last)) = (
                self.state.start_samples.first(),
                self.state.current_samples.first(),
            ) {
                let displacement = start.position().distance(last.position());
                if duration < self.config.tap_duration_ms
                    && displacement < self.config.tap_threshold_px
                {
                    let position = last.position();
                    effect = match self.last_tap_at {
                        Some(previous)
                            if timestamp_ms.saturating_sub(previous)
                                <= self.config.double_tap_delay_ms =>
                        {
                            self.state.kind = GestureKind::DoubleTap;
                            self.last_tap_at = None;
                            GestureEffect::DoubleTap(position)
                        }
                        _ => {
                            self.last_tap_at = Some(timestamp_ms);
                            GestureEffect::Tap(position)
                        }
                    };
                }
            }
        }

        self.state.reset();
        effect
    }

    /// Aborts the session without classifying it.
    pub fn on_touch_cancel(&mut self) {
        self.state.reset();
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    #[must_use]
    pub fn kind(&self) -> GestureKind {
        self.state.kind
    }

    #[must_use]
    pub fn velocity(&self) -> Vector {
        self.state.velocity
    }

    #[must_use]
    pub fn pinch_scale(&self) -> f32 {
        self.state.pinch_scale
    }

    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    fn points_are_valid(points: &[TouchSample]) -> bool {
        !points.is_empty() && points.iter().all(|p| p.position().is_finite())
    }

    fn centroid(points: &[TouchSample]) -> Point {
        let n = points.len() as f32;
        let (sum_x, sum_y) = points
            .iter()
            .fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
        Point::new(sum_x / n, sum_y / n)
    }
}
