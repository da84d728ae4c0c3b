// SPDX-License-Identifier: MPL-2.0
//! Orchestration of the culler, cache and gesture recognizer behind one
//! configuration.
//!
//! [`CanvasEngine`] instantiates the three components from an
//! [`EngineConfig`] plus a detected [`PlatformProfile`], derives render
//! settings from the selected performance mode, and exposes a merged stats
//! snapshot and a single `destroy()`.

use serde::Serialize;

use crate::cache::{CacheConfig, CacheStats, MemoryCheckOutcome, MemoryStats, ResourceCache};
use crate::config::{EngineConfig, PerformanceMode, RESOURCE_CONSTRAINED_TOTAL_MB};
use crate::culler::{CullItem, CullStats, CullerConfig, ViewportCuller};
use crate::geometry::Rect;
use crate::gesture::{GestureConfig, GestureRecognizer};
use crate::port::Disposable;

/// What kind of host the engine is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    /// Touch-capable host; supplied by the host via configuration since a
    /// headless engine cannot probe input hardware.
    pub is_mobile: bool,
    /// Host with little total memory; derived from system introspection.
    pub resource_constrained: bool,
}

impl PlatformProfile {
    #[must_use]
    pub fn new(is_mobile: bool, resource_constrained: bool) -> Self {
        Self {
            is_mobile,
            resource_constrained,
        }
    }

    /// Detects the profile from the running system, honoring the config's
    /// `is_mobile` override.
    #[must_use]
    pub fn detect(config: &EngineConfig) -> Self {
        let mut system = sysinfo::System::new();
        system.refresh_memory();
        let total_mb = system.total_memory() / (1024 * 1024);
        Self {
            is_mobile: config.is_mobile.unwrap_or(false),
            resource_constrained: total_mb <= RESOURCE_CONSTRAINED_TOTAL_MB,
        }
    }
}

/// Rendering hints derived from performance mode and platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderSettings {
    /// Upper bound the host should apply to its device pixel ratio.
    pub max_pixel_ratio: f32,
    pub image_smoothing: bool,
    pub smoothing_quality: SmoothingQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingQuality {
    Low,
    Medium,
    High,
}

impl RenderSettings {
    #[must_use]
    pub fn derive(mode: PerformanceMode, profile: PlatformProfile) -> Self {
        match mode {
            PerformanceMode::Performance => Self {
                max_pixel_ratio: 1.0,
                image_smoothing: false,
                smoothing_quality: SmoothingQuality::Low,
            },
            PerformanceMode::Balanced => Self {
                max_pixel_ratio: if profile.is_mobile || profile.resource_constrained {
                    1.5
                } else {
                    2.0
                },
                image_smoothing: true,
                smoothing_quality: SmoothingQuality::Medium,
            },
            PerformanceMode::High => Self {
                max_pixel_ratio: 2.0,
                image_smoothing: true,
                smoothing_quality: SmoothingQuality::High,
            },
        }
    }
}

/// Merged snapshot across the composed components.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineStats {
    pub culling: CullStats,
    pub memory: Option<MemoryStats>,
    pub cache: Option<CacheStats>,
}

/// The composed optimization engine.
///
/// `N` and `I` are the host's render-node and decoded-image payload types;
/// hosts that don't cache one of them can use `()`.
pub struct CanvasEngine<N: Disposable = (), I: Disposable = ()> {
    config: EngineConfig,
    profile: PlatformProfile,
    render_settings: RenderSettings,
    culler: ViewportCuller,
    cache: Option<ResourceCache<N, I>>,
    gestures: Option<GestureRecognizer>,
    destroyed: bool,
}

impl<N: Disposable, I: Disposable> CanvasEngine<N, I> {
    /// Builds the engine, detecting the platform profile from the running
    /// system.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let profile = PlatformProfile::detect(&config);
        Self::with_profile(config, profile)
    }

    /// Builds the engine with an explicit platform profile (hosts that know
    /// better than detection, and tests).
    #[must_use]
    pub fn with_profile(config: EngineConfig, profile: PlatformProfile) -> Self {
        let render_settings = RenderSettings::derive(config.performance_mode(), profile);

        let culler = ViewportCuller::new(Self::culler_config(&config));

        let cache = config.memory_management_enabled().then(|| {
            let mut cache = ResourceCache::new(Self::cache_config(&config, profile));
            if config.performance_monitoring_enabled() {
                cache.start();
            }
            cache
        });

        let gestures = profile
            .is_mobile
            .then(|| GestureRecognizer::new(GestureConfig::default()));

        Self {
            config,
            profile,
            render_settings,
            culler,
            cache,
            gestures,
            destroyed: false,
        }
    }

    fn culler_config(config: &EngineConfig) -> CullerConfig {
        let padding_px = match config.performance_mode() {
            PerformanceMode::Performance => 50.0,
            PerformanceMode::Balanced => CullerConfig::default().padding_px,
            PerformanceMode::High => 150.0,
        };
        CullerConfig {
            enabled: config.culling_enabled(),
            max_visible_items: config.max_render_items,
            ..CullerConfig::new(padding_px, CullerConfig::default().cell_size)
        }
    }

    fn cache_config(config: &EngineConfig, profile: PlatformProfile) -> CacheConfig {
        let default_limit = CacheConfig::default().hard_limit_mb;
        let hard_limit_mb = config.max_memory_mb.unwrap_or(if profile.resource_constrained {
            default_limit / 2
        } else {
            default_limit
        });
        CacheConfig::new(hard_limit_mb)
    }

    /// Culling query against the padded viewport; see
    /// [`ViewportCuller::cull`].
    pub fn cull(&mut self, items: &mut [CullItem], viewport: Rect, scale: f32) -> Vec<usize> {
        self.culler.cull(items, viewport, scale)
    }

    #[must_use]
    pub fn culler(&mut self) -> &mut ViewportCuller {
        &mut self.culler
    }

    #[must_use]
    pub fn cache(&mut self) -> Option<&mut ResourceCache<N, I>> {
        self.cache.as_mut()
    }

    #[must_use]
    pub fn gestures(&mut self) -> Option<&mut GestureRecognizer> {
        self.gestures.as_mut()
    }

    /// Drives the periodic memory check; call at the host's own cadence
    /// (per frame is fine, checks self-throttle).
    pub fn maybe_check_memory(&mut self) -> MemoryCheckOutcome {
        self.cache
            .as_mut()
            .map_or(MemoryCheckOutcome::Skipped, ResourceCache::maybe_check)
    }

    /// Host lifecycle signal, forwarded to the memory manager.
    pub fn handle_visibility_change(&mut self, hidden: bool) {
        if let Some(cache) = self.cache.as_mut() {
            cache.handle_visibility_change(hidden);
        }
    }

    /// Host lifecycle signal, forwarded to the memory manager.
    pub fn handle_unload(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.handle_unload();
        }
    }

    /// Merged snapshot across the composed components.
    pub fn stats(&mut self) -> EngineStats {
        EngineStats {
            culling: self.culler.stats(),
            memory: self.cache.as_mut().map(ResourceCache::memory_stats),
            cache: self.cache.as_ref().map(ResourceCache::stats),
        }
    }

    #[must_use]
    pub fn render_settings(&self) -> RenderSettings {
        self.render_settings
    }

    #[must_use]
    pub fn profile(&self) -> PlatformProfile {
        self.profile
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tears down every component. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(cache) = self.cache.as_mut() {
            cache.destroy();
        }
        if let Some(gestures) = self.gestures.as_mut() {
            gestures.on_touch_cancel();
        }
        self.destroyed = true;
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
