//! Placement Settings & Startup Configuration
//!
//! [`PlacementSettings`] gathers every tunable of the coordinator: loader
//! deadline, optional fallback decoding, preloading, and the allowed placement
//! distance range. [`AppConfig`] bundles the settings with the fixed asset
//! descriptor list supplied at startup.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_placement::settings::{AppConfig, PlacementSettings};
//!
//! // Defaults: 30 s timeout, fallback decoding and preloading on
//! let settings = PlacementSettings::default();
//!
//! // Tighter placement range, no preloading
//! let settings = PlacementSettings {
//!     min_distance: 0.3,
//!     max_distance: 4.0,
//!     preload: false,
//!     ..Default::default()
//! };
//!
//! // Or from JSON
//! let config = AppConfig::from_json(r#"{ "assets": [{ "id": 1, "name": "Fox", "uri": "fox.glb" }] }"#)?;
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assets::AssetDescriptor;
use crate::errors::{PlacementError, Result};

// ---------------------------------------------------------------------------
// PlacementSettings
// ---------------------------------------------------------------------------

/// Longest accepted loader deadline, in seconds.
pub const MAX_LOAD_TIMEOUT_SECS: f32 = 3600.0;

const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime tunables of the placement coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    /// Deadline (seconds) raced against primary + fallback decoding.
    pub load_timeout_secs: f32,
    /// Retry a failed primary decode once without compression support.
    pub fallback_decoding: bool,
    /// Warm the cache with every descriptor at startup.
    pub preload: bool,
    /// Minimum viewer-to-surface distance accepted for a placement (meters).
    pub min_distance: f32,
    /// Maximum viewer-to-surface distance accepted for a placement (meters).
    pub max_distance: f32,
    /// Uniform scale used when no asset is attached yet.
    pub default_scale: f32,
    /// Show the debug overlay from startup.
    pub debug_overlay: bool,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            load_timeout_secs: 30.0,
            fallback_decoding: true,
            preload: true,
            min_distance: 0.5,
            max_distance: 10.0,
            default_scale: 1.0,
            debug_overlay: false,
        }
    }
}

impl PlacementSettings {
    /// Loader deadline as a [`Duration`].
    #[inline]
    #[must_use]
    pub fn load_timeout(&self) -> Duration {
        Duration::try_from_secs_f32(self.load_timeout_secs.clamp(0.0, MAX_LOAD_TIMEOUT_SECS))
            .unwrap_or(DEFAULT_LOAD_TIMEOUT)
    }

    /// Overrides the loader deadline.
    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout_secs = timeout.as_secs_f32();
        self
    }

    /// Checks internal consistency of the settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.load_timeout_secs > 0.0 && self.load_timeout_secs <= MAX_LOAD_TIMEOUT_SECS) {
            return Err(PlacementError::InvalidConfig(format!(
                "load_timeout_secs must be in (0, {MAX_LOAD_TIMEOUT_SECS}], got {}",
                self.load_timeout_secs
            )));
        }
        if !self.min_distance.is_finite() || !self.max_distance.is_finite() {
            return Err(PlacementError::InvalidConfig(format!(
                "placement range [{}, {}] must be finite",
                self.min_distance, self.max_distance
            )));
        }
        if self.min_distance < 0.0 || self.min_distance > self.max_distance {
            return Err(PlacementError::InvalidConfig(format!(
                "placement range [{}, {}] is empty or negative",
                self.min_distance, self.max_distance
            )));
        }
        if !(self.default_scale > 0.0 && self.default_scale.is_finite()) {
            return Err(PlacementError::InvalidConfig(format!(
                "default_scale must be positive, got {}",
                self.default_scale
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Everything the application needs at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: PlacementSettings,
    pub assets: Vec<AssetDescriptor>,
}

impl AppConfig {
    #[must_use]
    pub fn new(settings: PlacementSettings, assets: Vec<AssetDescriptor>) -> Self {
        Self { settings, assets }
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        if self.assets.is_empty() {
            return Err(PlacementError::EmptyCatalog);
        }
        Ok(())
    }
}
