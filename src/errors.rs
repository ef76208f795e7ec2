//! Error Types
//!
//! This module defines the error type shared by every placement subsystem.
//!
//! # Overview
//!
//! [`PlacementError`] covers the failure modes of the coordinator:
//! - Immersive capability missing or session start refused
//! - Asset decoding failures and load timeouts
//! - Placement candidates outside the allowed distance range
//! - Per-frame hit-test processing errors
//! - Configuration problems detected at startup
//!
//! Per-frame and per-interaction errors are contained by the caller and turned
//! into status text; none of them is fatal to the frame loop.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, PlacementError>`.
//!
//! ```rust,ignore
//! use myth_placement::errors::{PlacementError, Result};
//!
//! fn check(distance: f32) -> Result<()> {
//!     if distance < 0.5 {
//!         return Err(PlacementError::PlacementOutOfRange { distance, min: 0.5, max: 10.0 });
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::assets::AssetId;

/// The main error type for the placement coordinator.
///
/// The type is `Clone` so that a single load outcome can be handed to every
/// caller awaiting the same in-flight request.
#[derive(Error, Debug, Clone)]
pub enum PlacementError {
    // ========================================================================
    // Session & Capability Errors
    // ========================================================================
    /// Immersive surface tracking is not available on this device.
    #[error("Immersive mode unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The environment refused or failed to start a session.
    #[error("Session error: {0}")]
    Session(String),

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// Both the primary and the fallback decoding paths failed.
    #[error("Failed to decode asset {id}: primary path: {primary}; fallback path: {fallback}")]
    DecodeFailure {
        /// The asset that failed to decode
        id: AssetId,
        /// Failure reported by the primary (compression-aware) path
        primary: String,
        /// Failure reported by the fallback path, or `"disabled"`
        fallback: String,
    },

    /// Decoding did not finish before the loader deadline.
    #[error("Loading asset {id} timed out after {after:?}")]
    Timeout {
        /// The asset whose load timed out
        id: AssetId,
        /// The deadline that elapsed
        after: Duration,
    },

    /// The requested asset id has no descriptor.
    #[error("Unknown asset id: {0}")]
    UnknownAsset(AssetId),

    /// The asset catalog has no descriptors.
    #[error("Asset catalog is empty")]
    EmptyCatalog,

    // ========================================================================
    // Interaction Errors
    // ========================================================================
    /// The placement candidate is too near or too far from the viewer.
    #[error("Placement distance {distance:.2} m is outside the allowed range [{min:.2}, {max:.2}]")]
    PlacementOutOfRange {
        /// Distance between viewer and candidate
        distance: f32,
        /// Minimum allowed distance
        min: f32,
        /// Maximum allowed distance
        max: f32,
    },

    /// Hit-test processing failed for the current frame.
    #[error("Frame processing error: {0}")]
    FrameProcessing(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Startup configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(Arc<serde_json::Error>),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),
}

impl PlacementError {
    /// Returns `true` for load failures that a later request may recover from.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DecodeFailure { .. } | Self::Timeout { .. })
    }

    /// Returns `true` for purely advisory rejections that never touched any state.
    #[must_use]
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            Self::PlacementOutOfRange { .. } | Self::CapabilityUnavailable(_)
        )
    }
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<serde_json::Error> for PlacementError {
    fn from(err: serde_json::Error) -> Self {
        PlacementError::Json(Arc::new(err))
    }
}

impl From<std::io::Error> for PlacementError {
    fn from(err: std::io::Error) -> Self {
        PlacementError::Io(Arc::new(err))
    }
}

/// Alias for `Result<T, PlacementError>`.
pub type Result<T> = std::result::Result<T, PlacementError>;
