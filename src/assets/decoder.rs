//! Decoder seam.
//!
//! Turning a compressed asset file into a [`ModelDescription`] is the job of an
//! external codec. The loader only needs the [`AssetDecoder`] contract: decode
//! with or without optional compression support, report advisory progress, and
//! either succeed or fail with a message.

use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::assets::AssetId;
use crate::assets::catalog::AssetDescriptor;
use crate::assets::model::ModelDescription;

/// Failure reported by a single decoding attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl DecodeError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Which decoding path is being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Whether optional mesh compression support may be used
    pub compression: bool,
}

impl DecodeOptions {
    /// Primary path: compression support enabled.
    #[must_use]
    pub const fn primary() -> Self {
        Self { compression: true }
    }

    /// Fallback path: plain decoding without compression support.
    #[must_use]
    pub const fn fallback() -> Self {
        Self { compression: false }
    }

    #[must_use]
    pub fn path_name(&self) -> &'static str {
        if self.compression { "primary" } else { "fallback" }
    }
}

/// Listener receiving `(asset, fraction)` progress updates.
pub type ProgressListener = Arc<dyn Fn(AssetId, f32) + Send + Sync>;

/// Progress reporter handed to a decoder. Purely advisory.
#[derive(Clone)]
pub struct LoadProgress {
    id: AssetId,
    listener: Option<ProgressListener>,
}

impl LoadProgress {
    #[must_use]
    pub fn new(id: AssetId, listener: Option<ProgressListener>) -> Self {
        Self { id, listener }
    }

    /// A reporter that only logs.
    #[must_use]
    pub fn silent(id: AssetId) -> Self {
        Self::new(id, None)
    }

    /// Reports completion as a fraction in `[0, 1]`.
    pub fn report(&self, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        log::debug!("Asset {} decode progress {:.0}%", self.id, fraction * 100.0);
        if let Some(listener) = &self.listener {
            listener(self.id, fraction);
        }
    }
}

impl std::fmt::Debug for LoadProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadProgress")
            .field("id", &self.id)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// External codec turning an asset source into a decoded model.
///
/// The returned future must be `'static`: the loader runs it on its own task so
/// a load always settles even if every caller stops waiting.
pub trait AssetDecoder: Send + Sync + 'static {
    fn decode(
        &self,
        descriptor: &AssetDescriptor,
        options: DecodeOptions,
        progress: LoadProgress,
    ) -> BoxFuture<'static, Result<ModelDescription, DecodeError>>;
}
