//! Host XR runtime seam.
//!
//! The coordinator never talks to a device API directly. The embedding
//! application implements these traits on top of whatever runtime it has
//! (a browser XR binding, OpenXR, or a scripted simulator in tests).

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use glam::{Mat4, Vec3};
use thiserror::Error;

/// Identifier of one immersive session, unique for the lifetime of the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Failure reported by the host runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct XrError(pub String);

impl XrError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Entry point of the host runtime.
pub trait XrSystem: Send + Sync {
    /// Capability check for immersive surface tracking.
    fn is_immersive_supported(&self) -> BoxFuture<'_, bool>;

    /// Starts an immersive session with hit-testing enabled.
    fn request_session(&self) -> BoxFuture<'_, Result<Arc<dyn XrSession>, XrError>>;
}

/// A running immersive session.
pub trait XrSession: Send + Sync {
    fn id(&self) -> SessionId;

    /// Requests a viewer-space hit-test source for this session.
    fn request_hit_test_source(&self) -> BoxFuture<'_, Result<Arc<dyn HitTestSource>, XrError>>;

    /// Asks the runtime to end the session. Completion is reported back as a
    /// session-ended event.
    fn end(&self);
}

/// Handle to a hit-test source owned by one session.
pub trait HitTestSource: Send + Sync {
    /// Releases the source. Called when the processor drops the source.
    fn cancel(&self) {}
}

/// One candidate surface intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestResult {
    /// Pose in the local reference space, if the runtime could resolve one
    pub pose: Option<Mat4>,
}

impl HitTestResult {
    #[must_use]
    pub fn at(pose: Mat4) -> Self {
        Self { pose: Some(pose) }
    }

    #[must_use]
    pub fn unresolved() -> Self {
        Self { pose: None }
    }
}

/// Per-frame view of a session.
pub trait XrFrame {
    fn session_id(&self) -> SessionId;

    /// Position of the viewer in the local reference space.
    fn viewer_position(&self) -> Option<Vec3>;

    /// Results of `source` for this frame.
    fn hit_test_results(&self, source: &dyn HitTestSource) -> Result<Vec<HitTestResult>, XrError>;
}
