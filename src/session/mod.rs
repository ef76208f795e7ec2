//! Immersive session handling.
//!
//! - [`environment`]: the traits the host XR runtime implements
//! - [`ModeStateMachine`]: WebView / Immersive transitions and their view effects
//! - [`HitTestProcessor`]: per-frame surface probing into a [`CursorPose`]

pub mod environment;
pub mod mode;

pub use environment::{
    HitTestResult, HitTestSource, SessionId, XrError, XrFrame, XrSession, XrSystem,
};
pub use hit_test::{CursorPose, HitTestProcessor};
pub use mode::{ModeChange, ModeStateMachine, ModeView, SessionMode};
