//! # Myth Placement
//!
//! Spatial anchoring and asset lifecycle coordination for "place a model on a
//! detected surface" viewers.
//!
//! The crate sits between a host XR runtime, an asset codec and a UI shell, and
//! keeps one promise: the single model slot never races, never leaks GPU
//! resources, and stays consistent when sessions start, end or fail mid-flight.
//!
//! ```text
//! XrFrame ──► HitTestProcessor ──► CursorPose ──► InteractionController
//!                                                        │
//!                  ModeStateMachine ──────────────► AssetSlotCoordinator
//!                                                   │              │
//!                                              AssetLoader   ResourceDisposer
//! ```
//!
//! [`ArApp`] owns all of it and accepts external input through
//! [`ArApp::dispatch`].

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod app;
pub mod assets;
pub mod coordinator;
pub mod errors;
pub mod interaction;
pub mod resources;
pub mod scene;
pub mod session;
pub mod settings;
pub mod shell;

pub use animation::{AnimationAction, AnimationClip, AnimationMixer, LoopMode};
pub use app::{AppEvent, ArApp, Command, DebugSnapshot};
pub use assets::{
    AssetCatalog, AssetDecoder, AssetDescriptor, AssetId, AssetInstance, AssetLoader, DecodeError,
    DecodeOptions, InstanceOrigin, LoadProgress, LoadState, LoaderOptions, ModelDescription,
    PreloadReport,
};
pub use coordinator::{AssetSlotCoordinator, AttachOutcome};
pub use errors::{PlacementError, Result};
pub use interaction::{InteractionController, PlacementRange, SelectContext, SelectOutcome};
pub use resources::{GpuResourceRegistry, ReleaseReport, ResourceCounts, ResourceDisposer};
pub use scene::{Placement, Scene, SceneStats, Transform};
pub use session::{
    CursorPose, HitTestResult, HitTestSource, HitTestProcessor, ModeChange, ModeStateMachine,
    ModeView, SessionId, SessionMode, XrError, XrFrame, XrSession, XrSystem,
};
pub use settings::{AppConfig, PlacementSettings};
pub use shell::{Chrome, LogShell, Shell};
