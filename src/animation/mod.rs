//! Animation playback for attached assets.
//!
//! Each attached instance that carries clips gets its own [`AnimationMixer`]
//! driven by a per-instance [`Clock`]; the first clip starts looping as soon as
//! the instance enters the scene.

pub mod action;
pub mod clip;
pub mod clock;
pub mod mixer;

pub use action::{AnimationAction, LoopMode};
pub use clip::AnimationClip;
pub use clock::Clock;
pub use mixer::AnimationMixer;
