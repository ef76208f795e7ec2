//! Scene attachment model.
//!
//! - [`Transform`]: TRS component with a cached local matrix
//! - [`Placement`]: the pose requested for an attach
//! - [`Scene`]: the process-wide scene the asset slot attaches into

pub mod scene;
pub mod transform;

pub use scene::{AttachedModel, AttachmentKey, Scene, SceneId, SceneStats};
pub use transform::{Placement, Transform};
