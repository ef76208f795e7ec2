//! GPU-side resource ownership.
//!
//! - [`GpuResourceRegistry`]: issues and tracks geometry, material and texture handles
//! - [`ResourceDisposer`]: walks a retired instance and releases everything it owns

pub mod disposer;
pub mod registry;

pub use disposer::{ReleaseReport, ResourceDisposer};
pub use registry::{
    GeometryHandle, GpuResourceRegistry, MapSlot, MaterialHandle, ResourceCounts, TextureHandle,
};
