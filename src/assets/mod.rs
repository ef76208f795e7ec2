//! Asset Module
//!
//! Resolves logical asset ids to renderable instances:
//!
//! - [`AssetCatalog`]: the fixed, ordered descriptor list
//! - [`AssetDecoder`]: the external codec seam (primary / fallback paths)
//! - [`AssetLoader`]: cache, in-flight coalescing, fallback and timeout
//! - [`AssetTemplate`] / [`AssetInstance`]: cached decode result and the
//!   exclusively-owned clones handed to the scene

pub mod catalog;
pub mod decoder;
pub mod instance;
pub mod loader;
pub mod model;

pub use catalog::{AssetCatalog, AssetDescriptor, AssetId};
pub use decoder::{AssetDecoder, DecodeError, DecodeOptions, LoadProgress, ProgressListener};
pub use instance::{
    AssetInstance, AssetTemplate, InstanceNode, InstanceOrigin, MaterialInstance, MeshInstance,
};
pub use loader::{AssetLoader, LoadState, LoaderOptions, PreloadReport};
pub use model::{
    MaterialDescription, MeshDescription, ModelDescription, NodeDescription, TextureDescription,
};
