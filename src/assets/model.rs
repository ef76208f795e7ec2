//! CPU-side decoded model description.
//!
//! This is what a decoder hands back: a node tree with optional meshes and the
//! animation clips. Nothing here owns GPU resources; uploading happens when a
//! template is instantiated.

use serde::{Deserialize, Serialize};

use crate::animation::AnimationClip;
use crate::resources::MapSlot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureDescription {
    pub label: String,
    pub slot: MapSlot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescription {
    pub name: String,
    #[serde(default)]
    pub maps: Vec<TextureDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDescription {
    pub geometry: String,
    pub vertex_count: u32,
    /// One entry per primitive group; more than one means a multi-material mesh
    pub materials: Vec<MaterialDescription>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    #[serde(default)]
    pub mesh: Option<MeshDescription>,
    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

impl NodeDescription {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: MeshDescription) -> Self {
        self.mesh = Some(mesh);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: NodeDescription) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree carrying a mesh.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        usize::from(self.mesh.is_some())
            + self.children.iter().map(NodeDescription::mesh_count).sum::<usize>()
    }
}

/// Decoded scene + animation clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    pub root: NodeDescription,
    #[serde(default)]
    pub clips: Vec<AnimationClip>,
}

impl ModelDescription {
    #[must_use]
    pub fn new(root: NodeDescription) -> Self {
        Self {
            root,
            clips: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_clip(mut self, clip: AnimationClip) -> Self {
        self.clips.push(clip);
        self
    }
}
