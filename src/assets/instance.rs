//! Cached templates and the exclusively-owned instances produced from them.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::animation::AnimationClip;
use crate::assets::AssetId;
use crate::assets::model::{ModelDescription, NodeDescription};
use crate::resources::{GeometryHandle, GpuResourceRegistry, MaterialHandle, TextureHandle};
use crate::scene::{AttachmentKey, SceneId, Transform};

/// Immutable decoded asset kept by the loader cache.
///
/// Instances never borrow GPU resources from the template, so disposing an
/// instance cannot corrupt what later requests clone.
#[derive(Debug)]
pub struct AssetTemplate {
    id: AssetId,
    model: ModelDescription,
    clips: Vec<Arc<AnimationClip>>,
}

/// How an instance came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceOrigin {
    /// Built straight from the decode result for the request that triggered it
    Decoded,
    /// Cloned from a cached template
    Cloned,
}

impl AssetTemplate {
    #[must_use]
    pub fn new(id: AssetId, model: ModelDescription) -> Self {
        let clips = model.clips.iter().cloned().map(Arc::new).collect();
        Self { id, model, clips }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> AssetId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn model(&self) -> &ModelDescription {
        &self.model
    }

    /// Uploads a fresh copy of every GPU resource and returns the new instance.
    #[must_use]
    pub fn instantiate(&self, registry: &GpuResourceRegistry, origin: InstanceOrigin) -> AssetInstance {
        AssetInstance {
            asset: self.id,
            root: InstanceNode::build(&self.model.root, registry),
            clips: self.clips.clone(),
            origin,
            owner: None,
            released: false,
        }
    }
}

#[derive(Debug)]
pub struct MaterialInstance {
    pub material: MaterialHandle,
    pub maps: SmallVec<[TextureHandle; 4]>,
}

#[derive(Debug)]
pub struct MeshInstance {
    pub geometry: GeometryHandle,
    pub materials: SmallVec<[MaterialInstance; 1]>,
}

/// One node of an instance's scene graph.
#[derive(Debug)]
pub struct InstanceNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<MeshInstance>,
    pub children: Vec<InstanceNode>,
}

impl InstanceNode {
    fn build(desc: &NodeDescription, registry: &GpuResourceRegistry) -> Self {
        let mesh = desc.mesh.as_ref().map(|mesh| MeshInstance {
            geometry: registry.allocate_geometry(&mesh.geometry, mesh.vertex_count),
            materials: mesh
                .materials
                .iter()
                .map(|mat| MaterialInstance {
                    material: registry.allocate_material(&mat.name),
                    maps: mat
                        .maps
                        .iter()
                        .map(|map| registry.allocate_texture(&map.label, map.slot))
                        .collect(),
                })
                .collect(),
        });

        Self {
            name: desc.name.clone(),
            transform: Transform::new(),
            mesh,
            children: desc
                .children
                .iter()
                .map(|child| Self::build(child, registry))
                .collect(),
        }
    }

    /// Depth-first visit of this node and all descendants.
    pub fn visit(&self, f: &mut impl FnMut(&InstanceNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// A renderable asset owned by exactly one slot.
///
/// Not `Clone`: copies are made from the template, never from a live instance.
#[derive(Debug)]
pub struct AssetInstance {
    asset: AssetId,
    /// Scene-graph root; its transform is the placement of the whole model
    pub root: InstanceNode,
    clips: Vec<Arc<AnimationClip>>,
    origin: InstanceOrigin,
    owner: Option<(SceneId, AttachmentKey)>,
    released: bool,
}

impl AssetInstance {
    #[inline]
    #[must_use]
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    #[inline]
    #[must_use]
    pub fn clips(&self) -> &[Arc<AnimationClip>] {
        &self.clips
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> InstanceOrigin {
        self.origin
    }

    /// The scene and attachment currently holding this instance.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<(SceneId, AttachmentKey)> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<(SceneId, AttachmentKey)>) {
        self.owner = owner;
    }

    #[inline]
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) fn mark_released(&mut self) {
        self.released = true;
    }

    /// Every geometry handle in the instance, depth-first.
    #[must_use]
    pub fn geometry_handles(&self) -> Vec<GeometryHandle> {
        let mut handles = Vec::new();
        self.root.visit(&mut |node| {
            if let Some(mesh) = &node.mesh {
                handles.push(mesh.geometry);
            }
        });
        handles
    }
}
