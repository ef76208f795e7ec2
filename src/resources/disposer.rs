//! Resource Disposer
//!
//! Releases everything a retired [`AssetInstance`] owns on the GPU side:
//! geometry buffers, then for every material (multi-material meshes included)
//! its texture maps followed by the material itself.
//!
//! Release is idempotent. A second call on the same instance, or on handles
//! already released through another path, neither faults nor moves the
//! registry counters.

use std::sync::Arc;

use crate::assets::AssetInstance;
use crate::resources::registry::GpuResourceRegistry;

/// What a single [`ResourceDisposer::release`] call actually freed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub geometries: usize,
    pub textures: usize,
    pub materials: usize,
}

impl ReleaseReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometries == 0 && self.textures == 0 && self.materials == 0
    }
}

#[derive(Clone)]
pub struct ResourceDisposer {
    registry: Arc<GpuResourceRegistry>,
}

impl ResourceDisposer {
    #[must_use]
    pub fn new(registry: Arc<GpuResourceRegistry>) -> Self {
        Self { registry }
    }

    /// Walks the instance's scene graph and releases its GPU resources.
    pub fn release(&self, instance: &mut AssetInstance) -> ReleaseReport {
        if instance.is_released() {
            log::debug!("Asset {} instance already released", instance.asset());
            return ReleaseReport::default();
        }

        let mut report = ReleaseReport::default();
        instance.root.visit(&mut |node| {
            let Some(mesh) = &node.mesh else {
                return;
            };
            if self.registry.release_geometry(mesh.geometry) {
                report.geometries += 1;
            }
            for material in &mesh.materials {
                for &map in &material.maps {
                    if self.registry.release_texture(map) {
                        report.textures += 1;
                    }
                }
                if self.registry.release_material(material.material) {
                    report.materials += 1;
                }
            }
        });
        instance.mark_released();

        log::debug!(
            "Released asset {}: {} geometries, {} textures, {} materials",
            instance.asset(),
            report.geometries,
            report.textures,
            report.materials
        );
        report
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<GpuResourceRegistry> {
        &self.registry
    }
}
