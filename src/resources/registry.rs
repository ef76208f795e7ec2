//! GPU Resource Registry
//!
//! Every geometry buffer, material and texture map uploaded for an asset
//! instance is represented by a strongly-typed slotmap handle issued here.
//! Releasing a handle removes its record; releasing it again is a no-op and
//! leaves the counters untouched.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

// Strongly-typed handles
new_key_type! {
    pub struct GeometryHandle;
    pub struct MaterialHandle;
    pub struct TextureHandle;
}

/// Material slot a texture map is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapSlot {
    BaseColor,
    Normal,
    MetallicRoughness,
    Emissive,
    Occlusion,
}

#[derive(Debug)]
struct GeometryRecord {
    label: String,
    vertex_count: u32,
}

#[derive(Debug)]
struct MaterialRecord {
    label: String,
}

#[derive(Debug)]
struct TextureRecord {
    label: String,
    slot: MapSlot,
}

/// Per-kind resource counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
}

impl ResourceCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.geometries + self.materials + self.textures
    }
}

#[derive(Default)]
struct RegistryInner {
    geometries: SlotMap<GeometryHandle, GeometryRecord>,
    materials: SlotMap<MaterialHandle, MaterialRecord>,
    textures: SlotMap<TextureHandle, TextureRecord>,

    allocated: ResourceCounts,
    released: ResourceCounts,
}

/// Thread-safe owner of all live GPU resource records.
#[derive(Default)]
pub struct GpuResourceRegistry {
    inner: Mutex<RegistryInner>,
}

impl GpuResourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    pub fn allocate_geometry(&self, label: &str, vertex_count: u32) -> GeometryHandle {
        let mut inner = self.inner.lock();
        inner.allocated.geometries += 1;
        inner.geometries.insert(GeometryRecord {
            label: label.to_string(),
            vertex_count,
        })
    }

    pub fn allocate_material(&self, label: &str) -> MaterialHandle {
        let mut inner = self.inner.lock();
        inner.allocated.materials += 1;
        inner.materials.insert(MaterialRecord {
            label: label.to_string(),
        })
    }

    pub fn allocate_texture(&self, label: &str, slot: MapSlot) -> TextureHandle {
        let mut inner = self.inner.lock();
        inner.allocated.textures += 1;
        inner.textures.insert(TextureRecord {
            label: label.to_string(),
            slot,
        })
    }

    // ========================================================================
    // Release (idempotent)
    // ========================================================================

    /// Returns `true` if the geometry was live and is now released.
    pub fn release_geometry(&self, handle: GeometryHandle) -> bool {
        let mut inner = self.inner.lock();
        let released = inner.geometries.remove(handle).is_some();
        if released {
            inner.released.geometries += 1;
        }
        released
    }

    /// Returns `true` if the material was live and is now released.
    pub fn release_material(&self, handle: MaterialHandle) -> bool {
        let mut inner = self.inner.lock();
        let released = inner.materials.remove(handle).is_some();
        if released {
            inner.released.materials += 1;
        }
        released
    }

    /// Returns `true` if the texture was live and is now released.
    pub fn release_texture(&self, handle: TextureHandle) -> bool {
        let mut inner = self.inner.lock();
        let released = inner.textures.remove(handle).is_some();
        if released {
            inner.released.textures += 1;
        }
        released
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn is_geometry_live(&self, handle: GeometryHandle) -> bool {
        self.inner.lock().geometries.contains_key(handle)
    }

    #[must_use]
    pub fn is_material_live(&self, handle: MaterialHandle) -> bool {
        self.inner.lock().materials.contains_key(handle)
    }

    #[must_use]
    pub fn is_texture_live(&self, handle: TextureHandle) -> bool {
        self.inner.lock().textures.contains_key(handle)
    }

    /// Resources currently alive.
    #[must_use]
    pub fn live(&self) -> ResourceCounts {
        let inner = self.inner.lock();
        ResourceCounts {
            geometries: inner.geometries.len(),
            materials: inner.materials.len(),
            textures: inner.textures.len(),
        }
    }

    /// Resources allocated since creation.
    #[must_use]
    pub fn allocated(&self) -> ResourceCounts {
        self.inner.lock().allocated
    }

    /// Resources released since creation.
    #[must_use]
    pub fn released(&self) -> ResourceCounts {
        self.inner.lock().released
    }

    /// Labels of every live resource, for leak diagnostics.
    #[must_use]
    pub fn live_labels(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let geometries = inner.geometries.values().map(|g| format!("geometry:{}", g.label));
        let materials = inner.materials.values().map(|m| format!("material:{}", m.label));
        let textures = inner
            .textures
            .values()
            .map(|t| format!("texture:{}:{:?}", t.label, t.slot));
        geometries.chain(materials).chain(textures).collect()
    }

    /// Total vertex count of live geometry, a rough proxy for GPU memory use.
    #[must_use]
    pub fn live_vertex_count(&self) -> u64 {
        self.inner
            .lock()
            .geometries
            .values()
            .map(|g| u64::from(g.vertex_count))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_is_idempotent() {
        let registry = GpuResourceRegistry::new();
        let geometry = registry.allocate_geometry("body", 128);
        let texture = registry.allocate_texture("albedo", MapSlot::BaseColor);

        assert!(registry.release_geometry(geometry));
        assert!(!registry.release_geometry(geometry));
        assert!(registry.release_texture(texture));
        assert!(!registry.release_texture(texture));

        assert_eq!(registry.live().total(), 0);
        assert_eq!(registry.released().geometries, 1);
        assert_eq!(registry.released().textures, 1);
    }

    #[test]
    fn live_vertex_count_tracks_geometry() {
        let registry = GpuResourceRegistry::new();
        let a = registry.allocate_geometry("a", 100);
        registry.allocate_geometry("b", 50);
        assert_eq!(registry.live_vertex_count(), 150);
        registry.release_geometry(a);
        assert_eq!(registry.live_vertex_count(), 50);
    }
}
