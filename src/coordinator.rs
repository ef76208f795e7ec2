//! Asset Slot Coordinator
//!
//! The single owner of the "current asset" slot. Every mutation of the slot,
//! whether a placement, an asset cycle, or a mode change resetting the pose, goes
//! through [`AssetSlotCoordinator`].
//!
//! # Guarantees
//!
//! - The previous instance is detached and disposed **before** the new one is
//!   attached; the scene never holds two slot instances, even transiently.
//! - At most one attach is in progress per slot. A second attach observed while
//!   the first is still waiting on the loader is dropped (coalesced), not
//!   queued.
//! - Every attach captures the slot generation. If the generation advanced
//!   while the load was pending (slot cleared or shut down), the loaded
//!   instance is disposed instead of attached.
//! - A failed load leaves the slot empty and the slot ready for a retry.
//! - While the canonical-pose lock is held (non-immersive view) every attach
//!   uses the canonical pose, including attaches that started before the lock
//!   was taken.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::animation::AnimationMixer;
use crate::assets::{AssetId, AssetInstance, AssetLoader, InstanceOrigin};
use crate::errors::Result;
use crate::resources::ResourceDisposer;
use crate::scene::{Placement, Scene, SceneStats, Transform};

/// Result of an [`AssetSlotCoordinator::attach`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The instance is attached and the slot holds it.
    Attached { id: AssetId, origin: InstanceOrigin },
    /// Another attach was already in progress; this one was dropped.
    Coalesced { pending: AssetId },
    /// The slot moved on while loading; the result was discarded.
    Superseded,
}

struct SlotEntry {
    instance: AssetInstance,
    mixer: Option<AnimationMixer>,
}

struct SlotState {
    current: Option<SlotEntry>,
    pending: Option<AssetId>,
    generation: u64,
    /// Pose of the current asset, kept across a reload of the slot
    placement: Option<Placement>,
    canonical_lock: bool,
}

/// Releases the loading flag of an attach whose future is dropped while it
/// waits on the loader.
struct PendingGuard<'a> {
    slot: &'a Mutex<SlotState>,
    generation: u64,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slot = self.slot.lock();
        if slot.generation == self.generation {
            if let Some(id) = slot.pending.take() {
                log::warn!("Attach of asset {id} cancelled while loading, slot left empty");
            }
            slot.placement = None;
        }
    }
}

pub struct AssetSlotCoordinator {
    loader: Arc<AssetLoader>,
    disposer: ResourceDisposer,
    scene: Mutex<Scene>,
    slot: Mutex<SlotState>,
    default_scale: f32,
}

impl AssetSlotCoordinator {
    /// Creates a coordinator with an empty slot and the canonical-pose lock held
    /// (the application starts in the non-immersive view).
    #[must_use]
    pub fn new(loader: Arc<AssetLoader>, default_scale: f32) -> Self {
        let disposer = ResourceDisposer::new(Arc::clone(loader.resources()));
        Self {
            loader,
            disposer,
            scene: Mutex::new(Scene::new()),
            slot: Mutex::new(SlotState {
                current: None,
                pending: None,
                generation: 0,
                placement: None,
                canonical_lock: true,
            }),
            default_scale,
        }
    }

    // ========================================================================
    // Attach
    // ========================================================================

    /// Replaces the slot content with asset `id` at `placement`.
    pub async fn attach(&self, id: AssetId, placement: Placement) -> Result<AttachOutcome> {
        let (generation, retired) = {
            let mut slot = self.slot.lock();
            if let Some(pending) = slot.pending {
                log::warn!("Attach of asset {id} dropped: asset {pending} is still loading");
                return Ok(AttachOutcome::Coalesced { pending });
            }
            slot.pending = Some(id);
            slot.generation += 1;
            (slot.generation, slot.current.take())
        };

        let mut guard = PendingGuard {
            slot: &self.slot,
            generation,
            armed: true,
        };

        if let Some(entry) = retired {
            self.retire(entry);
        }

        let loaded = self.loader.request(id).await;
        guard.armed = false;

        let mut slot = self.slot.lock();
        if slot.generation != generation {
            drop(slot);
            log::warn!("Asset {id} finished loading after the slot moved on, discarding");
            if let Ok(mut instance) = loaded {
                self.disposer.release(&mut instance);
            }
            return Ok(AttachOutcome::Superseded);
        }
        slot.pending = None;

        let mut instance = match loaded {
            Ok(instance) => instance,
            Err(err) => {
                slot.placement = None;
                log::error!("Attach of asset {id} failed, slot left empty: {err}");
                return Err(err);
            }
        };

        let placement = if slot.canonical_lock {
            placement.canonicalized()
        } else {
            placement
        };
        instance.root.transform.apply_placement(placement);

        {
            let mut scene = self.scene.lock();
            let key = scene.attach(id, instance.root.transform.clone());
            instance.set_owner(Some((scene.id(), key)));
        }

        let mixer = instance.clips().first().map(|clip| {
            log::debug!("Asset {id} playing clip '{}'", clip.name);
            AnimationMixer::playing(Arc::clone(clip))
        });

        let origin = instance.origin();
        slot.placement = Some(placement);
        slot.current = Some(SlotEntry { instance, mixer });

        log::info!(
            "Asset {id} attached at ({:.2}, {:.2}, {:.2})",
            placement.position.x,
            placement.position.y,
            placement.position.z
        );
        Ok(AttachOutcome::Attached { id, origin })
    }

    /// Detaches and disposes a retired slot entry.
    fn retire(&self, mut entry: SlotEntry) {
        if let Some((_, key)) = entry.instance.owner() {
            self.scene.lock().detach(key);
            entry.instance.set_owner(None);
        }
        if let Some(mixer) = entry.mixer.as_mut() {
            mixer.stop_all();
        }
        self.disposer.release(&mut entry.instance);
    }

    // ========================================================================
    // Pose Control
    // ========================================================================

    /// Takes the canonical-pose lock and moves the current asset to the
    /// canonical pose, keeping its scale.
    pub fn reset_to_canonical(&self) {
        let mut slot = self.slot.lock();
        slot.canonical_lock = true;
        slot.placement = slot.placement.map(Placement::canonicalized);

        if let Some(entry) = slot.current.as_mut() {
            entry.instance.root.transform.reset_to_canonical();
            if let Some((_, key)) = entry.instance.owner() {
                self.scene
                    .lock()
                    .set_transform(key, entry.instance.root.transform.clone());
            }
            log::info!("Asset {} reset to canonical pose", entry.instance.asset());
        }
    }

    /// Releases the canonical-pose lock. The current transform is left as is
    /// until the next placement.
    pub fn release_canonical_lock(&self) {
        self.slot.lock().canonical_lock = false;
    }

    // ========================================================================
    // Frame Update & Teardown
    // ========================================================================

    /// Advances the current instance's animation clock.
    pub fn update(&self, dt: f32) {
        let mut slot = self.slot.lock();
        if let Some(mixer) = slot.current.as_mut().and_then(|e| e.mixer.as_mut()) {
            mixer.update(dt);
        }
    }

    /// Empties the slot, disposing the current instance and invalidating any
    /// attach still waiting on the loader.
    pub fn clear(&self) {
        let retired = {
            let mut slot = self.slot.lock();
            slot.generation += 1;
            slot.pending = None;
            slot.placement = None;
            slot.current.take()
        };
        if let Some(entry) = retired {
            log::info!("Asset {} removed from slot", entry.instance.asset());
            self.retire(entry);
        }
    }

    /// Empties the slot and drops every cached template.
    pub fn shutdown(&self) {
        self.clear();
        self.loader.clear();
        log::info!("Asset slot shut down");
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn current_asset(&self) -> Option<AssetId> {
        self.slot
            .lock()
            .current
            .as_ref()
            .map(|e| e.instance.asset())
    }

    /// Pose of the current asset, also kept while a replacement is loading.
    #[must_use]
    pub fn current_placement(&self) -> Option<Placement> {
        self.slot.lock().placement
    }

    /// Scale to preserve for the next placement.
    #[must_use]
    pub fn current_scale(&self) -> glam::Vec3 {
        self.current_placement()
            .map_or_else(|| glam::Vec3::splat(self.default_scale), |p| p.scale)
    }

    #[must_use]
    pub fn pending(&self) -> Option<AssetId> {
        self.slot.lock().pending
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending().is_some()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.slot.lock().generation
    }

    #[must_use]
    pub fn is_canonical_locked(&self) -> bool {
        self.slot.lock().canonical_lock
    }

    /// Elapsed animation time of the current instance, if it animates.
    #[must_use]
    pub fn animation_elapsed(&self) -> Option<std::time::Duration> {
        let slot = self.slot.lock();
        slot.current
            .as_ref()
            .and_then(|e| e.mixer.as_ref())
            .map(|m| m.clock().elapsed)
    }

    /// Transform of the current instance's root as attached in the scene.
    #[must_use]
    pub fn current_transform(&self) -> Option<Transform> {
        let slot = self.slot.lock();
        let key = slot.current.as_ref()?.instance.owner()?.1;
        self.scene.lock().get(key).map(|m| m.transform.clone())
    }

    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.scene.lock().attached_count()
    }

    #[must_use]
    pub fn scene_stats(&self) -> SceneStats {
        self.scene.lock().stats()
    }

    #[must_use]
    pub fn loader(&self) -> &Arc<AssetLoader> {
        &self.loader
    }

    #[must_use]
    pub fn default_scale(&self) -> f32 {
        self.default_scale
    }
}

impl Drop for AssetSlotCoordinator {
    fn drop(&mut self) {
        self.clear();
    }
}
