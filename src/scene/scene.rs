use std::sync::atomic::{AtomicU32, Ordering};

use slotmap::{SlotMap, new_key_type};

use crate::assets::AssetId;
use crate::scene::transform::Transform;

new_key_type! {
    pub struct AttachmentKey;
}

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Identifier of a [`Scene`], stored by instances as the handle to their owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(pub u32);

/// A model root currently attached to the scene.
#[derive(Debug, Clone)]
pub struct AttachedModel {
    pub asset: AssetId,
    pub transform: Transform,
}

/// Attachment bookkeeping, used to verify the single-occupancy invariant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub attach_events: u64,
    pub detach_events: u64,
    /// Highest number of simultaneously attached models ever observed
    pub peak_attached: usize,
}

/// The scene the asset slot attaches into.
///
/// Rendering setup (camera, lights) lives with the renderer; this only tracks
/// which model roots are attached and where.
pub struct Scene {
    id: SceneId,
    attachments: SlotMap<AttachmentKey, AttachedModel>,
    stats: SceneStats,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed)),
            attachments: SlotMap::with_key(),
            stats: SceneStats::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Attaches a model root and returns its key.
    pub fn attach(&mut self, asset: AssetId, mut transform: Transform) -> AttachmentKey {
        transform.update_local_matrix();
        let key = self.attachments.insert(AttachedModel { asset, transform });
        self.stats.attach_events += 1;
        self.stats.peak_attached = self.stats.peak_attached.max(self.attachments.len());
        key
    }

    /// Detaches a model root. Unknown keys are ignored and reported as `false`.
    pub fn detach(&mut self, key: AttachmentKey) -> bool {
        if self.attachments.remove(key).is_some() {
            self.stats.detach_events += 1;
            true
        } else {
            log::warn!("Detach of unknown attachment {key:?} ignored");
            false
        }
    }

    /// Overwrites the transform of an attached model.
    pub fn set_transform(&mut self, key: AttachmentKey, mut transform: Transform) -> bool {
        match self.attachments.get_mut(key) {
            Some(model) => {
                transform.update_local_matrix();
                model.transform = transform;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, key: AttachmentKey) -> Option<&AttachedModel> {
        self.attachments.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttachmentKey, &AttachedModel)> {
        self.attachments.iter()
    }

    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.attachments.len()
    }

    #[must_use]
    pub fn stats(&self) -> SceneStats {
        self.stats
    }
}
