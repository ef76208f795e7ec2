//! Placement / Interaction Controller
//!
//! Interprets one discrete "select" trigger against the current cursor and
//! slot state. The first matching branch wins:
//!
//! 1. no active immersive presentation: ignored
//! 2. cursor visible: validate the distance, then place (or move) the asset there
//! 3. an asset is attached: advance to the next catalog entry at the current pose
//! 4. otherwise: ask the user to point at a surface

use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

use crate::assets::{AssetCatalog, AssetId};
use crate::coordinator::{AssetSlotCoordinator, AttachOutcome};
use crate::errors::{PlacementError, Result};
use crate::session::{CursorPose, SessionMode};
use crate::scene::Placement;
use crate::settings::PlacementSettings;

/// Allowed viewer-to-cursor distance for a placement, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRange {
    pub min: f32,
    pub max: f32,
}

impl PlacementRange {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, distance: f32) -> Result<()> {
        if distance.is_finite() && distance >= self.min && distance <= self.max {
            Ok(())
        } else {
            Err(PlacementError::PlacementOutOfRange {
                distance,
                min: self.min,
                max: self.max,
            })
        }
    }
}

impl From<&PlacementSettings> for PlacementRange {
    fn from(settings: &PlacementSettings) -> Self {
        Self::new(settings.min_distance, settings.max_distance)
    }
}

/// Snapshot of everything a select decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct SelectContext {
    pub mode: SessionMode,
    /// An immersive session is running and presenting frames
    pub presenting: bool,
    pub cursor: CursorPose,
    pub viewer: Option<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectOutcome {
    Ignored,
    Placed { id: AssetId, distance: Option<f32> },
    Cycled { from: AssetId, to: AssetId },
    /// Nothing to place on and nothing to cycle
    NeedsSurface,
    /// An attach was already in progress
    Coalesced,
    /// The slot moved on before the attach completed
    Superseded,
}

pub struct InteractionController {
    catalog: Arc<AssetCatalog>,
    range: PlacementRange,
    selected: Mutex<AssetId>,
}

impl InteractionController {
    /// The first catalog entry starts out selected.
    #[must_use]
    pub fn new(catalog: Arc<AssetCatalog>, range: PlacementRange) -> Self {
        let first = catalog.first();
        Self {
            catalog,
            range,
            selected: Mutex::new(first),
        }
    }

    pub async fn on_select(
        &self,
        ctx: SelectContext,
        slot: &AssetSlotCoordinator,
    ) -> Result<SelectOutcome> {
        if ctx.mode != SessionMode::Immersive || !ctx.presenting {
            log::debug!("Select ignored outside an immersive presentation");
            return Ok(SelectOutcome::Ignored);
        }

        if let Some(pending) = slot.pending() {
            log::warn!("Select ignored: asset {pending} is still loading");
            return Ok(SelectOutcome::Coalesced);
        }

        if ctx.cursor.visible {
            return self.place(ctx, slot).await;
        }

        if let Some(from) = slot.current_asset() {
            let to = self.catalog.next(from).unwrap_or_else(|| self.catalog.first());
            let placement = slot
                .current_placement()
                .unwrap_or_else(|| Placement::canonical(slot.default_scale()));
            *self.selected.lock() = to;
            log::info!("Cycling asset {from} -> {to}");
            return Ok(match slot.attach(to, placement).await? {
                AttachOutcome::Attached { .. } => SelectOutcome::Cycled { from, to },
                AttachOutcome::Coalesced { .. } => SelectOutcome::Coalesced,
                AttachOutcome::Superseded => SelectOutcome::Superseded,
            });
        }

        log::info!("Select with no surface and no asset, waiting for a surface");
        Ok(SelectOutcome::NeedsSurface)
    }

    async fn place(&self, ctx: SelectContext, slot: &AssetSlotCoordinator) -> Result<SelectOutcome> {
        let target = ctx.cursor.position();
        let distance = match ctx.viewer {
            Some(viewer) => {
                let distance = viewer.distance(target);
                if let Err(err) = self.range.validate(distance) {
                    log::warn!("Placement rejected: {err}");
                    return Err(err);
                }
                Some(distance)
            }
            None => {
                log::warn!("Viewer position unknown, skipping placement distance check");
                None
            }
        };

        let placement = Placement::from_matrix(ctx.cursor.matrix, slot.current_scale());
        let id = slot.current_asset().unwrap_or_else(|| *self.selected.lock());

        Ok(match slot.attach(id, placement).await? {
            AttachOutcome::Attached { id, .. } => SelectOutcome::Placed { id, distance },
            AttachOutcome::Coalesced { .. } => SelectOutcome::Coalesced,
            AttachOutcome::Superseded => SelectOutcome::Superseded,
        })
    }

    /// Makes `id` the asset used by the next placement onto an empty slot.
    pub fn select(&self, id: AssetId) -> Result<()> {
        if !self.catalog.contains(id) {
            return Err(PlacementError::UnknownAsset(id));
        }
        *self.selected.lock() = id;
        Ok(())
    }

    #[must_use]
    pub fn selected(&self) -> AssetId {
        *self.selected.lock()
    }

    #[must_use]
    pub fn range(&self) -> PlacementRange {
        self.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds_are_inclusive() {
        let range = PlacementRange::new(0.5, 10.0);
        assert!(range.validate(0.5).is_ok());
        assert!(range.validate(5.0).is_ok());
        assert!(range.validate(10.0).is_ok());
        assert!(matches!(
            range.validate(0.1),
            Err(PlacementError::PlacementOutOfRange { .. })
        ));
        assert!(range.validate(f32::NAN).is_err());
    }
}
