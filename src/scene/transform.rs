use glam::{Affine3A, Mat4, Quat, Vec3};

/// Requested pose of an attached asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Placement {
    /// Identity position and rotation with a uniform `scale`.
    #[must_use]
    pub fn canonical(scale: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(scale),
        }
    }

    /// Takes position and orientation from `matrix`, keeping `scale`.
    ///
    /// Any scale baked into the matrix (hit-test poses carry none) is dropped.
    #[must_use]
    pub fn from_matrix(matrix: Mat4, scale: Vec3) -> Self {
        let (_, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Same scale, canonical position and rotation.
    #[must_use]
    pub fn canonicalized(self) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: self.scale,
        }
    }

    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.position == Vec3::ZERO && self.rotation == Quat::IDENTITY
    }
}

/// Transform component.
///
/// Holds the node's position, rotation and scale (TRS) together with a cached
/// local matrix that is only rebuilt when one of the public fields changed.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    local_matrix: Affine3A,

    last_position: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,

            local_matrix: Affine3A::IDENTITY,

            last_position: Vec3::ZERO,
            last_rotation: Quat::IDENTITY,
            last_scale: Vec3::ONE,
            force_update: true,
        }
    }

    #[must_use]
    pub fn from_placement(placement: Placement) -> Self {
        let mut t = Self::new();
        t.apply_placement(placement);
        t
    }

    /// Rebuilds the local matrix if any TRS field changed.
    ///
    /// Returns whether the matrix changed.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale
            || self.force_update;

        if changed {
            self.local_matrix =
                Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);

            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    /// Local matrix as of the last [`update_local_matrix`](Self::update_local_matrix).
    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    #[inline]
    #[must_use]
    pub fn local_matrix_as_mat4(&self) -> Mat4 {
        Mat4::from(self.local_matrix)
    }

    pub fn apply_placement(&mut self, placement: Placement) {
        self.position = placement.position;
        self.rotation = placement.rotation;
        self.scale = placement.scale;
        self.mark_dirty();
    }

    #[must_use]
    pub fn placement(&self) -> Placement {
        Placement {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Resets position and rotation to identity, leaving scale untouched.
    pub fn reset_to_canonical(&mut self) {
        self.position = Vec3::ZERO;
        self.rotation = Quat::IDENTITY;
        self.mark_dirty();
    }

    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_from_matrix_keeps_requested_scale() {
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(3.0),
            Quat::from_rotation_y(1.0),
            Vec3::new(1.0, 0.0, -2.0),
        );
        let p = Placement::from_matrix(matrix, Vec3::splat(0.5));
        assert!(p.position.abs_diff_eq(Vec3::new(1.0, 0.0, -2.0), 1e-5));
        assert!(p.rotation.abs_diff_eq(Quat::from_rotation_y(1.0), 1e-5));
        assert_eq!(p.scale, Vec3::splat(0.5));
    }

    #[test]
    fn local_matrix_only_rebuilds_when_dirty() {
        let mut t = Transform::new();
        assert!(t.update_local_matrix());
        assert!(!t.update_local_matrix());
        t.position = Vec3::X;
        assert!(t.update_local_matrix());
        assert!(t.local_matrix().translation.abs_diff_eq(Vec3::X.into(), 1e-6));
    }

    #[test]
    fn reset_to_canonical_keeps_scale() {
        let mut t = Transform::from_placement(Placement {
            position: Vec3::new(4.0, 1.0, 2.0),
            rotation: Quat::from_rotation_x(0.3),
            scale: Vec3::splat(2.0),
        });
        t.reset_to_canonical();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::splat(2.0));
    }
}
