//! Rigid transforms (rotation + translation) positioning hulls in the world.

use glam::{EulerRot, Quat, Vec3};

use crate::types::Plane;

/// Rigid transform: rotation followed by translation. No scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidTransform {
  pub rotation: Quat,
  pub translation: Vec3,
}

impl RigidTransform {
  pub const IDENTITY: Self = Self {
    rotation: Quat::IDENTITY,
    translation: Vec3::ZERO,
  };

  pub fn new(rotation: Quat, translation: Vec3) -> Self {
    Self {
      rotation,
      translation,
    }
  }

  /// Pure translation.
  pub fn from_translation(translation: Vec3) -> Self {
    Self {
      rotation: Quat::IDENTITY,
      translation,
    }
  }

  /// Build a transform from Euler angles in degrees, applied Y-X-Z.
  ///
  /// The Y-X-Z order matches the convention the collision scenarios were
  /// authored in (yaw, then pitch, then roll).
  pub fn from_euler_deg(angles: Vec3, translation: Vec3) -> Self {
    let rotation = Quat::from_euler(
      EulerRot::YXZ,
      angles.y.to_radians(),
      angles.x.to_radians(),
      angles.z.to_radians(),
    );
    Self {
      rotation,
      translation,
    }
  }

  /// Transform a point from local space to world space.
  #[inline]
  pub fn transform_point(&self, point: Vec3) -> Vec3 {
    self.rotation * point + self.translation
  }

  /// Rotate a direction from local space to world space.
  #[inline]
  pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
    self.rotation * vector
  }

  /// Bring a world-space point into local space.
  #[inline]
  pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
    self.rotation.inverse() * (point - self.translation)
  }

  /// Bring a world-space direction into local space.
  #[inline]
  pub fn inverse_transform_vector(&self, vector: Vec3) -> Vec3 {
    self.rotation.inverse() * vector
  }

  /// Transform a supporting plane into world space.
  ///
  /// The normal rotates; the offset shifts by the projection of the
  /// translation onto the rotated normal.
  #[inline]
  pub fn transform_plane(&self, plane: &Plane) -> Plane {
    let normal = self.rotation * plane.normal;
    Plane {
      normal,
      offset: plane.offset + normal.dot(self.translation),
    }
  }

  /// Inverse transform.
  pub fn inverse(&self) -> Self {
    let inv_rot = self.rotation.inverse();
    Self {
      rotation: inv_rot,
      translation: inv_rot * -self.translation,
    }
  }

  /// Compose: apply `other` first, then `self`.
  pub fn mul_transform(&self, other: &Self) -> Self {
    Self {
      rotation: self.rotation * other.rotation,
      translation: self.rotation * other.translation + self.translation,
    }
  }
}

impl Default for RigidTransform {
  fn default() -> Self {
    Self::IDENTITY
  }
}
