//! World-space bounding boxes for broad-phase filtering.
//!
//! Hulls report an [`Aabb`] per pose (see `Hull::world_aabb`); the BVH
//! stores and unions these, and candidate pairs are accepted or rejected
//! purely on box overlap before any SAT work runs.

use glam::Vec3;

/// Axis-aligned box, stored as two corners.
///
/// An interval test per axis is all the broad phase ever needs, so the
/// representation stays min/max rather than center/half-extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
  pub min: Vec3,
  pub max: Vec3,
}

impl Aabb {
  /// Box from its two corners. Debug-asserts the corners are ordered.
  pub fn new(min: Vec3, max: Vec3) -> Self {
    debug_assert!(min.cmple(max).all(), "corners out of order: {min} / {max}");
    Self { min, max }
  }

  /// The identity for [`union`](Self::union): infinite inverted corners
  /// that any encapsulated point collapses onto.
  pub fn empty() -> Self {
    Self {
      min: Vec3::INFINITY,
      max: Vec3::NEG_INFINITY,
    }
  }

  /// Box of half-size `half_extents` around `center`.
  pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
    Self {
      min: center - half_extents,
      max: center + half_extents,
    }
  }

  /// Tightest box around a point cloud (e.g. transformed hull vertices).
  pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
    let mut aabb = Self::empty();
    for p in points {
      aabb.encapsulate(p);
    }
    aabb
  }

  /// Grow just enough to cover `point`.
  #[inline]
  pub fn encapsulate(&mut self, point: Vec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  /// Tightest box covering both operands.
  #[inline]
  pub fn union(&self, other: &Aabb) -> Aabb {
    Aabb {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  /// Interval overlap on every axis. Shared boundary points count, so
  /// exactly-touching shapes stay broad-phase candidates.
  #[inline]
  pub fn overlaps(&self, other: &Aabb) -> bool {
    self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
  }

  /// Whether `other` fits entirely inside this box. Used by the BVH to
  /// decide if a moved shape still fits its leaf.
  #[inline]
  pub fn contains(&self, other: &Aabb) -> bool {
    self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
  }

  /// Whether `point` lies in the closed box.
  #[inline]
  pub fn contains_point(&self, point: Vec3) -> bool {
    self.min.cmple(point).all() && point.cmple(self.max).all()
  }

  /// Edge lengths.
  #[inline]
  pub fn size(&self) -> Vec3 {
    self.max - self.min
  }

  /// Midpoint of the two corners.
  #[inline]
  pub fn center(&self) -> Vec3 {
    (self.min + self.max) * 0.5
  }

  /// Total face area, the cost metric the tree minimises when choosing
  /// where to insert and which rotation to commit.
  #[inline]
  pub fn surface_area(&self) -> f32 {
    let s = self.size();
    2.0 * (s.x * s.y + s.y * s.z + s.z * s.x)
  }

  /// False for inverted (empty) boxes.
  pub fn is_valid(&self) -> bool {
    self.min.cmple(self.max).all()
  }
}

impl Default for Aabb {
  fn default() -> Self {
    Self::empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::hull::build_box;
  use crate::transform::RigidTransform;

  #[test]
  fn test_corner_construction() {
    let aabb = Aabb::new(Vec3::new(-0.5, -1.0, 2.0), Vec3::new(0.5, 1.0, 4.0));
    assert_eq!(aabb.center(), Vec3::new(0.0, 0.0, 3.0));
    assert_eq!(aabb.size(), Vec3::new(1.0, 2.0, 2.0));
    assert!(aabb.is_valid());
  }

  #[test]
  fn test_empty_is_union_identity() {
    let shape = Aabb::from_center_half_extents(Vec3::new(3.0, -2.0, 1.0), Vec3::splat(0.5));
    assert!(!Aabb::empty().is_valid());
    assert_eq!(Aabb::empty().union(&shape), shape);
  }

  #[test]
  fn test_encapsulate_collapses_empty_to_point() {
    let mut aabb = Aabb::empty();
    aabb.encapsulate(Vec3::new(0.2, 1.1, -0.8));
    assert_eq!(aabb.min, aabb.max);
    assert!(aabb.contains_point(Vec3::new(0.2, 1.1, -0.8)));
  }

  #[test]
  fn test_from_points_covers_hull_vertices() {
    let hull = build_box(1.0, 2.0, 0.5);
    let aabb = Aabb::from_points(hull.vertices().iter().copied());
    assert!((aabb.min - Vec3::new(-0.5, -1.0, -0.25)).length() < 1e-6);
    assert!((aabb.max - Vec3::new(0.5, 1.0, 0.25)).length() < 1e-6);
  }

  #[test]
  fn test_overlap_mirrors_box_scenarios() {
    // Two unit boxes: overlapping at an offset of 0.99 per axis,
    // disjoint at 1.01, matching the narrow-phase corner cases.
    let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));
    let near = Aabb::from_center_half_extents(Vec3::splat(0.99), Vec3::splat(0.5));
    let far = Aabb::from_center_half_extents(Vec3::splat(1.01), Vec3::splat(0.5));
    assert!(a.overlaps(&near) && near.overlaps(&a));
    assert!(!a.overlaps(&far) && !far.overlaps(&a));
  }

  #[test]
  fn test_one_separated_axis_defeats_overlap() {
    let a = Aabb::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5));
    // Generous overlap in x and z, a 0.1 gap in y.
    let b = Aabb::new(Vec3::new(-0.4, 0.6, -2.0), Vec3::new(0.4, 1.6, 2.0));
    assert!(!a.overlaps(&b));
  }

  #[test]
  fn test_touching_faces_are_candidates() {
    // Resting contact: boxes sharing the plane x = 0.5 must still be
    // handed to the narrow phase.
    let a = Aabb::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5));
    let b = Aabb::new(Vec3::new(0.5, -0.3, -0.3), Vec3::new(1.5, 0.3, 0.3));
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
  }

  #[test]
  fn test_leaf_containment_check() {
    // A leaf box keeps a shrunken or shifted-but-inside shape, loses one
    // that pokes out.
    let leaf = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(2.0));
    let inside = Aabb::from_center_half_extents(Vec3::new(1.0, -1.0, 0.5), Vec3::splat(0.5));
    let poking = Aabb::from_center_half_extents(Vec3::new(1.8, 0.0, 0.0), Vec3::splat(0.5));
    assert!(leaf.contains(&inside));
    assert!(!leaf.contains(&poking));
    assert!(!inside.contains(&leaf));
    assert!(leaf.contains(&leaf));
  }

  #[test]
  fn test_contains_point_closed_bounds() {
    let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));
    assert!(aabb.contains_point(Vec3::ZERO));
    assert!(aabb.contains_point(Vec3::new(0.5, -0.5, 0.5)));
    assert!(!aabb.contains_point(Vec3::new(0.51, 0.0, 0.0)));
  }

  #[test]
  fn test_union_grows_surface_area() {
    let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));
    let b = Aabb::from_center_half_extents(Vec3::new(4.0, 0.0, 0.0), Vec3::splat(0.5));
    let u = a.union(&b);
    assert!(u.contains(&a) && u.contains(&b));
    // 6 for each unit box; the union spans 5 x 1 x 1.
    assert!((a.surface_area() - 6.0).abs() < 1e-6);
    assert!((u.surface_area() - 22.0).abs() < 1e-6);
    assert!(u.surface_area() > a.surface_area() + b.surface_area());
  }

  #[test]
  fn test_rotated_hull_boxes_stay_conservative() {
    // A tilted hull's world box inflates, so two boxes may overlap while
    // the hulls do not; the broad phase only promises no false negatives.
    let hull = build_box(1.0, 1.0, 1.0);
    let upright = hull.world_aabb(&RigidTransform::IDENTITY);
    let tilted = hull.world_aabb(&RigidTransform::from_euler_deg(
      Vec3::new(45.0, 45.0, 45.0),
      Vec3::new(0.2, 1.34, 0.1),
    ));
    assert!(tilted.size().max_element() > 1.0);
    assert!(upright.overlaps(&tilted));
  }
}
