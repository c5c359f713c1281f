//! Core data types for convex collision queries.

use glam::Vec3;

/// Maximum number of contact points a manifold can hold.
///
/// Clipping a large incident face against a large reference face can
/// produce many vertices; points beyond this cap are dropped and callers
/// that need a reduced stable set run their own reducer.
pub const MANIFOLD_MAX_POINTS: usize = 24;

/// Edge contact is preferred only when it beats the best face distance
/// scaled by this factor (plus [`ABS_TOL`]).
pub const REL_EDGE_TOL: f32 = 0.90;

/// Hull B's face is preferred as reference only when it beats hull A's
/// face distance scaled by this factor (plus [`ABS_TOL`]). The slack keeps
/// the reference face stable between frames.
pub const REL_FACE_TOL: f32 = 0.95;

/// Absolute slack applied on top of the relative tolerances.
pub const ABS_TOL: f32 = 0.5 * 0.005;

/// Supporting plane of a face: `dot(normal, p) - offset = 0`.
///
/// Normals point outward; a positive signed distance means the point is
/// outside the face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
  /// Unit outward normal.
  pub normal: Vec3,
  /// Distance of the plane from the origin along the normal.
  pub offset: f32,
}

impl Plane {
  pub fn new(normal: Vec3, offset: f32) -> Self {
    Self { normal, offset }
  }

  /// Signed distance of a point to the plane (positive = outside).
  #[inline]
  pub fn signed_distance(&self, point: Vec3) -> f32 {
    self.normal.dot(point) - self.offset
  }

  /// Project a point onto the plane.
  #[inline]
  pub fn project(&self, point: Vec3) -> Vec3 {
    point - self.signed_distance(point) * self.normal
  }
}

/// Bounding sphere used by broad-phase shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
  pub center: Vec3,
  pub radius: f32,
}

impl Sphere {
  pub fn new(center: Vec3, radius: f32) -> Self {
    Self { center, radius }
  }

  #[inline]
  pub fn contains_point(&self, point: Vec3) -> bool {
    self.center.distance_squared(point) <= self.radius * self.radius
  }
}

/// Identifies the clipping edges that produced a contact point.
///
/// Each half is a pair of half-edge ids on one hull (-1 = no feature on
/// that side). The ids survive clipping losslessly so an external solver
/// can match contact points across frames.
///
/// Ids are stored as `i32` rather than the packed 8-bit record some
/// engines use; hulls with more than 127 edges stay representable. The
/// packed [`key`](FeaturePair::key) still truncates each id to 16 bits,
/// which the builder guarantees is enough.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeaturePair {
  pub in_edge_a: i32,
  pub out_edge_a: i32,
  pub in_edge_b: i32,
  pub out_edge_b: i32,
}

impl FeaturePair {
  /// No feature on either side.
  pub const NONE: Self = Self {
    in_edge_a: -1,
    out_edge_a: -1,
    in_edge_b: -1,
    out_edge_b: -1,
  };

  pub fn new(in_edge_a: i32, out_edge_a: i32, in_edge_b: i32, out_edge_b: i32) -> Self {
    Self {
      in_edge_a,
      out_edge_a,
      in_edge_b,
      out_edge_b,
    }
  }

  /// Exchange the hull-A and hull-B halves.
  ///
  /// Used when a manifold is reported with hulls swapped so that feature
  /// ids keep referring to the correct hull.
  #[inline]
  pub fn flip(&self) -> Self {
    Self {
      in_edge_a: self.in_edge_b,
      out_edge_a: self.out_edge_b,
      in_edge_b: self.in_edge_a,
      out_edge_b: self.out_edge_a,
    }
  }

  /// Pack the four ids into a single key for contact caching.
  ///
  /// Each id is truncated to 16 bits; -1 maps to 0xFFFF.
  #[inline]
  pub fn key(&self) -> u64 {
    ((self.in_edge_a as u64 & 0xFFFF) << 48)
      | ((self.out_edge_a as u64 & 0xFFFF) << 32)
      | ((self.in_edge_b as u64 & 0xFFFF) << 16)
      | (self.out_edge_b as u64 & 0xFFFF)
  }
}

impl Default for FeaturePair {
  fn default() -> Self {
    Self::NONE
  }
}

/// One contact point of a manifold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactPoint {
  /// Contact position in world space.
  pub position: Vec3,
  /// Signed distance along the manifold normal (<= 0 for penetration).
  pub distance: f32,
  /// Clipping edges that generated this point.
  pub feature: FeaturePair,
  /// Normal impulse accumulator for an external solver. Zero at emit time.
  pub normal_impulse: f32,
  /// Tangent impulse accumulators for an external solver. Zero at emit time.
  pub tangent_impulse: [f32; 2],
}

impl ContactPoint {
  const EMPTY: Self = Self {
    position: Vec3::ZERO,
    distance: 0.0,
    feature: FeaturePair::NONE,
    normal_impulse: 0.0,
    tangent_impulse: [0.0; 2],
  };

  pub fn new(position: Vec3, distance: f32, feature: FeaturePair) -> Self {
    Self {
      position,
      distance,
      feature,
      ..Self::EMPTY
    }
  }
}

/// Contact manifold: a shared normal plus up to
/// [`MANIFOLD_MAX_POINTS`] contact points.
///
/// The normal always points from hull A toward hull B. Points live in a
/// fixed inline buffer; pushes beyond the cap are dropped.
#[derive(Clone, Copy, Debug)]
pub struct Manifold {
  /// Unit contact normal, from hull A toward hull B.
  pub normal: Vec3,
  points: [ContactPoint; MANIFOLD_MAX_POINTS],
  len: usize,
}

impl Manifold {
  pub fn new(normal: Vec3) -> Self {
    Self {
      normal,
      points: [ContactPoint::EMPTY; MANIFOLD_MAX_POINTS],
      len: 0,
    }
  }

  /// Append a contact point. Returns false (and drops the point) when the
  /// inline buffer is full.
  pub fn push(&mut self, point: ContactPoint) -> bool {
    if self.len == MANIFOLD_MAX_POINTS {
      return false;
    }
    self.points[self.len] = point;
    self.len += 1;
    true
  }

  #[inline]
  pub fn points(&self) -> &[ContactPoint] {
    &self.points[..self.len]
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Report the manifold from the other hull's perspective: negated
  /// normal, feature pairs with their halves exchanged.
  pub fn flipped(&self) -> Self {
    let mut out = Self::new(-self.normal);
    for point in self.points() {
      out.push(ContactPoint {
        feature: point.feature.flip(),
        ..*point
      });
    }
    out
  }
}

/// Tolerances and limits for contact generation.
///
/// Defaults are the tuned values; override through the `with_*` builders
/// when an embedding needs different hysteresis behavior.
#[derive(Clone, Copy, Debug)]
pub struct CollisionConfig {
  /// Relative tolerance favoring face contact over edge contact.
  pub rel_edge_tol: f32,
  /// Relative tolerance favoring hull A's face as reference.
  pub rel_face_tol: f32,
  /// Absolute slack added to both relative comparisons.
  pub abs_tol: f32,
}

impl Default for CollisionConfig {
  fn default() -> Self {
    Self {
      rel_edge_tol: REL_EDGE_TOL,
      rel_face_tol: REL_FACE_TOL,
      abs_tol: ABS_TOL,
    }
  }
}

impl CollisionConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_rel_edge_tol(mut self, tol: f32) -> Self {
    self.rel_edge_tol = tol;
    self
  }

  pub fn with_rel_face_tol(mut self, tol: f32) -> Self {
    self.rel_face_tol = tol;
    self
  }

  pub fn with_abs_tol(mut self, tol: f32) -> Self {
    self.abs_tol = tol;
    self
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
