//! Public collision queries between transformed hulls.
//!
//! The overlap decision is pure SAT: two face queries and one edge query,
//! all of which must report non-separation. Contact manifolds reuse the
//! same three queries, then apply tolerance hysteresis to choose between
//! a face contact (clipping) and an edge contact.

use glam::Vec3;

use crate::clip;
use crate::hull::Hull;
use crate::sat::{query_edge_distance, query_face_distance};
use crate::transform::RigidTransform;
use crate::types::{CollisionConfig, Manifold};

/// True iff the hulls overlap.
///
/// Equivalent to `contact(..).is_some()` up to the clipping degeneracies,
/// but cheaper: it early-outs on the first separating axis found.
pub fn is_colliding(
  t1: &RigidTransform,
  hull1: &Hull,
  t2: &RigidTransform,
  hull2: &Hull,
) -> bool {
  if query_face_distance(t1, hull1, t2, hull2).distance > 0.0 {
    return false;
  }
  if query_face_distance(t2, hull2, t1, hull1).distance > 0.0 {
    return false;
  }
  query_edge_distance(t1, hull1, t2, hull2).distance <= 0.0
}

/// Build the minimum-translation contact manifold, or None when the
/// hulls are separated (or the contact is numerically degenerate).
///
/// The manifold normal points from `hull1` toward `hull2`. Face contact
/// is preferred over edge contact, and hull1's face over hull2's, each
/// with a tolerance margin so the chosen reference feature is stable
/// across consecutive nearly-identical queries.
pub fn contact(
  t1: &RigidTransform,
  hull1: &Hull,
  t2: &RigidTransform,
  hull2: &Hull,
  config: &CollisionConfig,
) -> Option<Manifold> {
  let face_a = query_face_distance(t1, hull1, t2, hull2);
  if face_a.distance > 0.0 {
    return None;
  }
  let face_b = query_face_distance(t2, hull2, t1, hull1);
  if face_b.distance > 0.0 {
    return None;
  }
  let edge = query_edge_distance(t1, hull1, t2, hull2);
  if edge.distance > 0.0 {
    return None;
  }

  let max_face = face_a.distance.max(face_b.distance);
  if edge.distance > config.rel_edge_tol * max_face + config.abs_tol {
    return clip::edge_contact(t1, hull1, t2, hull2, &edge);
  }

  if face_b.distance > config.rel_face_tol * face_a.distance + config.abs_tol {
    clip::face_contact(t2, hull2, face_b.face, t1, hull1, true)
  } else {
    clip::face_contact(t1, hull1, face_a.face, t2, hull2, false)
  }
}

/// True iff `point` lies inside (or on the boundary of) the hull.
pub fn contains_point(t: &RigidTransform, hull: &Hull, point: Vec3) -> bool {
  let local = t.inverse_transform_point(point);
  (0..hull.face_count() as i32).all(|f| hull.plane(f).signed_distance(local) <= 0.0)
}

/// Closest point on the hull to `point`, in world space.
///
/// A point inside the hull is its own closest point.
pub fn closest_point(t: &RigidTransform, hull: &Hull, point: Vec3) -> Vec3 {
  let local = t.inverse_transform_point(point);
  if (0..hull.face_count() as i32).all(|f| hull.plane(f).signed_distance(local) <= 0.0) {
    return point;
  }

  let mut best = Vec3::ZERO;
  let mut best_dist_sq = f32::INFINITY;
  for f in 0..hull.face_count() as i32 {
    let candidate = closest_point_on_face(hull, f, local);
    let dist_sq = candidate.distance_squared(local);
    if dist_sq < best_dist_sq {
      best_dist_sq = dist_sq;
      best = candidate;
    }
  }
  t.transform_point(best)
}

/// Closest point on one face polygon to a local-space point.
fn closest_point_on_face(hull: &Hull, face: i32, point: Vec3) -> Vec3 {
  let plane = hull.plane(face);
  let projected = plane.project(point);

  // Inside every edge's side plane, the projection is the answer.
  let mut inside = true;
  for e in hull.face_edges(face) {
    let (a, b) = hull.edge_endpoints(e);
    let outward = (b - a).cross(plane.normal);
    if outward.dot(projected - a) > 0.0 {
      inside = false;
      break;
    }
  }
  if inside {
    return projected;
  }

  // Otherwise the closest point lies on the face boundary.
  let mut best = Vec3::ZERO;
  let mut best_dist_sq = f32::INFINITY;
  for e in hull.face_edges(face) {
    let (a, b) = hull.edge_endpoints(e);
    let candidate = closest_point_on_segment(a, b, point);
    let dist_sq = candidate.distance_squared(point);
    if dist_sq < best_dist_sq {
      best_dist_sq = dist_sq;
      best = candidate;
    }
  }
  best
}

#[inline]
fn closest_point_on_segment(a: Vec3, b: Vec3, point: Vec3) -> Vec3 {
  let ab = b - a;
  let t = (point - a).dot(ab) / ab.length_squared().max(f32::MIN_POSITIVE);
  a + ab * t.clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "query_test.rs"]
mod query_test;
