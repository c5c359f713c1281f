//! Separating-axis queries between two transformed hulls.
//!
//! Two query families: face distance (every face plane of one hull as a
//! candidate axis) and edge distance (cross products of edge direction
//! pairs, pruned by a Gauss-map arc test). Both return the *maximum*
//! signed separation over their candidate axes together with the witness
//! features, so a positive result proves the hulls disjoint and the
//! least-negative result picks the contact features.

use glam::Vec3;

use crate::hull::Hull;
use crate::transform::RigidTransform;

/// Near-parallel edge pairs produce a degenerate cross product and are
/// treated as non-separating.
const PARALLEL_AXIS_EPS: f32 = 1e-10;

/// Result of the face-distance query: witness face and signed separation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceQuery {
  pub face: i32,
  pub distance: f32,
}

/// Result of the edge-distance query: witness edge pair and signed
/// separation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeQuery {
  pub edge_a: i32,
  pub edge_b: i32,
  pub distance: f32,
}

/// Maximum signed distance of `hull2` below the face planes of `hull1`.
///
/// Positive iff some face of `hull1` separates the hulls. The witness is
/// the face achieving the maximum.
pub fn query_face_distance(
  t1: &RigidTransform,
  hull1: &Hull,
  t2: &RigidTransform,
  hull2: &Hull,
) -> FaceQuery {
  let mut best = FaceQuery {
    face: -1,
    distance: f32::NEG_INFINITY,
  };
  for face in 0..hull1.face_count() as i32 {
    let plane = t1.transform_plane(&hull1.plane(face));
    // Deepest vertex of hull2 against this plane.
    let support_dir = t2.inverse_transform_vector(-plane.normal);
    let support = hull2.vertex(hull2.support(support_dir));
    let distance = plane.signed_distance(t2.transform_point(support));
    if distance > best.distance {
      best = FaceQuery { face, distance };
    }
  }
  best
}

/// Maximum signed separation over cross-product axes of edge pairs.
///
/// Iterates undirected edges (twin pairs, stride 2) of both hulls. Pairs
/// whose Gauss-map arcs do not cross cannot form a supporting axis and
/// are skipped; so are near-parallel pairs.
pub fn query_edge_distance(
  t1: &RigidTransform,
  hull1: &Hull,
  t2: &RigidTransform,
  hull2: &Hull,
) -> EdgeQuery {
  let centroid1 = t1.transform_point(hull1.centroid());
  let mut best = EdgeQuery {
    edge_a: -1,
    edge_b: -1,
    distance: f32::NEG_INFINITY,
  };

  for edge_a in (0..hull1.edge_count() as i32).step_by(2) {
    let e1 = hull1.edge(edge_a);
    let twin1 = hull1.edge(e1.twin);
    let p1 = t1.transform_point(hull1.vertex(e1.origin));
    let q1 = t1.transform_point(hull1.vertex(twin1.origin));
    let dir1 = q1 - p1;
    let a = t1.transform_vector(hull1.plane(e1.face).normal);
    let b = t1.transform_vector(hull1.plane(twin1.face).normal);

    for edge_b in (0..hull2.edge_count() as i32).step_by(2) {
      let e2 = hull2.edge(edge_b);
      let twin2 = hull2.edge(e2.twin);
      let c = t2.transform_vector(hull2.plane(e2.face).normal);
      let d = t2.transform_vector(hull2.plane(twin2.face).normal);

      if !arcs_cross(a, b, c, d) {
        continue;
      }

      let p2 = t2.transform_point(hull2.vertex(e2.origin));
      let q2 = t2.transform_point(hull2.vertex(twin2.origin));
      let dir2 = q2 - p2;

      let axis = dir1.cross(dir2);
      let len_sq = axis.length_squared();
      if len_sq < PARALLEL_AXIS_EPS * dir1.length_squared() * dir2.length_squared() {
        continue;
      }
      let mut axis = axis / len_sq.sqrt();
      // Orient the axis outward from hull1.
      if axis.dot(p1 - centroid1) < 0.0 {
        axis = -axis;
      }
      // The axis is perpendicular to both edges, so any point of each
      // line measures the same separation.
      let distance = axis.dot(p2 - p1);
      if distance > best.distance {
        best = EdgeQuery {
          edge_a,
          edge_b,
          distance,
        };
      }
    }
  }
  best
}

/// Gauss-map prune: the arcs spanned by the two face normals of each edge
/// must cross for the edge pair to define a supporting axis.
#[inline]
fn arcs_cross(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> bool {
  a.dot(d) * b.dot(d) < 0.0 && c.dot(b) * c.dot(a) < 0.0
}

#[cfg(test)]
#[path = "sat_test.rs"]
mod sat_test;
