//! Contact manifold construction.
//!
//! Face contacts clip the incident face of one hull against the side
//! planes of the reference face on the other, Sutherland-Hodgman style,
//! threading feature ids through every emitted vertex so an external
//! solver can match contact points across frames. Edge contacts emit the
//! single closest point between the witness edges.
//!
//! All scratch buffers are SmallVec-backed; typical faces never leave the
//! stack.

use glam::Vec3;
use smallvec::SmallVec;

use crate::hull::Hull;
use crate::sat::EdgeQuery;
use crate::transform::RigidTransform;
use crate::types::{ContactPoint, FeaturePair, Manifold, Plane};

/// Degenerate denominators below this are treated as parallel.
const DEGENERATE_EPS: f32 = 1e-10;

/// Vertex of the incident polygon moving through the clip stages.
#[derive(Clone, Copy, Debug)]
struct ClipVertex {
  position: Vec3,
  feature: FeaturePair,
}

/// Side plane of the reference face, carrying the clip edge id recorded
/// into feature pairs.
#[derive(Clone, Copy, Debug)]
struct SidePlane {
  plane: Plane,
  edge: i32,
}

type Polygon = SmallVec<[ClipVertex; 8]>;

/// Build a face contact with `ref_face` on the reference hull.
///
/// `flip` marks that the reference hull is hull B of the query; the
/// manifold normal is negated and feature halves exchanged so the result
/// always points from hull A to hull B.
pub fn face_contact(
  t_ref: &RigidTransform,
  hull_ref: &Hull,
  ref_face: i32,
  t_inc: &RigidTransform,
  hull_inc: &Hull,
  flip: bool,
) -> Option<Manifold> {
  let ref_plane = t_ref.transform_plane(&hull_ref.plane(ref_face));

  // Incident face: the face of the other hull whose normal is most
  // anti-parallel to the reference normal.
  let mut inc_face = -1;
  let mut best_dot = f32::INFINITY;
  for f in 0..hull_inc.face_count() as i32 {
    let normal = t_inc.transform_vector(hull_inc.plane(f).normal);
    let d = normal.dot(ref_plane.normal);
    if d < best_dot {
      best_dot = d;
      inc_face = f;
    }
  }

  // Side planes of the reference face, one per boundary edge, normals
  // pointing outward from the face.
  let mut sides: SmallVec<[SidePlane; 8]> = SmallVec::new();
  for e in hull_ref.face_edges(ref_face) {
    let (p, q) = hull_ref.edge_endpoints(e);
    let p = t_ref.transform_point(p);
    let q = t_ref.transform_point(q);
    let normal = (q - p).cross(ref_plane.normal).normalize();
    if !normal.is_finite() {
      return None;
    }
    sides.push(SidePlane {
      plane: Plane::new(normal, normal.dot(p)),
      edge: hull_ref.edge(e).twin,
    });
  }

  // Incident polygon in world space, seeded with incident-hull features.
  let mut polygon: Polygon = SmallVec::new();
  for e in hull_inc.face_edges(inc_face) {
    let edge = hull_inc.edge(e);
    polygon.push(ClipVertex {
      position: t_inc.transform_point(hull_inc.vertex(edge.origin)),
      feature: FeaturePair::new(-1, -1, edge.next, e),
    });
  }

  for side in &sides {
    polygon = clip_polygon(&polygon, side)?;
  }

  // Keep only points at or below the reference plane, projected onto it.
  let normal = if flip {
    -ref_plane.normal
  } else {
    ref_plane.normal
  };
  let mut manifold = Manifold::new(normal);
  for v in &polygon {
    let distance = ref_plane.signed_distance(v.position);
    if distance <= 0.0 {
      let position = v.position - distance * ref_plane.normal;
      let feature = if flip { v.feature.flip() } else { v.feature };
      manifold.push(ContactPoint::new(position, distance, feature));
    }
  }

  if manifold.is_empty() {
    None
  } else {
    Some(manifold)
  }
}

/// One Sutherland-Hodgman stage. Returns None when nothing survives.
fn clip_polygon(input: &Polygon, side: &SidePlane) -> Option<Polygon> {
  let mut output = Polygon::new();
  let mut v1 = *input.last()?;
  let mut d1 = side.plane.signed_distance(v1.position);

  for &v2 in input {
    let d2 = side.plane.signed_distance(v2.position);
    if d1 <= 0.0 && d2 <= 0.0 {
      output.push(v2);
    } else if d1 <= 0.0 && d2 > 0.0 {
      // Leaving the inside: record where the edge exits, tagged with the
      // clipping edge on the reference hull.
      output.push(ClipVertex {
        position: intersect(v1.position, v2.position, d1, d2),
        feature: FeaturePair::new(-1, side.edge, v1.feature.out_edge_b, -1),
      });
    } else if d2 <= 0.0 && d1 > 0.0 {
      // Entering the inside: record the entry point, then the vertex.
      output.push(ClipVertex {
        position: intersect(v1.position, v2.position, d1, d2),
        feature: FeaturePair::new(side.edge, -1, -1, v1.feature.out_edge_b),
      });
      output.push(v2);
    }
    v1 = v2;
    d1 = d2;
  }

  if output.is_empty() {
    None
  } else {
    Some(output)
  }
}

#[inline]
fn intersect(p1: Vec3, p2: Vec3, d1: f32, d2: f32) -> Vec3 {
  p1 + (p2 - p1) * (d1 / (d1 - d2))
}

/// Build an edge contact from the witness pair of the edge query.
///
/// Emits the midpoint of the closest points between the two segments; the
/// normal is the edge-pair cross product oriented from hull A to hull B.
pub fn edge_contact(
  t1: &RigidTransform,
  hull1: &Hull,
  t2: &RigidTransform,
  hull2: &Hull,
  query: &EdgeQuery,
) -> Option<Manifold> {
  let (p1, q1) = hull1.edge_endpoints(query.edge_a);
  let (p2, q2) = hull2.edge_endpoints(query.edge_b);
  let p1 = t1.transform_point(p1);
  let q1 = t1.transform_point(q1);
  let p2 = t2.transform_point(p2);
  let q2 = t2.transform_point(q2);

  let e1 = q1 - p1;
  let e2 = q2 - p2;
  let d1 = e1.length_squared();
  let d2 = e2.length_squared();
  let d12 = e1.dot(e2);
  let dnm = d1 * d2 - d12 * d12;
  if dnm.abs() < DEGENERATE_EPS || d2 < DEGENERATE_EPS {
    return None;
  }

  let r = p1 - p2;
  let de1p1 = e1.dot(r);
  let de2p1 = e2.dot(r);
  let f1 = ((d12 * de2p1 - de1p1 * d2) / dnm).clamp(0.0, 1.0);
  let f2 = ((d12 * f1 + de2p1) / d2).clamp(0.0, 1.0);

  let c1 = p1 + e1 * f1;
  let c2 = p2 + e2 * f2;

  let mut normal = e1.cross(e2).normalize();
  if !normal.is_finite() {
    return None;
  }
  if normal.dot(t2.translation - t1.translation) < 0.0 {
    normal = -normal;
  }

  let feature = FeaturePair::new(
    query.edge_a,
    query.edge_a ^ 1,
    query.edge_b,
    query.edge_b ^ 1,
  );
  let mut manifold = Manifold::new(normal);
  manifold.push(ContactPoint::new(
    (c1 + c2) * 0.5,
    query.distance,
    feature,
  ));
  Some(manifold)
}

#[cfg(test)]
#[path = "clip_test.rs"]
mod clip_test;
