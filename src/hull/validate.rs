//! Half-edge invariant checks.
//!
//! The builder debug-asserts these after every successful build; embedding
//! programs are expected to run [`Hull::validate`] on every hull they
//! construct before handing it to queries.

use thiserror::Error;

use super::Hull;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
  /// `twin(twin(e)) != e` or twins are not stored in adjacent slots.
  #[error("half-edge {edge} breaks twin pairing")]
  TwinPairing { edge: i32 },

  /// `next(prev(e)) != e` or `prev(next(e)) != e`.
  #[error("half-edge {edge} has inconsistent prev/next links")]
  BrokenLink { edge: i32 },

  /// Walking `next` around the face does not return to the first edge, or
  /// visits an edge of another face.
  #[error("face {face} is not a closed ring")]
  OpenFaceRing { face: i32 },

  /// `origin(e) == origin(twin(e))`.
  #[error("half-edge {edge} has zero extent")]
  ZeroLengthEdge { edge: i32 },

  /// Edge references a face outside `[0, F)`.
  #[error("half-edge {edge} references face {face} out of range")]
  FaceOutOfRange { edge: i32, face: i32 },

  /// A vertex is not the origin of any half-edge.
  #[error("vertex {vertex} is unreferenced")]
  UnreferencedVertex { vertex: i32 },

  /// Edge references a vertex outside `[0, V)`.
  #[error("half-edge {edge} has an out-of-range origin")]
  OriginOutOfRange { edge: i32 },

  /// Some edge was never reached by any face ring walk.
  #[error("half-edge {edge} belongs to no face ring")]
  UnreachableEdge { edge: i32 },

  /// A face vertex lies off the face's supporting plane.
  #[error("face {face} has a vertex off its plane")]
  PlaneDeviation { face: i32 },
}

impl Hull {
  /// Check every half-edge invariant. O(V + E + F).
  pub fn validate(&self) -> Result<(), ValidationError> {
    let edge_count = self.edge_count() as i32;
    let face_count = self.face_count() as i32;

    let in_range = |id: i32| (0..edge_count).contains(&id);
    for e in 0..edge_count {
      let edge = self.edge(e);
      if !in_range(edge.twin) || edge.twin != (e ^ 1) || self.edge(edge.twin).twin != e {
        return Err(ValidationError::TwinPairing { edge: e });
      }
      if !in_range(edge.prev) || !in_range(edge.next) {
        return Err(ValidationError::BrokenLink { edge: e });
      }
      if edge.origin < 0 || edge.origin >= self.vertex_count() as i32 {
        return Err(ValidationError::OriginOutOfRange { edge: e });
      }
      if self.edge(edge.prev).next != e || self.edge(edge.next).prev != e {
        return Err(ValidationError::BrokenLink { edge: e });
      }
      if edge.origin == self.edge(edge.twin).origin {
        return Err(ValidationError::ZeroLengthEdge { edge: e });
      }
      if edge.face < 0 || edge.face >= face_count {
        return Err(ValidationError::FaceOutOfRange {
          edge: e,
          face: edge.face,
        });
      }
    }

    // Each face ring must close on itself, stay on its own face, and the
    // rings together must cover every edge exactly once.
    let mut visited = vec![false; self.edge_count()];
    for f in 0..face_count {
      let first = self.face(f).first_edge;
      let mut current = first;
      let mut steps = 0;
      loop {
        if self.edge(current).face != f || visited[current as usize] {
          return Err(ValidationError::OpenFaceRing { face: f });
        }
        visited[current as usize] = true;
        current = self.edge(current).next;
        steps += 1;
        if current == first {
          break;
        }
        if steps > edge_count {
          return Err(ValidationError::OpenFaceRing { face: f });
        }
      }
    }
    if let Some(e) = visited.iter().position(|&v| !v) {
      return Err(ValidationError::UnreachableEdge { edge: e as i32 });
    }

    // No vertex may be unreferenced.
    let mut origin_seen = vec![false; self.vertex_count()];
    for e in 0..edge_count {
      origin_seen[self.edge(e).origin as usize] = true;
    }
    if let Some(v) = origin_seen.iter().position(|&seen| !seen) {
      return Err(ValidationError::UnreferencedVertex { vertex: v as i32 });
    }

    // Every vertex of a face sits on the face's plane, within a tolerance
    // scaled by the hull's extent.
    let extent = self.local_aabb().size().max_element().max(1.0);
    let tol = 1e-4 * extent;
    for f in 0..face_count {
      let plane = self.plane(f);
      for e in self.face_edges(f) {
        let v = self.vertex(self.edge(e).origin);
        if plane.signed_distance(v).abs() > tol {
          return Err(ValidationError::PlaneDeviation { face: f });
        }
      }
    }

    Ok(())
  }
}
