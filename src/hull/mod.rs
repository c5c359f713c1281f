//! Convex hull represented as a half-edge mesh with face planes.
//!
//! A hull owns four parallel index-addressable arrays: vertices, faces,
//! face planes, and half-edges. All adjacency references are integer
//! indices into those arrays, so lookups are O(1), copies are trivial,
//! and destruction releases everything in one step. Twin half-edges are
//! stored in adjacent index pairs (`twin == e ^ 1`).
//!
//! Hulls are immutable after construction; any number of concurrent
//! readers is safe.
//!
//! # Module Structure
//!
//! - [`builder`]: box and indexed-triangle-mesh construction
//! - [`validate`]: half-edge invariant checks

pub mod builder;
pub mod validate;

use glam::Vec3;

use crate::aabb::Aabb;
use crate::transform::RigidTransform;
use crate::types::{Plane, Sphere};

pub use builder::{build_box, build_from_mesh, BuildError, COPLANAR_ROUND_DECIMALS};
pub use validate::ValidationError;

/// Directed edge record. Each undirected edge is two twinned half-edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HalfEdge {
  /// Previous edge around the face.
  pub prev: i32,
  /// Next edge around the face (counter-clockwise viewed from outside).
  pub next: i32,
  /// Opposite half-edge. Always `self_index ^ 1`.
  pub twin: i32,
  /// Face this half-edge borders.
  pub face: i32,
  /// Vertex this half-edge leaves from.
  pub origin: i32,
}

/// Face record: one entry edge into its ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Face {
  pub first_edge: i32,
}

/// Immutable convex polyhedron.
#[derive(Clone, Debug, PartialEq)]
pub struct Hull {
  vertices: Vec<Vec3>,
  faces: Vec<Face>,
  planes: Vec<Plane>,
  edges: Vec<HalfEdge>,
  /// Mean of the vertices; used to orient separating axes.
  centroid: Vec3,
  /// Radius of the bounding sphere about the centroid.
  radius: f32,
}

impl Hull {
  pub(crate) fn from_parts(
    vertices: Vec<Vec3>,
    faces: Vec<Face>,
    planes: Vec<Plane>,
    edges: Vec<HalfEdge>,
  ) -> Self {
    let centroid = vertices.iter().copied().sum::<Vec3>() / vertices.len().max(1) as f32;
    let radius = vertices
      .iter()
      .map(|v| v.distance(centroid))
      .fold(0.0f32, f32::max);
    Self {
      vertices,
      faces,
      planes,
      edges,
      centroid,
      radius,
    }
  }

  #[inline]
  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  #[inline]
  pub fn face_count(&self) -> usize {
    self.faces.len()
  }

  #[inline]
  pub fn edge_count(&self) -> usize {
    self.edges.len()
  }

  #[inline]
  pub fn vertex(&self, index: i32) -> Vec3 {
    self.vertices[index as usize]
  }

  #[inline]
  pub fn face(&self, index: i32) -> Face {
    self.faces[index as usize]
  }

  #[inline]
  pub fn plane(&self, index: i32) -> Plane {
    self.planes[index as usize]
  }

  #[inline]
  pub fn edge(&self, index: i32) -> HalfEdge {
    self.edges[index as usize]
  }

  #[inline]
  pub fn vertices(&self) -> &[Vec3] {
    &self.vertices
  }

  #[inline]
  pub fn centroid(&self) -> Vec3 {
    self.centroid
  }

  /// Local-space endpoints of a half-edge (origin, destination).
  #[inline]
  pub fn edge_endpoints(&self, index: i32) -> (Vec3, Vec3) {
    let edge = self.edge(index);
    let twin = self.edge(edge.twin);
    (self.vertex(edge.origin), self.vertex(twin.origin))
  }

  /// Index of the extreme vertex in `direction` (local space).
  ///
  /// Linear scan over the vertex array; hulls are small enough that
  /// hill-climbing the topology does not pay for itself.
  pub fn support(&self, direction: Vec3) -> i32 {
    let mut best = 0;
    let mut best_dot = f32::NEG_INFINITY;
    for (i, v) in self.vertices.iter().enumerate() {
      let d = direction.dot(*v);
      if d > best_dot {
        best_dot = d;
        best = i;
      }
    }
    best as i32
  }

  /// Mean of the origins around a face.
  pub fn face_centroid(&self, face: i32) -> Vec3 {
    let mut sum = Vec3::ZERO;
    let mut count = 0;
    for e in self.face_edges(face) {
      sum += self.vertex(self.edge(e).origin);
      count += 1;
    }
    sum / count.max(1) as f32
  }

  /// Iterate the half-edge ids around a face, in ring order.
  pub fn face_edges(&self, face: i32) -> FaceEdgeIter<'_> {
    let first = self.faces[face as usize].first_edge;
    FaceEdgeIter {
      hull: self,
      first,
      current: first,
      done: false,
    }
  }

  /// Local-space bounding box.
  pub fn local_aabb(&self) -> Aabb {
    Aabb::from_points(self.vertices.iter().copied())
  }

  /// World-space bounding box under a rigid transform.
  pub fn world_aabb(&self, transform: &RigidTransform) -> Aabb {
    Aabb::from_points(self.vertices.iter().map(|v| transform.transform_point(*v)))
  }

  /// World-space bounding sphere under a rigid transform.
  pub fn bounding_sphere(&self, transform: &RigidTransform) -> Sphere {
    Sphere::new(transform.transform_point(self.centroid), self.radius)
  }
}

/// Iterator over the half-edges of one face ring.
pub struct FaceEdgeIter<'a> {
  hull: &'a Hull,
  first: i32,
  current: i32,
  done: bool,
}

impl Iterator for FaceEdgeIter<'_> {
  type Item = i32;

  fn next(&mut self) -> Option<i32> {
    if self.done {
      return None;
    }
    let current = self.current;
    self.current = self.hull.edge(current).next;
    if self.current == self.first {
      self.done = true;
    }
    Some(current)
  }
}
