//! Hull construction from box extents or an indexed triangle mesh.
//!
//! The mesh path runs a fixed pipeline: coalesce vertices at a fixed
//! precision, group coplanar adjacent triangles, extract each group's
//! boundary perimeter, drop orphan vertices, then emit the half-edge
//! arrays with twins in adjacent slots. Both entry points share the same
//! assembly step, so a box is guaranteed to carry the exact topology a
//! six-quad mesh would.

use std::collections::HashMap;

use glam::Vec3;
use thiserror::Error;

use super::{Face, HalfEdge, Hull};
use crate::types::Plane;

/// Decimal places vertices and normals are rounded to before coalescing
/// and coplanarity grouping.
pub const COPLANAR_ROUND_DECIMALS: u32 = 3;

/// Mesh problems the builder reports. No partial hull is ever returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
  /// A face ended up with fewer than 3 perimeter vertices after
  /// coalescing, or its plane could not be derived.
  #[error("face {face} is degenerate after vertex coalescing")]
  DegenerateFace { face: usize },

  /// The same ordered edge appears on two faces, or a face boundary
  /// splits into multiple loops.
  #[error("edge {v0} -> {v1} is non-manifold")]
  NonManifoldEdge { v0: i32, v1: i32 },

  /// A half-edge never received its twin's face; the surface has a hole.
  #[error("half-edge {edge} has no neighbouring face; mesh is not closed")]
  UnclosedMesh { edge: i32 },

  /// Fewer than 4 distinct vertices remain after coalescing.
  #[error("mesh has {count} distinct vertices; a closed hull needs at least 4")]
  InsufficientVertices { count: usize },
}

/// Build a validated axis-aligned box hull centred at the origin.
///
/// `extents` are the full side lengths; vertices land at `±extents / 2`.
/// The result always has V=8, F=6, E=24 with outward face normals along
/// `±x, ±y, ±z`.
pub fn build_box(sx: f32, sy: f32, sz: f32) -> Hull {
  debug_assert!(
    sx > 0.0 && sy > 0.0 && sz > 0.0,
    "box extents must be positive"
  );
  let (hx, hy, hz) = (sx * 0.5, sy * 0.5, sz * 0.5);
  let vertices = vec![
    Vec3::new(-hx, -hy, -hz),
    Vec3::new(hx, -hy, -hz),
    Vec3::new(hx, hy, -hz),
    Vec3::new(-hx, hy, -hz),
    Vec3::new(-hx, -hy, hz),
    Vec3::new(hx, -hy, hz),
    Vec3::new(hx, hy, hz),
    Vec3::new(-hx, hy, hz),
  ];
  // Quads wound counter-clockwise viewed from outside: +x -x +y -y +z -z.
  let perimeters: Vec<Vec<i32>> = vec![
    vec![1, 2, 6, 5],
    vec![0, 4, 7, 3],
    vec![3, 7, 6, 2],
    vec![0, 1, 5, 4],
    vec![4, 5, 6, 7],
    vec![1, 0, 3, 2],
  ];
  assemble(vertices, &perimeters).expect("box topology is closed and manifold")
}

/// Build a validated hull from an indexed triangle mesh.
///
/// Coplanar adjacent triangles are merged into polygonal faces, so a
/// twelve-triangle box comes out with six quad faces. Inputs must
/// describe a closed 2-manifold surface.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "hull::build_from_mesh"))]
pub fn build_from_mesh(vertices: &[Vec3], indices: &[u32]) -> Result<Hull, BuildError> {
  // Coalesce vertices at fixed precision.
  let mut keyed = HashMap::new();
  let mut coalesced: Vec<Vec3> = Vec::new();
  let mut remap = Vec::with_capacity(vertices.len());
  for v in vertices {
    let rounded = round_vec(*v);
    let id = *keyed.entry(quantize(rounded)).or_insert_with(|| {
      coalesced.push(rounded);
      (coalesced.len() - 1) as i32
    });
    remap.push(id);
  }
  if coalesced.len() < 4 {
    return Err(BuildError::InsufficientVertices {
      count: coalesced.len(),
    });
  }

  // Remap triangles; a triangle collapsing under coalescing is degenerate.
  let mut triangles: Vec<[i32; 3]> = Vec::with_capacity(indices.len() / 3);
  for (t, tri) in indices.chunks_exact(3).enumerate() {
    let (a, b, c) = (
      remap[tri[0] as usize],
      remap[tri[1] as usize],
      remap[tri[2] as usize],
    );
    if a == b || b == c || c == a {
      return Err(BuildError::DegenerateFace { face: t });
    }
    triangles.push([a, b, c]);
  }

  // Group coplanar adjacent triangles: bucket by rounded normal, then
  // union-find on shared vertices within each bucket.
  let mut buckets: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
  for (t, tri) in triangles.iter().enumerate() {
    let (p1, p2, p3) = (
      coalesced[tri[0] as usize],
      coalesced[tri[1] as usize],
      coalesced[tri[2] as usize],
    );
    let normal = (p3 - p2).cross(p1 - p2).normalize();
    if !normal.is_finite() {
      return Err(BuildError::DegenerateFace { face: t });
    }
    buckets.entry(quantize(round_vec(normal))).or_default().push(t);
  }

  let mut groups: Vec<Vec<usize>> = Vec::new();
  for bucket in buckets.values() {
    let mut uf = UnionFind::new(bucket.len());
    let mut vertex_owner: HashMap<i32, usize> = HashMap::new();
    for (local, &t) in bucket.iter().enumerate() {
      for &v in &triangles[t] {
        match vertex_owner.get(&v) {
          Some(&owner) => uf.union(owner, local),
          None => {
            vertex_owner.insert(v, local);
          }
        }
      }
    }
    let mut by_root: HashMap<usize, Vec<usize>> = HashMap::new();
    for (local, &t) in bucket.iter().enumerate() {
      by_root.entry(uf.find(local)).or_default().push(t);
    }
    groups.extend(by_root.into_values());
  }

  // Extract each group's boundary perimeter.
  let mut perimeters: Vec<Vec<i32>> = Vec::with_capacity(groups.len());
  for (g, group) in groups.iter().enumerate() {
    perimeters.push(group_perimeter(g, group, &triangles)?);
  }

  // Drop orphan vertices and reindex the perimeters.
  let mut compact: HashMap<i32, i32> = HashMap::new();
  let mut kept: Vec<Vec3> = Vec::new();
  for perimeter in &mut perimeters {
    for v in perimeter.iter_mut() {
      let id = *compact.entry(*v).or_insert_with(|| {
        kept.push(coalesced[*v as usize]);
        (kept.len() - 1) as i32
      });
      *v = id;
    }
  }
  if kept.len() < 4 {
    return Err(BuildError::InsufficientVertices { count: kept.len() });
  }

  assemble(kept, &perimeters)
}

/// Collect the oriented boundary loop of one coplanar triangle group.
///
/// Every directed edge of the group's triangles is recorded; an edge that
/// appears with both orientations is interior and dropped. The survivors
/// are chained into a single cycle via their start vertex.
fn group_perimeter(
  group_index: usize,
  group: &[usize],
  triangles: &[[i32; 3]],
) -> Result<Vec<i32>, BuildError> {
  let mut directed: HashMap<(i32, i32), u32> = HashMap::new();
  for &t in group {
    let tri = triangles[t];
    for k in 0..3 {
      let pair = (tri[k], tri[(k + 1) % 3]);
      let count = directed.entry(pair).or_insert(0);
      *count += 1;
      if *count > 1 {
        return Err(BuildError::NonManifoldEdge {
          v0: pair.0,
          v1: pair.1,
        });
      }
    }
  }

  // start -> end over boundary edges only.
  let mut successor: HashMap<i32, i32> = HashMap::new();
  let mut boundary_count = 0usize;
  for (&(v0, v1), _) in &directed {
    if directed.contains_key(&(v1, v0)) {
      continue;
    }
    boundary_count += 1;
    if successor.insert(v0, v1).is_some() {
      // A vertex that starts two boundary edges means two loops touch;
      // such meshes are rejected rather than guessed at.
      return Err(BuildError::NonManifoldEdge { v0, v1 });
    }
  }
  if boundary_count < 3 {
    return Err(BuildError::DegenerateFace { face: group_index });
  }

  let start = *successor.keys().next().expect("boundary is non-empty");
  let mut perimeter = Vec::with_capacity(boundary_count);
  let mut current = start;
  loop {
    perimeter.push(current);
    current = match successor.get(&current) {
      Some(&next) => next,
      None => {
        return Err(BuildError::NonManifoldEdge {
          v0: current,
          v1: current,
        })
      }
    };
    if current == start {
      break;
    }
    if perimeter.len() > boundary_count {
      break;
    }
  }
  if perimeter.len() != boundary_count {
    // Leftover boundary edges form a second loop on the same face.
    return Err(BuildError::NonManifoldEdge { v0: start, v1: start });
  }
  Ok(perimeter)
}

/// Emit half-edges, link the rings, and derive face planes.
///
/// Shared by both entry points. Perimeters must be oriented
/// counter-clockwise viewed from outside.
fn assemble(vertices: Vec<Vec3>, perimeters: &[Vec<i32>]) -> Result<Hull, BuildError> {
  let mut edges: Vec<HalfEdge> = Vec::new();
  let mut faces: Vec<Face> = Vec::with_capacity(perimeters.len());
  let mut rings: Vec<Vec<i32>> = Vec::with_capacity(perimeters.len());
  let mut edge_map: HashMap<(i32, i32), i32> = HashMap::new();

  for (f, perimeter) in perimeters.iter().enumerate() {
    if perimeter.len() < 3 {
      return Err(BuildError::DegenerateFace { face: f });
    }
    let mut ring = Vec::with_capacity(perimeter.len());
    for k in 0..perimeter.len() {
      let v1 = perimeter[k];
      let v2 = perimeter[(k + 1) % perimeter.len()];
      match edge_map.get(&(v1, v2)).copied() {
        None => {
          // Allocate the twin pair in adjacent slots; the reverse side
          // stays open (-1) until its face comes through.
          let e12 = edges.len() as i32;
          edges.push(HalfEdge {
            prev: -1,
            next: -1,
            twin: e12 + 1,
            face: f as i32,
            origin: v1,
          });
          edges.push(HalfEdge {
            prev: -1,
            next: -1,
            twin: e12,
            face: -1,
            origin: v2,
          });
          edge_map.insert((v1, v2), e12);
          edge_map.insert((v2, v1), e12 + 1);
          ring.push(e12);
        }
        Some(e) => {
          if edges[e as usize].face != -1 {
            return Err(BuildError::NonManifoldEdge { v0: v1, v1: v2 });
          }
          edges[e as usize].face = f as i32;
          ring.push(e);
        }
      }
    }
    faces.push(Face {
      first_edge: ring[0],
    });
    rings.push(ring);
  }

  // Link prev/next within each ring.
  for ring in &rings {
    let n = ring.len();
    for k in 0..n {
      let e = ring[k] as usize;
      edges[e].next = ring[(k + 1) % n];
      edges[e].prev = ring[(k + n - 1) % n];
    }
  }

  // A hole in the surface leaves a twin's face unfilled.
  for (i, edge) in edges.iter().enumerate() {
    if edge.face == -1 {
      return Err(BuildError::UnclosedMesh { edge: i as i32 });
    }
  }

  // Face planes via Newell's method; offset from the face centroid.
  let mut planes: Vec<Plane> = Vec::with_capacity(perimeters.len());
  for (f, perimeter) in perimeters.iter().enumerate() {
    let mut normal = Vec3::ZERO;
    let mut centroid = Vec3::ZERO;
    let n = perimeter.len();
    for k in 0..n {
      let v = vertices[perimeter[k] as usize];
      let w = vertices[perimeter[(k + 1) % n] as usize];
      normal.x += (v.y - w.y) * (v.z + w.z);
      normal.y += (v.z - w.z) * (v.x + w.x);
      normal.z += (v.x - w.x) * (v.y + w.y);
      centroid += v;
    }
    let normal = normal.normalize();
    if !normal.is_finite() {
      return Err(BuildError::DegenerateFace { face: f });
    }
    centroid /= n as f32;
    planes.push(Plane::new(normal, normal.dot(centroid)));
  }

  // FeaturePair::key packs edge ids into 16-bit lanes.
  debug_assert!(edges.len() < u16::MAX as usize, "hull edge count overflows feature keys");

  let hull = Hull::from_parts(vertices, faces, planes, edges);
  debug_assert!(hull.validate().is_ok(), "{:?}", hull.validate());
  Ok(hull)
}

fn round_vec(v: Vec3) -> Vec3 {
  let scale = 10f32.powi(COPLANAR_ROUND_DECIMALS as i32);
  (v * scale).round() / scale
}

fn quantize(v: Vec3) -> (i64, i64, i64) {
  let scale = 10f32.powi(COPLANAR_ROUND_DECIMALS as i32);
  (
    (v.x * scale).round() as i64,
    (v.y * scale).round() as i64,
    (v.z * scale).round() as i64,
  )
}

/// Disjoint-set forest over triangle indices of one normal bucket.
struct UnionFind {
  parent: Vec<usize>,
}

impl UnionFind {
  fn new(len: usize) -> Self {
    Self {
      parent: (0..len).collect(),
    }
  }

  fn find(&mut self, mut x: usize) -> usize {
    while self.parent[x] != x {
      self.parent[x] = self.parent[self.parent[x]];
      x = self.parent[x];
    }
    x
  }

  fn union(&mut self, a: usize, b: usize) {
    let ra = self.find(a);
    let rb = self.find(b);
    if ra != rb {
      self.parent[rb] = ra;
    }
  }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;
