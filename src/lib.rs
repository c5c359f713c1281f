//! hull_collision - convex polyhedron collision detection
//!
//! This crate provides a geometry core for narrow-phase collision between
//! convex hulls positioned by rigid transforms, plus a dynamic AABB tree
//! for broad-phase candidate filtering.
//!
//! # Features
//!
//! - **Half-edge hulls**: immutable polyhedra with O(1) adjacency, built
//!   from box extents or an indexed triangle mesh
//! - **SAT narrow phase**: face and edge separating-axis queries with
//!   witness features
//! - **Clipped contact manifolds**: Sutherland-Hodgman clipping with
//!   lossless feature-pair tracking for persistent contacts
//! - **Dynamic BVH**: incremental add/remove/refit with rotation
//!   rebalancing, for sub-quadratic batch queries
//!
//! # Example
//!
//! ```ignore
//! use glam::Vec3;
//! use hull_collision::{build_box, contact, CollisionConfig, RigidTransform};
//!
//! let hull = build_box(1.0, 1.0, 1.0);
//! let t1 = RigidTransform::IDENTITY;
//! let t2 = RigidTransform::from_translation(Vec3::new(0.0, 0.9, 0.0));
//!
//! if let Some(manifold) = contact(&t1, &hull, &t2, &hull, &CollisionConfig::default()) {
//!     println!("{} contact points along {:?}", manifold.len(), manifold.normal);
//! }
//! ```

pub mod aabb;
pub mod types;

// Re-export commonly used items
pub use aabb::Aabb;
pub use types::{
  CollisionConfig, ContactPoint, FeaturePair, Manifold, Plane, Sphere, ABS_TOL,
  MANIFOLD_MAX_POINTS, REL_EDGE_TOL, REL_FACE_TOL,
};

// Rigid transforms
pub mod transform;
pub use transform::RigidTransform;

// Half-edge hull representation and builders
pub mod hull;
pub use hull::{
  build_box, build_from_mesh, BuildError, Hull, ValidationError, COPLANAR_ROUND_DECIMALS,
};

// Separating-axis queries
pub mod sat;
pub use sat::{query_edge_distance, query_face_distance, EdgeQuery, FaceQuery};

// Manifold construction by clipping
pub mod clip;

// Public collision queries
pub mod query;
pub use query::{closest_point, contact, contains_point, is_colliding};

// Broad-phase AABB tree
pub mod bvh;
pub use bvh::{Bvh, BvhConfig, BvhShape, BVH_BUCKET_CAPACITY};

// Parallel batch driver over broad-phase candidates
pub mod batch;
pub use batch::{candidate_pairs, collide_pairs, PairResult};
