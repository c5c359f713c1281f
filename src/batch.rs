//! Batch pairwise collision driver.
//!
//! The broad phase trims the all-pairs set down to candidates whose
//! shape boxes overlap. Narrow-phase resolution is a pure function of
//! the pair, so it dispatches across rayon's pool; results come back in
//! pair-index order, making the output deterministic regardless of
//! thread scheduling.

use rayon::prelude::*;

use crate::bvh::{Bvh, BvhShape};
use crate::types::Manifold;

/// Outcome of one narrow-phase pair.
#[derive(Clone, Copy, Debug)]
pub struct PairResult {
  pub id_a: u64,
  pub id_b: u64,
  pub manifold: Option<Manifold>,
}

/// Candidate `(i, j)` pairs with overlapping shape boxes, `i < j` by id.
///
/// Each shape queries the tree for leaves its box touches; the
/// leaf-level over-approximation is then filtered down to actual
/// shape-box overlap.
pub fn candidate_pairs<S: BvhShape + Clone>(bvh: &Bvh<S>) -> Vec<(u64, u64)> {
  let shapes = bvh.shapes();
  let mut pairs = Vec::new();
  for shape in &shapes {
    let aabb = shape.aabb();
    for other in bvh.query_overlap(&aabb) {
      if other.id() > shape.id() && aabb.overlaps(&other.aabb()) {
        pairs.push((shape.id(), other.id()));
      }
    }
  }
  pairs.sort_unstable();
  pairs.dedup();
  pairs
}

/// Resolve every candidate pair in parallel.
///
/// `resolve` must be a pure function of the pair ids (typically a
/// capture of hulls and transforms ending in [`crate::query::contact`]).
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "batch::collide_pairs"))]
pub fn collide_pairs<F>(pairs: &[(u64, u64)], resolve: F) -> Vec<PairResult>
where
  F: Fn(u64, u64) -> Option<Manifold> + Sync,
{
  pairs
    .par_iter()
    .map(|&(id_a, id_b)| PairResult {
      id_a,
      id_b,
      manifold: resolve(id_a, id_b),
    })
    .collect()
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod batch_test;
