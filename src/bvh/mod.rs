//! Dynamic AABB tree for broad-phase candidate filtering.
//!
//! Nodes live in an arena indexed by `i32`; each node is either an
//! internal node with two children or a leaf holding a small bucket of
//! shapes. Insertion descends by smallest surface-area growth; a full
//! leaf splits and redistributes. Shapes whose transforms changed are
//! queued and reconciled in `optimize()`, which also rebalances the tree
//! with surface-area-reducing rotations.
//!
//! Single writer: mutations must not race queries. Queries may run
//! concurrently with each other.
//!
//! # Module Structure
//!
//! - [`shape`]: the [`BvhShape`] trait shapes implement

pub mod shape;

use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use crate::aabb::Aabb;

pub use shape::BvhShape;

/// Default number of shapes a leaf holds before splitting.
pub const BVH_BUCKET_CAPACITY: usize = 4;

const NULL: i32 = -1;

/// Tree tuning knobs.
#[derive(Clone, Copy, Debug)]
pub struct BvhConfig {
  /// Shapes per leaf before a split.
  pub bucket_capacity: usize,
}

impl Default for BvhConfig {
  fn default() -> Self {
    Self {
      bucket_capacity: BVH_BUCKET_CAPACITY,
    }
  }
}

impl BvhConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_bucket_capacity(mut self, capacity: usize) -> Self {
    debug_assert!(capacity >= 1);
    self.bucket_capacity = capacity;
    self
  }
}

/// One tree node. Internal nodes have two children; leaves have a bucket.
#[derive(Clone, Debug)]
pub struct BvhNode<S> {
  pub aabb: Aabb,
  pub parent: i32,
  pub left: i32,
  pub right: i32,
  pub depth: u32,
  pub bucket: Option<SmallVec<[S; BVH_BUCKET_CAPACITY]>>,
}

impl<S> BvhNode<S> {
  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.bucket.is_some()
  }
}

/// Dynamic bounding-volume hierarchy over user shapes.
pub struct Bvh<S: BvhShape + Clone> {
  nodes: Vec<BvhNode<S>>,
  free: Vec<i32>,
  root: i32,
  /// Shape id -> leaf node, for O(1) lookups.
  leaf_of: HashMap<u64, i32>,
  /// Shapes queued for a refit. Set semantics make queueing idempotent.
  pending: HashSet<u64>,
  config: BvhConfig,
}

impl<S: BvhShape + Clone> Default for Bvh<S> {
  fn default() -> Self {
    Self::new()
  }
}

impl<S: BvhShape + Clone> Bvh<S> {
  pub fn new() -> Self {
    Self::with_config(BvhConfig::default())
  }

  pub fn with_config(config: BvhConfig) -> Self {
    Self {
      nodes: Vec::new(),
      free: Vec::new(),
      root: NULL,
      leaf_of: HashMap::new(),
      pending: HashSet::new(),
      config,
    }
  }

  /// Number of shapes currently stored.
  pub fn shape_count(&self) -> usize {
    self.leaf_of.len()
  }

  pub fn is_empty(&self) -> bool {
    self.leaf_of.is_empty()
  }

  /// Arena index of the root, or None for an empty tree.
  pub fn root(&self) -> Option<i32> {
    (self.root != NULL).then_some(self.root)
  }

  /// Borrow a node by its identifier.
  pub fn node(&self, id: i32) -> &BvhNode<S> {
    &self.nodes[id as usize]
  }

  /// Leaf currently holding the shape, if present. O(1).
  pub fn try_get_leaf(&self, shape: &S) -> Option<i32> {
    self.leaf_of.get(&shape.id()).copied()
  }

  /// Insert a shape. O(log n) expected.
  pub fn add(&mut self, shape: S) {
    let aabb = shape.aabb();
    debug_assert!(aabb.is_valid(), "shape AABB must be valid");

    if self.root == NULL {
      let mut bucket = SmallVec::new();
      let id = shape.id();
      bucket.push(shape);
      let node = self.alloc(aabb, NULL, 0, Some(bucket));
      self.root = node;
      self.leaf_of.insert(id, node);
      return;
    }

    // Descend toward the child whose box grows least.
    let mut current = self.root;
    while !self.nodes[current as usize].is_leaf() {
      let node = &self.nodes[current as usize];
      current = self.cheaper_child(node.left, node.right, &aabb);
    }

    if self.bucket_len(current) < self.config.bucket_capacity {
      let id = shape.id();
      let node = &mut self.nodes[current as usize];
      node.aabb = node.aabb.union(&aabb);
      node.bucket.as_mut().expect("leaf has bucket").push(shape);
      self.leaf_of.insert(id, current);
      let parent = self.nodes[current as usize].parent;
      self.refit_up(parent);
    } else {
      self.split_leaf(current, shape);
    }
  }

  /// Detach a shape. Absent shapes are ignored.
  pub fn remove(&mut self, shape: &S) {
    let _ = self.detach(shape.id());
  }

  /// Record that a shape's AABB may have changed. Idempotent per
  /// optimize cycle.
  pub fn queue_for_update(&mut self, shape: &S) {
    self.pending.insert(shape.id());
  }

  /// Drain the refit queue and rebalance.
  ///
  /// Each queued shape still inside its leaf's box is left alone; shapes
  /// that escaped are detached and re-inserted. Rotation passes then
  /// reshape internal nodes where a child/grandchild swap shrinks the
  /// children's total surface area, repeating until no swap helps so the
  /// call is a fixed point: a second `optimize()` with no interleaved
  /// mutation leaves the tree unchanged.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "bvh::optimize"))]
  pub fn optimize(&mut self) {
    let pending: Vec<u64> = self.pending.drain().collect();
    for id in pending {
      let Some(&leaf) = self.leaf_of.get(&id) else {
        continue;
      };
      let shape = self.nodes[leaf as usize]
        .bucket
        .as_ref()
        .expect("leaf has bucket")
        .iter()
        .find(|s| s.id() == id)
        .cloned()
        .expect("leaf_of points at the holding leaf");
      if self.nodes[leaf as usize].aabb.contains(&shape.aabb()) {
        continue;
      }
      let _ = self.detach(id);
      self.add(shape);
    }

    // Each committed rotation strictly reduces surface area, so this
    // terminates; the guard bounds pathological float behavior.
    let mut passes = 0;
    while self.rotation_pass() {
      passes += 1;
      if passes > 64 {
        break;
      }
    }
  }

  /// Depth-first visit. The callback decides whether to descend.
  pub fn traverse(&self, mut callback: impl FnMut(i32, &BvhNode<S>) -> bool) {
    if self.root == NULL {
      return;
    }
    let mut stack: SmallVec<[i32; 32]> = SmallVec::new();
    stack.push(self.root);
    while let Some(id) = stack.pop() {
      let node = &self.nodes[id as usize];
      if !callback(id, node) {
        continue;
      }
      if !node.is_leaf() {
        stack.push(node.right);
        stack.push(node.left);
      }
    }
  }

  /// Collect the shapes of every leaf whose box intersects `aabb`.
  pub fn query_overlap(&self, aabb: &Aabb) -> Vec<S> {
    let mut result = Vec::new();
    self.traverse(|_, node| {
      if !node.aabb.overlaps(aabb) {
        return false;
      }
      if let Some(bucket) = &node.bucket {
        result.extend(bucket.iter().cloned());
      }
      true
    });
    result
  }

  /// All shapes currently in the tree, in arbitrary order.
  pub fn shapes(&self) -> Vec<S> {
    let mut result = Vec::with_capacity(self.leaf_of.len());
    self.traverse(|_, node| {
      if let Some(bucket) = &node.bucket {
        result.extend(bucket.iter().cloned());
      }
      true
    });
    result
  }

  // -------------------------------------------------------------------
  // Internals
  // -------------------------------------------------------------------

  fn alloc(
    &mut self,
    aabb: Aabb,
    parent: i32,
    depth: u32,
    bucket: Option<SmallVec<[S; BVH_BUCKET_CAPACITY]>>,
  ) -> i32 {
    let node = BvhNode {
      aabb,
      parent,
      left: NULL,
      right: NULL,
      depth,
      bucket,
    };
    match self.free.pop() {
      Some(id) => {
        self.nodes[id as usize] = node;
        id
      }
      None => {
        self.nodes.push(node);
        (self.nodes.len() - 1) as i32
      }
    }
  }

  fn bucket_len(&self, leaf: i32) -> usize {
    self.nodes[leaf as usize]
      .bucket
      .as_ref()
      .map_or(0, |b| b.len())
  }

  /// Child whose union with `aabb` has the smaller surface area.
  fn cheaper_child(&self, left: i32, right: i32, aabb: &Aabb) -> i32 {
    let left_cost = self.nodes[left as usize].aabb.union(aabb).surface_area();
    let right_cost = self.nodes[right as usize].aabb.union(aabb).surface_area();
    if left_cost < right_cost {
      left
    } else if right_cost < left_cost {
      right
    } else {
      // Tie: prefer the smaller child so the other keeps room to grow.
      let left_area = self.nodes[left as usize].aabb.surface_area();
      let right_area = self.nodes[right as usize].aabb.surface_area();
      if left_area <= right_area {
        left
      } else {
        right
      }
    }
  }

  /// Split a full leaf into two and push `extra` into the better half.
  fn split_leaf(&mut self, leaf: i32, extra: S) {
    let mut shapes: Vec<S> = self.nodes[leaf as usize]
      .bucket
      .take()
      .expect("splitting a leaf")
      .into_vec();
    shapes.push(extra);

    // Seed the halves with the extremes along the widest centroid axis.
    let mut spread = Aabb::empty();
    for s in &shapes {
      spread.encapsulate(s.aabb().center());
    }
    let size = spread.size();
    let axis = if size.x >= size.y && size.x >= size.z {
      0
    } else if size.y >= size.z {
      1
    } else {
      2
    };
    let key = |s: &S| s.aabb().center()[axis];
    let (mut lo, mut hi) = (0, 0);
    for (i, s) in shapes.iter().enumerate() {
      if key(s) < key(&shapes[lo]) {
        lo = i;
      }
      if key(s) > key(&shapes[hi]) {
        hi = i;
      }
    }
    if lo == hi {
      // All centroids coincide; an arbitrary partition keeps the tree
      // growing instead of looping.
      hi = (lo + 1) % shapes.len();
    }

    let depth = self.nodes[leaf as usize].depth + 1;
    let seed_left = shapes[lo].clone();
    let seed_right = shapes[hi].clone();
    let left = self.alloc(seed_left.aabb(), leaf, depth, Some(SmallVec::new()));
    let right = self.alloc(seed_right.aabb(), leaf, depth, Some(SmallVec::new()));

    let mut place = |tree: &mut Self, target: i32, shape: S| {
      let aabb = shape.aabb();
      let node = &mut tree.nodes[target as usize];
      node.aabb = node.aabb.union(&aabb);
      tree.leaf_of.insert(shape.id(), target);
      tree.nodes[target as usize]
        .bucket
        .as_mut()
        .expect("fresh leaf")
        .push(shape);
    };
    place(self, left, seed_left);
    place(self, right, seed_right);
    for (i, shape) in shapes.into_iter().enumerate() {
      if i == lo || i == hi {
        continue;
      }
      let target = self.cheaper_child(left, right, &shape.aabb());
      place(self, target, shape);
    }

    let combined = self.nodes[left as usize]
      .aabb
      .union(&self.nodes[right as usize].aabb);
    let node = &mut self.nodes[leaf as usize];
    node.left = left;
    node.right = right;
    node.aabb = combined;
    let parent = node.parent;
    self.refit_up(parent);
  }

  /// Pull a shape out of the tree, collapsing its leaf if it empties.
  fn detach(&mut self, id: u64) -> Option<S> {
    let leaf = self.leaf_of.remove(&id)?;
    let bucket = self.nodes[leaf as usize]
      .bucket
      .as_mut()
      .expect("leaf_of points at leaves");
    let pos = bucket
      .iter()
      .position(|s| s.id() == id)
      .expect("leaf_of is in sync with buckets");
    let shape = bucket.remove(pos);

    if bucket.is_empty() {
      self.remove_leaf(leaf);
    } else {
      let mut aabb = Aabb::empty();
      for s in self.nodes[leaf as usize].bucket.as_ref().expect("leaf") {
        aabb = aabb.union(&s.aabb());
      }
      self.nodes[leaf as usize].aabb = aabb;
      let parent = self.nodes[leaf as usize].parent;
      self.refit_up(parent);
    }
    Some(shape)
  }

  /// Remove an empty leaf; its sibling takes the parent's place.
  fn remove_leaf(&mut self, leaf: i32) {
    let parent = self.nodes[leaf as usize].parent;
    self.free_node(leaf);
    if parent == NULL {
      self.root = NULL;
      return;
    }

    let sibling = if self.nodes[parent as usize].left == leaf {
      self.nodes[parent as usize].right
    } else {
      self.nodes[parent as usize].left
    };
    let grandparent = self.nodes[parent as usize].parent;
    self.free_node(parent);

    self.nodes[sibling as usize].parent = grandparent;
    if grandparent == NULL {
      self.root = sibling;
      self.refresh_depths(sibling, 0);
    } else {
      if self.nodes[grandparent as usize].left == parent {
        self.nodes[grandparent as usize].left = sibling;
      } else {
        self.nodes[grandparent as usize].right = sibling;
      }
      self.refresh_depths(sibling, self.nodes[grandparent as usize].depth + 1);
      self.refit_up(grandparent);
    }
  }

  fn free_node(&mut self, id: i32) {
    self.nodes[id as usize].bucket = None;
    self.nodes[id as usize].parent = NULL;
    self.nodes[id as usize].left = NULL;
    self.nodes[id as usize].right = NULL;
    self.free.push(id);
  }

  /// Recompute ancestor boxes from `from` up, stopping when one no
  /// longer changes.
  fn refit_up(&mut self, from: i32) {
    let mut current = from;
    while current != NULL {
      let node = &self.nodes[current as usize];
      let updated = self.nodes[node.left as usize]
        .aabb
        .union(&self.nodes[node.right as usize].aabb);
      if updated == self.nodes[current as usize].aabb {
        break;
      }
      self.nodes[current as usize].aabb = updated;
      current = self.nodes[current as usize].parent;
    }
  }

  fn refresh_depths(&mut self, node: i32, depth: u32) {
    let mut stack: SmallVec<[(i32, u32); 32]> = SmallVec::new();
    stack.push((node, depth));
    while let Some((id, depth)) = stack.pop() {
      self.nodes[id as usize].depth = depth;
      if !self.nodes[id as usize].is_leaf() {
        stack.push((self.nodes[id as usize].left, depth + 1));
        stack.push((self.nodes[id as usize].right, depth + 1));
      }
    }
  }

  /// One pass of local rotations over all internal nodes. Returns true
  /// when any rotation was committed.
  fn rotation_pass(&mut self) -> bool {
    // Freed slots have null children and fall out of the filter.
    let candidates: Vec<i32> = (0..self.nodes.len() as i32)
      .filter(|&id| !self.nodes[id as usize].is_leaf() && self.nodes[id as usize].left != NULL)
      .collect();
    let mut changed = false;
    for id in candidates {
      changed |= self.try_rotate(id);
    }
    changed
  }

  /// Consider the five child/grandchild swaps below `node`; commit the
  /// one that most reduces the children's combined surface area.
  fn try_rotate(&mut self, node: i32) -> bool {
    let left = self.nodes[node as usize].left;
    let right = self.nodes[node as usize].right;
    let current = self.nodes[left as usize].aabb.surface_area()
      + self.nodes[right as usize].aabb.surface_area();

    let (ll, lr) = if self.nodes[left as usize].is_leaf() {
      (NULL, NULL)
    } else {
      (self.nodes[left as usize].left, self.nodes[left as usize].right)
    };
    let (rl, rr) = if self.nodes[right as usize].is_leaf() {
      (NULL, NULL)
    } else {
      (
        self.nodes[right as usize].left,
        self.nodes[right as usize].right,
      )
    };

    // (child kept in place, grandchild pulled up) candidate pairs.
    let mut best: Option<(i32, i32, f32)> = None;
    let mut consider = |a: i32, b: i32, cost: f32| {
      if cost < current && best.map_or(true, |(_, _, c)| cost < c) {
        best = Some((a, b, cost));
      }
    };

    let area = |id: i32| self.nodes[id as usize].aabb;
    if rl != NULL {
      // Swap left child with a right grandchild.
      consider(
        left,
        rl,
        area(rl).surface_area() + area(left).union(&area(rr)).surface_area(),
      );
      consider(
        left,
        rr,
        area(rr).surface_area() + area(rl).union(&area(left)).surface_area(),
      );
    }
    if ll != NULL {
      // Swap right child with a left grandchild.
      consider(
        right,
        ll,
        area(ll).surface_area() + area(right).union(&area(lr)).surface_area(),
      );
      consider(
        right,
        lr,
        area(lr).surface_area() + area(ll).union(&area(right)).surface_area(),
      );
    }
    if ll != NULL && rl != NULL {
      // Swap grandchildren across sides.
      consider(
        ll,
        rl,
        area(rl).union(&area(lr)).surface_area() + area(ll).union(&area(rr)).surface_area(),
      );
    }

    if let Some((a, b, _)) = best {
      self.swap_nodes(a, b);
      true
    } else {
      false
    }
  }

  /// Exchange two disjoint subtrees in their parents' child slots.
  fn swap_nodes(&mut self, a: i32, b: i32) {
    let pa = self.nodes[a as usize].parent;
    let pb = self.nodes[b as usize].parent;
    debug_assert!(pa != NULL && pb != NULL && pa != pb);

    if self.nodes[pa as usize].left == a {
      self.nodes[pa as usize].left = b;
    } else {
      self.nodes[pa as usize].right = b;
    }
    if self.nodes[pb as usize].left == b {
      self.nodes[pb as usize].left = a;
    } else {
      self.nodes[pb as usize].right = a;
    }
    self.nodes[a as usize].parent = pb;
    self.nodes[b as usize].parent = pa;

    // The deeper parent's box changes; recompute both and above.
    self.recompute_aabb(pb);
    self.recompute_aabb(pa);
    self.refit_up(self.nodes[pa as usize].parent);
    let depth_a = self.nodes[pb as usize].depth + 1;
    let depth_b = self.nodes[pa as usize].depth + 1;
    self.refresh_depths(a, depth_a);
    self.refresh_depths(b, depth_b);
  }

  fn recompute_aabb(&mut self, node: i32) {
    if self.nodes[node as usize].is_leaf() {
      return;
    }
    let left = self.nodes[node as usize].left;
    let right = self.nodes[node as usize].right;
    self.nodes[node as usize].aabb = self.nodes[left as usize]
      .aabb
      .union(&self.nodes[right as usize].aabb);
  }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
