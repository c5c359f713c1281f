use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;

use super::*;
use crate::types::Sphere;

/// Shared-handle test shape; mutating the cell is what a physics body
/// does to its transform between optimize cycles.
#[derive(Clone)]
struct TestShape(Rc<RefCell<ShapeData>>);

struct ShapeData {
  id: u64,
  aabb: Aabb,
}

impl TestShape {
  fn new(id: u64, center: Vec3, half: f32) -> Self {
    Self(Rc::new(RefCell::new(ShapeData {
      id,
      aabb: Aabb::from_center_half_extents(center, Vec3::splat(half)),
    })))
  }

  fn move_to(&self, center: Vec3, half: f32) {
    self.0.borrow_mut().aabb = Aabb::from_center_half_extents(center, Vec3::splat(half));
  }
}

impl BvhShape for TestShape {
  fn id(&self) -> u64 {
    self.0.borrow().id
  }
  fn aabb(&self) -> Aabb {
    self.0.borrow().aabb
  }
  fn sphere(&self) -> Sphere {
    let aabb = self.aabb();
    Sphere::new(aabb.center(), aabb.size().length() * 0.5)
  }
}

/// Every node's box must contain its children's boxes and every shape in
/// its bucket.
fn assert_containment(bvh: &Bvh<TestShape>) {
  bvh.traverse(|id, node| {
    if let Some(bucket) = &node.bucket {
      for shape in bucket {
        assert!(
          node.aabb.contains(&shape.aabb()),
          "leaf {} does not contain shape {}",
          id,
          shape.id()
        );
      }
    } else {
      for child in [node.left, node.right] {
        assert!(
          node.aabb.contains(&bvh.node(child).aabb),
          "node {} does not contain child {}",
          id,
          child
        );
      }
    }
    true
  });
}

/// DFS snapshot of identity, structure, and bounds.
fn snapshot(bvh: &Bvh<TestShape>) -> Vec<(i32, i32, i32, Aabb, u32)> {
  let mut out = Vec::new();
  bvh.traverse(|id, node| {
    out.push((id, node.left, node.right, node.aabb, node.depth));
    true
  });
  out
}

fn grid(count: usize) -> (Bvh<TestShape>, Vec<TestShape>) {
  let mut bvh = Bvh::new();
  let mut shapes = Vec::new();
  for i in 0..count {
    let center = Vec3::new(
      (i % 5) as f32 * 3.0,
      ((i / 5) % 5) as f32 * 3.0,
      (i / 25) as f32 * 3.0,
    );
    let shape = TestShape::new(i as u64, center, 0.5);
    bvh.add(shape.clone());
    shapes.push(shape);
  }
  (bvh, shapes)
}

#[test]
fn test_empty_tree() {
  let bvh: Bvh<TestShape> = Bvh::new();
  assert!(bvh.is_empty());
  assert_eq!(bvh.root(), None);
  assert!(bvh.query_overlap(&Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE)).is_empty());
}

#[test]
fn test_single_add() {
  let mut bvh = Bvh::new();
  let shape = TestShape::new(1, Vec3::ZERO, 0.5);
  bvh.add(shape.clone());

  assert_eq!(bvh.shape_count(), 1);
  let leaf = bvh.try_get_leaf(&shape).expect("shape has a leaf");
  assert!(bvh.node(leaf).is_leaf());
  assert_eq!(bvh.root(), Some(leaf));
}

#[test]
fn test_add_many_keeps_containment() {
  let (bvh, _shapes) = grid(40);
  assert_eq!(bvh.shape_count(), 40);
  assert_containment(&bvh);
}

#[test]
fn test_leaves_split_beyond_capacity() {
  let (bvh, _shapes) = grid(20);
  let root = bvh.root().unwrap();
  assert!(
    !bvh.node(root).is_leaf(),
    "20 shapes cannot fit a single bucket"
  );
  bvh.traverse(|_, node| {
    if let Some(bucket) = &node.bucket {
      assert!(bucket.len() <= BVH_BUCKET_CAPACITY);
    }
    true
  });
}

#[test]
fn test_query_overlap_finds_neighbours() {
  let (bvh, shapes) = grid(40);
  let probe = shapes[7].aabb();
  let found = bvh.query_overlap(&probe);
  assert!(found.iter().any(|s| s.id() == 7), "shape finds itself");

  // A probe far away from the grid hits nothing.
  let far = Aabb::from_center_half_extents(Vec3::splat(1000.0), Vec3::ONE);
  assert!(bvh.query_overlap(&far).is_empty());
}

#[test]
fn test_remove_silent_when_absent() {
  let mut bvh = Bvh::new();
  let present = TestShape::new(1, Vec3::ZERO, 0.5);
  let absent = TestShape::new(99, Vec3::ZERO, 0.5);
  bvh.add(present);
  bvh.remove(&absent);
  assert_eq!(bvh.shape_count(), 1);
}

#[test]
fn test_remove_and_drain() {
  let (mut bvh, shapes) = grid(20);
  for shape in &shapes {
    bvh.remove(shape);
  }
  assert!(bvh.is_empty());
  assert_eq!(bvh.root(), None);

  // Tree is reusable after draining.
  bvh.add(shapes[0].clone());
  assert_eq!(bvh.shape_count(), 1);
}

#[test]
fn test_remove_updates_queries() {
  let (mut bvh, shapes) = grid(40);
  bvh.remove(&shapes[7]);
  let found = bvh.query_overlap(&shapes[7].aabb());
  assert!(!found.iter().any(|s| s.id() == 7));
  assert_containment(&bvh);
}

#[test]
fn test_optimize_relocates_moved_shape() {
  let (mut bvh, shapes) = grid(40);
  shapes[3].move_to(Vec3::splat(100.0), 0.5);
  bvh.queue_for_update(&shapes[3]);
  bvh.queue_for_update(&shapes[3]); // idempotent
  bvh.optimize();

  assert_containment(&bvh);
  let found = bvh.query_overlap(&Aabb::from_center_half_extents(Vec3::splat(100.0), Vec3::ONE));
  assert!(found.iter().any(|s| s.id() == 3));
  assert_eq!(bvh.shape_count(), 40);
}

#[test]
fn test_optimize_leaves_fitting_shape_alone() {
  let (mut bvh, shapes) = grid(40);
  let leaf_before = bvh.try_get_leaf(&shapes[3]);
  // Shrink in place; the shape still fits its leaf.
  shapes[3].move_to(shapes[3].aabb().center(), 0.25);
  bvh.queue_for_update(&shapes[3]);
  bvh.optimize();
  assert_eq!(bvh.try_get_leaf(&shapes[3]), leaf_before);
}

#[test]
fn test_optimize_idempotent() {
  let (mut bvh, shapes) = grid(40);
  shapes[5].move_to(Vec3::splat(50.0), 0.5);
  shapes[11].move_to(Vec3::splat(-20.0), 0.5);
  bvh.queue_for_update(&shapes[5]);
  bvh.queue_for_update(&shapes[11]);
  bvh.optimize();

  let first = snapshot(&bvh);
  bvh.optimize();
  let second = snapshot(&bvh);
  assert_eq!(first, second, "optimize must be a fixed point");
}

#[test]
fn test_queries_survive_heavy_rebalancing() {
  let (mut bvh, shapes) = grid(40);
  // Scatter a few shapes to unbalance the tree, then rebalance.
  for (i, shape) in shapes.iter().enumerate().take(8) {
    shape.move_to(Vec3::splat(-(i as f32) * 7.0), 0.5);
    bvh.queue_for_update(shape);
  }
  bvh.optimize();
  assert_containment(&bvh);
  for shape in &shapes {
    let found = bvh.query_overlap(&shape.aabb());
    assert!(found.iter().any(|s| s.id() == shape.id()));
  }
}

#[test]
fn test_depths_consistent() {
  let (mut bvh, shapes) = grid(40);
  shapes[2].move_to(Vec3::splat(60.0), 0.5);
  bvh.queue_for_update(&shapes[2]);
  bvh.optimize();

  bvh.traverse(|_, node| {
    if !node.is_leaf() {
      for child in [node.left, node.right] {
        assert_eq!(bvh.node(child).depth, node.depth + 1);
      }
    }
    true
  });
  if let Some(root) = bvh.root() {
    assert_eq!(bvh.node(root).depth, 0);
    assert_eq!(bvh.node(root).parent, -1);
  }
}

#[test]
fn test_parent_links_consistent() {
  let (mut bvh, shapes) = grid(30);
  bvh.remove(&shapes[4]);
  bvh.remove(&shapes[17]);
  shapes[9].move_to(Vec3::splat(-40.0), 0.5);
  bvh.queue_for_update(&shapes[9]);
  bvh.optimize();

  bvh.traverse(|id, node| {
    if !node.is_leaf() {
      assert_eq!(bvh.node(node.left).parent, id);
      assert_eq!(bvh.node(node.right).parent, id);
    }
    true
  });
}

#[test]
fn test_custom_bucket_capacity() {
  let mut bvh = Bvh::with_config(BvhConfig::new().with_bucket_capacity(1));
  for i in 0..4 {
    bvh.add(TestShape::new(i, Vec3::new(i as f32 * 4.0, 0.0, 0.0), 0.5));
  }
  bvh.traverse(|_, node| {
    if let Some(bucket) = &node.bucket {
      assert_eq!(bucket.len(), 1);
    }
    true
  });
}

#[test]
fn test_traverse_can_prune() {
  let (bvh, _shapes) = grid(40);
  let mut visited_all = 0;
  bvh.traverse(|_, _| {
    visited_all += 1;
    true
  });
  let mut visited_root_only = 0;
  bvh.traverse(|_, _| {
    visited_root_only += 1;
    false
  });
  assert!(visited_all > visited_root_only);
  assert_eq!(visited_root_only, 1);
}
