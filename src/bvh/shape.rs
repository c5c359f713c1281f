//! Shape trait the broad phase indexes.

use crate::aabb::Aabb;
use crate::types::Sphere;

/// A shape the BVH can track.
///
/// The tree needs nothing beyond a stable identity and current world
/// bounds. A shape whose transform mutates between `optimize()` cycles
/// should implement this on a shared handle (e.g. `Rc<RefCell<..>>` or an
/// arena id) so the tree always observes fresh bounds when it refits.
pub trait BvhShape {
  /// Stable integer identity. Two live shapes must never share an id.
  fn id(&self) -> u64;

  /// Current world-space bounding box.
  fn aabb(&self) -> Aabb;

  /// Current world-space bounding sphere.
  fn sphere(&self) -> Sphere;
}

#[cfg(test)]
mod tests {
  use glam::Vec3;

  use super::*;

  struct Point(u64, Vec3);

  impl BvhShape for Point {
    fn id(&self) -> u64 {
      self.0
    }
    fn aabb(&self) -> Aabb {
      Aabb::new(self.1, self.1)
    }
    fn sphere(&self) -> Sphere {
      Sphere::new(self.1, 0.0)
    }
  }

  #[test]
  fn test_trait_object_safe() {
    let p = Point(7, Vec3::ONE);
    let dyn_shape: &dyn BvhShape = &p;
    assert_eq!(dyn_shape.id(), 7);
    assert!(dyn_shape.aabb().contains_point(Vec3::ONE));
    assert_eq!(dyn_shape.sphere().radius, 0.0);
  }
}
