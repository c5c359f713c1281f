use glam::Vec3;

use super::*;

#[test]
fn test_plane_signed_distance() {
  let plane = Plane::new(Vec3::Y, 0.5);
  assert!((plane.signed_distance(Vec3::new(3.0, 1.5, -2.0)) - 1.0).abs() < 1e-6);
  assert!((plane.signed_distance(Vec3::new(0.0, 0.5, 0.0))).abs() < 1e-6);
  assert!(plane.signed_distance(Vec3::ZERO) < 0.0);
}

#[test]
fn test_plane_project_lands_on_plane() {
  let plane = Plane::new(Vec3::new(1.0, 1.0, 0.0).normalize(), 1.0);
  let projected = plane.project(Vec3::new(4.0, -2.0, 7.0));
  assert!(plane.signed_distance(projected).abs() < 1e-5);
}

#[test]
fn test_feature_pair_flip_swaps_halves() {
  let fp = FeaturePair::new(1, 2, 3, 4);
  let flipped = fp.flip();
  assert_eq!(flipped, FeaturePair::new(3, 4, 1, 2));
  assert_eq!(flipped.flip(), fp);
}

#[test]
fn test_feature_pair_key_distinguishes_pairs() {
  let a = FeaturePair::new(1, 2, 3, 4);
  let b = FeaturePair::new(1, 2, 4, 3);
  assert_ne!(a.key(), b.key());
  assert_eq!(a.key(), a.key());
}

#[test]
fn test_feature_pair_key_none_sentinel() {
  // -1 ids must map to 0xFFFF in each 16-bit lane.
  assert_eq!(FeaturePair::NONE.key(), u64::MAX);
}

#[test]
fn test_manifold_push_caps_at_max() {
  let mut manifold = Manifold::new(Vec3::Y);
  for i in 0..MANIFOLD_MAX_POINTS {
    assert!(manifold.push(ContactPoint::new(
      Vec3::splat(i as f32),
      -0.1,
      FeaturePair::NONE,
    )));
  }
  // Overflow is dropped, not an error.
  assert!(!manifold.push(ContactPoint::new(Vec3::ZERO, -0.1, FeaturePair::NONE)));
  assert_eq!(manifold.len(), MANIFOLD_MAX_POINTS);
}

#[test]
fn test_manifold_flipped() {
  let mut manifold = Manifold::new(Vec3::Y);
  manifold.push(ContactPoint::new(
    Vec3::new(1.0, 2.0, 3.0),
    -0.25,
    FeaturePair::new(7, 8, -1, 2),
  ));

  let flipped = manifold.flipped();
  assert_eq!(flipped.normal, Vec3::NEG_Y);
  assert_eq!(flipped.len(), 1);
  let p = &flipped.points()[0];
  assert_eq!(p.position, Vec3::new(1.0, 2.0, 3.0));
  assert_eq!(p.distance, -0.25);
  assert_eq!(p.feature, FeaturePair::new(-1, 2, 7, 8));
}

#[test]
fn test_contact_point_accumulators_zero_at_emit() {
  let p = ContactPoint::new(Vec3::ONE, -0.5, FeaturePair::NONE);
  assert_eq!(p.normal_impulse, 0.0);
  assert_eq!(p.tangent_impulse, [0.0; 2]);
}

#[test]
fn test_collision_config_defaults() {
  let config = CollisionConfig::default();
  assert_eq!(config.rel_edge_tol, 0.90);
  assert_eq!(config.rel_face_tol, 0.95);
  assert_eq!(config.abs_tol, 0.0025);
}

#[test]
fn test_collision_config_builders() {
  let config = CollisionConfig::new()
    .with_rel_edge_tol(0.8)
    .with_rel_face_tol(0.9)
    .with_abs_tol(0.01);
  assert_eq!(config.rel_edge_tol, 0.8);
  assert_eq!(config.rel_face_tol, 0.9);
  assert_eq!(config.abs_tol, 0.01);
}
