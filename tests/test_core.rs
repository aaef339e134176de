use std::f64::consts::TAU;

use nalgebra::{Rotation3, Unit, Vector3};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sphere_anneal::core::domain::{Configuration, InitialLayout, Point};
use sphere_anneal::core::sphere;

use crate::common::{assert_unit, random_rotation, rotate};

mod common;

#[test]
fn test_uniform_configuration_on_sphere() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let c = Configuration::new_random(InitialLayout::Uniform, 500, &mut rng).unwrap();
    assert_eq!(c.len(), 500);
    c.points().iter().for_each(assert_unit);
}

#[test]
fn test_cluster_configuration_on_sphere() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let c = Configuration::new_random(InitialLayout::Cluster, 200, &mut rng).unwrap();
    assert_eq!(c.len(), 200);
    c.points().iter().for_each(assert_unit);
}

#[test]
fn test_cluster_is_biased_towards_first_point() {
    // Walked points lean towards the anchor; uniform ones average out.
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let c = sphere::initialise_cluster(400, &mut rng).unwrap();
    let anchor = *c.point(0);
    let mean_cos = c.points()[1..].iter().map(|p| p.dot(&anchor)).sum::<f64>() / 399.0;
    assert!(mean_cos > 0.3, "mean cosine to anchor {mean_cos}");

    let u = sphere::initialise_uniform(400, &mut rng);
    let anchor = *u.point(0);
    let mean_cos = u.points()[1..].iter().map(|p| p.dot(&anchor)).sum::<f64>() / 399.0;
    assert!(mean_cos.abs() < 0.15, "uniform mean cosine {mean_cos}");
}

#[test]
fn test_empty_and_single_configurations() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let empty = sphere::initialise_cluster(0, &mut rng).unwrap();
    assert!(empty.is_empty());

    let single = sphere::initialise_uniform(1, &mut rng);
    assert_eq!(sphere::pairwise_sum_distance(&single), 0.0);
    assert_eq!(sphere::riesz_energy(&single), 0.0);
    assert_eq!(sphere::select_closest_pair(&single), None);
}

#[test]
fn test_closest_pair_finds_coincident_points() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let spread = sphere::initialise_uniform(8, &mut rng);
    let mut points = spread.points().to_vec();
    points[6] = points[2];
    let c = Configuration::from_points(points).unwrap();
    assert_eq!(sphere::select_closest_pair(&c), Some((2, 6)));
}

#[test]
fn test_closest_pair_ties_go_to_first_found() {
    // Square on the equator: all four edges tie.
    let c = Configuration::from_points(vec![
        Point::new(1.0, 0.0, 0.0),
        Point::new(0.0, 1.0, 0.0),
        Point::new(-1.0, 0.0, 0.0),
        Point::new(0.0, -1.0, 0.0),
    ])
    .unwrap();
    assert_eq!(sphere::select_closest_pair(&c), Some((0, 1)));
}

#[test]
fn test_objectives_invariant_under_rotation() {
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let c = sphere::initialise_uniform(30, &mut rng);
    for _ in 0..10 {
        let rot = random_rotation(&mut rng);
        let r = rotate(&c, &rot);
        assert!((sphere::pairwise_sum_distance(&c) - sphere::pairwise_sum_distance(&r)).abs() < 1e-9);
        assert!((sphere::riesz_energy(&c) - sphere::riesz_energy(&r)).abs() < 1e-9);
        assert_eq!(sphere::select_closest_pair(&c), sphere::select_closest_pair(&r));
    }
}

#[test]
fn test_same_seed_same_points() {
    let a = sphere::initialise_uniform(10, &mut ChaCha8Rng::seed_from_u64(77));
    let b = sphere::initialise_uniform(10, &mut ChaCha8Rng::seed_from_u64(77));
    assert_eq!(a, b);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn walk_stays_on_sphere(seed in any::<u64>(), variance in 0.0f64..4.0) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let p = sphere::sample_uniform_point(&mut rng);
        prop_assert!((p.norm() - 1.0).abs() < 1e-9);
        let q = sphere::walk(&p, variance, &mut rng).unwrap();
        prop_assert!((q.norm() - 1.0).abs() < 1e-9, "walked norm {}", q.norm());
    }

    #[test]
    fn move_apart_stays_on_sphere(seed in any::<u64>(), variance in 0.0f64..2.0) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let a = sphere::sample_uniform_point(&mut rng);
        let b = sphere::sample_uniform_point(&mut rng);
        let (a2, b2) = sphere::move_apart(&a, &b, variance).unwrap();
        prop_assert!((a2.norm() - 1.0).abs() < 1e-9);
        prop_assert!((b2.norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sum_distance_rotation_invariant(
        seed in any::<u64>(),
        n in 2usize..16,
        ax in -1.0f64..1.0,
        ay in -1.0f64..1.0,
        angle in 0.0f64..TAU,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let c = sphere::initialise_uniform(n, &mut rng);
        let rot = Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::new(ax, ay, 1.0)), angle);
        let r = rotate(&c, &rot);
        let before = sphere::pairwise_sum_distance(&c);
        let after = sphere::pairwise_sum_distance(&r);
        prop_assert!((before - after).abs() < 1e-9 * before.max(1.0));
    }
}
