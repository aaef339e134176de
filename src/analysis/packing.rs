use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::domain::{Configuration, Point};
use crate::core::{sphere, vector};

/// Arc length between two unit vectors, in radians.
pub fn geodesic(a: &Point, b: &Point) -> f64 {
    vector::dot(a, b).clamp(-1.0, 1.0).acos()
}

/// Smallest chord distance over all pairs, i.e. the Tammes objective
/// `min d_ij`. `None` for fewer than two points.
pub fn min_separation(config: &Configuration) -> Option<f64> {
    sphere::select_closest_pair(config).map(|(i, j)| sphere::distance(config.point(i), config.point(j)))
}

/// Packing quality figures for a finished configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingReport {
    pub points: usize,
    pub sum_distance: f64,
    pub riesz_energy: f64,
    pub min_chord: Option<f64>,
    pub min_angle_deg: Option<f64>,
}

impl PackingReport {
    pub fn from_configuration(config: &Configuration) -> Self {
        let closest = sphere::select_closest_pair(config);
        Self {
            points: config.len(),
            sum_distance: sphere::pairwise_sum_distance(config),
            riesz_energy: sphere::riesz_energy(config),
            min_chord: closest.map(|(i, j)| sphere::distance(config.point(i), config.point(j))),
            min_angle_deg: closest.map(|(i, j)| geodesic(config.point(i), config.point(j)).to_degrees()),
        }
    }
}

/// Mean and spread of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub samples: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

/// Pairwise sum distance of `samples` independent uniform configurations of
/// `n` points. Gives the value a purely random placement reaches, to judge
/// how much annealing adds.
pub fn uniform_baseline<R: Rng + ?Sized>(n: usize, samples: usize, rng: &mut R) -> Baseline {
    let values: Vec<f64> = (0..samples)
        .map(|_| sphere::pairwise_sum_distance(&sphere::initialise_uniform(n, rng)))
        .collect();

    if values.is_empty() {
        return Baseline { samples: 0, mean: 0.0, std_dev: 0.0 };
    }

    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

    Baseline {
        samples: values.len(),
        mean,
        std_dev: var.sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::PI;

    #[test]
    fn test_geodesic_known_angles() {
        let x = Point::new(1.0, 0.0, 0.0);
        let y = Point::new(0.0, 1.0, 0.0);
        assert!((geodesic(&x, &y) - PI / 2.0).abs() < 1e-12);
        assert!((geodesic(&x, &-x) - PI).abs() < 1e-12);
        assert_eq!(geodesic(&x, &x), 0.0);
    }

    #[test]
    fn test_report_on_octahedron() {
        let c = Configuration::from_points(vec![
            Point::new(1.0, 0.0, 0.0),
            Point::new(-1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.0, -1.0, 0.0),
            Point::new(0.0, 0.0, 1.0),
            Point::new(0.0, 0.0, -1.0),
        ])
        .unwrap();
        let r = PackingReport::from_configuration(&c);
        assert_eq!(r.points, 6);
        assert!((r.min_angle_deg.unwrap() - 90.0).abs() < 1e-9);
        assert!((r.min_chord.unwrap() - 2.0_f64.sqrt()).abs() < 1e-12);
        // 12 edges of sqrt(2) and 3 diameters of 2.
        assert!((r.sum_distance - (12.0 * 2.0_f64.sqrt() + 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_has_no_separation() {
        let c = Configuration::from_points(vec![Point::new(0.0, 0.0, 1.0)]).unwrap();
        assert_eq!(min_separation(&c), None);
    }

    #[test]
    fn test_uniform_baseline_matches_expectation() {
        // E|p - q| for independent uniform points on the unit sphere is 4/3.
        let mut rng = ChaCha8Rng::seed_from_u64(12_345_678);
        let b = uniform_baseline(40, 20, &mut rng);
        let pairs = (40 * 39 / 2) as f64;
        assert_eq!(b.samples, 20);
        assert!((b.mean / pairs - 4.0 / 3.0).abs() < 0.05, "mean per pair {}", b.mean / pairs);
        assert!(b.std_dev > 0.0);
    }
}
