//! Geometry on the unit sphere: sampling, perturbation and pairwise
//! aggregates over a [`Configuration`].
//!
//! Distances are straight-line chord lengths, monotone in the arc length.

use rand::Rng;

use crate::core::domain::{Configuration, Point};
use crate::core::error::AnnealError;
use crate::core::vector;

/// Uniform variate in (-1, 1).
#[inline]
fn coordinate<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    2.0 * rng.gen::<f64>() - 1.0
}

/// Standard normal variate via the polar form of Box-Muller.
pub fn normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let u = coordinate(rng);
        let v = coordinate(rng);
        let w = u * u + v * v;
        if w > 0.0 && w < 1.0 {
            return u * ((-2.0 * w.ln()) / w).sqrt();
        }
    }
}

/// Chord distance between two points.
#[inline]
pub fn distance(a: &Point, b: &Point) -> f64 {
    let d = a - b;
    vector::dot(&d, &d).sqrt()
}

/// Uniform point on the unit sphere (Marsaglia, 1972).
pub fn sample_uniform_point<R: Rng + ?Sized>(rng: &mut R) -> Point {
    let (u, v, s) = loop {
        let u = coordinate(rng);
        let v = coordinate(rng);
        let s = u * u + v * v;
        if s < 1.0 {
            break (u, v, s);
        }
    };

    let root = (1.0 - s).sqrt();
    let p = Point::new(2.0 * u * root, 2.0 * v * root, 1.0 - 2.0 * s);
    // Exact by construction; only floating-point drift is removed here.
    p / p.norm()
}

pub fn initialise_uniform<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Configuration {
    let points = (0..n).map(|_| sample_uniform_point(rng)).collect();
    Configuration::from_unit_points(points)
}

/// Clustered start: the first point is uniform, every other point is a
/// unit-variance walk away from it.
pub fn initialise_cluster<R: Rng + ?Sized>(
    n: usize,
    rng: &mut R,
) -> Result<Configuration, AnnealError> {
    if n == 0 {
        return Ok(Configuration::from_unit_points(Vec::new()));
    }

    let anchor = sample_uniform_point(rng);
    let mut points = Vec::with_capacity(n);
    points.push(anchor);
    for _ in 1..n {
        points.push(walk(&anchor, 1.0, rng)?);
    }
    Ok(Configuration::from_unit_points(points))
}

/// Random walk on the sphere: Gaussian noise with standard deviation
/// `sqrt(variance)` on each coordinate, projected back onto the sphere.
pub fn walk<R: Rng + ?Sized>(point: &Point, variance: f64, rng: &mut R) -> Result<Point, AnnealError> {
    let sd = variance.sqrt();
    let x = point.x + normal(rng) * sd;
    let y = point.y + normal(rng) * sd;
    let z = point.z + normal(rng) * sd;
    vector::normalize(&Point::new(x, y, z))
}

/// Pushes two points apart along their chord by a factor of `1 + variance`.
pub fn move_apart(a: &Point, b: &Point, variance: f64) -> Result<(Point, Point), AnnealError> {
    let u = 1.0 + variance;
    let chord = a - b;
    let a_new = vector::normalize(&(a + chord * u))?;
    let b_new = vector::normalize(&(b - chord * u))?;
    Ok((a_new, b_new))
}

/// Sum of chord distances over all unordered pairs.
pub fn pairwise_sum_distance(config: &Configuration) -> f64 {
    let pts = config.points();
    let n = pts.len();
    let mut sum = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += distance(&pts[i], &pts[j]);
        }
    }
    sum
}

/// Logarithmic Riesz energy: sum of `ln(1 / d^2)` over all unordered pairs.
/// Coincident points give `+inf`.
pub fn riesz_energy(config: &Configuration) -> f64 {
    let pts = config.points();
    let n = pts.len();
    let mut energy = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = pts[i] - pts[j];
            energy += (1.0 / vector::dot(&d, &d)).ln();
        }
    }
    energy
}

/// Index pair `(i, j)`, `i < j`, with the smallest chord distance. The first
/// pair in lexicographic scan order wins ties. `None` when fewer than two
/// points exist.
pub fn select_closest_pair(config: &Configuration) -> Option<(usize, usize)> {
    let pts = config.points();
    let n = pts.len();
    let mut best: Option<((usize, usize), f64)> = None;

    for i in 0..n {
        for j in (i + 1)..n {
            let d = distance(&pts[i], &pts[j]);
            match best {
                Some((_, d_min)) if d >= d_min => {}
                _ => best = Some(((i, j), d)),
            }
        }
    }

    best.map(|(pair, _)| pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_normal_moments() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let samples: Vec<f64> = (0..20_000).map(|_| normal(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }

    #[test]
    fn test_uniform_points_have_zero_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let c = initialise_uniform(5_000, &mut rng);
        let centroid = c.points().iter().fold(Point::zeros(), |acc, p| acc + p) / c.len() as f64;
        assert!(centroid.norm() < 0.05, "centroid {centroid:?}");
    }

    #[test]
    fn test_walk_with_tiny_variance_stays_close() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let p = Point::new(0.0, 0.0, 1.0);
        let q = walk(&p, 1e-10, &mut rng).unwrap();
        assert!(distance(&p, &q) < 1e-3);
    }

    #[test]
    fn test_move_apart_increases_separation() {
        let a = vector::normalize(&Point::new(1.0, 0.1, 0.0)).unwrap();
        let b = vector::normalize(&Point::new(1.0, -0.1, 0.0)).unwrap();
        let (a2, b2) = move_apart(&a, &b, 0.01).unwrap();
        assert!(distance(&a2, &b2) > distance(&a, &b));
        assert!((a2.norm() - 1.0).abs() < 1e-12);
        assert!((b2.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_move_apart_is_symmetric() {
        let a = vector::normalize(&Point::new(0.3, 0.2, 0.9)).unwrap();
        let b = vector::normalize(&Point::new(-0.1, 0.4, 0.9)).unwrap();
        let (a2, b2) = move_apart(&a, &b, 0.5).unwrap();
        let (b3, a3) = move_apart(&b, &a, 0.5).unwrap();
        assert!((a2 - a3).norm() < 1e-12);
        assert!((b2 - b3).norm() < 1e-12);
    }

    #[test]
    fn test_antipodal_pair_distance() {
        let c = Configuration::from_points(vec![Point::new(0.0, 0.0, 1.0), Point::new(0.0, 0.0, -1.0)])
            .unwrap();
        assert!((pairwise_sum_distance(&c) - 2.0).abs() < 1e-12);
        // ln(1/4)
        assert!((riesz_energy(&c) + 4.0_f64.ln()).abs() < 1e-12);
        assert_eq!(select_closest_pair(&c), Some((0, 1)));
    }

    #[test]
    fn test_closest_pair_needs_two_points() {
        let c = Configuration::from_points(vec![Point::new(1.0, 0.0, 0.0)]).unwrap();
        assert_eq!(select_closest_pair(&c), None);
    }
}
