use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::AnnealError;
use crate::core::{sphere, vector};

// --- Constants ---

/// Temperature floor: the schedule terminates once T drops to this value.
pub const T_MIN: f64 = 0.1;

/// Boltzmann constant used by the Metropolis test.
pub const BOLTZMANN_CONSTANT: f64 = 1.0;

pub const DEFAULT_POINTS: usize = 50;
pub const DEFAULT_INNER_ITERATIONS: usize = 100;
pub const DEFAULT_INITIAL_TEMPERATURE: f64 = 30.0;
pub const DEFAULT_DAMPING: f64 = 0.99;
pub const DEFAULT_SEED: u64 = 751_339_078;

/// A point on the unit sphere.
pub type Point = Vector3<f64>;

// --- The Core Entity ---

/// An ordered set of points on the unit sphere. The length is fixed for the
/// lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    points: Vec<Point>,
}

impl Configuration {
    /// Builds a configuration from arbitrary non-zero vectors, projecting each
    /// one onto the sphere.
    pub fn from_points(points: Vec<Point>) -> Result<Self, AnnealError> {
        let points = points
            .iter()
            .map(vector::normalize)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { points })
    }

    /// Generates a starting configuration with the requested layout.
    pub fn new_random<R: Rng + ?Sized>(
        layout: InitialLayout,
        n: usize,
        rng: &mut R,
    ) -> Result<Self, AnnealError> {
        match layout {
            InitialLayout::Uniform => Ok(sphere::initialise_uniform(n, rng)),
            InitialLayout::Cluster => sphere::initialise_cluster(n, rng),
        }
    }

    pub(crate) fn from_unit_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, index: usize) -> &Point {
        &self.points[index]
    }

    /// Replaces a point. Callers hand in unit vectors produced by the sphere
    /// module.
    pub(crate) fn set_point(&mut self, index: usize, p: Point) {
        vector::copy(&mut self.points[index], &p);
    }

    /// Overwrites this configuration with `other` without reallocating.
    pub fn snapshot_from(&mut self, other: &Configuration) {
        vector::copy_array(&mut self.points, &other.points);
    }
}

// --- Configuration Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialLayout {
    /// Independent uniform samples.
    Uniform,
    /// Every point is a random walk away from the first one.
    Cluster,
}

/// Which move/objective pair drives the annealer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Single-point random walk, maximise the pairwise sum distance.
    Distance,
    /// Push the closest pair apart, maximise the pairwise sum distance.
    Closeness,
    /// Single-point random walk, minimise the Riesz energy.
    Energy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealParams {
    pub variant: Variant,
    pub layout: InitialLayout,
    pub seed: u64,

    pub point_count: usize,
    pub inner_iterations: usize,

    // Schedule
    pub initial_temperature: f64,
    pub damping: f64,
    pub min_temperature: f64,
}

impl Default for AnnealParams {
    fn default() -> Self {
        Self {
            variant: Variant::Distance,
            layout: InitialLayout::Cluster,
            seed: DEFAULT_SEED,
            point_count: DEFAULT_POINTS,
            inner_iterations: DEFAULT_INNER_ITERATIONS,
            initial_temperature: DEFAULT_INITIAL_TEMPERATURE,
            damping: DEFAULT_DAMPING,
            min_temperature: T_MIN,
        }
    }
}

impl AnnealParams {
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_layout(mut self, layout: InitialLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_point_count(mut self, n: usize) -> Self {
        self.point_count = n;
        self
    }

    pub fn with_inner_iterations(mut self, n: usize) -> Self {
        self.inner_iterations = n;
        self
    }

    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn is_uniform(&self) -> bool {
        self.layout == InitialLayout::Uniform
    }

    /// Rejects parameter sets the annealer cannot run.
    pub fn validate(&self) -> Result<(), AnnealError> {
        let invalid = |msg: String| Err(AnnealError::InvalidConfiguration(msg));

        if self.point_count < 1 {
            return invalid("point count must be at least 1".into());
        }
        if self.variant == Variant::Closeness && self.point_count < 2 {
            return invalid("closeness variant needs at least 2 points".into());
        }
        if self.inner_iterations == 0 {
            return invalid("inner iterations must be positive".into());
        }
        if !self.damping.is_finite() || self.damping <= 0.0 || self.damping >= 1.0 {
            return invalid(format!("damping must be in (0, 1), got {}", self.damping));
        }
        if !self.min_temperature.is_finite() || self.min_temperature <= 0.0 {
            return invalid(format!(
                "temperature floor must be positive, got {}",
                self.min_temperature
            ));
        }
        if !self.initial_temperature.is_finite() || self.initial_temperature <= self.min_temperature {
            return invalid(format!(
                "initial temperature {} must exceed the floor {}",
                self.initial_temperature, self.min_temperature
            ));
        }
        Ok(())
    }

    /// Number of temperature levels the schedule will visit: the count of
    /// k >= 0 with `T0 * damping^k > floor`.
    pub fn scheduled_levels(&self) -> usize {
        let mut t = self.initial_temperature;
        let mut levels = 0;
        while t > self.min_temperature {
            levels += 1;
            t *= self.damping;
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let p = AnnealParams::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.point_count, 50);
        assert_eq!(p.seed, 751_339_078);
        assert!(!p.is_uniform());
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let base = AnnealParams::default();
        assert!(base.clone().with_point_count(0).validate().is_err());
        assert!(base.clone().with_damping(1.0).validate().is_err());
        assert!(base.clone().with_damping(0.0).validate().is_err());
        assert!(base.clone().with_inner_iterations(0).validate().is_err());
        assert!(base.clone().with_initial_temperature(0.1).validate().is_err());
        assert!(base.clone().with_min_temperature(-1.0).validate().is_err());
        assert!(base
            .clone()
            .with_variant(Variant::Closeness)
            .with_point_count(1)
            .validate()
            .is_err());
        assert!(base.with_point_count(1).validate().is_ok());
    }

    #[test]
    fn test_scheduled_levels() {
        let p = AnnealParams::default()
            .with_initial_temperature(1.0)
            .with_damping(0.9)
            .with_min_temperature(0.1);
        assert_eq!(p.scheduled_levels(), 22);
    }

    #[test]
    fn test_from_points_normalizes() {
        let c = Configuration::from_points(vec![Vector3::new(0.0, 0.0, 5.0)]).unwrap();
        assert!((c.point(0).z - 1.0).abs() < 1e-12);
        assert!(Configuration::from_points(vec![Vector3::zeros()]).is_err());
    }
}
