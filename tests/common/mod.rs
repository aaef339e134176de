#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use nalgebra::{Rotation3, Unit, Vector3};
use rand::Rng;
use sphere_anneal::core::domain::{AnnealParams, Configuration, Point};
use sphere_anneal::core::error::SinkError;
use sphere_anneal::engine::sink::{RunSink, StepRecord};

pub const EPS: f64 = 1e-9;

pub fn random_rotation<R: Rng>(rng: &mut R) -> Rotation3<f64> {
    let axis = Unit::new_normalize(Vector3::new(
        rng.gen::<f64>() - 0.5,
        rng.gen::<f64>() - 0.5,
        rng.gen::<f64>() - 0.5,
    ));
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    Rotation3::from_axis_angle(&axis, angle)
}

pub fn rotate(config: &Configuration, rot: &Rotation3<f64>) -> Configuration {
    Configuration::from_points(config.points().iter().map(|p| rot * p).collect())
        .expect("rotated points are unit vectors")
}

pub fn assert_unit(p: &Point) {
    assert!((p.norm() - 1.0).abs() < EPS, "point {p:?} has norm {}", p.norm());
}

/// Small annealing run used by most solver tests.
pub fn small_params() -> AnnealParams {
    AnnealParams::default()
        .with_point_count(4)
        .with_seed(12345)
        .with_initial_temperature(1.0)
        .with_damping(0.9)
        .with_min_temperature(0.1)
        .with_inner_iterations(10)
}

/// A fresh directory path under the system temp dir. Not created.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("sphere_anneal_{}_{}_{}", tag, std::process::id(), nanos))
}

/// Every call fails, as if the log target went away.
pub struct FailingSink;

impl RunSink for FailingSink {
    fn log_params(&mut self, _params: &AnnealParams) -> Result<(), SinkError> {
        Err(SinkError::Disconnected)
    }

    fn log_initial(&mut self, _p: &Point) -> Result<(), SinkError> {
        Err(SinkError::Disconnected)
    }

    fn log_step(&mut self, _step: &StepRecord) -> Result<(), SinkError> {
        Err(SinkError::Disconnected)
    }

    fn log_best(&mut self, _p: &Point) -> Result<(), SinkError> {
        Err(SinkError::Disconnected)
    }
}

/// Raises a cancel flag once `after` steps have been logged.
pub struct CancelAfter {
    pub after: usize,
    pub steps: usize,
    pub flag: Arc<AtomicBool>,
}

impl RunSink for CancelAfter {
    fn log_params(&mut self, _params: &AnnealParams) -> Result<(), SinkError> {
        Ok(())
    }

    fn log_initial(&mut self, _p: &Point) -> Result<(), SinkError> {
        Ok(())
    }

    fn log_step(&mut self, _step: &StepRecord) -> Result<(), SinkError> {
        self.steps += 1;
        if self.steps >= self.after {
            self.flag.store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    fn log_best(&mut self, _p: &Point) -> Result<(), SinkError> {
        Ok(())
    }
}
