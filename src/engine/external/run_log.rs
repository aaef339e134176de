use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::{Writer, WriterBuilder};
use log::info;

use crate::analysis::packing::PackingReport;
use crate::core::domain::{AnnealParams, Point};
use crate::core::error::SinkError;
use crate::engine::sink::{RunSink, StepRecord};

const SIM_LOG: &str = "sim.log";
const BEST_LOG: &str = "best.log";
const INITIAL_LOG: &str = "initial.log";
const PARAM_LOG: &str = "param.log";
const SUMMARY: &str = "summary.json";

/// CSV run log written into a UTC-timestamped directory
/// (`<base>/YYYYMMDDhhmmss/`), one file per record kind.
///
/// Opening fails if the directory already exists, so two runs started in
/// the same second never interleave their files.
pub struct CsvRunLog {
    dir: PathBuf,
    sim: Writer<File>,
    best: Writer<File>,
    initial: Writer<File>,
    param: Writer<File>,
}

impl CsvRunLog {
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self, SinkError> {
        let stamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        Self::open_in(base_dir.as_ref().join(stamp))
    }

    /// Opens the log in an explicit directory, which must not exist yet.
    pub fn open_in(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir(&dir)?;

        let sim = Self::writer(&dir, SIM_LOG, &[
            "Iteration",
            "Distance",
            "DistanceDelta",
            "Temperature",
            "Variance",
            "Accepted",
        ])?;
        let best = Self::writer(&dir, BEST_LOG, &["x", "y", "z"])?;
        let initial = Self::writer(&dir, INITIAL_LOG, &["x", "y", "z"])?;
        let param = Self::writer(&dir, PARAM_LOG, &[
            "RandomNum",
            "Iteration",
            "Points",
            "TMax",
            "TDamping",
            "UniformInitialConfiguration",
        ])?;

        info!("Run log directory: {}", dir.display());
        Ok(Self { dir, sim, best, initial, param })
    }

    fn writer(dir: &Path, name: &str, header: &[&str]) -> Result<Writer<File>, SinkError> {
        let mut w = WriterBuilder::new().has_headers(false).from_path(dir.join(name))?;
        w.write_record(header)?;
        Ok(w)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the packing report next to the CSV files.
    pub fn write_summary(&self, report: &PackingReport) -> Result<(), SinkError> {
        let file = File::create(self.dir.join(SUMMARY))?;
        serde_json::to_writer_pretty(file, report)?;
        Ok(())
    }

    /// Flushes every file. Dropping without calling this may lose the tail
    /// of the step log.
    pub fn finish(mut self) -> Result<PathBuf, SinkError> {
        self.sim.flush()?;
        self.best.flush()?;
        self.initial.flush()?;
        self.param.flush()?;
        Ok(self.dir)
    }
}

fn point_row(w: &mut Writer<File>, p: &Point) -> Result<(), SinkError> {
    w.serialize((p.x, p.y, p.z))?;
    Ok(())
}

impl RunSink for CsvRunLog {
    fn log_params(&mut self, params: &AnnealParams) -> Result<(), SinkError> {
        self.param.serialize((
            params.seed,
            params.inner_iterations,
            params.point_count,
            params.initial_temperature,
            params.damping,
            u8::from(params.is_uniform()),
        ))?;
        self.param.flush()?;
        Ok(())
    }

    fn log_initial(&mut self, p: &Point) -> Result<(), SinkError> {
        point_row(&mut self.initial, p)
    }

    fn log_step(&mut self, step: &StepRecord) -> Result<(), SinkError> {
        self.sim.serialize((
            step.iteration,
            step.objective,
            step.delta,
            step.temperature,
            step.variance,
            u8::from(step.accepted),
        ))?;
        Ok(())
    }

    fn log_best(&mut self, p: &Point) -> Result<(), SinkError> {
        point_row(&mut self.best, p)
    }
}
