use crossbeam_channel::Sender;

use crate::core::domain::{AnnealParams, Configuration, Point};
use crate::core::error::SinkError;
use crate::solvers::{LevelStats, SolverEvent};

/// One inner iteration of the annealer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord {
    pub iteration: u64,
    /// Objective of the current configuration after the accept/reject decision.
    pub objective: f64,
    /// Candidate minus current, signed so that positive means better.
    pub delta: f64,
    pub temperature: f64,
    pub variance: f64,
    pub accepted: bool,
}

/// Receiver for the records a run produces. The caller owns the sink and its
/// lifecycle; the annealer only appends.
pub trait RunSink {
    fn log_params(&mut self, params: &AnnealParams) -> Result<(), SinkError>;

    fn log_initial(&mut self, p: &Point) -> Result<(), SinkError>;

    fn log_step(&mut self, step: &StepRecord) -> Result<(), SinkError>;

    fn log_best(&mut self, p: &Point) -> Result<(), SinkError>;

    /// Called whenever the best snapshot changes, including once for the
    /// starting configuration.
    fn on_new_best(
        &mut self,
        _iteration: u64,
        _objective: f64,
        _config: &Configuration,
    ) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RunSink for NullSink {
    fn log_params(&mut self, _params: &AnnealParams) -> Result<(), SinkError> {
        Ok(())
    }

    fn log_initial(&mut self, _p: &Point) -> Result<(), SinkError> {
        Ok(())
    }

    fn log_step(&mut self, _step: &StepRecord) -> Result<(), SinkError> {
        Ok(())
    }

    fn log_best(&mut self, _p: &Point) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub params: Option<AnnealParams>,
    pub initial: Vec<Point>,
    pub steps: Vec<StepRecord>,
    pub best: Vec<Point>,
    /// (steps completed, objective) for every best snapshot.
    pub best_snapshots: Vec<(u64, f64)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted_flags(&self) -> Vec<bool> {
        self.steps.iter().map(|s| s.accepted).collect()
    }
}

impl RunSink for MemorySink {
    fn log_params(&mut self, params: &AnnealParams) -> Result<(), SinkError> {
        self.params = Some(params.clone());
        Ok(())
    }

    fn log_initial(&mut self, p: &Point) -> Result<(), SinkError> {
        self.initial.push(*p);
        Ok(())
    }

    fn log_step(&mut self, step: &StepRecord) -> Result<(), SinkError> {
        self.steps.push(*step);
        Ok(())
    }

    fn log_best(&mut self, p: &Point) -> Result<(), SinkError> {
        self.best.push(*p);
        Ok(())
    }

    fn on_new_best(&mut self, iteration: u64, objective: f64, _config: &Configuration) -> Result<(), SinkError> {
        self.best_snapshots.push((iteration, objective));
        Ok(())
    }
}

/// Optional sink: `None` behaves like [`NullSink`].
impl<S: RunSink> RunSink for Option<S> {
    fn log_params(&mut self, params: &AnnealParams) -> Result<(), SinkError> {
        self.as_mut().map_or(Ok(()), |s| s.log_params(params))
    }

    fn log_initial(&mut self, p: &Point) -> Result<(), SinkError> {
        self.as_mut().map_or(Ok(()), |s| s.log_initial(p))
    }

    fn log_step(&mut self, step: &StepRecord) -> Result<(), SinkError> {
        self.as_mut().map_or(Ok(()), |s| s.log_step(step))
    }

    fn log_best(&mut self, p: &Point) -> Result<(), SinkError> {
        self.as_mut().map_or(Ok(()), |s| s.log_best(p))
    }

    fn on_new_best(&mut self, iteration: u64, objective: f64, config: &Configuration) -> Result<(), SinkError> {
        self.as_mut().map_or(Ok(()), |s| s.on_new_best(iteration, objective, config))
    }
}

/// Fans every record out to two sinks. Both are always called; the first
/// error is returned.
#[derive(Debug)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: RunSink, B: RunSink> RunSink for Tee<A, B> {
    fn log_params(&mut self, params: &AnnealParams) -> Result<(), SinkError> {
        let a = self.0.log_params(params);
        let b = self.1.log_params(params);
        a.and(b)
    }

    fn log_initial(&mut self, p: &Point) -> Result<(), SinkError> {
        let a = self.0.log_initial(p);
        let b = self.1.log_initial(p);
        a.and(b)
    }

    fn log_step(&mut self, step: &StepRecord) -> Result<(), SinkError> {
        let a = self.0.log_step(step);
        let b = self.1.log_step(step);
        a.and(b)
    }

    fn log_best(&mut self, p: &Point) -> Result<(), SinkError> {
        let a = self.0.log_best(p);
        let b = self.1.log_best(p);
        a.and(b)
    }

    fn on_new_best(&mut self, iteration: u64, objective: f64, config: &Configuration) -> Result<(), SinkError> {
        let a = self.0.on_new_best(iteration, objective, config);
        let b = self.1.on_new_best(iteration, objective, config);
        a.and(b)
    }
}

/// Forwards a run to the monitor thread. Steps are folded into one
/// [`LevelStats`] per temperature level to keep the channel quiet.
pub struct ChannelSink {
    tx: Sender<SolverEvent>,
    inner_iterations: usize,
    point_count: usize,
    level: usize,
    window: Vec<StepRecord>,
    best: Vec<Point>,
}

impl ChannelSink {
    pub fn new(tx: Sender<SolverEvent>) -> Self {
        Self {
            tx,
            inner_iterations: 0,
            point_count: 0,
            level: 0,
            window: Vec::new(),
            best: Vec::new(),
        }
    }

    fn send(&self, event: SolverEvent) -> Result<(), SinkError> {
        self.tx.send(event).map_err(|_| SinkError::Disconnected)
    }

    fn flush_level(&mut self) -> Result<(), SinkError> {
        let Some(last) = self.window.last().copied() else {
            return Ok(());
        };
        let accepted = self.window.iter().filter(|s| s.accepted).count();
        let stats = LevelStats {
            level: self.level,
            iteration: last.iteration,
            temperature: last.temperature,
            variance: last.variance,
            objective: last.objective,
            steps: self.window.len(),
            accepted,
        };
        self.level += 1;
        self.window.clear();
        self.send(SolverEvent::LevelUpdate(stats))
    }
}

impl RunSink for ChannelSink {
    fn log_params(&mut self, params: &AnnealParams) -> Result<(), SinkError> {
        self.inner_iterations = params.inner_iterations;
        self.point_count = params.point_count;
        self.window = Vec::with_capacity(params.inner_iterations);
        self.best = Vec::with_capacity(params.point_count);
        self.send(SolverEvent::Log(format!(
            "Seed {} | {} points | T0 {} | damping {} | {} iter/level",
            params.seed,
            params.point_count,
            params.initial_temperature,
            params.damping,
            params.inner_iterations
        )))
    }

    fn log_initial(&mut self, _p: &Point) -> Result<(), SinkError> {
        Ok(())
    }

    fn log_step(&mut self, step: &StepRecord) -> Result<(), SinkError> {
        self.window.push(*step);
        if self.window.len() >= self.inner_iterations {
            self.flush_level()?;
        }
        Ok(())
    }

    fn log_best(&mut self, p: &Point) -> Result<(), SinkError> {
        // A cancelled run ends mid-level.
        self.flush_level()?;
        self.best.push(*p);
        if self.best.len() == self.point_count {
            let points = std::mem::take(&mut self.best);
            self.send(SolverEvent::Finished(Configuration::from_unit_points(points)))?;
        }
        Ok(())
    }

    fn on_new_best(&mut self, iteration: u64, objective: f64, config: &Configuration) -> Result<(), SinkError> {
        self.send(SolverEvent::NewBest {
            iteration,
            objective,
            configuration: config.clone(),
        })
    }
}
