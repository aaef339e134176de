use crate::core::domain::Configuration;

/// Summary of one completed temperature level.
/// Used for telemetry and UI visualization.
#[derive(Debug, Clone, Default)]
pub struct LevelStats {
    pub level: usize,
    /// Iteration index of the last step in the level.
    pub iteration: u64,
    pub temperature: f64,
    pub variance: f64,
    /// Objective of the current configuration at the end of the level.
    pub objective: f64,
    pub steps: usize,
    pub accepted: usize,
}

impl LevelStats {
    pub fn acceptance_rate(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.accepted as f64 / self.steps as f64
        }
    }
}

/// Events emitted by a running annealer to the monitor thread.
#[derive(Debug, Clone)]
pub enum SolverEvent {
    /// Diagnostic log message.
    Log(String),

    /// A temperature level finished.
    LevelUpdate(LevelStats),

    /// The best snapshot changed.
    NewBest {
        iteration: u64,
        objective: f64,
        configuration: Configuration,
    },

    /// The run ended; carries the final best configuration.
    Finished(Configuration),
}

pub mod sa;
