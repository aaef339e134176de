use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};
use ratatui::widgets::TableState;

use crate::analysis::packing::PackingReport;
use crate::core::domain::{AnnealParams, Configuration};
use crate::engine::evaluator::{Direction, Objective};
use crate::solvers::{LevelStats, SolverEvent};

// --- Constants ---
const HISTORY_CAPACITY: usize = 1000;
const LOG_CAPACITY: usize = 200;
const BEST_CAPACITY: usize = 50;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Dashboard,
    Parameters,
    BestHistory,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Starting,
    Running,
    Cancelling,
    Finished,
}

// --- Telemetry ---

#[derive(Debug, Clone)]
pub struct Telemetry {
    // History Queues for Sparklines
    pub objective_history: VecDeque<(f64, f64)>, // (Level, Objective)
    pub acceptance_history: VecDeque<(f64, f64)>, // (Level, Acceptance %)
    pub temperature_history: VecDeque<(f64, f64)>,

    // Global Bounds for Chart Scaling
    pub objective_min: f64,
    pub objective_max: f64,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            objective_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            acceptance_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            temperature_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            objective_min: f64::MAX,
            objective_max: f64::MIN,
        }
    }

    pub fn ingest(&mut self, stats: &LevelStats) {
        if self.objective_history.len() >= HISTORY_CAPACITY {
            self.objective_history.pop_front();
            self.acceptance_history.pop_front();
            self.temperature_history.pop_front();
        }

        if stats.objective.is_finite() {
            self.objective_min = self.objective_min.min(stats.objective);
            self.objective_max = self.objective_max.max(stats.objective);
        }

        let x = stats.level as f64;
        self.objective_history.push_back((x, stats.objective));
        self.acceptance_history.push_back((x, stats.acceptance_rate() * 100.0));
        self.temperature_history.push_back((x, stats.temperature));
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// Visualization State for the sphere viewer
#[derive(Debug, Clone)]
pub struct Viewport {
    pub azimuth: f64,
    pub elevation: f64,
    pub auto_rotate: bool,
    pub last_tick: Instant,
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.35,
            auto_rotate: true,
            last_tick: Instant::now(),
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        if self.auto_rotate {
            let dt = now.duration_since(self.last_tick).as_secs_f64();
            self.azimuth += 0.5 * dt; // Rotate 0.5 rad/s
        }
        self.last_tick = now;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

/// A best snapshot received from the worker.
#[derive(Debug, Clone)]
pub struct BestEntry {
    pub iteration: u64,
    pub objective: f64,
    pub min_angle_deg: Option<f64>,
    pub configuration: Configuration,
}

// --- The Master State ---

pub struct AppState {
    // System
    pub should_quit: bool,
    pub mode: AppMode,
    pub params: AnnealParams,
    pub objective: Objective,

    // Worker
    pub rx: Option<Receiver<SolverEvent>>,
    pub worker_status: WorkerStatus,
    cancel: Arc<AtomicBool>,

    // Simulation Data
    pub scheduled_levels: usize,
    pub last_level: Option<LevelStats>,
    pub start_time: Instant,
    pub best_history: Vec<BestEntry>,
    pub active: Option<Configuration>,
    pub final_report: Option<PackingReport>,

    // Analytics
    pub telemetry: Telemetry,
    pub logs: VecDeque<String>,

    // UI Elements
    pub best_state: TableState,
    pub viewport: Viewport,
}

impl AppState {
    pub fn new(params: AnnealParams, cancel: Arc<AtomicBool>) -> Self {
        Self {
            should_quit: false,
            mode: AppMode::Dashboard,
            objective: Objective::for_variant(params.variant),
            scheduled_levels: params.scheduled_levels(),
            params,
            rx: None,
            worker_status: WorkerStatus::Idle,
            cancel,
            last_level: None,
            start_time: Instant::now(),
            best_history: Vec::with_capacity(BEST_CAPACITY),
            active: None,
            final_report: None,
            telemetry: Telemetry::new(),
            logs: VecDeque::with_capacity(LOG_CAPACITY),
            best_state: TableState::default(),
            viewport: Viewport::new(),
        }
    }

    pub fn set_channel(&mut self, rx: Receiver<SolverEvent>) {
        self.rx = Some(rx);
        self.worker_status = WorkerStatus::Starting;
        self.start_time = Instant::now();
    }

    pub fn tick(&mut self) {
        self.viewport.tick();

        // Process Events
        if let Some(rx) = self.rx.clone() {
            for _ in 0..100 {
                match rx.try_recv() {
                    Ok(evt) => self.handle_event(evt),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if self.worker_status != WorkerStatus::Finished {
                            self.worker_status = WorkerStatus::Finished;
                            self.log("Worker disconnected.");
                        }
                        self.rx = None;
                        break;
                    }
                }
            }
        }
    }

    pub fn handle_event(&mut self, event: SolverEvent) {
        match event {
            SolverEvent::Log(msg) => self.log(msg),

            SolverEvent::LevelUpdate(stats) => {
                if self.worker_status != WorkerStatus::Cancelling {
                    self.worker_status = WorkerStatus::Running;
                }
                self.telemetry.ingest(&stats);
                self.last_level = Some(stats);
            }

            SolverEvent::NewBest {
                iteration,
                objective,
                configuration,
            } => self.handle_new_best(iteration, objective, configuration),

            SolverEvent::Finished(best) => {
                let report = PackingReport::from_configuration(&best);
                self.log(format!(
                    ">>> Finished: min separation {:.4}° over {} points",
                    report.min_angle_deg.unwrap_or(0.0),
                    report.points
                ));
                self.final_report = Some(report);
                self.active = Some(best);
                self.worker_status = WorkerStatus::Finished;
            }
        }
    }

    fn handle_new_best(&mut self, iteration: u64, objective: f64, configuration: Configuration) {
        let report = PackingReport::from_configuration(&configuration);
        if iteration > 0 {
            self.log(format!(">>> New best at {}: {:.6}", iteration, objective));
        }

        self.best_history.push(BestEntry {
            iteration,
            objective,
            min_angle_deg: report.min_angle_deg,
            configuration: configuration.clone(),
        });
        if self.best_history.len() > BEST_CAPACITY {
            self.best_history.remove(0);
        }

        self.active = Some(configuration);
    }

    pub fn best_objective(&self) -> Option<f64> {
        self.best_history.last().map(|b| b.objective)
    }

    pub fn direction(&self) -> Direction {
        self.objective.direction()
    }

    pub fn levels_done(&self) -> usize {
        self.last_level.as_ref().map_or(0, |l| l.level + 1)
    }

    pub fn progress(&self) -> f64 {
        if self.scheduled_levels == 0 {
            return 1.0;
        }
        (self.levels_done() as f64 / self.scheduled_levels as f64).clamp(0.0, 1.0)
    }

    /// Logs a message to the internal buffer.
    pub fn log(&mut self, msg: impl Into<String>) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(msg.into());
    }

    // --- Input Handling ---

    pub fn on_key(&mut self, key: char) {
        match key {
            'q' => self.quit(),
            '1' => self.mode = AppMode::Dashboard,
            '2' => self.mode = AppMode::Parameters,
            '3' => self.mode = AppMode::BestHistory,
            '4' => self.mode = AppMode::Viewer,
            'a' => self.viewport.auto_rotate = !self.viewport.auto_rotate,
            'r' => self.viewport.azimuth = 0.0,
            'j' => self.select_next_best(),
            'k' => self.select_prev_best(),
            _ => {}
        }
    }

    /// Asks the worker to stop at its next inner-iteration boundary and
    /// leaves the UI loop.
    pub fn quit(&mut self) {
        if matches!(self.worker_status, WorkerStatus::Starting | WorkerStatus::Running) {
            self.worker_status = WorkerStatus::Cancelling;
        }
        self.cancel.store(true, Ordering::Relaxed);
        self.should_quit = true;
    }

    fn select_next_best(&mut self) {
        if self.best_history.is_empty() {
            return;
        }
        let i = match self.best_state.selected() {
            Some(i) if i + 1 < self.best_history.len() => i + 1,
            _ => 0,
        };
        self.select_best(i);
    }

    fn select_prev_best(&mut self) {
        if self.best_history.is_empty() {
            return;
        }
        let i = match self.best_state.selected() {
            Some(0) | None => self.best_history.len() - 1,
            Some(i) => i - 1,
        };
        self.select_best(i);
    }

    fn select_best(&mut self, i: usize) {
        self.best_state.select(Some(i));
        self.active = Some(self.best_history[i].configuration.clone());
    }
}
