use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::domain::{AnnealParams, Configuration, BOLTZMANN_CONSTANT};
use crate::core::error::{AnnealError, SinkError};
use crate::engine::evaluator::Objective;
use crate::engine::operators::{sync_move, Proposal};
use crate::engine::sink::{RunSink, StepRecord};

/// The single reproducible random source of a run.
pub fn rng_for(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Metropolis acceptance probability for a move whose oriented change is
/// `delta` at `temperature`.
pub fn metropolis_probability(delta: f64, temperature: f64) -> f64 {
    (-delta.abs() / (BOLTZMANN_CONSTANT * temperature)).exp()
}

/// Result of an annealing run.
#[derive(Debug, Clone)]
pub struct AnnealOutcome {
    pub best: Configuration,
    pub best_objective: f64,
    pub initial_objective: f64,

    /// Temperature at which the loop stopped.
    pub final_temperature: f64,
    /// Completed temperature levels.
    pub levels: usize,
    pub iterations: u64,
    pub accepted_moves: u64,
    pub improving_moves: u64,

    pub cancelled: bool,
    /// Sink calls that failed and were skipped.
    pub sink_failures: usize,

    /// (steps completed, objective) at every best snapshot. The starting
    /// configuration is recorded at 0; an improvement found by step `i`
    /// is recorded at `i + 1`, so entries are strictly increasing.
    pub best_history: Vec<(u64, f64)>,
}

/// Counts sink failures and warns once; the run never stops for logging.
struct BestEffort {
    failures: usize,
}

impl BestEffort {
    fn record(&mut self, result: Result<(), SinkError>) {
        if let Err(e) = result {
            if self.failures == 0 {
                warn!("Run log unavailable, continuing without it: {}", e);
            }
            self.failures += 1;
        }
    }
}

/// Single-walker simulated annealing over point configurations on the unit
/// sphere.
///
/// The move generator and the objective are chosen from the run's
/// [`Variant`](crate::core::domain::Variant); the loop is shared.
pub struct SimulatedAnnealing {
    params: AnnealParams,
    objective: Objective,
    proposal: Proposal,
}

impl SimulatedAnnealing {
    pub fn new(params: AnnealParams) -> Result<Self, AnnealError> {
        params.validate()?;
        Ok(Self {
            objective: Objective::for_variant(params.variant),
            proposal: Proposal::for_variant(params.variant),
            params,
        })
    }

    pub fn params(&self) -> &AnnealParams {
        &self.params
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn solve(&self, sink: &mut dyn RunSink) -> Result<AnnealOutcome, AnnealError> {
        self.solve_with_cancel(sink, None)
    }

    /// Seeds the generator, builds the starting configuration and runs.
    pub fn solve_with_cancel(
        &self,
        sink: &mut dyn RunSink,
        cancel: Option<&AtomicBool>,
    ) -> Result<AnnealOutcome, AnnealError> {
        let mut rng = rng_for(self.params.seed);
        let start = Configuration::new_random(self.params.layout, self.params.point_count, &mut rng)?;
        self.solve_from(start, &mut rng, sink, cancel)
    }

    /// Runs the annealing loop from an explicit starting configuration.
    ///
    /// `cancel` is polled before every inner iteration; a cancelled run still
    /// reports its best snapshot.
    pub fn solve_from<R: Rng + ?Sized>(
        &self,
        start: Configuration,
        rng: &mut R,
        sink: &mut dyn RunSink,
        cancel: Option<&AtomicBool>,
    ) -> Result<AnnealOutcome, AnnealError> {
        let p = &self.params;
        if start.len() != p.point_count {
            return Err(AnnealError::InvalidConfiguration(format!(
                "starting configuration has {} points, expected {}",
                start.len(),
                p.point_count
            )));
        }

        let direction = self.objective.direction();
        let mut sink_status = BestEffort { failures: 0 };

        sink_status.record(sink.log_params(p));
        for point in start.points() {
            sink_status.record(sink.log_initial(point));
        }

        // 1. Initial state: best starts as the starting configuration.
        let mut current = start;
        let mut candidate = current.clone();
        let mut current_obj = self.objective.evaluate(&current);
        let initial_objective = current_obj;

        let mut best = current.clone();
        let mut best_obj = current_obj;
        let mut best_history = vec![(0, best_obj)];
        sink_status.record(sink.on_new_best(0, best_obj, &best));

        info!(
            "Annealing {} points ({:?}, {}): initial {} = {:.6}, {} levels scheduled",
            p.point_count,
            p.variant,
            if p.is_uniform() { "uniform" } else { "clustered" },
            self.objective.name(),
            initial_objective,
            p.scheduled_levels()
        );

        let start_time = Instant::now();
        let mut temperature = p.initial_temperature;
        let mut iteration: u64 = 0;
        let mut levels = 0;
        let mut accepted_moves: u64 = 0;
        let mut improving_moves: u64 = 0;
        let mut cancelled = false;

        // 2. Main Loop
        'cooling: while temperature > p.min_temperature {
            let variance = self.proposal.variance(temperature);
            let mut accepted_in_level = 0;

            for _ in 0..p.inner_iterations {
                if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                    cancelled = true;
                    break 'cooling;
                }

                // A. Propose
                let mv = self.proposal.apply(&current, &mut candidate, variance, rng)?;

                // B. Evaluate
                let candidate_obj = self.objective.evaluate(&candidate);
                let delta = direction.gain(candidate_obj, current_obj);
                let improved = direction.improves(candidate_obj, current_obj);

                // C. Metropolis Acceptance
                let accepted =
                    improved || rng.gen::<f64>() < metropolis_probability(delta, temperature);

                if accepted {
                    sync_move(&mut current, &candidate, mv);
                    current_obj = candidate_obj;
                    accepted_moves += 1;
                    accepted_in_level += 1;
                    if improved {
                        improving_moves += 1;
                    }

                    // D. Snapshot Best
                    // Snapshots count completed steps; 0 is the start.
                    if direction.improves(current_obj, best_obj) {
                        best.snapshot_from(&current);
                        best_obj = current_obj;
                        best_history.push((iteration + 1, best_obj));
                        sink_status.record(sink.on_new_best(iteration + 1, best_obj, &best));
                    }
                } else {
                    sync_move(&mut candidate, &current, mv);
                }

                // E. Record
                sink_status.record(sink.log_step(&StepRecord {
                    iteration,
                    objective: current_obj,
                    delta,
                    temperature,
                    variance,
                    accepted,
                }));
                iteration += 1;
            }

            debug!(
                "Level {} T={:.5} var={:.5}: {}/{} accepted, current {:.6}, best {:.6}",
                levels, temperature, variance, accepted_in_level, p.inner_iterations, current_obj, best_obj
            );
            levels += 1;
            temperature *= p.damping;
        }

        for point in best.points() {
            sink_status.record(sink.log_best(point));
        }

        info!(
            "Annealing {} after {} levels / {} iterations in {:.2}s: best {:.6}, accepted {}/{}",
            if cancelled { "cancelled" } else { "finished" },
            levels,
            iteration,
            start_time.elapsed().as_secs_f64(),
            best_obj,
            accepted_moves,
            iteration
        );

        Ok(AnnealOutcome {
            best,
            best_objective: best_obj,
            initial_objective,
            final_temperature: temperature,
            levels,
            iterations: iteration,
            accepted_moves,
            improving_moves,
            cancelled,
            sink_failures: sink_status.failures,
            best_history,
        })
    }
}
