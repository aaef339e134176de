use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use crossbeam_channel::unbounded;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::LevelFilter;
use ratatui::{backend::CrosstermBackend, Terminal};

use sphere_anneal::analysis::packing::{uniform_baseline, PackingReport};
use sphere_anneal::core::domain::{
    AnnealParams, InitialLayout, Variant, DEFAULT_DAMPING, DEFAULT_INITIAL_TEMPERATURE,
    DEFAULT_INNER_ITERATIONS, DEFAULT_POINTS, DEFAULT_SEED, T_MIN,
};
use sphere_anneal::engine::external::run_log::CsvRunLog;
use sphere_anneal::engine::sink::{ChannelSink, Tee};
use sphere_anneal::interface::logging::{self, ChannelLogger, StderrLogger};
use sphere_anneal::interface::state::AppState;
use sphere_anneal::interface::ui;
use sphere_anneal::solvers::sa::{rng_for, AnnealOutcome, SimulatedAnnealing};
use sphere_anneal::solvers::SolverEvent;

// --- CLI Definitions ---

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    /// Random walk, maximise the pairwise sum distance
    Distance,
    /// Push the closest pair apart
    Closeness,
    /// Random walk, minimise the Riesz energy
    Energy,
}

impl From<VariantArg> for Variant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Distance => Variant::Distance,
            VariantArg::Closeness => Variant::Closeness,
            VariantArg::Energy => Variant::Energy,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Uniformly distribute points on a sphere by simulated annealing", long_about = None)]
struct Args {
    /// Damping factor for the annealing process
    #[arg(short, long, default_value_t = DEFAULT_DAMPING)]
    damping: f64,

    /// Number of iterations per temperature level
    #[arg(short, long, default_value_t = DEFAULT_INNER_ITERATIONS)]
    iterations: usize,

    /// Number of points
    #[arg(short = 'n', long = "points", default_value_t = DEFAULT_POINTS)]
    points: usize,

    /// Seed for the random number generator
    #[arg(short = 'r', long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Initial value for the temperature
    #[arg(short, long, default_value_t = DEFAULT_INITIAL_TEMPERATURE)]
    temperature: f64,

    /// Start from a uniform configuration instead of a cluster
    #[arg(short, long)]
    uniform: bool,

    /// Move/objective pair to anneal with
    #[arg(long, value_enum, default_value_t = VariantArg::Distance)]
    variant: VariantArg,

    /// Temperature floor that ends the schedule
    #[arg(long, default_value_t = T_MIN)]
    floor: f64,

    /// Base directory for the timestamped run logs
    #[arg(long, default_value = "./log")]
    log_dir: PathBuf,

    /// Do not write run logs
    #[arg(long)]
    no_log: bool,

    /// Show a live terminal dashboard while annealing
    #[arg(short, long)]
    monitor: bool,

    /// Log every temperature level
    #[arg(short, long)]
    verbose: bool,

    /// Only sample uniform configurations and print the mean sum distance
    #[arg(long, value_name = "SAMPLES")]
    baseline: Option<usize>,
}

impl Args {
    fn params(&self) -> AnnealParams {
        AnnealParams::default()
            .with_variant(self.variant.into())
            .with_layout(if self.uniform { InitialLayout::Uniform } else { InitialLayout::Cluster })
            .with_seed(self.seed)
            .with_point_count(self.points)
            .with_inner_iterations(self.iterations)
            .with_initial_temperature(self.temperature)
            .with_damping(self.damping)
            .with_min_temperature(self.floor)
    }

    fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    fn open_run_log(&self) -> Result<Option<CsvRunLog>> {
        if self.no_log {
            return Ok(None);
        }
        let log = CsvRunLog::open(&self.log_dir)
            .with_context(|| format!("Could not create run log under {}", self.log_dir.display()))?;
        Ok(Some(log))
    }
}

// --- Terminal Guard (RAII) ---

struct TuiContext {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TuiContext {
    fn new() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to setup terminal alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal backend")?;
        Ok(Self { terminal })
    }
}

impl Drop for TuiContext {
    fn drop(&mut self) {
        // Best-effort restoration of terminal state
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

// --- Initialization Helpers ---

fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Forcefully restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));
}

fn print_outcome(outcome: &AnnealOutcome) {
    let report = PackingReport::from_configuration(&outcome.best);
    println!(
        "{} after {} levels / {} iterations ({} accepted, {} improving)",
        if outcome.cancelled { "Cancelled" } else { "Finished" },
        outcome.levels,
        outcome.iterations,
        outcome.accepted_moves,
        outcome.improving_moves
    );
    println!(
        "Objective: initial {:.6} -> best {:.6}",
        outcome.initial_objective, outcome.best_objective
    );
    if let (Some(chord), Some(angle)) = (report.min_chord, report.min_angle_deg) {
        println!("Min separation: {:.6} chord, {:.4} deg", chord, angle);
    }
    if outcome.sink_failures > 0 {
        eprintln!("Warning: {} run log writes failed", outcome.sink_failures);
    }
}

/// Writes the summary and flushes the run log.
fn close_run_log(log: Option<CsvRunLog>, outcome: &AnnealOutcome) -> Result<Option<PathBuf>> {
    let Some(log) = log else {
        return Ok(None);
    };
    log.write_summary(&PackingReport::from_configuration(&outcome.best))
        .context("Failed to write run summary")?;
    let dir = log.finish().context("Failed to flush run log")?;
    Ok(Some(dir))
}

// --- Modes ---

fn run_baseline(args: &Args, samples: usize) -> Result<()> {
    let mut rng = rng_for(args.seed);
    let b = uniform_baseline(args.points, samples, &mut rng);
    println!(
        "Uniform baseline over {} samples of {} points: Mean {:.6} +/- {:.6}",
        b.samples, args.points, b.mean, b.std_dev
    );
    Ok(())
}

fn run_headless(args: &Args) -> Result<()> {
    let level = args.log_level();
    logging::install(Box::new(StderrLogger::new(level)), level)
        .map_err(|e| anyhow!("Failed to install logger: {}", e))?;

    let annealer = SimulatedAnnealing::new(args.params()).context("Invalid run parameters")?;
    let mut run_log = args.open_run_log()?;

    let outcome = annealer.solve(&mut run_log).context("Annealing failed")?;

    print_outcome(&outcome);
    if let Some(dir) = close_run_log(run_log, &outcome)? {
        println!("Run log: {}", dir.display());
    }
    Ok(())
}

fn run_monitor(args: &Args) -> Result<()> {
    setup_panic_hook();

    let params = args.params();
    let annealer = SimulatedAnnealing::new(params.clone()).context("Invalid run parameters")?;
    let run_log = args.open_run_log()?;

    let (tx, rx) = unbounded();
    let level = args.log_level();
    logging::install(Box::new(ChannelLogger::new(tx.clone(), level)), level)
        .map_err(|e| anyhow!("Failed to install logger: {}", e))?;

    let cancel = Arc::new(AtomicBool::new(false));
    let mut app = AppState::new(params, cancel.clone());
    app.set_channel(rx);

    // Spawn Solver Thread
    let worker = thread::Builder::new()
        .name("Anneal-Worker".to_string())
        .spawn(move || -> Result<(AnnealOutcome, Option<PathBuf>)> {
            let mut sink = Tee(ChannelSink::new(tx.clone()), run_log);
            let result = annealer.solve_with_cancel(&mut sink, Some(&cancel));
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    let _ = tx.send(SolverEvent::Log(format!("Error: {}", e)));
                    return Err(e.into());
                }
            };
            let Tee(_, run_log) = sink;
            let dir = close_run_log(run_log, &outcome)?;
            Ok((outcome, dir))
        })
        .context("Failed to spawn annealing worker")?;

    {
        let mut tui = TuiContext::new().context("Failed to initialize TUI")?;

        // Event Loop
        let tick_rate = Duration::from_millis(50); // 20 FPS
        let mut last_tick = Instant::now();

        while !app.should_quit {
            tui.terminal.draw(|f| ui::draw(f, &mut app))?;

            let timeout = tick_rate.saturating_sub(last_tick.elapsed());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == event::KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char(c) => app.on_key(c),
                            KeyCode::Esc => app.quit(),
                            _ => {}
                        }
                    }
                }
            }

            if last_tick.elapsed() >= tick_rate {
                app.tick();
                last_tick = Instant::now();
            }
        }
    }

    // Terminal is restored; the worker stops at its next iteration boundary.
    let (outcome, dir) = worker
        .join()
        .map_err(|_| anyhow!("Annealing worker panicked"))??;
    print_outcome(&outcome);
    if let Some(dir) = dir {
        println!("Run log: {}", dir.display());
    }
    Ok(())
}

// --- Main ---

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(samples) = args.baseline {
        return run_baseline(&args, samples);
    }

    if args.monitor {
        run_monitor(&args)
    } else {
        run_headless(&args)
    }
}
