use sphere_anneal::analysis::packing::{uniform_baseline, PackingReport};
use sphere_anneal::core::domain::{AnnealParams, InitialLayout, Variant};
use sphere_anneal::engine::sink::NullSink;
use sphere_anneal::solvers::sa::{rng_for, SimulatedAnnealing};
use std::time::Instant;
use anyhow::Result;

fn main() -> Result<()> {
    let base = AnnealParams {
        point_count: 50,
        inner_iterations: 100,
        initial_temperature: 30.0,
        damping: 0.99,
        layout: InitialLayout::Uniform,
        ..Default::default()
    };

    let baseline = uniform_baseline(base.point_count, 200, &mut rng_for(base.seed));
    println!(
        "Uniform baseline: {:.4} +/- {:.4}",
        baseline.mean, baseline.std_dev
    );

    for variant in [Variant::Distance, Variant::Closeness, Variant::Energy] {
        let params = base.clone().with_variant(variant);
        let annealer = SimulatedAnnealing::new(params)?;

        let start = Instant::now();
        let outcome = annealer.solve(&mut NullSink)?;
        let duration = start.elapsed();

        let report = PackingReport::from_configuration(&outcome.best);
        println!(
            "{:?}: {} iterations in {:?}, sum {:.4}, energy {:.4}, min angle {:.3} deg",
            variant,
            outcome.iterations,
            duration,
            report.sum_distance,
            report.riesz_energy,
            report.min_angle_deg.unwrap_or(0.0)
        );
    }
    Ok(())
}
