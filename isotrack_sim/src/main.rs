//! IsoTrack simulation CLI
//!
//! Run the corrector over deterministic synthetic scenarios.

use clap::Parser;
use isotrack_sim::scenarios::ScenarioId;
use isotrack_sim::{AssociationExport, ScenarioResult, ScenarioRunner};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// IsoTrack deterministic association testing CLI
#[derive(Parser, Debug)]
#[command(name = "isotrack-sim")]
#[command(about = "Run deterministic association scenarios for isotrack", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (clean, pileup, orphans, no_tracks, tight_cone, wide_cone, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Events per scenario run
    #[arg(short, long, default_value = "100")]
    events: usize,

    /// Override the association cone radius in radians (scenario default otherwise)
    #[arg(short, long)]
    cone: Option<f64>,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export per-event match data to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn build_runner(seed: u64, args: &Args) -> ScenarioRunner {
    let runner = ScenarioRunner::new(seed, args.events);
    match args.cone {
        Some(cone) => runner.with_cone(cone),
        None => runner,
    }
}

fn report(result: &ScenarioResult, json: bool) {
    if json {
        return;
    }
    if result.passed {
        info!(
            "✓ {} (seed={}) PASSED | eff={:.3} pur={:.3} <dR>={:.4}",
            result.scenario.name(),
            result.seed,
            result.metrics.efficiency(),
            result.metrics.purity(),
            result.metrics.mean_delta_r()
        );
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("IsoTrack Association Simulator v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!(
                "Available scenarios: clean, pileup, orphans, no_tracks, tight_cone, wide_cone, all"
            );
            std::process::exit(1);
        })]
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64
    } else {
        args.seed
    };

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }
        let scenario = scenarios[0];
        let cone = args
            .cone
            .unwrap_or_else(|| scenario.params().cone_radius);

        info!("Running with export to: {}", export_path);

        let runner = build_runner(base_seed, &args);
        let mut export = AssociationExport::new(scenario.name(), base_seed, cone);
        let result = runner.run_exporting(scenario, &mut export);

        if let Err(e) = export.write_to_file(export_path) {
            error!("Failed to write export: {:?}", e);
        } else {
            info!("Exported {} frames to {}", export.frames.len(), export_path);
        }

        report(&result, args.json);
        if !result.passed {
            std::process::exit(1);
        }
        return;
    }

    // Run simulations
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = build_runner(seed, &args);

        for scenario in &scenarios {
            let result = runner.run(*scenario);
            report(&result, args.json);

            if !result.passed {
                failed_count += 1;
            }
            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "events": r.events,
                    "candidates": r.metrics.candidates,
                    "matched": r.metrics.matched,
                    "efficiency": r.metrics.efficiency(),
                    "purity": r.metrics.purity(),
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary).unwrap());
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
            for result in &all_results {
                if !result.passed {
                    error!(
                        "  - {} seed={}: {}",
                        result.scenario.name(),
                        result.seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
