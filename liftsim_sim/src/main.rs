//! LiftSim Simulator CLI
//!
//! Run deterministic fleet scenarios, or drive a live fleet on the tokio
//! runtime with `--realtime`.

use clap::Parser;
use liftsim_core::{ChannelObserver, Fleet, FleetConfig, FleetError, FleetEvent, FleetRuntime};
use liftsim_env::TokioContext;
use liftsim_sim::scenarios::ScenarioId;
use liftsim_sim::{ScenarioResult, ScenarioRunner};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// LiftSim elevator fleet simulator
#[derive(Parser, Debug)]
#[command(name = "liftsim")]
#[command(about = "Run deterministic elevator fleet simulations", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (nearest_idle, saturation, rush_hour, maintenance, misconfigured_bounds, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Main phase duration in seconds (virtual, or wall-clock with --realtime)
    #[arg(short, long, default_value = "120", value_parser = parse_duration_secs)]
    duration: f64,

    /// Number of elevators
    #[arg(short, long, default_value = "4")]
    elevators: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export frames of a single scenario to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Ticks between exported frames
    #[arg(long, default_value = "5")]
    export_every: u64,

    /// Run a live fleet on the tokio runtime instead of scenarios
    #[arg(long)]
    realtime: bool,

    /// Simulation clock period in milliseconds
    #[arg(long, env = "SIMULATION_INTERVAL_MS", default_value = "1000")]
    tick_ms: u64,

    /// Dispatch cycle period in milliseconds
    #[arg(long, env = "DISPATCH_INTERVAL_MS", default_value = "2000")]
    dispatch_ms: u64,

    /// Travel time between adjacent floors in milliseconds
    #[arg(long, env = "TIME_PER_FLOOR_MS", default_value = "3000")]
    time_per_floor_ms: u64,

    /// Door hold time in milliseconds
    #[arg(long, env = "TIME_DOOR_OPEN_MS", default_value = "5000")]
    time_door_open_ms: u64,

    /// Lowest floor
    #[arg(long, env = "MIN_FLOORS", default_value = "-3", allow_negative_numbers = true)]
    min_floor: i32,

    /// Highest floor
    #[arg(long, env = "MAX_FLOORS", default_value = "50", allow_negative_numbers = true)]
    max_floor: i32,
}

/// Accepts a finite, non-negative number of seconds that fits in a `Duration`.
fn parse_duration_secs(value: &str) -> Result<f64, String> {
    let secs: f64 = value.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{secs}: {e}"))?;
    Ok(secs)
}

impl Args {
    fn fleet_config(&self) -> FleetConfig {
        let mut config = FleetConfig::default()
            .with_floors(self.min_floor, self.max_floor)
            .with_timing(
                Duration::from_millis(self.time_per_floor_ms),
                Duration::from_millis(self.time_door_open_ms),
            );
        config.tick_interval = Duration::from_millis(self.tick_ms);
        config.dispatch_interval = Duration::from_millis(self.dispatch_ms);
        if !config.contains_floor(config.default_floor) {
            config.default_floor = self.min_floor;
        }
        config
    }
}

/// Runs a fleet on tokio with the generator enabled for `duration` seconds.
async fn run_realtime(config: FleetConfig, elevators: usize, duration: Duration) -> Result<(), FleetError> {
    let fleet = Arc::new(Fleet::new(TokioContext::shared(), config)?);

    let (observer, mut events) = ChannelObserver::new();
    fleet.add_observer(Arc::new(observer));
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                FleetEvent::MaintenanceLogged(log) => {
                    info!("[MAINTENANCE] {}: {}", log.elevator_name, log.description)
                }
                other => debug!("event: {:?}", other),
            }
        }
    });

    for i in 0..elevators.max(1) {
        let capacity = fleet.config().default_capacity;
        fleet.create_elevator(&format!("Elevator {}", i + 1), capacity)?;
    }

    let runtime = FleetRuntime::spawn(fleet.clone(), true);
    tokio::time::sleep(duration).await;
    runtime.stop();

    for elevator in fleet.list() {
        info!(
            "{}: floor {} {} load {}/{} targets {:?}",
            elevator.name,
            elevator.current_floor,
            elevator.status,
            elevator.current_load,
            elevator.capacity,
            elevator.target_floors
        );
    }
    info!("{} requests still queued after {} ticks", fleet.queue().len(), fleet.tick_count());
    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --verbose when set
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", err);
    }

    let config = args.fleet_config();

    if args.realtime {
        info!("LiftSim realtime fleet: {} elevators for {}s", args.elevators, args.duration);
        let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(err) => {
                error!("Failed to start tokio runtime: {}", err);
                std::process::exit(1);
            }
        };
        let duration = match Duration::try_from_secs_f64(args.duration) {
            Ok(duration) => duration,
            Err(err) => {
                error!("Invalid --duration {}: {}", args.duration, err);
                std::process::exit(1);
            }
        };
        if let Err(err) = runtime.block_on(run_realtime(config, args.elevators, duration)) {
            error!("Fleet failed: {}", err);
            std::process::exit(1);
        }
        return;
    }

    if !args.json {
        info!("LiftSim Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Available scenarios: nearest_idle, saturation, rush_hour, maintenance, misconfigured_bounds, all");
                std::process::exit(1);
            }
        }
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }

        info!("Running with export to: {}", export_path);
        let runner = ScenarioRunner::new(base_seed, args.elevators)
            .with_duration(args.duration)
            .with_config(config);
        let (result, export) = runner.run_with_export(scenarios[0], args.export_every);

        if let Err(e) = export.write_to_file(export_path) {
            error!("Failed to write export: {}", e);
            std::process::exit(1);
        }
        info!("Exported {} frames to {}", export.frames.len(), export_path);

        if result.passed {
            info!("✓ {} (seed={}) PASSED", scenarios[0].name(), base_seed);
        } else {
            error!(
                "✗ {} FAILED: {}",
                scenarios[0].name(),
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
            std::process::exit(1);
        }
        return;
    }

    // Track results
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);

        let runner = ScenarioRunner::new(seed, args.elevators)
            .with_duration(args.duration)
            .with_config(config.clone());

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                if result.passed {
                    info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

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
                    "ticks": r.total_ticks,
                    "time_secs": r.final_time_secs,
                    "elevators": r.final_elevator_count,
                    "metrics": r.metrics,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to encode summary: {}", e);
                std::process::exit(1);
            }
        }
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
