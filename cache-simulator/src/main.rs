use cache_simulator::demo;
use cache_simulator::models::{
    CacheAlgorithm, CacheMode, SimulationConfig, Workload, WorkloadConfig,
};
use cache_simulator::runner::SimulationRunner;
use cache_simulator::stats::SimulationStats;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SIEVE cache workload simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the CLI
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a synthetic workload against SIEVE and baseline caches
    Simulate {
        /// Access pattern: hotspot, zipfian or scan-mixed
        #[arg(short, long, default_value = "zipfian")]
        workload: String,

        /// Number of requests in the trace
        #[arg(short, long, default_value = "1000000")]
        requests: usize,

        /// Number of distinct objects
        #[arg(short, long, default_value = "100000")]
        key_space: u32,

        /// Cache capacity (number of entries)
        #[arg(short, long, default_value = "10000")]
        capacity: usize,

        /// Algorithms to simulate (sieve, lru, moka)
        /// If not provided, all algorithms will be used
        #[arg(short, long, value_name = "ALGOS", num_args = 1.., value_delimiter = ',')]
        algorithms: Option<Vec<String>>,

        /// Execution mode: sequential, threaded, or both
        #[arg(long, default_value = "both")]
        mode: String,

        /// Number of worker threads in threaded mode
        #[arg(long, default_value = "4")]
        threads: usize,

        /// Zipf skew for zipfian and scan-mixed workloads
        #[arg(long, default_value = "0.8")]
        alpha: f64,

        /// Percentage of traffic going to hot objects (hotspot workload)
        #[arg(long, default_value = "80")]
        hot_traffic: u8,

        /// Percentage of objects that are hot (hotspot workload)
        #[arg(long, default_value = "20")]
        hot_objects: u8,

        /// Seed for the trace generator
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Export results to CSV file
        #[arg(long, value_name = "PATH")]
        output_csv: Option<PathBuf>,
    },

    /// Walk through basic operations, eviction, statistics and concurrency
    Demo,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Simulate {
            workload,
            requests,
            key_space,
            capacity,
            algorithms,
            mode,
            threads,
            alpha,
            hot_traffic,
            hot_objects,
            seed,
            output_csv,
        } => {
            let workload = Workload::parse(&workload).ok_or_else(|| {
                format!("unknown workload '{workload}' (expected hotspot, zipfian or scan-mixed)")
            })?;
            let modes = CacheMode::parse_list(&mode).unwrap_or_else(|| {
                println!("Warning: Unknown mode '{mode}', using 'both'");
                vec![CacheMode::Sequential, CacheMode::Threaded]
            });

            let config = SimulationConfig {
                workload: WorkloadConfig {
                    workload,
                    requests,
                    key_space,
                    zipf_alpha: alpha,
                    hot_traffic_percent: hot_traffic,
                    hot_objects_percent: hot_objects,
                    seed,
                },
                capacity,
                algorithms: select_algorithms(algorithms.as_deref()),
                modes,
                thread_count: threads,
            };

            run_simulation(config, output_csv)
        }

        Commands::Demo => {
            demo::run()?;
            Ok(())
        }
    }
}

/// Resolve algorithm names, falling back to all algorithms
fn select_algorithms(names: Option<&[String]>) -> Vec<CacheAlgorithm> {
    let Some(names) = names.filter(|names| !names.is_empty()) else {
        return CacheAlgorithm::all();
    };

    let mut selected = Vec::new();
    for name in names {
        match CacheAlgorithm::parse(name) {
            Some(algo) if !selected.contains(&algo) => selected.push(algo),
            Some(_) => {}
            None => println!("Warning: Unknown algorithm '{name}', skipping"),
        }
    }

    if selected.is_empty() {
        println!("No valid algorithms selected, using all available algorithms");
        CacheAlgorithm::all()
    } else {
        selected
    }
}

/// Run the simulation with the given configuration
fn run_simulation(
    config: SimulationConfig,
    output_csv: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Cache Simulation");
    println!("================");
    println!("Workload: {}", config.workload.workload);
    println!("Cache capacity: {} entries", config.capacity);
    println!(
        "Algorithms: {:?}",
        config.algorithms.iter().map(|a| a.as_str()).collect::<Vec<_>>()
    );
    println!();

    let workload = config.workload.workload;
    let runner = SimulationRunner::new(config);
    let result = runner.run().map_err(|e| {
        eprintln!("Error running simulation: {e}");
        e
    })?;

    println!("\nSimulation completed in {:.2?}", result.duration);
    println!("Total requests: {}", result.total_requests);
    println!("Unique objects: {}", result.unique_objects);

    if let Some(csv_path) = output_csv {
        let stats = SimulationStats::from_result(&result);
        match stats.export_csv(&csv_path, workload, result.capacity) {
            Ok(()) => println!("\nResults exported to: {}", csv_path.display()),
            Err(e) => eprintln!("Failed to export CSV: {e}"),
        }
    }

    Ok(())
}
