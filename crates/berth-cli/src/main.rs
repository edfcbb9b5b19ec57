//! berth - benchmark CLI for container-runtime engines

use anyhow::Result;
use berth_core::{Engine, MonitorConfig, PowerStrategy, StartupConfig, TestType};
use berth_monitor::ResourceMonitor;
use berth_startup::StartupProber;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

mod output;

/// Benchmark container-runtime engines on this host
#[derive(Debug, Parser)]
#[command(name = "berth")]
#[command(about = "Benchmark container-runtime engines: resource usage and cold-start latency")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sample steady-state resource usage under a workload
    Monitor {
        /// Engine to test
        #[arg(value_enum)]
        engine: EngineArg,

        /// Sampling duration in seconds
        #[arg(short, long, default_value = "600")]
        duration: u64,

        /// Polling interval in seconds
        #[arg(short, long, default_value = "5")]
        interval: u64,

        /// Workload type
        #[arg(short, long, value_enum, default_value = "idle")]
        test: TestTypeArg,

        /// Output directory
        #[arg(short, long, default_value = "results/performance")]
        output: PathBuf,

        /// Compose file for the idle stack
        #[arg(long)]
        compose_file: Option<PathBuf>,

        /// Power attribution strategy
        #[arg(long, value_enum, default_value = "apportioned")]
        power_source: PowerSourceArg,
    },

    /// Measure cold-start latency across repetitions
    Startup {
        /// Engine to test
        #[arg(value_enum)]
        engine: EngineArg,

        /// Number of test repetitions
        #[arg(short, long, default_value = "3")]
        repeat: u32,

        /// Results directory
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Diagnostic logs directory
        #[arg(long, default_value = "logs")]
        logs_dir: PathBuf,

        /// Readiness timeout in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,

        /// Don't stop engines after testing
        #[arg(long)]
        no_cleanup: bool,
    },
}

/// Engine argument, including the `all` sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    DockerDesktop,
    PodmanDesktop,
    Orbstack,
    RancherDesktop,
    Colima,
    All,
}

impl EngineArg {
    /// The engines this argument selects, in fixed sweep order
    fn engines(self) -> Vec<Engine> {
        match self {
            EngineArg::DockerDesktop => vec![Engine::DockerDesktop],
            EngineArg::PodmanDesktop => vec![Engine::PodmanDesktop],
            EngineArg::Orbstack => vec![Engine::Orbstack],
            EngineArg::RancherDesktop => vec![Engine::RancherDesktop],
            EngineArg::Colima => vec![Engine::Colima],
            EngineArg::All => Engine::all().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestTypeArg {
    Idle,
    Load,
}

impl From<TestTypeArg> for TestType {
    fn from(arg: TestTypeArg) -> Self {
        match arg {
            TestTypeArg::Idle => TestType::Idle,
            TestTypeArg::Load => TestType::Load,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PowerSourceArg {
    /// Apportion system CPU power by the engine's CPU share
    Apportioned,
    /// Continuously sample the top power column through a side file
    Top,
}

impl From<PowerSourceArg> for PowerStrategy {
    fn from(arg: PowerSourceArg) -> Self {
        match arg {
            PowerSourceArg::Apportioned => PowerStrategy::Apportioned,
            PowerSourceArg::Top => PowerStrategy::TopSampler,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "berth_cli={level},berth_core={level},berth_engine={level},berth_metrics={level},berth_monitor={level},berth_startup={level}",
            level = log_level
        ))
        .with_target(false)
        .init();

    debug!("Starting berth with args: {:?}", cli);

    match cli.command {
        Commands::Monitor {
            engine,
            duration,
            interval,
            test,
            output,
            compose_file,
            power_source,
        } => {
            run_monitor(
                engine.engines(),
                duration,
                interval,
                test.into(),
                output,
                compose_file,
                power_source.into(),
            )
            .await
        }
        Commands::Startup {
            engine,
            repeat,
            output,
            logs_dir,
            timeout,
            no_cleanup,
        } => {
            run_startup(
                engine.engines(),
                repeat,
                output,
                logs_dir,
                timeout,
                no_cleanup,
                cli.verbose,
            )
            .await
        }
    }
}

async fn run_monitor(
    engines: Vec<Engine>,
    duration: u64,
    interval: u64,
    test_type: TestType,
    output: PathBuf,
    compose_file: Option<PathBuf>,
    power_strategy: PowerStrategy,
) -> Result<()> {
    let mut failures = 0;

    for engine in &engines {
        let mut config = MonitorConfig::new(*engine, test_type)
            .with_duration(Duration::from_secs(duration))
            .with_interval(Duration::from_secs(interval))
            .with_output_dir(&output)
            .with_power_strategy(power_strategy);
        if let Some(ref file) = compose_file {
            config = config.with_compose_file(file);
        }

        // One engine's failure never aborts the sweep
        let outcome = match ResourceMonitor::new(config) {
            Ok(mut monitor) => monitor.run().await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(Some(summary)) => output::print_run_summary(&summary),
            Ok(None) => {
                output::print_engine_failure(*engine, "no samples collected");
                failures += 1;
            }
            Err(e) => {
                output::print_engine_failure(*engine, &e.to_string());
                failures += 1;
            }
        }
    }

    if failures == engines.len() {
        anyhow::bail!("all monitoring runs failed");
    }
    Ok(())
}

async fn run_startup(
    engines: Vec<Engine>,
    repeat: u32,
    output: PathBuf,
    logs_dir: PathBuf,
    timeout: u64,
    no_cleanup: bool,
    verbose: bool,
) -> Result<()> {
    let mut failures = 0;

    for engine in &engines {
        let mut config = StartupConfig::new(*engine)
            .with_repeat_count(repeat)
            .with_ready_timeout(Duration::from_secs(timeout))
            .with_output_dir(&output)
            .with_logs_dir(&logs_dir)
            .with_verbose(verbose);
        if no_cleanup {
            config = config.without_cleanup();
        }

        let outcome = match StartupProber::new(config) {
            Ok(mut prober) => prober.run().await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(outcome) => match outcome.summary {
                Some(summary) => output::print_startup_summary(&summary),
                None => {
                    output::print_engine_failure(*engine, "no successful startup measurements");
                    failures += 1;
                }
            },
            Err(e) => {
                output::print_engine_failure(*engine, &e.to_string());
                failures += 1;
            }
        }
    }

    println!("Testing complete. Results in directory {}", output.display());

    if failures == engines.len() {
        anyhow::bail!("all startup tests failed");
    }
    Ok(())
}
