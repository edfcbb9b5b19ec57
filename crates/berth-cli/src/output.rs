//! Summary output for the berth CLI

use berth_core::{RunSummary, StartupSummary};
use colored::*;

/// Echo a monitoring run's summary as key/value lines
pub fn print_run_summary(summary: &RunSummary) {
    println!();
    println!(
        "{}",
        format!("=== {} ({} test) ===", summary.engine, summary.test_type).bold()
    );
    println!("Samples:        {}", summary.samples);
    println!("CPU average:    {:.1}%", summary.metrics.cpu_average);
    println!("Memory average: {:.1} MB", summary.metrics.memory_average);
    println!("Power average:  {:.1} mW", summary.metrics.power_average_mw);
}

/// Echo a startup run's summary as key/value lines
pub fn print_startup_summary(summary: &StartupSummary) {
    println!();
    println!("{}", format!("=== {} startup ===", summary.engine).bold());
    println!("Successful attempts: {}", summary.repeat_count);
    println!("Average: {:.2} s", summary.results.average);
    println!("Min:     {:.2} s", summary.results.min);
    println!("Max:     {:.2} s", summary.results.max);
}

/// Report a per-engine failure without aborting the sweep
pub fn print_engine_failure(engine: berth_core::Engine, message: &str) {
    eprintln!("{} {}: {}", "FAILED".red().bold(), engine, message);
}
