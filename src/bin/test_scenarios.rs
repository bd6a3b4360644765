//! Scenario test runner CLI
//!
//! Usage:
//!   cargo run --bin test-scenarios                   # Run all scenarios
//!   cargo run --bin test-scenarios -- control/       # Run category
//!   cargo run --bin test-scenarios -- possession/kick_releases  # Run one
//!   cargo run --bin test-scenarios -- --verbose      # Show details on failure
//!   cargo run --bin test-scenarios -- --parallel     # Run on all cores

use std::env;
use std::path::Path;
use std::process::ExitCode;

use kickabout::testing::{SCENARIOS_DIR, ScenarioOutcome, Summary, TestResult, run_scenarios};

fn main() -> ExitCode {
    let mut verbose = false;
    let mut parallel = false;
    let mut filter: Option<String> = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--verbose" | "-v" => verbose = true,
            "--parallel" | "-p" => parallel = true,
            other if !other.starts_with('-') => filter = Some(other.to_string()),
            other => eprintln!("Ignoring unknown flag {}", other),
        }
    }

    let root = Path::new(SCENARIOS_DIR);
    if !root.is_dir() {
        eprintln!("No scenarios directory at {}", SCENARIOS_DIR);
        return ExitCode::FAILURE;
    }

    let outcomes = run_scenarios(root, filter.as_deref(), parallel);
    if outcomes.is_empty() {
        eprintln!("No scenarios match {}", filter.as_deref().unwrap_or("*"));
        return ExitCode::FAILURE;
    }

    let mut category = None;
    for outcome in &outcomes {
        if category != Some(&outcome.category) {
            println!("{}/", outcome.category);
            category = Some(&outcome.category);
        }
        report(outcome, verbose);
    }

    let summary = Summary::of(&outcomes);
    println!(
        "\n{} passed, {} failed, {} errors",
        summary.passed, summary.failed, summary.errors
    );
    if summary.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report(outcome: &ScenarioOutcome, verbose: bool) {
    let name = &outcome.name;
    match &outcome.result {
        TestResult::Pass { frames } => println!("  {:<40} PASS ({} frames)", name, frames),
        TestResult::Fail { error } => {
            println!("  {:<40} FAIL", name);
            if verbose {
                println!("    {}", error);
            } else {
                println!("    {}", error.message);
            }
        }
        TestResult::Error { message } => {
            println!("  {:<40} ERROR", name);
            println!("    {}", message);
        }
    }
}
