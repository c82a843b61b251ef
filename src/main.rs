//! Iteration-bounded supervisor for an autonomous agent loop.
//!
//! Repeatedly invokes an external agent CLI against a fixed prompt,
//! watching the transcript for a completion marker and the run document
//! (`prd.json`) for a targeted story's pass/fail state. Prior-run
//! artifacts are archived whenever the document's branch label changes.

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;

use overseer::exit_codes;
use overseer::io::agent::CliAgent;
use overseer::io::config::load_config;
use overseer::io::paths::LoopPaths;
use overseer::logging;
use overseer::looping::{LoopOptions, LoopOutcome, LoopStop, run_loop};

#[derive(Parser)]
#[command(
    name = "overseer",
    version,
    about = "Iteration-bounded supervisor for an autonomous agent loop"
)]
struct Cli {
    /// Maximum number of agent invocations before giving up.
    #[arg(default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    max_iterations: u32,

    /// Stop as soon as this story (1-based position) passes or fails.
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    story: Option<u64>,
}

fn main() {
    logging::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Malformed arguments are fatal before any iteration runs;
            // --help and --version still exit cleanly.
            let code = if err.use_stderr() {
                exit_codes::FAILURE
            } else {
                exit_codes::OK
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    match run(&cli) {
        Ok(outcome) => {
            announce(&outcome);
            let code = if outcome.stop.is_success() {
                exit_codes::OK
            } else {
                exit_codes::FAILURE
            };
            std::process::exit(code);
        }
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILURE);
        }
    }
}

fn run(cli: &Cli) -> Result<LoopOutcome> {
    let paths = LoopPaths::from_exe()?;
    let config = load_config(&paths.config_path)?;
    let prompt = fs::read_to_string(&paths.prompt_path)
        .with_context(|| format!("read prompt {}", paths.prompt_path.display()))?;
    let agent = CliAgent::new(config.agent.command.clone(), config.output_limit_bytes)?;

    let options = LoopOptions {
        max_iterations: cli.max_iterations,
        target_story: cli.story.map(|position| position as usize),
        ..LoopOptions::default()
    };

    run_loop(&paths, &agent, &prompt, &options, |iter, max| {
        println!("=== iteration {iter}/{max} ===");
    })
}

/// Announce the stop reason distinctly, so the operator can tell why the
/// loop ended without consulting the progress log.
fn announce(outcome: &LoopOutcome) {
    match &outcome.stop {
        LoopStop::Complete => println!(
            "Agent signalled completion after iteration {}.",
            outcome.iterations_run
        ),
        LoopStop::StoryPassed { position, id } => println!(
            "Story {position} ({id}) passed after iteration {}.",
            outcome.iterations_run
        ),
        LoopStop::StoryFailed {
            position,
            id,
            status,
        } => println!(
            "Story {position} ({id}) was attempted and did not pass (status: {status})."
        ),
        LoopStop::BudgetExhausted { iterations } => {
            println!("No stop condition after {iterations} iterations; giving up.");
        }
    }
}
