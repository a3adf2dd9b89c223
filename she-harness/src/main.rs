use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use she_harness::{registry, OperationKind, RunnerConfig};

#[derive(Parser)]
#[command(name = "she-harness", about = "Run the SHE operation verification registry")]
struct Cli {
    /// Print the selected case names and exit
    #[arg(long)]
    list: bool,

    /// Only run cases whose name contains this substring
    #[arg(long)]
    filter: Option<String>,

    /// Only run these operation kinds (repeatable, e.g. --kind EVALSUM)
    #[arg(long)]
    kind: Vec<String>,

    /// Worker threads, each with its own context factory
    #[arg(long, default_value = "1")]
    jobs: usize,

    /// Seed for reproducible key material
    #[arg(long)]
    seed: Option<u64>,

    /// Write a JSON report to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    let kinds = cli
        .kind
        .iter()
        .map(|k| k.parse::<OperationKind>())
        .collect::<Result<Vec<_>, _>>()?;

    let config = RunnerConfig {
        filter: cli.filter,
        kinds,
        jobs: cli.jobs,
        seed: cli.seed,
        report_path: cli.json,
    };

    if cli.list {
        for case in config.select(registry()) {
            println!("{}\t{}", case.name(), case.params);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let report = she_harness::run(&config)?;
    for case in report.failed_cases() {
        match &case.failure {
            Some(failure) => println!("FAILED {}: {failure}", case.name),
            None => {
                for check in case.failed_checks() {
                    println!(
                        "FAILED {} [{}]: expected {} got {}",
                        case.name, check.label, check.expected, check.actual
                    );
                }
            }
        }
    }
    println!("{}", report.summary_line());

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
