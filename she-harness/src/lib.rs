//! Verification harness for somewhat-homomorphic encryption engines.
//!
//! A fixed registry of parameter sets, each paired with an operation kind, is
//! run against a [`ContextFactory`](she_engine::ContextFactory). Every case
//! gets a fresh context, its verifier compares decrypted results against
//! known plaintexts, and the outcome lands in a [`RunReport`].

pub mod checks;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod params;
pub mod registry;
pub mod report;
pub mod verifiers;

pub use checks::{CheckLog, CheckOutcome, View};
pub use config::RunnerConfig;
pub use dispatch::{run_parallel, CaseScope, Dispatcher};
pub use error::{CaseFailure, FailureKind, HarnessError, Result};
pub use params::SchemeParameters;
pub use registry::{registry, OperationKind, TestCase};
pub use report::{CaseReport, RunReport};
pub use verifiers::{verifier_for, Verifier};

use log::info;
use she_engine::reference::ReferenceFactory;

fn reference_factory(seed: Option<u64>) -> ReferenceFactory {
    match seed {
        Some(seed) => ReferenceFactory::with_seed(seed),
        None => ReferenceFactory::new(),
    }
}

/// Run the selected registry cases against the reference engine.
///
/// Fails only when the registry itself is malformed or the report cannot be
/// written; case failures are recorded in the returned report.
pub fn run(config: &RunnerConfig) -> Result<RunReport> {
    let cases = registry();
    let duplicates = registry::duplicate_names(&cases);
    if !duplicates.is_empty() {
        let names: Vec<String> = duplicates
            .iter()
            .map(|(name, count)| format!("{name} (x{count})"))
            .collect();
        return Err(HarnessError::DuplicateNames(names.join(", ")));
    }

    let selected = config.select(cases);
    info!("running {} cases on {} worker(s)", selected.len(), config.jobs.max(1));

    let report = run_parallel(&selected, config.jobs, || reference_factory(config.seed));
    info!("{}", report.summary_line());

    if let Some(path) = &config.report_path {
        report.write_json(path)?;
        info!("report written to {}", path.display());
    }
    Ok(report)
}
