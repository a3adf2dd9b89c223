//! Runs cases and keeps them from seeing each other's contexts.
//!
//! Every case runs inside a [`CaseScope`]. Dropping the scope releases every
//! context the factory handed out, whether the verifier passed, returned an
//! error, or panicked. A released context refuses further work, so nothing a
//! case generated (keys, cached contexts) reaches the next one.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Instant;

use log::{error, info};
use she_engine::{ContextFactory, CryptoContext};

use crate::checks::CheckLog;
use crate::error::CaseFailure;
use crate::registry::TestCase;
use crate::report::{CaseReport, RunReport};
use crate::verifiers::verifier_for;

/// Releases all contexts of a factory when dropped.
pub struct CaseScope<'f, F: ContextFactory> {
    factory: &'f F,
}

impl<'f, F: ContextFactory> CaseScope<'f, F> {
    pub fn new(factory: &'f F) -> Self {
        Self { factory }
    }
}

impl<F: ContextFactory> Drop for CaseScope<'_, F> {
    fn drop(&mut self) {
        self.factory.release_all_contexts();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

/// Owns a context factory and runs cases against it, one at a time.
pub struct Dispatcher<F: ContextFactory> {
    factory: F,
}

impl<F: ContextFactory> Dispatcher<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Run one case inside its own scope. Never panics, never returns early.
    pub fn run_case(&self, case: &TestCase) -> CaseReport {
        let name = case.name();
        let verifier = verifier_for::<F::Context>(case.kind);
        let mut log = CheckLog::new(name.clone());
        let started = Instant::now();

        let scope = CaseScope::new(&self.factory);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), CaseFailure> {
            let params = case.params.resolve();
            let cc = self
                .factory
                .generate_context(&params)
                .map_err(|err| CaseFailure::configuration(verifier.name, &err))?;
            (verifier.run)(&cc, &mut log)
                .map_err(|err| CaseFailure::from_engine(verifier.name, &err))
        }));
        let mut failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(failure)) => Some(failure),
            Err(payload) => Some(CaseFailure::panic(verifier.name, panic_message(&*payload))),
        };
        // Release runs after the verifier's unwind finished, so a panic here is
        // a single panic and can be caught like any other.
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || drop(scope))) {
            let message = format!("context release panicked: {}", panic_message(&*payload));
            if failure.is_none() {
                failure = Some(CaseFailure::panic(verifier.name, message));
            }
        }

        let failed_checks = log.failures();
        match &failure {
            Some(failure) => error!("{name}: {failure}"),
            None if failed_checks > 0 => error!(
                "{name}: {failed_checks} of {} checks failed",
                log.outcomes().len()
            ),
            None => info!("{name}: ok ({} checks)", log.outcomes().len()),
        }

        CaseReport {
            name,
            kind: case.kind,
            description: case.description.clone(),
            params: case.params.to_string(),
            checks: log.into_outcomes(),
            failure,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Run cases in order; a failing case never stops the run.
    pub fn run_all(&self, cases: &[TestCase]) -> RunReport {
        RunReport::from_cases(cases.iter().map(|case| self.run_case(case)).collect())
    }
}

/// Report for a case that never reached `run_case`'s failure boundary.
fn lost_case<C: CryptoContext>(case: &TestCase, message: &str) -> CaseReport {
    let name = case.name();
    let failure = CaseFailure::panic(verifier_for::<C>(case.kind).name, message.to_string());
    error!("{name}: {failure}");
    CaseReport {
        name,
        kind: case.kind,
        description: case.description.clone(),
        params: case.params.to_string(),
        checks: Vec::new(),
        failure: Some(failure),
        elapsed_ms: 0,
    }
}

/// Run every `jobs`-th case starting at `worker`, tagged with its registry index.
///
/// A factory that cannot be built fails each case of the shard instead of
/// taking the shard down.
fn run_shard<F, M>(
    cases: &[TestCase],
    worker: usize,
    jobs: usize,
    make_factory: &M,
) -> Vec<(usize, CaseReport)>
where
    F: ContextFactory,
    M: Fn() -> F,
{
    let shard = cases.iter().enumerate().skip(worker).step_by(jobs);
    match panic::catch_unwind(AssertUnwindSafe(make_factory)) {
        Ok(factory) => {
            let dispatcher = Dispatcher::new(factory);
            shard.map(|(i, case)| (i, dispatcher.run_case(case))).collect()
        }
        Err(payload) => {
            let message = format!(
                "worker {worker}: factory panicked: {}",
                panic_message(&*payload)
            );
            shard
                .map(|(i, case)| (i, lost_case::<F::Context>(case, &message)))
                .collect()
        }
    }
}

/// Shard cases round-robin over `jobs` workers, each with its own factory.
///
/// Reports come back in registry order regardless of which worker ran them,
/// and every case gets one, even if its worker died.
pub fn run_parallel<F, M>(cases: &[TestCase], jobs: usize, make_factory: M) -> RunReport
where
    F: ContextFactory,
    M: Fn() -> F + Sync,
{
    let jobs = jobs.clamp(1, cases.len().max(1));
    if jobs == 1 {
        let reports = run_shard(cases, 0, 1, &make_factory);
        return RunReport::from_cases(reports.into_iter().map(|(_, report)| report).collect());
    }

    let mut slots: Vec<Option<CaseReport>> = (0..cases.len()).map(|_| None).collect();
    thread::scope(|s| {
        let make_factory = &make_factory;
        let handles: Vec<_> = (0..jobs)
            .map(|worker| s.spawn(move || run_shard(cases, worker, jobs, make_factory)))
            .collect();
        for (worker, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(reports) => {
                    for (i, report) in reports {
                        slots[i] = Some(report);
                    }
                }
                Err(_) => error!("worker {worker} died outside a case boundary"),
            }
        }
    });

    let reports = slots
        .into_iter()
        .zip(cases)
        .map(|(slot, case)| {
            slot.unwrap_or_else(|| lost_case::<F::Context>(case, "worker died before reporting"))
        })
        .collect();
    RunReport::from_cases(reports)
}
