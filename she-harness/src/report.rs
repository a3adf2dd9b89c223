//! Per-case and whole-run reports.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::checks::CheckOutcome;
use crate::error::{CaseFailure, Result};
use crate::registry::OperationKind;

/// Result of running one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseReport {
    pub name: String,
    pub kind: OperationKind,
    pub description: String,
    /// Parameters as written in the registry, defaults shown as `DFLT`.
    pub params: String,
    pub checks: Vec<CheckOutcome>,
    pub failure: Option<CaseFailure>,
    pub elapsed_ms: u64,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.failure.is_none() && self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Reports for a whole run, in registry order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub passed: usize,
    pub failed: usize,
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    pub fn from_cases(cases: Vec<CaseReport>) -> Self {
        let passed = cases.iter().filter(|c| c.passed()).count();
        Self {
            passed,
            failed: cases.len() - passed,
            cases,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failed_cases(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.passed())
    }

    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} cases: {} passed, {} failed",
            self.cases.len(),
            self.passed,
            self.failed
        )
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    fn report(name: &str, passed: bool, failure: Option<CaseFailure>) -> CaseReport {
        CaseReport {
            name: name.to_string(),
            kind: OperationKind::EvalSum,
            description: "01".into(),
            params: String::new(),
            checks: vec![CheckOutcome {
                label: "EvalSum window 1".into(),
                passed,
                expected: "[1]".into(),
                actual: if passed { "[1]".into() } else { "[2]".into() },
            }],
            failure,
            elapsed_ms: 0,
        }
    }

    #[test]
    fn counts_failed_checks_and_failures() {
        let failure = CaseFailure {
            kind: FailureKind::Evaluation,
            verifier: "verify_eval_sum".into(),
            message: "missing evaluation key".into(),
        };
        let run = RunReport::from_cases(vec![
            report("EVALSUM_01", true, None),
            report("EVALSUM_02", false, None),
            report("EVALSUM_03", true, Some(failure)),
        ]);
        assert_eq!(run.passed, 1);
        assert_eq!(run.failed, 2);
        assert!(!run.all_passed());
        assert_eq!(run.summary_line(), "3 cases: 1 passed, 2 failed");
        assert_eq!(run.case("EVALSUM_02").map(|c| c.failed_checks().count()), Some(1));
    }

    #[test]
    fn serializes_to_json() {
        let run = RunReport::from_cases(vec![report("EVALSUM_01", true, None)]);
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["passed"], 1);
        assert_eq!(json["cases"][0]["kind"], "EvalSum");
        assert!(json["cases"][0]["failure"].is_null());
    }
}
