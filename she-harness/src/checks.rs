//! Per-check results inside one case.
//!
//! A mismatch marks that check failed and the verifier keeps going; only
//! engine errors end a case early.

use serde::{Deserialize, Serialize};
use she_engine::{CryptoContext, EngineResult, Metadata, PlaintextValue};

/// Outcome of a single comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub label: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

/// Which decode accessor to compare through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Packed,
    CoefPacked,
}

/// Checks recorded for the current case.
#[derive(Debug, Default)]
pub struct CheckLog {
    case: String,
    outcomes: Vec<CheckOutcome>,
}

impl CheckLog {
    pub fn new(case: impl Into<String>) -> Self {
        Self {
            case: case.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn case(&self) -> &str {
        &self.case
    }

    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<CheckOutcome> {
        self.outcomes
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|c| !c.passed).count()
    }

    fn record(&mut self, label: &str, passed: bool, expected: String, actual: String) {
        if !passed {
            log::warn!(
                "{} {label} fails: expected {expected}, got {actual}",
                self.case
            );
        }
        self.outcomes.push(CheckOutcome {
            label: label.to_string(),
            passed,
            expected,
            actual,
        });
    }

    pub fn expect_values(&mut self, label: &str, expected: &[i64], actual: &[i64]) {
        let passed = expected == actual;
        self.record(label, passed, format!("{expected:?}"), format!("{actual:?}"));
    }

    pub fn expect_text(&mut self, label: &str, expected: &str, actual: &str) {
        self.record(label, expected == actual, expected.to_string(), actual.to_string());
    }

    /// Compare a ciphertext tag against the tag it should have inherited.
    pub fn expect_tag<M: Metadata>(&mut self, label: &str, key: &str, expected: &str, ct: &M) {
        let actual = ct.metadata(key);
        self.record(
            label,
            actual == Some(expected),
            expected.to_string(),
            actual.unwrap_or("<missing>").to_string(),
        );
    }

    /// Decrypt `ct`, trim it to the expected length, and compare.
    pub fn expect_decrypts_to<C: CryptoContext>(
        &mut self,
        cc: &C,
        label: &str,
        sk: &C::SecretKey,
        ct: &C::Ciphertext,
        expected: &C::Plaintext,
        view: View,
    ) -> EngineResult<()> {
        let mut result = cc.decrypt(sk, ct)?;
        result.set_length(expected.len());
        let (want, got) = match view {
            View::Packed => (expected.packed_values()?, result.packed_values()?),
            View::CoefPacked => (expected.coef_packed_values()?, result.coef_packed_values()?),
        };
        self.expect_values(label, &want, &got);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatches_are_recorded_and_counted() {
        let mut log = CheckLog::new("ADD_PACKED_01");
        assert_eq!(log.case(), "ADD_PACKED_01");
        log.expect_values("EvalAdd", &[1, 2], &[1, 2]);
        log.expect_values("EvalSub", &[1, 2], &[1, 3]);
        log.expect_text("KeySwitch", "abc", "abc");
        assert_eq!(log.outcomes().len(), 3);
        assert_eq!(log.failures(), 1);
        assert_eq!(log.outcomes()[1].actual, "[1, 3]");
    }
}
