use std::path::PathBuf;

use crate::registry::{OperationKind, TestCase};

/// What to run and where to put the results.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Only cases whose name contains this substring.
    pub filter: Option<String>,
    /// Only these kinds; empty means all.
    pub kinds: Vec<OperationKind>,
    /// Worker threads. Each owns its own context factory.
    pub jobs: usize,
    /// Seed for reproducible key material; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Where to write the JSON report, if anywhere.
    pub report_path: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            filter: None,
            kinds: Vec::new(),
            jobs: 1,
            seed: None,
            report_path: None,
        }
    }
}

impl RunnerConfig {
    /// Keep the cases this configuration selects, preserving order.
    pub fn select(&self, cases: Vec<TestCase>) -> Vec<TestCase> {
        cases
            .into_iter()
            .filter(|case| self.kinds.is_empty() || self.kinds.contains(&case.kind))
            .filter(|case| {
                self.filter
                    .as_deref()
                    .map_or(true, |needle| case.name().contains(needle))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::registry;

    #[test]
    fn selects_by_kind_and_substring() {
        let config = RunnerConfig {
            kinds: vec![OperationKind::KsSingleCrt, OperationKind::EvalSumAll],
            filter: Some("_0".into()),
            ..RunnerConfig::default()
        };
        let names: Vec<String> = config.select(registry()).iter().map(TestCase::name).collect();
        assert_eq!(
            names,
            vec![
                "EVALSUM_ALL_01",
                "EVALSUM_ALL_02",
                "KS_SINGLE_CRT_01",
                "KS_SINGLE_CRT_02",
                "KS_SINGLE_CRT_03",
                "KS_SINGLE_CRT_04",
            ]
        );
    }

    #[test]
    fn default_selects_everything() {
        assert_eq!(RunnerConfig::default().select(registry()).len(), registry().len());
    }
}
