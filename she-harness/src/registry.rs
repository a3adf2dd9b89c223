//! The test matrix: which operation runs under which scheme configuration.
//!
//! The table is plain data, built once by [`registry`]. Row groups share a
//! shape and differ only in the techniques they sweep, so each group is
//! produced by a small builder instead of being spelled out field by field.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use she_engine::{
    EncodingTechnique, KeySwitchTechnique, MultiplicationTechnique, ScalingTechnique,
    SchemeFamily, SecretKeyDist, SecurityLevel,
};

use crate::error::HarnessError;
use crate::params::SchemeParameters;

pub const BATCH: usize = 16;
pub const BATCH_LRG: usize = 1 << 12;
pub const PTM: u64 = 64;
pub const PTM_LRG: u64 = 65537;
/// Digit size for the small BV-keyed BGV rows.
pub const BV_DSIZE: u32 = 4;

/// Operation category under test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    AddPacked,
    MultCoefPacked,
    MultPacked,
    EvalAtIndex,
    EvalMerge,
    EvalSum,
    Metadata,
    EvalSumAll,
    KsSingleCrt,
    KsModReduceDcrt,
}

impl OperationKind {
    pub const ALL: [OperationKind; 10] = [
        OperationKind::AddPacked,
        OperationKind::MultCoefPacked,
        OperationKind::MultPacked,
        OperationKind::EvalAtIndex,
        OperationKind::EvalMerge,
        OperationKind::EvalSum,
        OperationKind::Metadata,
        OperationKind::EvalSumAll,
        OperationKind::KsSingleCrt,
        OperationKind::KsModReduceDcrt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::AddPacked => "ADD_PACKED",
            OperationKind::MultCoefPacked => "MULT_COEF_PACKED",
            OperationKind::MultPacked => "MULT_PACKED",
            OperationKind::EvalAtIndex => "EVALATINDEX",
            OperationKind::EvalMerge => "EVALMERGE",
            OperationKind::EvalSum => "EVALSUM",
            OperationKind::Metadata => "METADATA",
            OperationKind::EvalSumAll => "EVALSUM_ALL",
            OperationKind::KsSingleCrt => "KS_SINGLE_CRT",
            OperationKind::KsModReduceDcrt => "KS_MOD_REDUCE_DCRT",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HarnessError::UnknownKind(s.to_string()))
    }
}

/// One row of the matrix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub kind: OperationKind,
    pub description: String,
    pub params: SchemeParameters,
}

impl TestCase {
    pub fn new(
        kind: OperationKind,
        description: impl Into<String>,
        params: SchemeParameters,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            params,
        }
    }

    /// `<KIND>_<description>`, restricted to `[A-Za-z0-9_]`.
    pub fn name(&self) -> String {
        let raw = format!("{}_{}", self.kind, self.description);
        raw.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.params)
    }
}

/// Names that occur more than once, with their counts.
pub fn duplicate_names(cases: &[TestCase]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for case in cases {
        *counts.entry(case.name()).or_default() += 1;
    }
    counts.into_iter().filter(|(_, n)| *n > 1).collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Row builders
// ═══════════════════════════════════════════════════════════════════════

const DISTS: [SecretKeyDist; 2] = [SecretKeyDist::UniformTernary, SecretKeyDist::Gaussian];

const SCALINGS: [ScalingTechnique; 4] = [
    ScalingTechnique::FixedManual,
    ScalingTechnique::FixedAuto,
    ScalingTechnique::FlexibleAuto,
    ScalingTechnique::FlexibleAutoExt,
];

const MULT_TECHS: [MultiplicationTechnique; 4] = [
    MultiplicationTechnique::Hps,
    MultiplicationTechnique::Behz,
    MultiplicationTechnique::HpsPOverQ,
    MultiplicationTechnique::HpsPOverQLeveled,
];

const KS_TECHS: [KeySwitchTechnique; 2] = [KeySwitchTechnique::Bv, KeySwitchTechnique::Hybrid];

const ENCODINGS: [EncodingTechnique; 2] = [EncodingTechnique::Standard, EncodingTechnique::POverQ];

/// Ciphertext operation counts a row declares.
#[derive(Clone, Copy, Default)]
struct Counts {
    add: Option<u32>,
    mult: Option<u32>,
    key_switch: Option<u32>,
}

/// Eight small BGV rows: distribution × scaling technique, BV keyed.
fn bgv_small(ring_dimension: usize, plaintext_modulus: u64) -> Vec<SchemeParameters> {
    let mut rows = Vec::with_capacity(8);
    for dist in DISTS {
        for scaling in SCALINGS {
            rows.push(SchemeParameters {
                ring_dimension: Some(ring_dimension),
                multiplicative_depth: Some(2),
                scaling_mod_size: Some(59),
                digit_size: Some(BV_DSIZE),
                batch_size: Some(BATCH),
                secret_key_dist: Some(dist),
                max_relinearization_degree: Some(1),
                first_mod_size: Some(60),
                security_level: Some(SecurityLevel::NotSet),
                key_switch_technique: Some(KeySwitchTechnique::Bv),
                scaling_technique: Some(scaling),
                plaintext_modulus: Some(plaintext_modulus),
                encoding_technique: Some(EncodingTechnique::Standard),
                ..SchemeParameters::new(SchemeFamily::Bgvrns)
            });
        }
    }
    rows
}

fn bfv_row(
    plaintext_modulus: u64,
    counts: Counts,
    dist: SecretKeyDist,
    mult_tech: MultiplicationTechnique,
    encoding: EncodingTechnique,
) -> SchemeParameters {
    SchemeParameters {
        scaling_mod_size: Some(60),
        digit_size: Some(20),
        batch_size: Some(BATCH),
        secret_key_dist: Some(dist),
        plaintext_modulus: Some(plaintext_modulus),
        eval_add_count: counts.add,
        eval_mult_count: counts.mult,
        key_switch_count: counts.key_switch,
        multiplication_technique: Some(mult_tech),
        encoding_technique: Some(encoding),
        ..SchemeParameters::new(SchemeFamily::Bfvrns)
    }
}

/// 32 BFV rows: encoding × key switching × multiplication technique × distribution.
fn bfv_keyed(plaintext_modulus: u64, counts: Counts) -> Vec<SchemeParameters> {
    let mut rows = Vec::with_capacity(32);
    for encoding in ENCODINGS {
        for ks in KS_TECHS {
            for mult_tech in MULT_TECHS {
                for dist in DISTS {
                    rows.push(SchemeParameters {
                        key_switch_technique: Some(ks),
                        ..bfv_row(plaintext_modulus, counts, dist, mult_tech, encoding)
                    });
                }
            }
        }
    }
    rows
}

/// 16 BFV rows with manual scaling: encoding × multiplication technique × distribution.
fn bfv_manual(plaintext_modulus: u64, counts: Counts) -> Vec<SchemeParameters> {
    let mut rows = Vec::with_capacity(16);
    for encoding in ENCODINGS {
        for mult_tech in MULT_TECHS {
            for dist in DISTS {
                rows.push(SchemeParameters {
                    scaling_technique: Some(ScalingTechnique::FixedManual),
                    ..bfv_row(plaintext_modulus, counts, dist, mult_tech, encoding)
                });
            }
        }
    }
    rows
}

/// Large-ring BGV rows for key switching over a string message.
fn bgv_key_switch(scalings: &[ScalingTechnique]) -> Vec<SchemeParameters> {
    scalings
        .iter()
        .map(|&scaling| SchemeParameters {
            ring_dimension: Some(1 << 13),
            multiplicative_depth: Some(1),
            scaling_mod_size: Some(50),
            digit_size: Some(1),
            scaling_technique: Some(scaling),
            plaintext_modulus: Some(256),
            standard_deviation: Some(4.0),
            encoding_technique: Some(EncodingTechnique::Standard),
            ..SchemeParameters::new(SchemeFamily::Bgvrns)
        })
        .collect()
}

fn evalsum_all_rows() -> Vec<SchemeParameters> {
    ENCODINGS
        .iter()
        .map(|&encoding| SchemeParameters {
            ring_dimension: Some(BATCH_LRG),
            scaling_mod_size: Some(60),
            digit_size: Some(20),
            batch_size: Some(BATCH_LRG),
            scaling_technique: Some(ScalingTechnique::FixedManual),
            plaintext_modulus: Some(PTM_LRG),
            eval_mult_count: Some(2),
            encoding_technique: Some(encoding),
            ..SchemeParameters::new(SchemeFamily::Bfvrns)
        })
        .collect()
}

/// Number rows "01", "02", ... in order.
fn numbered(kind: OperationKind, rows: Vec<SchemeParameters>) -> impl Iterator<Item = TestCase> {
    rows.into_iter()
        .enumerate()
        .map(move |(i, params)| TestCase::new(kind, format!("{:02}", i + 1), params))
}

/// The full test matrix in execution order.
pub fn registry() -> Vec<TestCase> {
    use OperationKind::*;

    let add_counts = Counts {
        add: Some(1),
        mult: Some(0),
        key_switch: None,
    };
    let mult_coef_counts = Counts {
        mult: Some(1),
        ..Counts::default()
    };
    let mult_counts = Counts {
        mult: Some(2),
        ..Counts::default()
    };
    let rotate_counts = Counts {
        add: None,
        mult: Some(0),
        key_switch: Some(1),
    };

    let groups: Vec<(OperationKind, Vec<SchemeParameters>)> = vec![
        (AddPacked, [bgv_small(16, PTM), bfv_keyed(PTM, add_counts)].concat()),
        (MultCoefPacked, [bgv_small(16, PTM), bfv_keyed(PTM, mult_coef_counts)].concat()),
        (MultPacked, [bgv_small(256, PTM_LRG), bfv_keyed(PTM_LRG, mult_counts)].concat()),
        (EvalAtIndex, [bgv_small(256, PTM_LRG), bfv_keyed(PTM_LRG, rotate_counts)].concat()),
        (EvalMerge, [bgv_small(256, PTM_LRG), bfv_manual(PTM_LRG, mult_counts)].concat()),
        (EvalSum, bfv_manual(PTM_LRG, mult_counts)),
        (Metadata, [bgv_small(256, PTM_LRG), bfv_manual(PTM_LRG, mult_counts)].concat()),
        (EvalSumAll, evalsum_all_rows()),
        (KsSingleCrt, bgv_key_switch(&SCALINGS)),
        // Mod reduce is a no-op under the auto scaling techniques.
        (KsModReduceDcrt, bgv_key_switch(&[ScalingTechnique::FixedManual])),
    ];

    groups
        .into_iter()
        .flat_map(|(kind, rows)| numbered(kind, rows))
        .collect()
}
