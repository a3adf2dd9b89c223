//! Scheme parameters with per-field "use the scheme default".
//!
//! `None` means the scheme default. [`SchemeParameters::resolve`] is a pure
//! function keyed by scheme family; it has no hidden state and never fails.
//! Whether the result is usable is for the engine to decide.

use std::fmt;

use serde::{Deserialize, Serialize};
use she_engine::params::HE_STD_RING_DIMENSIONS;
use she_engine::{
    CryptoParams, EncodingTechnique, KeySwitchTechnique, MultiplicationTechnique,
    ScalingTechnique, SchemeFamily, SecretKeyDist, SecurityLevel,
};

pub const DEFAULT_MULT_DEPTH: usize = 1;
pub const DEFAULT_PLAINTEXT_MODULUS: u64 = 65537;
pub const DEFAULT_STD_DEV: f64 = 3.19;
pub const DEFAULT_MAX_RELIN_DEGREE: u32 = 2;
/// Large-digit count cap for HYBRID key switching.
pub const MAX_HYBRID_DIGITS: u32 = 3;

/// A test case's scheme configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemeParameters {
    pub scheme: SchemeFamily,
    pub ring_dimension: Option<usize>,
    pub multiplicative_depth: Option<usize>,
    pub scaling_mod_size: Option<u32>,
    pub digit_size: Option<u32>,
    pub batch_size: Option<usize>,
    pub secret_key_dist: Option<SecretKeyDist>,
    pub max_relinearization_degree: Option<u32>,
    pub first_mod_size: Option<u32>,
    pub security_level: Option<SecurityLevel>,
    pub key_switch_technique: Option<KeySwitchTechnique>,
    pub scaling_technique: Option<ScalingTechnique>,
    pub num_large_digits: Option<u32>,
    pub plaintext_modulus: Option<u64>,
    pub standard_deviation: Option<f64>,
    pub eval_add_count: Option<u32>,
    pub eval_mult_count: Option<u32>,
    pub key_switch_count: Option<u32>,
    pub multiplication_technique: Option<MultiplicationTechnique>,
    pub encoding_technique: Option<EncodingTechnique>,
}

/// Family-specific defaults.
struct FamilyDefaults {
    scaling_mod_size: u32,
    /// `None`: same as the resolved scaling modulus size.
    first_mod_size: Option<u32>,
    security_level: SecurityLevel,
    key_switch_technique: KeySwitchTechnique,
    scaling_technique: ScalingTechnique,
}

const BGV_DEFAULTS: FamilyDefaults = FamilyDefaults {
    scaling_mod_size: 50,
    first_mod_size: Some(60),
    security_level: SecurityLevel::Classic128,
    key_switch_technique: KeySwitchTechnique::Hybrid,
    scaling_technique: ScalingTechnique::FlexibleAutoExt,
};

const BFV_DEFAULTS: FamilyDefaults = FamilyDefaults {
    scaling_mod_size: 60,
    first_mod_size: None,
    security_level: SecurityLevel::NotSet,
    key_switch_technique: KeySwitchTechnique::Bv,
    scaling_technique: ScalingTechnique::FixedManual,
};

impl SchemeParameters {
    /// All fields left to the scheme default.
    pub fn new(scheme: SchemeFamily) -> Self {
        Self {
            scheme,
            ring_dimension: None,
            multiplicative_depth: None,
            scaling_mod_size: None,
            digit_size: None,
            batch_size: None,
            secret_key_dist: None,
            max_relinearization_degree: None,
            first_mod_size: None,
            security_level: None,
            key_switch_technique: None,
            scaling_technique: None,
            num_large_digits: None,
            plaintext_modulus: None,
            standard_deviation: None,
            eval_add_count: None,
            eval_mult_count: None,
            key_switch_count: None,
            multiplication_technique: None,
            encoding_technique: None,
        }
    }

    /// Replace every unset field with the scheme default.
    pub fn resolve(&self) -> CryptoParams {
        let defaults = match self.scheme {
            SchemeFamily::Bgvrns => &BGV_DEFAULTS,
            SchemeFamily::Bfvrns => &BFV_DEFAULTS,
        };
        let multiplicative_depth = self.multiplicative_depth.unwrap_or(DEFAULT_MULT_DEPTH);
        let scaling_mod_size = self.scaling_mod_size.unwrap_or(defaults.scaling_mod_size);
        let first_mod_size = self
            .first_mod_size
            .unwrap_or(defaults.first_mod_size.unwrap_or(scaling_mod_size));
        let security_level = self.security_level.unwrap_or(defaults.security_level);
        let key_switch_technique = self
            .key_switch_technique
            .unwrap_or(defaults.key_switch_technique);

        // BFV relinearizes to degree 2 only; BGV has a single multiplication path.
        let max_relinearization_degree = match self.scheme {
            SchemeFamily::Bgvrns => self
                .max_relinearization_degree
                .unwrap_or(DEFAULT_MAX_RELIN_DEGREE),
            SchemeFamily::Bfvrns => DEFAULT_MAX_RELIN_DEGREE,
        };
        let multiplication_technique = match self.scheme {
            SchemeFamily::Bgvrns => MultiplicationTechnique::HpsPOverQLeveled,
            SchemeFamily::Bfvrns => self
                .multiplication_technique
                .unwrap_or(MultiplicationTechnique::HpsPOverQLeveled),
        };

        let num_large_digits = self.num_large_digits.unwrap_or(match key_switch_technique {
            KeySwitchTechnique::Bv => 0,
            KeySwitchTechnique::Hybrid => {
                let towers = u32::try_from(multiplicative_depth + 1).unwrap_or(u32::MAX);
                towers.min(MAX_HYBRID_DIGITS)
            }
        });

        let log_q = first_mod_size.saturating_add(
            scaling_mod_size
                .saturating_mul(u32::try_from(multiplicative_depth).unwrap_or(u32::MAX)),
        );
        let ring_dimension = self.ring_dimension.unwrap_or_else(|| {
            let smallest = security_level
                .min_ring_dimension(log_q)
                .unwrap_or(HE_STD_RING_DIMENSIONS[HE_STD_RING_DIMENSIONS.len() - 1]);
            match self.batch_size {
                Some(batch) if batch > smallest => batch.next_power_of_two(),
                _ => smallest,
            }
        });

        CryptoParams {
            scheme: self.scheme,
            ring_dimension,
            multiplicative_depth,
            scaling_mod_size,
            digit_size: self.digit_size.unwrap_or(0),
            batch_size: self.batch_size.unwrap_or(ring_dimension),
            secret_key_dist: self.secret_key_dist.unwrap_or(SecretKeyDist::UniformTernary),
            max_relinearization_degree,
            first_mod_size,
            security_level,
            key_switch_technique,
            scaling_technique: self.scaling_technique.unwrap_or(defaults.scaling_technique),
            num_large_digits,
            plaintext_modulus: self.plaintext_modulus.unwrap_or(DEFAULT_PLAINTEXT_MODULUS),
            standard_deviation: self.standard_deviation.unwrap_or(DEFAULT_STD_DEV),
            eval_add_count: self.eval_add_count.unwrap_or(0),
            eval_mult_count: self.eval_mult_count.unwrap_or(0),
            key_switch_count: self.key_switch_count.unwrap_or(0),
            multiplication_technique,
            encoding_technique: self.encoding_technique.unwrap_or(EncodingTechnique::Standard),
        }
    }
}

struct Field<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Field<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => fmt::Display::fmt(v, f),
            None => f.write_str("DFLT"),
        }
    }
}

impl fmt::Display for SchemeParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} ringDim={} multDepth={} sfBits={} dSize={} batch={} secretKeyDist={} \
             maxRelinSkDeg={} firstModSize={} securityLevel={} ksTech={} scalTech={} \
             numLargeDigits={} ptm={} stdDev={} evalAddCt={} evalMultCt={} ksCt={} \
             multTech={} encTech={}]",
            self.scheme,
            Field(&self.ring_dimension),
            Field(&self.multiplicative_depth),
            Field(&self.scaling_mod_size),
            Field(&self.digit_size),
            Field(&self.batch_size),
            Field(&self.secret_key_dist),
            Field(&self.max_relinearization_degree),
            Field(&self.first_mod_size),
            Field(&self.security_level),
            Field(&self.key_switch_technique),
            Field(&self.scaling_technique),
            Field(&self.num_large_digits),
            Field(&self.plaintext_modulus),
            Field(&self.standard_deviation),
            Field(&self.eval_add_count),
            Field(&self.eval_mult_count),
            Field(&self.key_switch_count),
            Field(&self.multiplication_technique),
            Field(&self.encoding_technique),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgv_defaults() {
        let p = SchemeParameters::new(SchemeFamily::Bgvrns).resolve();
        assert_eq!(p.multiplicative_depth, 1);
        assert_eq!(p.scaling_mod_size, 50);
        assert_eq!(p.first_mod_size, 60);
        assert_eq!(p.security_level, SecurityLevel::Classic128);
        assert_eq!(p.key_switch_technique, KeySwitchTechnique::Hybrid);
        assert_eq!(p.scaling_technique, ScalingTechnique::FlexibleAutoExt);
        assert_eq!(p.num_large_digits, 2);
        assert_eq!(p.max_relinearization_degree, 2);
        // log Q = 60 + 50 = 110 needs n = 8192 at 128-bit security
        assert_eq!(p.ring_dimension, 8192);
        assert_eq!(p.batch_size, 8192);
        assert_eq!(p.plaintext_modulus, 65537);
        assert_eq!(p.secret_key_dist, SecretKeyDist::UniformTernary);
    }

    #[test]
    fn bfv_defaults() {
        let p = SchemeParameters::new(SchemeFamily::Bfvrns).resolve();
        assert_eq!(p.scaling_mod_size, 60);
        assert_eq!(p.first_mod_size, 60, "first modulus follows the scaling size");
        assert_eq!(p.security_level, SecurityLevel::NotSet);
        assert_eq!(p.key_switch_technique, KeySwitchTechnique::Bv);
        assert_eq!(p.scaling_technique, ScalingTechnique::FixedManual);
        assert_eq!(p.num_large_digits, 0);
        assert_eq!(p.multiplication_technique, MultiplicationTechnique::HpsPOverQLeveled);
        assert_eq!(p.ring_dimension, 8192);
    }

    #[test]
    fn bfv_ignores_max_relinearization_degree() {
        let p = SchemeParameters {
            max_relinearization_degree: Some(5),
            ..SchemeParameters::new(SchemeFamily::Bfvrns)
        };
        assert_eq!(p.resolve().max_relinearization_degree, 2);

        let p = SchemeParameters {
            max_relinearization_degree: Some(1),
            ..SchemeParameters::new(SchemeFamily::Bgvrns)
        };
        assert_eq!(p.resolve().max_relinearization_degree, 1);
    }

    #[test]
    fn bgv_ignores_multiplication_technique() {
        let p = SchemeParameters {
            multiplication_technique: Some(MultiplicationTechnique::Behz),
            ..SchemeParameters::new(SchemeFamily::Bgvrns)
        };
        assert_eq!(p.resolve().multiplication_technique, MultiplicationTechnique::HpsPOverQLeveled);
    }

    #[test]
    fn bfv_first_mod_size_tracks_explicit_scaling_size() {
        let p = SchemeParameters {
            scaling_mod_size: Some(40),
            ..SchemeParameters::new(SchemeFamily::Bfvrns)
        };
        assert_eq!(p.resolve().first_mod_size, 40);
    }

    #[test]
    fn explicit_values_win() {
        let p = SchemeParameters {
            ring_dimension: Some(16),
            multiplicative_depth: Some(2),
            security_level: Some(SecurityLevel::NotSet),
            batch_size: Some(16),
            key_switch_technique: Some(KeySwitchTechnique::Bv),
            ..SchemeParameters::new(SchemeFamily::Bgvrns)
        };
        let r = p.resolve();
        assert_eq!(r.ring_dimension, 16);
        assert_eq!(r.batch_size, 16);
        assert_eq!(r.num_large_digits, 0);
        assert_eq!(r.multiplicative_depth, 2);
    }

    #[test]
    fn hybrid_digits_are_capped() {
        let p = SchemeParameters {
            multiplicative_depth: Some(6),
            key_switch_technique: Some(KeySwitchTechnique::Hybrid),
            ..SchemeParameters::new(SchemeFamily::Bfvrns)
        };
        assert_eq!(p.resolve().num_large_digits, MAX_HYBRID_DIGITS);
    }

    #[test]
    fn display_marks_defaults() {
        let p = SchemeParameters {
            ring_dimension: Some(16),
            ..SchemeParameters::new(SchemeFamily::Bgvrns)
        };
        let s = p.to_string();
        assert!(s.starts_with("[BGVRNS ringDim=16 multDepth=DFLT"), "{s}");
        assert!(s.ends_with("encTech=DFLT]"), "{s}");
    }
}
