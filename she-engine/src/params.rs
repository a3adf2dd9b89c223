//! Scheme vocabulary and the fully resolved parameter record.
//!
//! Every enum renders with the token the engine's own configuration files
//! use (`BGVRNS`, `HYBRID`, `FLEXIBLEAUTOEXT`, ...), so diagnostics line up
//! with parameter tables written by hand.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ring dimensions covered by the HE security standard tables.
pub const HE_STD_RING_DIMENSIONS: [usize; 6] = [1024, 2048, 4096, 8192, 16384, 32768];

/// Maximum log2(Q) per ring dimension for 128-bit classical security (ternary secrets).
const HE_STD_128_CLASSIC: [u32; 6] = [27, 54, 109, 218, 438, 881];
const HE_STD_192_CLASSIC: [u32; 6] = [19, 37, 75, 152, 305, 611];
const HE_STD_256_CLASSIC: [u32; 6] = [14, 29, 58, 118, 237, 476];

/// Largest modulus size a single residue tower may use.
pub const MAX_MODULUS_BITS: u32 = 60;

/// Residue-number-system scheme families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemeFamily {
    Bgvrns,
    Bfvrns,
}

impl fmt::Display for SchemeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SchemeFamily::Bgvrns => "BGVRNS",
            SchemeFamily::Bfvrns => "BFVRNS",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecretKeyDist {
    UniformTernary,
    Gaussian,
}

impl fmt::Display for SecretKeyDist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SecretKeyDist::UniformTernary => "UNIFORM_TERNARY",
            SecretKeyDist::Gaussian => "GAUSSIAN",
        })
    }
}

/// Security level tag checked against the HE standard tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    NotSet,
    Classic128,
    Classic192,
    Classic256,
}

impl SecurityLevel {
    fn table(self) -> Option<&'static [u32; 6]> {
        match self {
            SecurityLevel::NotSet => None,
            SecurityLevel::Classic128 => Some(&HE_STD_128_CLASSIC),
            SecurityLevel::Classic192 => Some(&HE_STD_192_CLASSIC),
            SecurityLevel::Classic256 => Some(&HE_STD_256_CLASSIC),
        }
    }

    /// Largest admissible log2(Q) at `ring_dimension`, or `None` when unchecked.
    ///
    /// Dimensions below the table admit nothing; dimensions above it admit
    /// everything.
    pub fn max_log_q(self, ring_dimension: usize) -> Option<u32> {
        let table = self.table()?;
        if ring_dimension < HE_STD_RING_DIMENSIONS[0] {
            return Some(0);
        }
        if ring_dimension > HE_STD_RING_DIMENSIONS[HE_STD_RING_DIMENSIONS.len() - 1] {
            return Some(u32::MAX);
        }
        let idx = HE_STD_RING_DIMENSIONS
            .iter()
            .rposition(|&n| n <= ring_dimension)
            .unwrap_or(0);
        Some(table[idx])
    }

    /// Smallest table ring dimension that admits `log_q` at this level.
    ///
    /// `NotSet` sizes against the 128-bit table.
    pub fn min_ring_dimension(self, log_q: u32) -> Option<usize> {
        let table = self.table().unwrap_or(&HE_STD_128_CLASSIC);
        HE_STD_RING_DIMENSIONS
            .iter()
            .zip(table.iter())
            .find(|&(_, &max)| log_q <= max)
            .map(|(&n, _)| n)
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SecurityLevel::NotSet => "HEStd_NotSet",
            SecurityLevel::Classic128 => "HEStd_128_classic",
            SecurityLevel::Classic192 => "HEStd_192_classic",
            SecurityLevel::Classic256 => "HEStd_256_classic",
        })
    }
}

/// Key-switching technique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySwitchTechnique {
    /// Digit decomposition only.
    Bv,
    /// Digit decomposition with an auxiliary modulus.
    Hybrid,
}

impl fmt::Display for KeySwitchTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeySwitchTechnique::Bv => "BV",
            KeySwitchTechnique::Hybrid => "HYBRID",
        })
    }
}

/// How rescaling / modulus switching is scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalingTechnique {
    FixedManual,
    FixedAuto,
    FlexibleAuto,
    FlexibleAutoExt,
}

impl ScalingTechnique {
    /// True when the engine reduces the modulus on its own after multiplication.
    pub fn is_auto(self) -> bool {
        !matches!(self, ScalingTechnique::FixedManual)
    }
}

impl fmt::Display for ScalingTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalingTechnique::FixedManual => "FIXEDMANUAL",
            ScalingTechnique::FixedAuto => "FIXEDAUTO",
            ScalingTechnique::FlexibleAuto => "FLEXIBLEAUTO",
            ScalingTechnique::FlexibleAutoExt => "FLEXIBLEAUTOEXT",
        })
    }
}

/// RNS multiplication algorithm (BFV only).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MultiplicationTechnique {
    Hps,
    Behz,
    HpsPOverQ,
    HpsPOverQLeveled,
}

impl fmt::Display for MultiplicationTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MultiplicationTechnique::Hps => "HPS",
            MultiplicationTechnique::Behz => "BEHZ",
            MultiplicationTechnique::HpsPOverQ => "HPSPOVERQ",
            MultiplicationTechnique::HpsPOverQLeveled => "HPSPOVERQLEVELED",
        })
    }
}

/// Plaintext-to-residue encoding convention (BFV only).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingTechnique {
    Standard,
    POverQ,
}

impl fmt::Display for EncodingTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EncodingTechnique::Standard => "STANDARD",
            EncodingTechnique::POverQ => "POVERQ",
        })
    }
}

/// Fully resolved parameters handed to a [`crate::ContextFactory`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CryptoParams {
    pub scheme: SchemeFamily,
    pub ring_dimension: usize,
    pub multiplicative_depth: usize,
    /// Bits per scaling (non-first) modulus tower.
    pub scaling_mod_size: u32,
    /// Key-switching digit size in bits; 0 lets the engine choose.
    pub digit_size: u32,
    pub batch_size: usize,
    pub secret_key_dist: SecretKeyDist,
    pub max_relinearization_degree: u32,
    pub first_mod_size: u32,
    pub security_level: SecurityLevel,
    pub key_switch_technique: KeySwitchTechnique,
    pub scaling_technique: ScalingTechnique,
    pub num_large_digits: u32,
    pub plaintext_modulus: u64,
    pub standard_deviation: f64,
    pub eval_add_count: u32,
    pub eval_mult_count: u32,
    pub key_switch_count: u32,
    pub multiplication_technique: MultiplicationTechnique,
    pub encoding_technique: EncodingTechnique,
}

impl CryptoParams {
    /// Estimated bit size of the full ciphertext modulus Q.
    pub fn estimated_log_q(&self) -> u32 {
        let depth = u32::try_from(self.multiplicative_depth).unwrap_or(u32::MAX);
        self.first_mod_size
            .saturating_add(self.scaling_mod_size.saturating_mul(depth))
    }

    /// Number of RNS towers a fresh ciphertext carries.
    pub fn tower_count(&self) -> usize {
        self.multiplicative_depth + 1
    }

    pub fn cyclotomic_order(&self) -> usize {
        2 * self.ring_dimension
    }
}
