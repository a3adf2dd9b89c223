//! Key material for the reference engine.
//!
//! Secret keys hold a sampled private polynomial replicated across the RNS
//! towers. Keys are identified by a SHA-256 fingerprint of that polynomial,
//! and evaluation keys are tracked per fingerprint.

use std::collections::{BTreeSet, HashMap, HashSet};

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::capability::SecretKeyMaterial;
use crate::error::{EngineError, EngineResult};
use crate::params::{CryptoParams, KeySwitchTechnique, SecretKeyDist};

/// SHA-256 fingerprint of a secret key.
pub type KeyId = [u8; 32];

/// Public half of a key pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub(crate) key_id: KeyId,
    pub(crate) context_id: u64,
}

/// Secret half of a key pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretKey {
    pub(crate) key_id: KeyId,
    pub(crate) context_id: u64,
    pub(crate) towers: Vec<Vec<i64>>,
}

impl SecretKey {
    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }
}

impl SecretKeyMaterial for SecretKey {
    fn tower_count(&self) -> usize {
        self.towers.len()
    }

    fn drop_last_element(&mut self) -> EngineResult<()> {
        if self.towers.len() <= 1 {
            return Err(EngineError::Unsupported(
                "secret key is already down to a single tower".into(),
            ));
        }
        self.towers.pop();
        Ok(())
    }
}

/// Switching hint produced by `key_switch_gen`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySwitchHint {
    pub(crate) from: KeyId,
    pub(crate) to: KeyId,
    pub(crate) digits: usize,
}

impl KeySwitchHint {
    /// Number of decomposition digits per switching key.
    pub fn digits(&self) -> usize {
        self.digits
    }
}

/// Fingerprint a secret polynomial. Domain-separated so ids never collide
/// with other hashes over the same coefficients.
pub(crate) fn compute_key_id(secret: &[i64]) -> KeyId {
    let mut hasher = Sha256::new();
    hasher.update(b"she_reference_key_v1");
    for c in secret {
        hasher.update(c.to_le_bytes());
    }
    hasher.finalize().into()
}

/// Sample a private polynomial of `n` coefficients.
pub(crate) fn sample_secret<R: Rng>(
    rng: &mut R,
    dist: SecretKeyDist,
    sigma: f64,
    n: usize,
) -> Vec<i64> {
    match dist {
        SecretKeyDist::UniformTernary => (0..n).map(|_| rng.gen_range(-1i64..=1)).collect(),
        SecretKeyDist::Gaussian => sample_gaussian(rng, sigma, n),
    }
}

/// Discrete Gaussian via Box-Muller with 6σ tail rejection.
fn sample_gaussian<R: Rng>(rng: &mut R, sigma: f64, n: usize) -> Vec<i64> {
    let tail_bound = (sigma * 6.0).ceil() as i64;
    let mut coeffs = Vec::with_capacity(n);
    while coeffs.len() < n {
        let u1: f64 = rng.gen_range(1e-15_f64..1.0_f64);
        let u2: f64 = rng.gen_range(0.0_f64..std::f64::consts::TAU);
        let r = (-2.0 * u1.ln()).sqrt() * sigma;
        for z in [r * u2.cos(), r * u2.sin()] {
            let s = z.round() as i64;
            if s.abs() <= tail_bound && coeffs.len() < n {
                coeffs.push(s);
            }
        }
    }
    coeffs
}

/// Decomposition digits per switching key under the configured technique.
pub(crate) fn switching_digits(params: &CryptoParams) -> usize {
    match params.key_switch_technique {
        KeySwitchTechnique::Bv => {
            let per_tower = if params.digit_size == 0 {
                1
            } else {
                params.scaling_mod_size.div_ceil(params.digit_size) as usize
            };
            per_tower * params.tower_count()
        }
        KeySwitchTechnique::Hybrid => (params.num_large_digits as usize).max(1),
    }
}

/// Evaluation keys generated so far, keyed by secret key fingerprint.
#[derive(Debug, Default)]
pub(crate) struct EvalKeyStore {
    relinearization: HashSet<KeyId>,
    rotations: HashMap<KeyId, BTreeSet<i32>>,
    summation: HashSet<KeyId>,
}

impl EvalKeyStore {
    pub(crate) fn insert_relinearization(&mut self, id: KeyId) {
        self.relinearization.insert(id);
    }

    pub(crate) fn insert_rotations(&mut self, id: KeyId, indices: &[i32]) {
        self.rotations.entry(id).or_default().extend(indices.iter().copied());
    }

    pub(crate) fn insert_summation(&mut self, id: KeyId) {
        self.summation.insert(id);
    }

    pub(crate) fn has_relinearization(&self, id: &KeyId) -> bool {
        self.relinearization.contains(id)
    }

    pub(crate) fn has_rotation(&self, id: &KeyId, index: i32) -> bool {
        self.rotations.get(id).is_some_and(|set| set.contains(&index))
    }

    pub(crate) fn has_summation(&self, id: &KeyId) -> bool {
        self.summation.contains(id)
    }

    /// Total number of stored evaluation keys.
    pub(crate) fn len(&self) -> usize {
        self.relinearization.len()
            + self.rotations.values().map(BTreeSet::len).sum::<usize>()
            + self.summation.len()
    }

    pub(crate) fn clear(&mut self) {
        self.relinearization.clear();
        self.rotations.clear();
        self.summation.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn ternary_secret_in_range() {
        let s = sample_secret(&mut test_rng(), SecretKeyDist::UniformTernary, 3.19, 256);
        assert_eq!(s.len(), 256);
        assert!(s.iter().all(|&c| (-1..=1).contains(&c)));
    }

    #[test]
    fn gaussian_secret_respects_tail_bound() {
        let s = sample_secret(&mut test_rng(), SecretKeyDist::Gaussian, 4.0, 1024);
        assert_eq!(s.len(), 1024);
        assert!(s.iter().all(|&c| c.abs() <= 24));
        assert!(s.iter().any(|&c| c.abs() > 1), "gaussian should leave the ternary range");
    }

    #[test]
    fn key_ids_are_deterministic_and_distinct() {
        let mut rng = test_rng();
        let a = sample_secret(&mut rng, SecretKeyDist::UniformTernary, 3.19, 64);
        let b = sample_secret(&mut rng, SecretKeyDist::UniformTernary, 3.19, 64);
        assert_eq!(compute_key_id(&a), compute_key_id(&a));
        assert_ne!(compute_key_id(&a), compute_key_id(&b));
    }

    #[test]
    fn dropping_towers_stops_at_one() {
        let mut sk = SecretKey {
            key_id: [0; 32],
            context_id: 0,
            towers: vec![vec![1, 0], vec![1, 0]],
        };
        sk.drop_last_element().unwrap();
        assert_eq!(sk.tower_count(), 1);
        assert!(sk.drop_last_element().is_err());
    }

    #[test]
    fn store_tracks_rotations_per_key() {
        let mut store = EvalKeyStore::default();
        store.insert_rotations([1; 32], &[3, -3]);
        assert!(store.has_rotation(&[1; 32], -3));
        assert!(!store.has_rotation(&[2; 32], 3));
        assert!(!store.has_rotation(&[1; 32], 2));
        assert_eq!(store.len(), 2);
        store.clear();
        assert_eq!(store.len(), 0);
    }
}
