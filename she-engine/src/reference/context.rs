//! The reference crypto context.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use rand::rngs::StdRng;

use crate::capability::{CryptoContext, KeyPair, PlaintextEncoding, PlaintextValue};
use crate::error::{EngineError, EngineResult};
use crate::params::{CryptoParams, SchemeFamily, MAX_MODULUS_BITS};

use super::ciphertext::Ciphertext;
use super::encoding::{encode_coef_packed, encode_packed, encode_string, Plaintext};
use super::faults::{Fault, FaultPlan};
use super::keys::{
    compute_key_id, sample_secret, switching_digits, EvalKeyStore, KeySwitchHint, PublicKey,
    SecretKey,
};
use super::ring::PlainRing;
use super::slots::{rotate_rows, rotate_within, swap_rows};

/// Reject parameter sets no engine could build a context from.
pub(crate) fn validate(params: &CryptoParams) -> EngineResult<()> {
    let n = params.ring_dimension;
    if n < 2 || !n.is_power_of_two() {
        return Err(EngineError::InvalidParameters(format!(
            "ring dimension {n} must be a power of two of at least 2"
        )));
    }
    let batch = params.batch_size;
    if batch == 0 || !batch.is_power_of_two() || batch > n {
        return Err(EngineError::InvalidParameters(format!(
            "batch size {batch} must be a power of two no larger than the ring dimension {n}"
        )));
    }
    if params.plaintext_modulus < 2 {
        return Err(EngineError::InvalidParameters(format!(
            "plaintext modulus {} must be at least 2",
            params.plaintext_modulus
        )));
    }
    for (name, bits) in [
        ("scaling modulus size", params.scaling_mod_size),
        ("first modulus size", params.first_mod_size),
    ] {
        if bits == 0 || bits > MAX_MODULUS_BITS {
            return Err(EngineError::InvalidParameters(format!(
                "{name} of {bits} bits is outside 1..={MAX_MODULUS_BITS}"
            )));
        }
    }
    if !(params.standard_deviation.is_finite() && params.standard_deviation > 0.0) {
        return Err(EngineError::InvalidParameters(format!(
            "noise standard deviation {} must be positive",
            params.standard_deviation
        )));
    }
    if params.max_relinearization_degree == 0 {
        return Err(EngineError::InvalidParameters(
            "max relinearization degree must be at least 1".into(),
        ));
    }
    if let Some(max_log_q) = params.security_level.max_log_q(n) {
        let log_q = params.estimated_log_q();
        if log_q > max_log_q {
            return Err(EngineError::InvalidParameters(format!(
                "ring dimension {n} does not meet {}: log Q of {log_q} bits exceeds {max_log_q}",
                params.security_level
            )));
        }
    }
    Ok(())
}

/// Shared state behind every handle to one context.
pub(crate) struct ContextInner {
    pub(crate) id: u64,
    pub(crate) params: CryptoParams,
    pub(crate) ring: PlainRing,
    released: AtomicBool,
    rng: Mutex<StdRng>,
    eval_keys: Mutex<EvalKeyStore>,
    faults: FaultPlan,
}

impl ContextInner {
    fn keys(&self) -> MutexGuard<'_, EvalKeyStore> {
        self.eval_keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        self.keys().clear();
    }

    fn ensure_live(&self) -> EngineResult<()> {
        if self.released.load(Ordering::SeqCst) {
            return Err(EngineError::ContextReleased);
        }
        Ok(())
    }

    fn check_secret(&self, sk: &SecretKey) -> EngineResult<()> {
        self.ensure_live()?;
        if sk.context_id != self.id {
            return Err(EngineError::KeyMismatch(
                "secret key was generated by another context".into(),
            ));
        }
        Ok(())
    }

    fn check_operand(&self, ct: &Ciphertext) -> EngineResult<()> {
        self.ensure_live()?;
        ct.check_fault()?;
        if ct.context.id != self.id {
            return Err(EngineError::KeyMismatch(
                "ciphertext belongs to another context".into(),
            ));
        }
        Ok(())
    }

    fn check_pair(&self, a: &Ciphertext, b: &Ciphertext) -> EngineResult<()> {
        self.check_operand(a)?;
        self.check_operand(b)?;
        if a.key_id != b.key_id {
            return Err(EngineError::KeyMismatch(
                "operands are encrypted under different keys".into(),
            ));
        }
        if a.encoding != b.encoding {
            return Err(EngineError::Encoding(format!(
                "cannot combine {} and {} ciphertexts",
                a.encoding, b.encoding
            )));
        }
        Ok(())
    }

    fn check_plain(&self, ct: &Ciphertext, pt: &Plaintext) -> EngineResult<()> {
        self.check_operand(ct)?;
        if ct.encoding != pt.encoding {
            return Err(EngineError::Encoding(format!(
                "cannot combine a {} ciphertext with a {} plaintext",
                ct.encoding, pt.encoding
            )));
        }
        Ok(())
    }

    /// Plaintext payload as exactly n ring values.
    fn plain_payload(&self, pt: &Plaintext) -> Vec<i64> {
        self.ring.lift(&pt.values[..pt.length.min(self.ring.n)])
    }

    /// Result ciphertext inheriting the left operand's key and metadata.
    fn derive(
        &self,
        lhs: &Ciphertext,
        values: Vec<i64>,
        towers: usize,
        depth: usize,
    ) -> Ciphertext {
        let metadata = if self.faults.is_active(Fault::DropMetadata) {
            Default::default()
        } else {
            lhs.metadata.clone()
        };
        Ciphertext {
            context: Arc::clone(&lhs.context),
            key_id: lhs.key_id,
            encoding: lhs.encoding,
            values,
            towers,
            depth,
            metadata,
            fault: None,
        }
    }

    fn multiply_payload(
        &self,
        encoding: PlaintextEncoding,
        a: &[i64],
        b: &[i64],
    ) -> EngineResult<Vec<i64>> {
        match encoding {
            PlaintextEncoding::Packed => Ok(self.ring.hadamard(a, b)),
            PlaintextEncoding::CoefPacked => Ok(self.ring.negacyclic_mul(a, b)),
            PlaintextEncoding::String => Err(EngineError::Unsupported(
                "multiplication of string-encoded ciphertexts".into(),
            )),
        }
    }

    fn rotate(&self, values: &[i64], index: i32) -> Vec<i64> {
        if self.faults.is_active(Fault::WrapRotations) {
            rotate_within(values, self.params.batch_size, index)
        } else {
            rotate_rows(values, index)
        }
    }

    pub(crate) fn add(&self, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext> {
        self.check_pair(a, b)?;
        let values = self.ring.add(&a.values, &b.values);
        Ok(self.derive(a, values, a.towers.min(b.towers), a.depth.max(b.depth)))
    }

    pub(crate) fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext> {
        self.check_pair(a, b)?;
        let values = if self.faults.is_active(Fault::SubtractAdds) {
            self.ring.add(&a.values, &b.values)
        } else {
            self.ring.sub(&a.values, &b.values)
        };
        Ok(self.derive(a, values, a.towers.min(b.towers), a.depth.max(b.depth)))
    }

    pub(crate) fn mult(&self, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext> {
        self.check_pair(a, b)?;
        if !self.keys().has_relinearization(&a.key_id) {
            return Err(EngineError::MissingEvalKey(
                "no multiplication key for the operands' secret key".into(),
            ));
        }
        let needed = a.depth.max(b.depth) + 1;
        let limit = self.params.multiplicative_depth;
        if needed > limit {
            return Err(EngineError::DepthExhausted { needed, limit });
        }
        let values = self.multiply_payload(a.encoding, &a.values, &b.values)?;
        let mut towers = a.towers.min(b.towers);
        if self.params.scheme == SchemeFamily::Bgvrns && self.params.scaling_technique.is_auto() {
            towers = towers.saturating_sub(1).max(1);
        }
        Ok(self.derive(a, values, towers, needed))
    }
}

/// Handle to a reference-engine context. Clones share keys and state.
#[derive(Clone)]
pub struct ReferenceContext {
    pub(crate) inner: Arc<ContextInner>,
}

impl ReferenceContext {
    pub(crate) fn new(id: u64, params: CryptoParams, rng: StdRng, faults: FaultPlan) -> Self {
        let ring = PlainRing::new(params.ring_dimension, params.plaintext_modulus);
        Self {
            inner: Arc::new(ContextInner {
                id,
                params,
                ring,
                released: AtomicBool::new(false),
                rng: Mutex::new(rng),
                eval_keys: Mutex::new(EvalKeyStore::default()),
                faults,
            }),
        }
    }

    /// Factory-unique context id.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Number of evaluation keys currently stored in this context.
    pub fn eval_key_count(&self) -> usize {
        self.inner.keys().len()
    }

    fn lift_ciphertext(&self, pk: &PublicKey, pt: &Plaintext) -> Ciphertext {
        Ciphertext {
            context: Arc::clone(&self.inner),
            key_id: pk.key_id,
            encoding: pt.encoding,
            values: self.inner.plain_payload(pt),
            towers: self.inner.params.tower_count(),
            depth: 0,
            metadata: Default::default(),
            fault: None,
        }
    }
}

impl fmt::Debug for ReferenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceContext")
            .field("id", &self.inner.id)
            .field("scheme", &self.inner.params.scheme)
            .field("ring_dimension", &self.inner.params.ring_dimension)
            .field("released", &self.is_released())
            .finish()
    }
}

impl CryptoContext for ReferenceContext {
    type Plaintext = Plaintext;
    type Ciphertext = Ciphertext;
    type PublicKey = PublicKey;
    type SecretKey = SecretKey;
    type KeySwitchHint = KeySwitchHint;

    fn params(&self) -> &CryptoParams {
        &self.inner.params
    }

    fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }

    fn key_gen(&self) -> EngineResult<KeyPair<PublicKey, SecretKey>> {
        self.inner.ensure_live()?;
        let params = &self.inner.params;
        let secret = {
            let mut rng = self.inner.rng.lock().unwrap_or_else(PoisonError::into_inner);
            sample_secret(
                &mut *rng,
                params.secret_key_dist,
                params.standard_deviation,
                params.ring_dimension,
            )
        };
        let key_id = compute_key_id(&secret);
        let towers = vec![secret; params.tower_count()];
        Ok(KeyPair {
            public_key: PublicKey {
                key_id,
                context_id: self.inner.id,
            },
            secret_key: SecretKey {
                key_id,
                context_id: self.inner.id,
                towers,
            },
        })
    }

    fn eval_mult_key_gen(&self, sk: &SecretKey) -> EngineResult<()> {
        self.inner.check_secret(sk)?;
        self.inner.keys().insert_relinearization(sk.key_id);
        debug!(
            "context #{}: relinearization key with {} digits",
            self.inner.id,
            switching_digits(&self.inner.params)
        );
        Ok(())
    }

    fn eval_at_index_key_gen(&self, sk: &SecretKey, indices: &[i32]) -> EngineResult<()> {
        self.inner.check_secret(sk)?;
        self.inner.keys().insert_rotations(sk.key_id, indices);
        debug!("context #{}: rotation keys for {:?}", self.inner.id, indices);
        Ok(())
    }

    fn eval_sum_key_gen(&self, sk: &SecretKey) -> EngineResult<()> {
        self.inner.check_secret(sk)?;
        self.inner.keys().insert_summation(sk.key_id);
        Ok(())
    }

    fn key_switch_gen(&self, from: &SecretKey, to: &SecretKey) -> EngineResult<KeySwitchHint> {
        self.inner.check_secret(from)?;
        self.inner.check_secret(to)?;
        Ok(KeySwitchHint {
            from: from.key_id,
            to: to.key_id,
            digits: switching_digits(&self.inner.params),
        })
    }

    fn make_packed_plaintext(&self, values: &[i64]) -> EngineResult<Plaintext> {
        self.inner.ensure_live()?;
        encode_packed(&self.inner.ring, values)
    }

    fn make_coef_packed_plaintext(&self, values: &[i64]) -> EngineResult<Plaintext> {
        self.inner.ensure_live()?;
        encode_coef_packed(&self.inner.ring, values)
    }

    fn make_string_plaintext(&self, text: &str) -> EngineResult<Plaintext> {
        self.inner.ensure_live()?;
        encode_string(&self.inner.ring, text)
    }

    fn encrypt(&self, pk: &PublicKey, pt: &Plaintext) -> EngineResult<Ciphertext> {
        self.inner.ensure_live()?;
        if pk.context_id != self.inner.id {
            return Err(EngineError::KeyMismatch(
                "public key was generated by another context".into(),
            ));
        }
        Ok(self.lift_ciphertext(pk, pt))
    }

    fn decrypt(&self, sk: &SecretKey, ct: &Ciphertext) -> EngineResult<Plaintext> {
        self.inner.check_secret(sk)?;
        self.inner.check_operand(ct)?;
        if self.inner.faults.is_active(Fault::ForeignDecryptError) {
            let cause = std::io::Error::new(std::io::ErrorKind::Other, "accelerator lost");
            return Err(EngineError::foreign(&cause));
        }
        if self.inner.faults.is_active(Fault::PanicOnDecrypt) {
            panic!("reference engine: decrypt fault injected");
        }
        if sk.key_id != ct.key_id {
            return Err(EngineError::KeyMismatch(
                "ciphertext was not encrypted under this secret key".into(),
            ));
        }
        if sk.towers.len() < ct.towers {
            return Err(EngineError::KeyMismatch(format!(
                "secret key has {} towers but the ciphertext needs {}",
                sk.towers.len(),
                ct.towers
            )));
        }
        let mut pt = Plaintext {
            encoding: ct.encoding,
            values: ct.values.clone(),
            length: 0,
        };
        pt.set_length(self.inner.ring.n);
        Ok(pt)
    }

    fn eval_add(&self, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext> {
        self.inner.add(a, b)
    }

    fn eval_add_plain(&self, a: &Ciphertext, p: &Plaintext) -> EngineResult<Ciphertext> {
        self.inner.check_plain(a, p)?;
        let values = self.inner.ring.add(&a.values, &self.inner.plain_payload(p));
        Ok(self.inner.derive(a, values, a.towers, a.depth))
    }

    fn eval_sub(&self, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext> {
        self.inner.sub(a, b)
    }

    fn eval_sub_plain(&self, a: &Ciphertext, p: &Plaintext) -> EngineResult<Ciphertext> {
        self.inner.check_plain(a, p)?;
        let payload = self.inner.plain_payload(p);
        let values = if self.inner.faults.is_active(Fault::SubtractAdds) {
            self.inner.ring.add(&a.values, &payload)
        } else {
            self.inner.ring.sub(&a.values, &payload)
        };
        Ok(self.inner.derive(a, values, a.towers, a.depth))
    }

    fn eval_mult(&self, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext> {
        self.inner.mult(a, b)
    }

    fn eval_mult_plain(&self, a: &Ciphertext, p: &Plaintext) -> EngineResult<Ciphertext> {
        self.inner.check_plain(a, p)?;
        let values =
            self.inner
                .multiply_payload(a.encoding, &a.values, &self.inner.plain_payload(p))?;
        Ok(self.inner.derive(a, values, a.towers, a.depth))
    }

    fn eval_at_index(&self, ct: &Ciphertext, index: i32) -> EngineResult<Ciphertext> {
        self.inner.check_operand(ct)?;
        if index == 0 {
            return Ok(self.inner.derive(ct, ct.values.clone(), ct.towers, ct.depth));
        }
        if ct.encoding != PlaintextEncoding::Packed {
            return Err(EngineError::Unsupported(format!(
                "rotation of a {} ciphertext",
                ct.encoding
            )));
        }
        if !self.inner.keys().has_rotation(&ct.key_id, index) {
            return Err(EngineError::MissingEvalKey(format!(
                "no rotation key for index {index}"
            )));
        }
        let values = self.inner.rotate(&ct.values, index);
        Ok(self.inner.derive(ct, values, ct.towers, ct.depth))
    }

    fn eval_merge(&self, cts: &[Ciphertext]) -> EngineResult<Ciphertext> {
        let (first, rest) = cts.split_first().ok_or_else(|| {
            EngineError::Unsupported("merging an empty list of ciphertexts".into())
        })?;
        self.inner.check_operand(first)?;
        for ct in rest {
            self.inner.check_pair(first, ct)?;
        }
        if first.encoding != PlaintextEncoding::Packed {
            return Err(EngineError::Unsupported(format!(
                "merging {} ciphertexts",
                first.encoding
            )));
        }
        let row = self.inner.ring.n / 2;
        if cts.len() > row {
            return Err(EngineError::Encoding(format!(
                "cannot merge {} ciphertexts into a row of {row} slots",
                cts.len()
            )));
        }
        {
            let keys = self.inner.keys();
            for k in 1..=cts.len() {
                let index = -(k as i32);
                if !keys.has_rotation(&first.key_id, index) {
                    return Err(EngineError::MissingEvalKey(format!(
                        "merge of {} ciphertexts needs a rotation key for index {index}",
                        cts.len()
                    )));
                }
            }
        }
        let mut values = vec![0i64; self.inner.ring.n];
        for (slot, ct) in values.iter_mut().zip(cts) {
            *slot = ct.values[0];
        }
        let towers = cts.iter().map(|ct| ct.towers).min().unwrap_or(first.towers);
        let depth = cts.iter().map(|ct| ct.depth).max().unwrap_or(first.depth);
        Ok(self.inner.derive(first, values, towers, depth))
    }

    fn eval_sum(&self, ct: &Ciphertext, batch_size: usize) -> EngineResult<Ciphertext> {
        self.inner.check_operand(ct)?;
        if ct.encoding != PlaintextEncoding::Packed {
            return Err(EngineError::Unsupported(format!(
                "summation over a {} ciphertext",
                ct.encoding
            )));
        }
        if !self.inner.keys().has_summation(&ct.key_id) {
            return Err(EngineError::MissingEvalKey(
                "no summation keys for the ciphertext's secret key".into(),
            ));
        }
        let limit = self.inner.params.batch_size;
        if batch_size == 0 || !batch_size.is_power_of_two() || batch_size > limit {
            return Err(EngineError::Unsupported(format!(
                "summation window {batch_size} must be a power of two \
                 no larger than the batch size {limit}"
            )));
        }
        let row = self.inner.ring.n / 2;
        let mut acc = ct.values.clone();
        let mut step = 1usize;
        while step < batch_size {
            let shifted = if step < row {
                self.inner.rotate(&acc, step as i32)
            } else {
                swap_rows(&acc)
            };
            acc = self.inner.ring.add(&acc, &shifted);
            step *= 2;
        }
        Ok(self.inner.derive(ct, acc, ct.towers, ct.depth))
    }

    fn key_switch(&self, ct: &Ciphertext, hint: &KeySwitchHint) -> EngineResult<Ciphertext> {
        self.inner.check_operand(ct)?;
        if hint.from != ct.key_id {
            return Err(EngineError::KeyMismatch(
                "switching hint does not start at the ciphertext's key".into(),
            ));
        }
        let mut switched = self.inner.derive(ct, ct.values.clone(), ct.towers, ct.depth);
        switched.key_id = hint.to;
        Ok(switched)
    }

    fn mod_reduce_in_place(&self, ct: &mut Ciphertext) -> EngineResult<()> {
        self.inner.check_operand(ct)?;
        let params = &self.inner.params;
        if params.scheme == SchemeFamily::Bfvrns {
            return Err(EngineError::Unsupported(
                "modulus reduction is not available for BFVRNS".into(),
            ));
        }
        if params.scaling_technique.is_auto() {
            debug!(
                "context #{}: mod reduce is a no-op under {}",
                self.inner.id, params.scaling_technique
            );
            return Ok(());
        }
        if ct.towers <= 1 {
            return Err(EngineError::Unsupported(
                "ciphertext has no tower left to drop".into(),
            ));
        }
        ct.towers -= 1;
        Ok(())
    }
}
