//! Capability traits an encryption engine exposes to the harness.
//!
//! Follows the backend-trait shape used across the workspace: one trait with
//! associated key and ciphertext types, so an engine can be swapped without
//! touching the callers. Every fallible call returns [`EngineResult`] instead
//! of throwing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::params::CryptoParams;

/// How a plaintext maps its message onto the ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaintextEncoding {
    /// One value per slot; arithmetic is slot-wise.
    Packed,
    /// One value per polynomial coefficient; multiplication convolves.
    CoefPacked,
    /// One byte per coefficient.
    String,
}

impl fmt::Display for PlaintextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaintextEncoding::Packed => "packed",
            PlaintextEncoding::CoefPacked => "coef-packed",
            PlaintextEncoding::String => "string",
        })
    }
}

/// A public/secret key pair.
#[derive(Clone, Debug)]
pub struct KeyPair<P, S> {
    pub public_key: P,
    pub secret_key: S,
}

/// An encoded message with a logical length.
///
/// The physical representation may be longer than the message; callers
/// compare decoded values only after [`PlaintextValue::set_length`].
pub trait PlaintextValue: Clone + fmt::Debug {
    fn encoding(&self) -> PlaintextEncoding;

    /// Logical length of the message.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Truncate (or zero-extend) the logical message to `length`.
    fn set_length(&mut self, length: usize);

    /// Slot values. Fails for non-packed plaintexts.
    fn packed_values(&self) -> EngineResult<Vec<i64>>;

    /// Coefficient values. Fails for non-coefficient-packed plaintexts.
    fn coef_packed_values(&self) -> EngineResult<Vec<i64>>;

    /// The decoded text. Fails for non-string plaintexts.
    fn string_value(&self) -> EngineResult<String>;
}

/// Opaque tags attached to a ciphertext alongside its payload.
pub trait Metadata {
    fn set_metadata(&mut self, key: &str, value: &str);
    fn metadata(&self, key: &str) -> Option<&str>;
}

/// Operator-style aliases (`+`, `+=`, `-`, `-=`, `*`, `*=`) of the named
/// evaluation calls.
pub trait CiphertextOps: Sized {
    fn add_op(&self, rhs: &Self) -> EngineResult<Self>;
    fn add_assign_op(&mut self, rhs: &Self) -> EngineResult<()>;
    fn sub_op(&self, rhs: &Self) -> EngineResult<Self>;
    fn sub_assign_op(&mut self, rhs: &Self) -> EngineResult<()>;
    fn mul_op(&self, rhs: &Self) -> EngineResult<Self>;
    fn mul_assign_op(&mut self, rhs: &Self) -> EngineResult<()>;
}

/// Secret key internals the harness is allowed to touch.
pub trait SecretKeyMaterial {
    /// Number of RNS towers in the secret key's private element.
    fn tower_count(&self) -> usize;

    /// Drop the last RNS tower, matching a modulus-reduced ciphertext.
    fn drop_last_element(&mut self) -> EngineResult<()>;
}

/// An encryption context built from one parameter set.
///
/// Contexts are handles: cloning shares the same key stores.
pub trait CryptoContext: Clone {
    type Plaintext: PlaintextValue;
    type Ciphertext: Clone + fmt::Debug + Metadata + CiphertextOps;
    type PublicKey: Clone;
    type SecretKey: Clone + SecretKeyMaterial;
    type KeySwitchHint: Clone;

    fn params(&self) -> &CryptoParams;

    fn ring_dimension(&self) -> usize {
        self.params().ring_dimension
    }

    fn cyclotomic_order(&self) -> usize {
        self.params().cyclotomic_order()
    }

    /// True once the owning factory released this context.
    fn is_released(&self) -> bool;

    // ── keys ─────────────────────────────────────────────────────────

    fn key_gen(&self) -> EngineResult<KeyPair<Self::PublicKey, Self::SecretKey>>;

    /// Relinearization key for ciphertext-ciphertext multiplication.
    fn eval_mult_key_gen(&self, sk: &Self::SecretKey) -> EngineResult<()>;

    /// Rotation keys for each signed slot offset in `indices`.
    fn eval_at_index_key_gen(&self, sk: &Self::SecretKey, indices: &[i32]) -> EngineResult<()>;

    /// Keys for [`CryptoContext::eval_sum`].
    fn eval_sum_key_gen(&self, sk: &Self::SecretKey) -> EngineResult<()>;

    /// Switching hint from `from` to `to`.
    fn key_switch_gen(
        &self,
        from: &Self::SecretKey,
        to: &Self::SecretKey,
    ) -> EngineResult<Self::KeySwitchHint>;

    // ── encoding ─────────────────────────────────────────────────────

    fn make_packed_plaintext(&self, values: &[i64]) -> EngineResult<Self::Plaintext>;
    fn make_coef_packed_plaintext(&self, values: &[i64]) -> EngineResult<Self::Plaintext>;
    fn make_string_plaintext(&self, text: &str) -> EngineResult<Self::Plaintext>;

    fn encrypt(&self, pk: &Self::PublicKey, pt: &Self::Plaintext)
        -> EngineResult<Self::Ciphertext>;
    fn decrypt(&self, sk: &Self::SecretKey, ct: &Self::Ciphertext)
        -> EngineResult<Self::Plaintext>;

    // ── evaluation ───────────────────────────────────────────────────

    fn eval_add(&self, a: &Self::Ciphertext, b: &Self::Ciphertext)
        -> EngineResult<Self::Ciphertext>;
    fn eval_add_plain(&self, a: &Self::Ciphertext, p: &Self::Plaintext)
        -> EngineResult<Self::Ciphertext>;
    fn eval_sub(&self, a: &Self::Ciphertext, b: &Self::Ciphertext)
        -> EngineResult<Self::Ciphertext>;
    fn eval_sub_plain(&self, a: &Self::Ciphertext, p: &Self::Plaintext)
        -> EngineResult<Self::Ciphertext>;
    fn eval_mult(&self, a: &Self::Ciphertext, b: &Self::Ciphertext)
        -> EngineResult<Self::Ciphertext>;
    fn eval_mult_plain(&self, a: &Self::Ciphertext, p: &Self::Plaintext)
        -> EngineResult<Self::Ciphertext>;

    fn eval_add_in_place(
        &self,
        a: &mut Self::Ciphertext,
        b: &Self::Ciphertext,
    ) -> EngineResult<()> {
        *a = self.eval_add(a, b)?;
        Ok(())
    }

    fn eval_sub_in_place(
        &self,
        a: &mut Self::Ciphertext,
        b: &Self::Ciphertext,
    ) -> EngineResult<()> {
        *a = self.eval_sub(a, b)?;
        Ok(())
    }

    fn eval_mult_in_place(
        &self,
        a: &mut Self::Ciphertext,
        b: &Self::Ciphertext,
    ) -> EngineResult<()> {
        *a = self.eval_mult(a, b)?;
        Ok(())
    }

    /// Rotate slots by a signed offset (positive shifts toward slot 0).
    fn eval_at_index(&self, ct: &Self::Ciphertext, index: i32) -> EngineResult<Self::Ciphertext>;

    /// Pack the first slot of each input into consecutive slots.
    fn eval_merge(&self, cts: &[Self::Ciphertext]) -> EngineResult<Self::Ciphertext>;

    /// Rotate-and-add over a power-of-two window of `batch_size` slots.
    fn eval_sum(&self, ct: &Self::Ciphertext, batch_size: usize) -> EngineResult<Self::Ciphertext>;

    fn key_switch(
        &self,
        ct: &Self::Ciphertext,
        hint: &Self::KeySwitchHint,
    ) -> EngineResult<Self::Ciphertext>;

    fn mod_reduce_in_place(&self, ct: &mut Self::Ciphertext) -> EngineResult<()>;
}

/// Builds contexts and owns the registry of live ones.
pub trait ContextFactory {
    type Context: CryptoContext;

    /// Build (or reuse) a context; fails when the parameters are inconsistent.
    fn generate_context(&self, params: &CryptoParams) -> EngineResult<Self::Context>;

    /// Release every live context. Released handles refuse further work.
    fn release_all_contexts(&self);

    fn live_contexts(&self) -> usize;
}
