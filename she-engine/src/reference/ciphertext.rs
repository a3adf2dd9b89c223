//! Reference ciphertexts and their operator aliases.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};
use std::sync::Arc;

use crate::capability::{CiphertextOps, Metadata, PlaintextEncoding};
use crate::error::{EngineError, EngineResult};

use super::context::ContextInner;
use super::keys::KeyId;

/// A ciphertext of the reference engine.
///
/// The payload is the message itself (mod t). What makes it behave like a
/// ciphertext is the bookkeeping: the key it decrypts under, the RNS towers
/// it still has, and the multiplicative depth it has consumed.
#[derive(Clone)]
pub struct Ciphertext {
    pub(crate) context: Arc<ContextInner>,
    pub(crate) key_id: KeyId,
    pub(crate) encoding: PlaintextEncoding,
    pub(crate) values: Vec<i64>,
    pub(crate) towers: usize,
    pub(crate) depth: usize,
    pub(crate) metadata: BTreeMap<String, String>,
    /// Error from a compound-assignment operator, reported on next use.
    pub(crate) fault: Option<EngineError>,
}

impl Ciphertext {
    /// RNS towers remaining.
    pub fn towers(&self) -> usize {
        self.towers
    }

    /// Multiplicative levels consumed.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn encoding(&self) -> PlaintextEncoding {
        self.encoding
    }

    /// Surface (and clear) an error recorded by `+=`, `-=` or `*=`.
    pub fn take_fault(&mut self) -> EngineResult<()> {
        match self.fault.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn check_fault(&self) -> EngineResult<()> {
        match &self.fault {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ciphertext")
            .field("context", &self.context.id)
            .field("encoding", &self.encoding)
            .field("towers", &self.towers)
            .field("depth", &self.depth)
            .field("metadata", &self.metadata)
            .field("fault", &self.fault)
            .finish_non_exhaustive()
    }
}

impl Metadata for Ciphertext {
    fn set_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Operators
// ═══════════════════════════════════════════════════════════════════════

impl Add<&Ciphertext> for &Ciphertext {
    type Output = EngineResult<Ciphertext>;

    fn add(self, rhs: &Ciphertext) -> Self::Output {
        self.context.add(self, rhs)
    }
}

impl Sub<&Ciphertext> for &Ciphertext {
    type Output = EngineResult<Ciphertext>;

    fn sub(self, rhs: &Ciphertext) -> Self::Output {
        self.context.sub(self, rhs)
    }
}

impl Mul<&Ciphertext> for &Ciphertext {
    type Output = EngineResult<Ciphertext>;

    fn mul(self, rhs: &Ciphertext) -> Self::Output {
        self.context.mult(self, rhs)
    }
}

// Compound assignment cannot return a Result; a failure is parked in
// `fault` and returned by the next operation or by `take_fault`.

impl AddAssign<&Ciphertext> for Ciphertext {
    fn add_assign(&mut self, rhs: &Ciphertext) {
        let context = Arc::clone(&self.context);
        match context.add(self, rhs) {
            Ok(sum) => *self = sum,
            Err(err) => self.fault = Some(err),
        }
    }
}

impl SubAssign<&Ciphertext> for Ciphertext {
    fn sub_assign(&mut self, rhs: &Ciphertext) {
        let context = Arc::clone(&self.context);
        match context.sub(self, rhs) {
            Ok(diff) => *self = diff,
            Err(err) => self.fault = Some(err),
        }
    }
}

impl MulAssign<&Ciphertext> for Ciphertext {
    fn mul_assign(&mut self, rhs: &Ciphertext) {
        let context = Arc::clone(&self.context);
        match context.mult(self, rhs) {
            Ok(prod) => *self = prod,
            Err(err) => self.fault = Some(err),
        }
    }
}

impl CiphertextOps for Ciphertext {
    fn add_op(&self, rhs: &Self) -> EngineResult<Self> {
        self + rhs
    }

    fn add_assign_op(&mut self, rhs: &Self) -> EngineResult<()> {
        *self += rhs;
        self.take_fault()
    }

    fn sub_op(&self, rhs: &Self) -> EngineResult<Self> {
        self - rhs
    }

    fn sub_assign_op(&mut self, rhs: &Self) -> EngineResult<()> {
        *self -= rhs;
        self.take_fault()
    }

    fn mul_op(&self, rhs: &Self) -> EngineResult<Self> {
        self * rhs
    }

    fn mul_assign_op(&mut self, rhs: &Self) -> EngineResult<()> {
        *self *= rhs;
        self.take_fault()
    }
}
