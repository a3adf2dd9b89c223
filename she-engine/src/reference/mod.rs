//! Reference engine: a cleartext model of a BGV/BFV RNS engine.
//!
//! Payloads are stored as plaintext ring elements, so nothing here is
//! confidential. What the model does reproduce is every contract the harness
//! relies on:
//! - operations need the evaluation keys a real engine needs (relinearization,
//!   per-offset rotation, summation, switching hints);
//! - ciphertexts track their secret key, RNS towers, and consumed depth;
//! - encodings obey the plaintext modulus (packing needs t ≡ 1 mod 2n);
//! - the factory reuses live contexts for identical parameters until
//!   `release_all_contexts`, just like a process-wide context cache.

mod ciphertext;
mod context;
mod encoding;
pub mod faults;
mod keys;
mod ring;
mod slots;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::capability::{ContextFactory, CryptoContext};
use crate::error::EngineResult;
use crate::params::CryptoParams;

pub use ciphertext::Ciphertext;
pub use context::ReferenceContext;
pub use encoding::Plaintext;
pub use faults::{Fault, FaultPlan};
pub use keys::{KeyId, KeySwitchHint, PublicKey, SecretKey};

/// Builds [`ReferenceContext`]s and keeps the registry of live ones.
pub struct ReferenceFactory {
    seed: Option<u64>,
    faults: FaultPlan,
    next_id: AtomicU64,
    live: Mutex<Vec<ReferenceContext>>,
}

impl ReferenceFactory {
    /// Factory drawing key material from OS entropy.
    pub fn new() -> Self {
        Self {
            seed: None,
            faults: FaultPlan::none(),
            next_id: AtomicU64::new(1),
            live: Mutex::new(Vec::new()),
        }
    }

    /// Factory with reproducible key material.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new()
        }
    }

    /// Contexts built from now on misbehave as described by `faults`.
    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    fn live(&self) -> MutexGuard<'_, Vec<ReferenceContext>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ReferenceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextFactory for ReferenceFactory {
    type Context = ReferenceContext;

    fn generate_context(&self, params: &CryptoParams) -> EngineResult<ReferenceContext> {
        context::validate(params)?;
        let mut live = self.live();
        if let Some(existing) = live.iter().find(|cc| cc.params() == params) {
            debug!("reusing live context #{} for identical parameters", existing.id());
            return Ok(existing.clone());
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id)),
            None => StdRng::from_entropy(),
        };
        let cc = ReferenceContext::new(id, params.clone(), rng, self.faults.clone());
        debug!(
            "context #{id}: {} n={} depth={} t={}",
            params.scheme,
            params.ring_dimension,
            params.multiplicative_depth,
            params.plaintext_modulus
        );
        live.push(cc.clone());
        Ok(cc)
    }

    fn release_all_contexts(&self) {
        let released: Vec<ReferenceContext> = self.live().drain(..).collect();
        for cc in &released {
            cc.inner.release();
        }
        if !released.is_empty() {
            debug!("released {} context(s)", released.len());
        }
    }

    fn live_contexts(&self) -> usize {
        self.live().len()
    }
}
