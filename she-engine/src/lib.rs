//! Encryption-context capability for somewhat-homomorphic (SHE) schemes.
//!
//! The harness in `she-harness` only ever talks to an engine through the
//! traits in [`capability`]. This crate also ships [`reference`], a cleartext
//! model of a BGV/BFV residue-number-system engine that enforces the same
//! key, depth, and encoding contracts so the harness can run in-process.

pub mod capability;
pub mod error;
pub mod params;
pub mod reference;

pub use capability::{
    CiphertextOps, ContextFactory, CryptoContext, KeyPair, Metadata, PlaintextEncoding,
    PlaintextValue, SecretKeyMaterial,
};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use params::{
    CryptoParams, EncodingTechnique, KeySwitchTechnique, MultiplicationTechnique,
    ScalingTechnique, SchemeFamily, SecretKeyDist, SecurityLevel,
};
