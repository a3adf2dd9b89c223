//! One verification procedure per operation kind.
//!
//! A verifier gets a freshly built context, encrypts literal fixtures,
//! generates the keys its operation needs, runs every equivalent entry point
//! (named call, operator alias, in-place variant), and records a check for
//! each decrypted result. Engine errors propagate with `?`; the dispatcher
//! turns them into a case failure.

pub mod arithmetic;
pub mod keyswitch;
pub mod metadata;
pub mod rotation;
pub mod summation;

use she_engine::{CryptoContext, EngineResult};

use crate::checks::CheckLog;
use crate::registry::OperationKind;

/// Signature shared by every verifier.
pub type VerifierFn<C> = fn(&C, &mut CheckLog) -> EngineResult<()>;

/// A verifier and the name it reports failures under.
pub struct Verifier<C> {
    pub name: &'static str,
    pub run: VerifierFn<C>,
}

impl<C> Clone for Verifier<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Verifier<C> {}

/// Map an operation kind to its verifier.
pub fn verifier_for<C: CryptoContext>(kind: OperationKind) -> Verifier<C> {
    use OperationKind::*;

    fn entry<C>(name: &'static str, run: VerifierFn<C>) -> Verifier<C> {
        Verifier { name, run }
    }

    match kind {
        AddPacked => entry("verify_add_packed", arithmetic::verify_add_packed::<C>),
        MultCoefPacked => {
            entry("verify_mult_coef_packed", arithmetic::verify_mult_coef_packed::<C>)
        }
        MultPacked => entry("verify_mult_packed", arithmetic::verify_mult_packed::<C>),
        EvalAtIndex => entry("verify_eval_at_index", rotation::verify_eval_at_index::<C>),
        EvalMerge => entry("verify_eval_merge", rotation::verify_eval_merge::<C>),
        EvalSum => entry("verify_eval_sum", summation::verify_eval_sum::<C>),
        Metadata => entry("verify_metadata", metadata::verify_metadata::<C>),
        EvalSumAll => entry("verify_eval_sum_all", summation::verify_eval_sum_all::<C>),
        KsSingleCrt => entry("verify_key_switch", keyswitch::verify_key_switch::<C>),
        KsModReduceDcrt => entry(
            "verify_key_switch_mod_reduce",
            keyswitch::verify_key_switch_mod_reduce::<C>,
        ),
    }
}
