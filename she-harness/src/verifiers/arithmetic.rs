//! Add/sub over coefficient packing, and both flavors of multiplication.

use she_engine::{CiphertextOps, CryptoContext, EngineResult};

use crate::checks::{CheckLog, View};

pub const LHS: [i64; 8] = [1, 0, 3, 1, 0, 1, 2, 1];
pub const RHS: [i64; 8] = [2, 1, 3, 2, 2, 1, 3, 0];
pub const SUM: [i64; 8] = [3, 1, 6, 3, 2, 2, 5, 1];
pub const DIFFERENCE: [i64; 8] = [-1, -1, 0, -1, -2, 0, -1, 1];

/// LHS × RHS as a plain polynomial product (no wraparound).
pub const FULL_CONVOLUTION: [i64; 15] = [2, 1, 9, 7, 12, 12, 16, 12, 19, 12, 7, 7, 7, 3, 0];
/// LHS × RHS reduced mod X^8 + 1.
pub const REDUCED_PRODUCT: [i64; 8] = [-17, -11, 2, 0, 5, 9, 16, 12];
/// Cyclotomic order at which the product no longer fits and wraps.
pub const REDUCED_PRODUCT_ORDER: usize = 16;

pub const PACKED_RHS: [i64; 8] = [2, 1, 3, 2, 2, 1, 3, 1];
pub const HADAMARD: [i64; 8] = [2, 0, 9, 2, 0, 1, 6, 1];

/// Expected coefficient product for a context of the given cyclotomic order.
pub fn expected_coef_product(cyclotomic_order: usize) -> &'static [i64] {
    if cyclotomic_order == REDUCED_PRODUCT_ORDER {
        &REDUCED_PRODUCT
    } else {
        &FULL_CONVOLUTION
    }
}

pub fn verify_add_packed<C: CryptoContext>(cc: &C, log: &mut CheckLog) -> EngineResult<()> {
    let pt1 = cc.make_coef_packed_plaintext(&LHS)?;
    let pt2 = cc.make_coef_packed_plaintext(&RHS)?;
    let pt_add = cc.make_coef_packed_plaintext(&SUM)?;
    let pt_sub = cc.make_coef_packed_plaintext(&DIFFERENCE)?;

    let kp = cc.key_gen()?;
    let sk = &kp.secret_key;
    let ct1 = cc.encrypt(&kp.public_key, &pt1)?;
    let ct2 = cc.encrypt(&kp.public_key, &pt2)?;

    let sum = cc.eval_add(&ct1, &ct2)?;
    log.expect_decrypts_to(cc, "EvalAdd", sk, &sum, &pt_add, View::CoefPacked)?;

    let mut acc = ct1.clone();
    cc.eval_add_in_place(&mut acc, &ct2)?;
    log.expect_decrypts_to(cc, "EvalAddInPlace", sk, &acc, &pt_add, View::CoefPacked)?;

    let sum = ct1.add_op(&ct2)?;
    log.expect_decrypts_to(cc, "operator+", sk, &sum, &pt_add, View::CoefPacked)?;

    let mut acc = ct1.clone();
    acc.add_assign_op(&ct2)?;
    log.expect_decrypts_to(cc, "operator+=", sk, &acc, &pt_add, View::CoefPacked)?;

    let diff = cc.eval_sub(&ct1, &ct2)?;
    log.expect_decrypts_to(cc, "EvalSub", sk, &diff, &pt_sub, View::CoefPacked)?;

    let diff = ct1.sub_op(&ct2)?;
    log.expect_decrypts_to(cc, "operator-", sk, &diff, &pt_sub, View::CoefPacked)?;

    let mut acc = ct1.clone();
    acc.sub_assign_op(&ct2)?;
    log.expect_decrypts_to(cc, "operator-=", sk, &acc, &pt_sub, View::CoefPacked)?;

    let sum = cc.eval_add_plain(&ct1, &pt2)?;
    let label = "EvalAdd Ciphertext + Plaintext";
    log.expect_decrypts_to(cc, label, sk, &sum, &pt_add, View::CoefPacked)?;

    let diff = cc.eval_sub_plain(&ct1, &pt2)?;
    let label = "EvalSub Ciphertext - Plaintext";
    log.expect_decrypts_to(cc, label, sk, &diff, &pt_sub, View::CoefPacked)?;

    Ok(())
}

/// Run the four multiplication entry points against one expected plaintext.
fn check_mult_entry_points<C: CryptoContext>(
    cc: &C,
    log: &mut CheckLog,
    pt1: &C::Plaintext,
    pt2: &C::Plaintext,
    expected: &C::Plaintext,
    view: View,
) -> EngineResult<()> {
    let kp = cc.key_gen()?;
    let sk = &kp.secret_key;
    cc.eval_mult_key_gen(sk)?;
    let ct1 = cc.encrypt(&kp.public_key, pt1)?;
    let ct2 = cc.encrypt(&kp.public_key, pt2)?;

    let prod = cc.eval_mult(&ct1, &ct2)?;
    log.expect_decrypts_to(cc, "EvalMult", sk, &prod, expected, view)?;

    let prod = ct1.mul_op(&ct2)?;
    log.expect_decrypts_to(cc, "operator*", sk, &prod, expected, view)?;

    let mut acc = ct1.clone();
    acc.mul_assign_op(&ct2)?;
    log.expect_decrypts_to(cc, "operator*=", sk, &acc, expected, view)?;

    let prod = cc.eval_mult_plain(&ct1, pt2)?;
    log.expect_decrypts_to(cc, "EvalMult Ciphertext * Plaintext", sk, &prod, expected, view)?;

    Ok(())
}

pub fn verify_mult_coef_packed<C: CryptoContext>(cc: &C, log: &mut CheckLog) -> EngineResult<()> {
    let pt1 = cc.make_coef_packed_plaintext(&LHS)?;
    let pt2 = cc.make_coef_packed_plaintext(&RHS)?;
    let expected = cc.make_coef_packed_plaintext(expected_coef_product(cc.cyclotomic_order()))?;
    check_mult_entry_points(cc, log, &pt1, &pt2, &expected, View::CoefPacked)
}

pub fn verify_mult_packed<C: CryptoContext>(cc: &C, log: &mut CheckLog) -> EngineResult<()> {
    let pt1 = cc.make_packed_plaintext(&LHS)?;
    let pt2 = cc.make_packed_plaintext(&PACKED_RHS)?;
    let expected = cc.make_packed_plaintext(&HADAMARD)?;
    check_mult_entry_points(cc, log, &pt1, &pt2, &expected, View::Packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convolve(a: &[i64], b: &[i64]) -> Vec<i64> {
        let mut out = vec![0; a.len() + b.len() - 1];
        for (i, x) in a.iter().enumerate() {
            for (j, y) in b.iter().enumerate() {
                out[i + j] += x * y;
            }
        }
        out
    }

    #[test]
    fn fixtures_are_consistent() {
        let sum: Vec<i64> = LHS.iter().zip(RHS).map(|(a, b)| a + b).collect();
        let diff: Vec<i64> = LHS.iter().zip(RHS).map(|(a, b)| a - b).collect();
        assert_eq!(sum, SUM);
        assert_eq!(diff, DIFFERENCE);
        assert_eq!(convolve(&LHS, &RHS), FULL_CONVOLUTION);

        let mut reduced = FULL_CONVOLUTION[..8].to_vec();
        for (k, v) in FULL_CONVOLUTION[8..].iter().enumerate() {
            reduced[k] -= v;
        }
        assert_eq!(reduced, REDUCED_PRODUCT);

        let hadamard: Vec<i64> = LHS.iter().zip(PACKED_RHS).map(|(a, b)| a * b).collect();
        assert_eq!(hadamard, HADAMARD);
    }

    #[test]
    fn product_selector_keys_on_cyclotomic_order() {
        assert_eq!(expected_coef_product(16), &REDUCED_PRODUCT[..]);
        assert_eq!(expected_coef_product(32), &FULL_CONVOLUTION[..]);
        assert_eq!(expected_coef_product(16384), &FULL_CONVOLUTION[..]);
    }

    #[test]
    fn full_product_checks_every_coefficient() {
        // deg(LHS) + deg(RHS) + 1 coefficients, the last one zero since RHS[7] = 0
        assert_eq!(FULL_CONVOLUTION.len(), LHS.len() + RHS.len() - 1);
        assert_eq!(FULL_CONVOLUTION[14], 0);
    }
}
