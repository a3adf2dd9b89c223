//! Metadata tags must follow the left operand through every evaluation.

use she_engine::{CryptoContext, EngineResult, Metadata};

use crate::checks::CheckLog;

/// Metadata key the tags are stored under.
pub const TAG_KEY: &str = "label";
pub const LEFT_TAG: &str = "ciphertext1";
pub const RIGHT_TAG: &str = "ciphertext2";

pub fn verify_metadata<C: CryptoContext>(cc: &C, log: &mut CheckLog) -> EngineResult<()> {
    let lhs: Vec<i64> = (0..8).collect();
    let rhs: Vec<i64> = (0..8).map(|v| -v).collect();
    let pt1 = cc.make_packed_plaintext(&lhs)?;
    let pt2 = cc.make_packed_plaintext(&rhs)?;

    let kp = cc.key_gen()?;
    cc.eval_mult_key_gen(&kp.secret_key)?;
    cc.eval_at_index_key_gen(&kp.secret_key, &[2, -2])?;
    cc.eval_sum_key_gen(&kp.secret_key)?;

    let mut ct1 = cc.encrypt(&kp.public_key, &pt1)?;
    let mut ct2 = cc.encrypt(&kp.public_key, &pt2)?;
    ct1.set_metadata(TAG_KEY, LEFT_TAG);
    ct2.set_metadata(TAG_KEY, RIGHT_TAG);

    let result = cc.eval_add(&ct1, &ct2)?;
    log.expect_tag("EvalAdd", TAG_KEY, LEFT_TAG, &result);

    let mut acc = ct1.clone();
    cc.eval_add_in_place(&mut acc, &ct2)?;
    log.expect_tag("EvalAddInPlace", TAG_KEY, LEFT_TAG, &acc);

    let result = cc.eval_add_plain(&ct1, &pt1)?;
    log.expect_tag("EvalAdd Ciphertext + Plaintext", TAG_KEY, LEFT_TAG, &result);

    let result = cc.eval_sub(&ct1, &ct2)?;
    log.expect_tag("EvalSub", TAG_KEY, LEFT_TAG, &result);

    let result = cc.eval_sub_plain(&ct1, &pt1)?;
    log.expect_tag("EvalSub Ciphertext - Plaintext", TAG_KEY, LEFT_TAG, &result);

    let result = cc.eval_mult(&ct1, &ct2)?;
    log.expect_tag("EvalMult", TAG_KEY, LEFT_TAG, &result);

    let result = cc.eval_mult_plain(&ct1, &pt1)?;
    log.expect_tag("EvalMult Ciphertext * Plaintext", TAG_KEY, LEFT_TAG, &result);

    let result = cc.eval_at_index(&ct1, 2)?;
    log.expect_tag("EvalAtIndex +2", TAG_KEY, LEFT_TAG, &result);

    let result = cc.eval_at_index(&ct1, -2)?;
    log.expect_tag("EvalAtIndex -2", TAG_KEY, LEFT_TAG, &result);

    Ok(())
}
