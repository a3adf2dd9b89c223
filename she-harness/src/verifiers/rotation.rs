//! Indexed rotation and ciphertext merge.
//!
//! Rotation shifts zeros in past the end of the message; it never wraps the
//! message around.

use she_engine::{CryptoContext, EngineResult};

use crate::checks::{CheckLog, View};

/// Offsets with rotation keys in the rotation check.
pub const ROTATION_OFFSETS: [i32; 2] = [3, -3];

/// First-slot values of the ciphertexts being merged.
pub const MERGE_INPUTS: [i64; 5] = [32, 2, 4, 8, 16];
/// Length of each merge input vector.
const MERGE_INPUT_LEN: usize = 10;
pub const MERGE_EXPECTED: [i64; 8] = [32, 2, 4, 8, 16, 0, 0, 0];

/// `values` shifted by `offset` slots with zero fill (positive shifts left).
pub fn zero_fill_shift(values: &[i64], offset: i32) -> Vec<i64> {
    let len = values.len() as i64;
    (0..len)
        .map(|i| {
            let src = i + i64::from(offset);
            if (0..len).contains(&src) {
                values[src as usize]
            } else {
                0
            }
        })
        .collect()
}

pub fn verify_eval_at_index<C: CryptoContext>(cc: &C, log: &mut CheckLog) -> EngineResult<()> {
    let input: Vec<i64> = (1..=16).collect();
    let pt = cc.make_packed_plaintext(&input)?;

    let kp = cc.key_gen()?;
    cc.eval_at_index_key_gen(&kp.secret_key, &ROTATION_OFFSETS)?;
    let ct = cc.encrypt(&kp.public_key, &pt)?;

    for offset in ROTATION_OFFSETS {
        let expected = cc.make_packed_plaintext(&zero_fill_shift(&input, offset))?;
        let rotated = cc.eval_at_index(&ct, offset)?;
        log.expect_decrypts_to(
            cc,
            &format!("EvalAtIndex {offset:+}"),
            &kp.secret_key,
            &rotated,
            &expected,
            View::Packed,
        )?;
    }
    Ok(())
}

pub fn verify_eval_merge<C: CryptoContext>(cc: &C, log: &mut CheckLog) -> EngineResult<()> {
    let kp = cc.key_gen()?;
    let offsets: Vec<i32> = (1..=MERGE_INPUTS.len() as i32).map(|k| -k).collect();
    cc.eval_at_index_key_gen(&kp.secret_key, &offsets)?;

    let mut cts = Vec::with_capacity(MERGE_INPUTS.len());
    for value in MERGE_INPUTS {
        let mut input = vec![0i64; MERGE_INPUT_LEN];
        input[0] = value;
        let pt = cc.make_packed_plaintext(&input)?;
        cts.push(cc.encrypt(&kp.public_key, &pt)?);
    }

    let merged = cc.eval_merge(&cts)?;
    let expected = cc.make_packed_plaintext(&MERGE_EXPECTED)?;
    log.expect_decrypts_to(cc, "EvalMerge", &kp.secret_key, &merged, &expected, View::Packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_fill_shift_matches_literal_vectors() {
        let input: Vec<i64> = (1..=16).collect();
        let left: Vec<i64> = (4..=16).chain([0, 0, 0]).collect();
        let right: Vec<i64> = [0, 0, 0].into_iter().chain(1..=13).collect();
        assert_eq!(zero_fill_shift(&input, 3), left);
        assert_eq!(zero_fill_shift(&input, -3), right);
        assert_eq!(zero_fill_shift(&input, 0), input);
    }
}
