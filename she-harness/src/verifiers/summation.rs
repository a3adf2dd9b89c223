//! Homomorphic summation: partial windows and the full batch.

use she_engine::{CryptoContext, EngineResult};

use crate::checks::{CheckLog, View};
use crate::registry::BATCH_LRG;

/// Period of the partial-sum input; the input is 1..=8 repeated.
const PERIOD: usize = 8;

/// (window, expected first eight slots) for the partial-sum check.
pub const PARTIAL_SUMS: [(usize, [i64; 8]); 3] = [
    (1, [1, 2, 3, 4, 5, 6, 7, 8]),
    (2, [3, 5, 7, 9, 11, 13, 15, 9]),
    (8, [36; 8]),
];

/// Every slot after a full-batch sum of the 4096-slot fixture.
pub const FULL_BATCH_SUM: i64 = 32768;

pub fn verify_eval_sum<C: CryptoContext>(cc: &C, log: &mut CheckLog) -> EngineResult<()> {
    let n = cc.ring_dimension();
    let input: Vec<i64> = (0..n).map(|i| (i % PERIOD) as i64 + 1).collect();
    let pt = cc.make_packed_plaintext(&input)?;

    let kp = cc.key_gen()?;
    cc.eval_sum_key_gen(&kp.secret_key)?;
    let ct = cc.encrypt(&kp.public_key, &pt)?;

    for (window, expected) in PARTIAL_SUMS {
        let expected = cc.make_packed_plaintext(&expected)?;
        let summed = cc.eval_sum(&ct, window)?;
        log.expect_decrypts_to(
            cc,
            &format!("EvalSum window {window}"),
            &kp.secret_key,
            &summed,
            &expected,
            View::Packed,
        )?;
    }
    Ok(())
}

/// 1..=8 at the front, the slot indices n-8..n at the back, zeros between.
pub fn full_batch_input(n: usize) -> Vec<i64> {
    let mut input = vec![0i64; n];
    for (i, slot) in input.iter_mut().enumerate().take(PERIOD) {
        *slot = i as i64 + 1;
    }
    for i in n.saturating_sub(PERIOD)..n {
        input[i] = i as i64;
    }
    input
}

pub fn verify_eval_sum_all<C: CryptoContext>(cc: &C, log: &mut CheckLog) -> EngineResult<()> {
    let input = full_batch_input(cc.ring_dimension());
    let pt = cc.make_packed_plaintext(&input)?;

    let kp = cc.key_gen()?;
    cc.eval_sum_key_gen(&kp.secret_key)?;
    let ct = cc.encrypt(&kp.public_key, &pt)?;

    let expected = cc.make_packed_plaintext(&[FULL_BATCH_SUM; PERIOD])?;
    let summed = cc.eval_sum(&ct, BATCH_LRG)?;
    let label = "EvalSum full batch";
    log.expect_decrypts_to(cc, label, &kp.secret_key, &summed, &expected, View::Packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_batch_fixture_sums_to_constant() {
        let input = full_batch_input(BATCH_LRG);
        assert_eq!(input.iter().sum::<i64>(), FULL_BATCH_SUM);
        assert_eq!(&input[..3], &[1, 2, 3]);
        assert_eq!(input[BATCH_LRG - 1], BATCH_LRG as i64 - 1);
    }

    #[test]
    fn partial_sums_follow_power_of_two_offsets() {
        let period: Vec<i64> = (1..=8).collect();
        for (window, expected) in PARTIAL_SUMS {
            let computed: Vec<i64> = (0..8)
                .map(|i| (0..window).map(|k| period[(i + k) % 8]).sum())
                .collect();
            assert_eq!(computed, expected, "window {window}");
        }
    }
}
