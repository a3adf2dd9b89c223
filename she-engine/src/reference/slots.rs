//! Slot layout for packed plaintexts.
//!
//! The n slots form two rows of n/2. Rotations act inside each row, so a
//! message shorter than a row sees zeros shifted in from the row's padding.

/// Rotate each row left by `index` (negative rotates right).
pub(crate) fn rotate_rows(values: &[i64], index: i32) -> Vec<i64> {
    let row = values.len() / 2;
    if row == 0 {
        return values.to_vec();
    }
    let shift = i64::from(index).rem_euclid(row as i64) as usize;
    let mut out = vec![0i64; values.len()];
    for r in 0..2 {
        let base = r * row;
        for j in 0..row {
            out[base + j] = values[base + (j + shift) % row];
        }
    }
    out
}

/// Exchange the two rows.
pub(crate) fn swap_rows(values: &[i64]) -> Vec<i64> {
    let row = values.len() / 2;
    let mut out = values[row..].to_vec();
    out.extend_from_slice(&values[..row]);
    out
}

/// Rotate only the first `window` slots cyclically, leaving the rest alone.
///
/// This is not a valid rotation for this slot layout; fault plans use it to
/// model an engine that wraps at the batch boundary.
pub(crate) fn rotate_within(values: &[i64], window: usize, index: i32) -> Vec<i64> {
    let window = window.min(values.len());
    if window == 0 {
        return values.to_vec();
    }
    let shift = i64::from(index).rem_euclid(window as i64) as usize;
    let mut out = values.to_vec();
    for j in 0..window {
        out[j] = values[(j + shift) % window];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize, n: usize) -> Vec<i64> {
        let mut v: Vec<i64> = (1..=len as i64).collect();
        v.resize(n, 0);
        v
    }

    #[test]
    fn left_rotation_shifts_in_zeros() {
        let out = rotate_rows(&ramp(16, 64), 3);
        let expected: Vec<i64> = (4..=16).chain([0, 0, 0]).collect();
        assert_eq!(&out[..16], expected.as_slice());
    }

    #[test]
    fn right_rotation_shifts_in_zeros() {
        let out = rotate_rows(&ramp(16, 64), -3);
        let expected: Vec<i64> = [0, 0, 0].into_iter().chain(1..=13).collect();
        assert_eq!(&out[..16], expected.as_slice());
    }

    #[test]
    fn rows_rotate_independently() {
        let v = vec![1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(rotate_rows(&v, 1), vec![2, 3, 4, 1, 6, 7, 8, 5]);
        assert_eq!(swap_rows(&v), vec![5, 6, 7, 8, 1, 2, 3, 4]);
    }

    #[test]
    fn rotate_within_wraps_at_window() {
        let out = rotate_within(&ramp(16, 64), 16, 3);
        assert_eq!(&out[13..16], &[1, 2, 3]);
    }
}
