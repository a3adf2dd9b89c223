//! Plaintext ring Z_t[X]/(X^n + 1).
//!
//! Values are kept centered in (-t/2, t/2]. Coefficient multiplication is a
//! naive O(n²) negacyclic convolution with i128 accumulators; the reference
//! engine only multiplies a handful of messages per case.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PlainRing {
    pub(crate) n: usize,
    pub(crate) t: u64,
}

impl PlainRing {
    pub(crate) fn new(n: usize, t: u64) -> Self {
        Self { n, t }
    }

    /// Reduce into the centered range (-t/2, t/2].
    pub(crate) fn reduce(&self, v: i128) -> i64 {
        let t = self.t as i128;
        let mut r = v.rem_euclid(t);
        if r > t / 2 {
            r -= t;
        }
        r as i64
    }

    /// Reduce a message and zero-pad it to exactly n entries.
    pub(crate) fn lift(&self, values: &[i64]) -> Vec<i64> {
        let mut out: Vec<i64> = values.iter().map(|&v| self.reduce(v as i128)).collect();
        out.resize(self.n, 0);
        out
    }

    pub(crate) fn add(&self, a: &[i64], b: &[i64]) -> Vec<i64> {
        a.iter()
            .zip(b)
            .map(|(&x, &y)| self.reduce(x as i128 + y as i128))
            .collect()
    }

    pub(crate) fn sub(&self, a: &[i64], b: &[i64]) -> Vec<i64> {
        a.iter()
            .zip(b)
            .map(|(&x, &y)| self.reduce(x as i128 - y as i128))
            .collect()
    }

    /// Slot-wise (Hadamard) product.
    pub(crate) fn hadamard(&self, a: &[i64], b: &[i64]) -> Vec<i64> {
        a.iter()
            .zip(b)
            .map(|(&x, &y)| self.reduce(x as i128 * y as i128))
            .collect()
    }

    /// Product in Z_t[X]/(X^n + 1): terms past X^(n-1) wrap with negation.
    pub(crate) fn negacyclic_mul(&self, a: &[i64], b: &[i64]) -> Vec<i64> {
        let n = self.n;
        let mut acc = vec![0i128; n];
        for (i, &x) in a.iter().enumerate().take(n) {
            if x == 0 {
                continue;
            }
            for (j, &y) in b.iter().enumerate().take(n) {
                let k = i + j;
                let prod = x as i128 * y as i128;
                if k < n {
                    acc[k] += prod;
                } else {
                    acc[k - n] -= prod;
                }
            }
        }
        acc.into_iter().map(|v| self.reduce(v)).collect()
    }
}

/// Trial-division primality test; plaintext moduli are small.
pub(crate) fn is_prime(t: u64) -> bool {
    if t < 2 {
        return false;
    }
    if t % 2 == 0 {
        return t == 2;
    }
    let mut d = 3u64;
    while d.saturating_mul(d) <= t {
        if t % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}
