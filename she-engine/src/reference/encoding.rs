//! Plaintext encodings: packed slots, coefficients, and byte strings.

use crate::capability::{PlaintextEncoding, PlaintextValue};
use crate::error::{EngineError, EngineResult};

use super::ring::{is_prime, PlainRing};

/// A reference-engine plaintext: n ring values plus a logical length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plaintext {
    pub(crate) encoding: PlaintextEncoding,
    pub(crate) values: Vec<i64>,
    pub(crate) length: usize,
}

impl Plaintext {
    fn view(&self, wanted: PlaintextEncoding) -> EngineResult<Vec<i64>> {
        if self.encoding != wanted {
            return Err(EngineError::Encoding(format!(
                "plaintext is {} encoded, not {}",
                self.encoding, wanted
            )));
        }
        Ok(self.values[..self.length].to_vec())
    }
}

impl PlaintextValue for Plaintext {
    fn encoding(&self) -> PlaintextEncoding {
        self.encoding
    }

    fn len(&self) -> usize {
        self.length
    }

    fn set_length(&mut self, length: usize) {
        if length > self.values.len() {
            self.values.resize(length, 0);
        }
        self.length = length;
    }

    fn packed_values(&self) -> EngineResult<Vec<i64>> {
        self.view(PlaintextEncoding::Packed)
    }

    fn coef_packed_values(&self) -> EngineResult<Vec<i64>> {
        self.view(PlaintextEncoding::CoefPacked)
    }

    fn string_value(&self) -> EngineResult<String> {
        let values = self.view(PlaintextEncoding::String)?;
        let mut bytes: Vec<u8> = values.iter().map(|&v| v.rem_euclid(256) as u8).collect();
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn check_fits(ring: &PlainRing, len: usize) -> EngineResult<()> {
    if len > ring.n {
        return Err(EngineError::Encoding(format!(
            "message of length {len} does not fit ring dimension {}",
            ring.n
        )));
    }
    Ok(())
}

/// Packed encoding needs a prime t with t ≡ 1 (mod 2n) so the ring splits
/// into n slots.
pub(crate) fn supports_packing(ring: &PlainRing) -> bool {
    let two_n = 2 * ring.n as u64;
    is_prime(ring.t) && (ring.t - 1) % two_n == 0
}

pub(crate) fn encode_packed(ring: &PlainRing, values: &[i64]) -> EngineResult<Plaintext> {
    if !supports_packing(ring) {
        return Err(EngineError::InvalidParameters(format!(
            "plaintext modulus {} does not support packed encoding at ring dimension {}",
            ring.t, ring.n
        )));
    }
    check_fits(ring, values.len())?;
    Ok(Plaintext {
        encoding: PlaintextEncoding::Packed,
        values: ring.lift(values),
        length: values.len(),
    })
}

pub(crate) fn encode_coef_packed(ring: &PlainRing, values: &[i64]) -> EngineResult<Plaintext> {
    check_fits(ring, values.len())?;
    Ok(Plaintext {
        encoding: PlaintextEncoding::CoefPacked,
        values: ring.lift(values),
        length: values.len(),
    })
}

pub(crate) fn encode_string(ring: &PlainRing, text: &str) -> EngineResult<Plaintext> {
    if ring.t < 256 {
        return Err(EngineError::InvalidParameters(format!(
            "string encoding needs a plaintext modulus of at least 256, got {}",
            ring.t
        )));
    }
    let bytes = text.as_bytes();
    check_fits(ring, bytes.len())?;
    let values: Vec<i64> = bytes.iter().map(|&b| i64::from(b)).collect();
    Ok(Plaintext {
        encoding: PlaintextEncoding::String,
        values: ring.lift(&values),
        length: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_requires_split_modulus() {
        assert!(supports_packing(&PlainRing::new(256, 65537)));
        assert!(supports_packing(&PlainRing::new(8192, 65537)));
        assert!(!supports_packing(&PlainRing::new(16, 64)));
        let err = encode_packed(&PlainRing::new(16, 64), &[1, 2]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters(_)));
    }

    #[test]
    fn set_length_truncates_and_extends() {
        let ring = PlainRing::new(16, 64);
        let mut pt = encode_coef_packed(&ring, &[1, 2, 3]).unwrap();
        assert_eq!(pt.coef_packed_values().unwrap(), vec![1, 2, 3]);
        pt.set_length(5);
        assert_eq!(pt.coef_packed_values().unwrap(), vec![1, 2, 3, 0, 0]);
        pt.set_length(2);
        assert_eq!(pt.coef_packed_values().unwrap(), vec![1, 2]);
        pt.set_length(20);
        assert_eq!(pt.len(), 20);
    }

    #[test]
    fn wrong_view_is_an_encoding_error() {
        let ring = PlainRing::new(16, 64);
        let pt = encode_coef_packed(&ring, &[1]).unwrap();
        assert!(matches!(pt.packed_values(), Err(EngineError::Encoding(_))));
        assert!(matches!(pt.string_value(), Err(EngineError::Encoding(_))));
    }

    #[test]
    fn strings_survive_centered_storage() {
        let ring = PlainRing::new(64, 256);
        let mut pt = encode_string(&ring, "I am good, what are you?! 32 ch").unwrap();
        pt.set_length(64);
        assert_eq!(pt.string_value().unwrap(), "I am good, what are you?! 32 ch");
        assert!(encode_string(&PlainRing::new(64, 64), "x").is_err());
    }

    #[test]
    fn overlong_messages_are_rejected() {
        let ring = PlainRing::new(4, 65537);
        assert!(encode_coef_packed(&ring, &[1, 2, 3, 4, 5]).is_err());
    }
}
