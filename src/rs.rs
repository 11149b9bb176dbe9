//! Reed–Solomon encoder/decoder (component B).
//!
//! Grounded on `original_source/include/zkp/encoding.hpp`'s `reed_solomon64`:
//! `encode_with` pads a length-`ℓ` message to `d` with blinds, inverse-NTTs
//! at size `d` to get coefficients, pads to `n`, forward-NTTs at size `n` to
//! get the codeword. `decode` reverses this, cancelling blinds by
//! subtracting the high half of the inverse-transformed codeword from the
//! low half before the final forward transform.

use crate::field::{self, Fp};
use crate::prng::FieldRng;
use thiserror::Error;

/// Errors from Reed-Solomon encode/decode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RsError {
    /// Field-level arithmetic failure (e.g. NTT size mismatch).
    #[error("field error: {0}")]
    Field(#[from] field::FieldError),
    /// Input slice length didn't match the expected stage length.
    #[error("reed-solomon shape error: expected length {expected}, got {got}")]
    BadLength { expected: usize, got: usize },
}

/// Code parameters `(p, ℓ, d, n)`: `ℓ ≤ d ≤ n`, `n = 2d`, `d` a power of two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeParams {
    /// Message length.
    pub l: usize,
    /// Padded (plaintext-domain) length, a power of two.
    pub d: usize,
    /// Codeword length, `n = 2d`.
    pub n: usize,
}

impl CodeParams {
    /// Construct and validate `ℓ ≤ d ≤ n = 2d`, `d` a power of two.
    pub fn new(l: usize, d: usize) -> Self {
        assert!(l <= d, "message length must not exceed padded length");
        assert!(d.is_power_of_two(), "padded length must be a power of two");
        CodeParams { l, d, n: 2 * d }
    }

    /// Hamming-distance rate bound `(d - l) / n`.
    pub fn rate_gap(&self) -> f64 {
        (self.d - self.l) as f64 / self.n as f64
    }
}

/// A Reed–Solomon codec bound to a fixed `CodeParams`.
#[derive(Clone, Copy, Debug)]
pub struct ReedSolomon {
    params: CodeParams,
}

impl ReedSolomon {
    /// Bind a codec to a fixed code shape.
    pub fn new(params: CodeParams) -> Self {
        ReedSolomon { params }
    }

    /// The code shape this codec was bound to.
    pub fn params(&self) -> CodeParams {
        self.params
    }

    /// Encode a length-`ℓ` message, padding `ℓ..d` with blinds drawn from
    /// `rng`, producing a length-`n` codeword.
    pub fn encode_with<R: FieldRng>(&self, message: &[Fp], rng: &mut R) -> Result<Vec<Fp>, RsError> {
        if message.len() != self.params.l {
            return Err(RsError::BadLength {
                expected: self.params.l,
                got: message.len(),
            });
        }
        let mut poly = vec![Fp::ZERO; self.params.d];
        poly[..self.params.l].copy_from_slice(message);
        for slot in poly.iter_mut().skip(self.params.l) {
            *slot = rng.uniform_in_field();
        }
        field::ntt_inverse(&mut poly)?;
        poly.resize(self.params.n, Fp::ZERO);
        field::ntt_forward(&mut poly)?;
        Ok(poly)
    }

    /// Encode a length-`ℓ` *public* message (no blinding): pads `ℓ..d`
    /// with zeros. Used for publicly-known constants.
    pub fn encode_const(&self, message: &[Fp]) -> Result<Vec<Fp>, RsError> {
        if message.len() != self.params.l {
            return Err(RsError::BadLength {
                expected: self.params.l,
                got: message.len(),
            });
        }
        let mut poly = vec![Fp::ZERO; self.params.d];
        poly[..self.params.l].copy_from_slice(message);
        field::ntt_inverse(&mut poly)?;
        poly.resize(self.params.n, Fp::ZERO);
        field::ntt_forward(&mut poly)?;
        Ok(poly)
    }

    /// Full decode: codeword (length `n`) -> message (length `ℓ`).
    /// Requires `n == 2d`.
    pub fn decode(&self, codeword: &[Fp]) -> Result<Vec<Fp>, RsError> {
        if codeword.len() != self.params.n {
            return Err(RsError::BadLength {
                expected: self.params.n,
                got: codeword.len(),
            });
        }
        let mut work = codeword.to_vec();
        field::ntt_inverse(&mut work)?;
        let (lo, hi) = work.split_at(self.params.d);
        let mut folded: Vec<Fp> = lo.iter().zip(hi.iter()).map(|(a, b)| *a - *b).collect();
        field::ntt_forward(&mut folded)?;
        folded.truncate(self.params.l);
        Ok(folded)
    }

    /// Partial decode: codeword -> padded plaintext-domain vector (length
    /// `d`), stopping short of the final forward transform. Used for the
    /// code argument's folding stage.
    pub fn partial_decode(&self, codeword: &[Fp]) -> Result<Vec<Fp>, RsError> {
        if codeword.len() != self.params.n {
            return Err(RsError::BadLength {
                expected: self.params.n,
                got: codeword.len(),
            });
        }
        let mut work = codeword.to_vec();
        field::ntt_inverse(&mut work)?;
        let (lo, hi) = work.split_at(self.params.d);
        let folded: Vec<Fp> = lo.iter().zip(hi.iter()).map(|(a, b)| *a - *b).collect();
        Ok(folded)
    }

    /// Partial encode: padded plaintext-domain vector (length `d`, already
    /// inverse-transformed) -> codeword, skipping the initial inverse
    /// transform.
    pub fn partial_encode(&self, padded: &[Fp]) -> Result<Vec<Fp>, RsError> {
        if padded.len() != self.params.d {
            return Err(RsError::BadLength {
                expected: self.params.d,
                got: padded.len(),
            });
        }
        let mut poly = padded.to_vec();
        poly.resize(self.params.n, Fp::ZERO);
        field::ntt_forward(&mut poly)?;
        Ok(poly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::HashPrg;

    #[test]
    fn encode_decode_round_trip() {
        let params = CodeParams::new(5, 8);
        let rs = ReedSolomon::new(params);
        let message: Vec<Fp> = (0..5).map(|i| Fp::new(i as u64 * 11 + 1)).collect();
        let mut rng = HashPrg::from_label("test-rs");
        let codeword = rs.encode_with(&message, &mut rng).unwrap();
        assert_eq!(codeword.len(), params.n);
        let decoded = rs.decode(&codeword).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn encode_const_is_deterministic() {
        let params = CodeParams::new(4, 4);
        let rs = ReedSolomon::new(params);
        let message: Vec<Fp> = (0..4).map(|i| Fp::new(i as u64)).collect();
        let a = rs.encode_const(&message).unwrap();
        let b = rs.encode_const(&message).unwrap();
        assert_eq!(a, b);
        let decoded = rs.decode(&a).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn bad_length_errors() {
        let params = CodeParams::new(4, 4);
        let rs = ReedSolomon::new(params);
        let mut rng = HashPrg::from_label("test-rs-2");
        let message = vec![Fp::ZERO; 3];
        assert!(matches!(
            rs.encode_with(&message, &mut rng),
            Err(RsError::BadLength { .. })
        ));
    }
}
