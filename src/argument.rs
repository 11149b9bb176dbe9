//! Argument accumulators (component J).
//!
//! Grounded on `original_source/include/zkp/argument.hpp`'s
//! `quasi_argument`/`nonbatch_argument`: `T_code`/`T_lin`/`T_quad`
//! independent repetitions, each a running length-`n` vector accumulator
//! updated by a fresh random scalar per retired, RS-encoded row
//! (`update_code`'s `code_.fma_mod(x, dist(rc_))`, `update_linear`'s
//! elementwise `linear_ += row * rand`, `update_quadratic`'s
//! `quad_.fma_mod(x*y-z, dist(rq_))` over already-encoded `ql`/`qr`/`qo`
//! codewords). Because `n = 2d ≥ 2d - 1`, the Hadamard product of two
//! degree-`<d` codewords' evaluation vectors still lies on the evaluation
//! domain of a degree-`<n` polynomial, so `quad_acc` stays a valid
//! codeword-combination target.

use crate::field::{self, Fp};
use crate::prng::FieldRng;
use crate::rs::{CodeParams, ReedSolomon};

/// One repetition's running length-`n` accumulators.
struct Repetition {
    code_acc: Vec<Fp>,
    linear_acc: Vec<Fp>,
    quad_acc: Vec<Fp>,
}

impl Repetition {
    fn new(n: usize) -> Self {
        Repetition { code_acc: vec![Fp::ZERO; n], linear_acc: vec![Fp::ZERO; n], quad_acc: vec![Fp::ZERO; n] }
    }
}

/// Accumulates `T_code`/`T_lin`/`T_quad` parallel repetitions of the code,
/// linear, and quadratic arguments as witness rows retire from the arena.
pub struct ArgumentAccumulator {
    rs: ReedSolomon,
    code_reps: Vec<Repetition>,
    linear_reps: Vec<Repetition>,
    quad_reps: Vec<Repetition>,
}

impl ArgumentAccumulator {
    /// A fresh accumulator with `t_code` code repetitions and `t_lin`/
    /// `t_quad` linear/quadratic repetitions, each over the given code
    /// parameters.
    pub fn new(params: CodeParams, t_code: usize, t_lin: usize, t_quad: usize) -> Self {
        ArgumentAccumulator {
            rs: ReedSolomon::new(params),
            code_reps: (0..t_code).map(|_| Repetition::new(params.n)).collect(),
            linear_reps: (0..t_lin).map(|_| Repetition::new(params.n)).collect(),
            quad_reps: (0..t_quad).map(|_| Repetition::new(params.n)).collect(),
        }
    }

    /// Fold one just-retired witness row (not yet encoded) into every code
    /// repetition with an independent random scalar drawn from `rng`.
    pub fn update_code<R: FieldRng>(&mut self, row: &[Fp], rng: &mut R) -> Result<(), field::FieldError> {
        let codeword = self.rs.encode_const(row).map_err(|e| match e {
            crate::rs::RsError::Field(fe) => fe,
            crate::rs::RsError::BadLength { .. } => unreachable!("row length matches params by construction"),
        })?;
        for rep in self.code_reps.iter_mut() {
            let scalar = rng.uniform_in_field();
            field::fma_poly(&mut rep.code_acc, &codeword, scalar);
        }
        Ok(())
    }

    /// Fold one already-RS-encoded linear-row codeword into every linear
    /// repetition. `codeword` should be zero everywhere when the row's
    /// underlying relations hold.
    pub fn update_linear<R: FieldRng>(&mut self, codeword: &[Fp], rng: &mut R) {
        for rep in self.linear_reps.iter_mut() {
            let scalar = rng.uniform_in_field();
            field::fma_poly(&mut rep.linear_acc, codeword, scalar);
        }
    }

    /// Fold one quadratic-relation row's already-RS-encoded `ql`/`qr`/`qo`
    /// codewords into every quadratic repetition, via `ql .* qr - qo`.
    pub fn update_quadratic<R: FieldRng>(&mut self, ql: &[Fp], qr: &[Fp], qo: &[Fp], rng: &mut R) {
        let defect = field::hadamard_sub(ql, qr, qo);
        for rep in self.quad_reps.iter_mut() {
            let scalar = rng.uniform_in_field();
            field::fma_poly(&mut rep.quad_acc, &defect, scalar);
        }
    }

    /// The `T_code` running codewords, for the code-argument Merkle commit.
    pub fn code_accumulators(&self) -> Vec<&[Fp]> {
        self.code_reps.iter().map(|r| r.code_acc.as_slice()).collect()
    }

    /// The `T_lin` running codewords; a sound proof has each the all-zero
    /// vector.
    pub fn linear_accumulators(&self) -> Vec<&[Fp]> {
        self.linear_reps.iter().map(|r| r.linear_acc.as_slice()).collect()
    }

    /// The `T_quad` running codewords; a sound proof has each the all-zero
    /// vector.
    pub fn quadratic_accumulators(&self) -> Vec<&[Fp]> {
        self.quad_reps.iter().map(|r| r.quad_acc.as_slice()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::HashPrg;

    fn zero_row(params: CodeParams) -> Vec<Fp> {
        let rs = ReedSolomon::new(params);
        rs.encode_const(&vec![Fp::ZERO; params.l]).unwrap()
    }

    #[test]
    fn satisfied_linear_relations_zero_the_accumulator() {
        let params = CodeParams::new(4, 4);
        let mut acc = ArgumentAccumulator::new(params, 1, 2, 1);
        let mut rng = HashPrg::from_label("argument-test-linear");
        let zero_codeword = zero_row(params);
        for _ in 0..5 {
            acc.update_linear(&zero_codeword, &mut rng);
        }
        for codeword in acc.linear_accumulators() {
            assert!(codeword.iter().all(|v| v.is_zero()));
        }
    }

    #[test]
    fn satisfied_quadratic_relations_zero_the_accumulator() {
        let params = CodeParams::new(4, 4);
        let mut acc = ArgumentAccumulator::new(params, 1, 1, 2);
        let mut rng = HashPrg::from_label("argument-test-quad");
        let rs = ReedSolomon::new(params);
        let ql = rs.encode_const(&[Fp::new(3); 4]).unwrap();
        let qr = rs.encode_const(&[Fp::new(4); 4]).unwrap();
        let qo = rs.encode_const(&[Fp::new(12); 4]).unwrap();
        for _ in 0..5 {
            acc.update_quadratic(&ql, &qr, &qo, &mut rng);
        }
        for codeword in acc.quadratic_accumulators() {
            assert!(codeword.iter().all(|v| v.is_zero()));
        }
    }

    #[test]
    fn unsatisfied_relation_almost_never_zeros() {
        let params = CodeParams::new(4, 4);
        let mut acc = ArgumentAccumulator::new(params, 1, 1, 1);
        let mut rng = HashPrg::from_label("argument-test-bad");
        let rs = ReedSolomon::new(params);
        let nonzero = rs.encode_const(&[Fp::new(1), Fp::ZERO, Fp::ZERO, Fp::ZERO]).unwrap();
        acc.update_linear(&nonzero, &mut rng);
        assert!(acc.linear_accumulators()[0].iter().any(|v| !v.is_zero()));
    }

    #[test]
    fn code_accumulator_has_codeword_length() {
        let params = CodeParams::new(4, 4);
        let mut acc = ArgumentAccumulator::new(params, 2, 0, 0);
        let mut rng = HashPrg::from_label("argument-test-code");
        let row = vec![Fp::new(1), Fp::new(2), Fp::new(3), Fp::new(4)];
        acc.update_code(&row, &mut rng).unwrap();
        for codeword in acc.code_accumulators() {
            assert_eq!(codeword.len(), params.n);
        }
    }
}
