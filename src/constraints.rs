//! Constraint emitter (component F).
//!
//! A thin façade over [`crate::arena::Arena`] that names the relation
//! shapes the rest of the crate emits against, grounded on
//! `original_source/include/zkp/relation.hpp` (`linear_relation`:
//! `a + b - c`, `quadratic_relation`: `a*b - c`) and `constraints.hpp`'s
//! relation-triple concept. The linear row stores one *defect* value per
//! relation instance (zero exactly when the relation holds), matching
//! `argument.hpp`'s `update_linear` treating each retired row as a single
//! to-be-zero codeword; the quadratic rows keep `ql`/`qr`/`qo` as three
//! aligned columns, since their Hadamard-product check needs the factors
//! kept separate until after RS encoding.
//!
//! Every operand is an [`Operand`]: either a public constant or a
//! [`WitnessHandle`] naming a specific, already-committed slot. Operand
//! values are always resolved by reading the arena through the handle, not
//! by trusting a value the caller happened to compute independently — so a
//! constraint can only be built over data that is genuinely the output of
//! some earlier step in the same witness graph. `opcodes.rs` is the only
//! caller, and it always passes the same handle object an earlier
//! instruction produced when that
//! earlier value is the one actually being used; a constant is only used
//! for values that genuinely originate at this relation (a public shift
//! amount, a zero, a sign weight).

use crate::arena::{Arena, ArenaError, WitnessHandle};
use crate::field::Fp;

/// One operand to a relation: a public constant, or a reference to a
/// witness slot some earlier step committed.
#[derive(Clone)]
pub enum Operand {
    /// A value known to both prover and verifier ahead of time.
    Const(Fp),
    /// A previously-committed witness, read back through its handle.
    Ref(WitnessHandle),
}

impl Operand {
    fn value(&self, arena: &Arena) -> Fp {
        match self {
            Operand::Const(v) => *v,
            Operand::Ref(h) => arena.value_of(h),
        }
    }
}

impl From<Fp> for Operand {
    fn from(v: Fp) -> Self {
        Operand::Const(v)
    }
}
impl From<WitnessHandle> for Operand {
    fn from(h: WitnessHandle) -> Self {
        Operand::Ref(h)
    }
}
impl From<&WitnessHandle> for Operand {
    fn from(h: &WitnessHandle) -> Self {
        Operand::Ref(h.clone())
    }
}

/// Emits algebraic relation triples into the witness arena. Each opcode
/// lowering in `opcodes.rs` goes through this type rather than touching
/// `Arena` directly, so the relation shape being emitted is self-documenting
/// at the call site.
pub struct ConstraintEmitter<'a> {
    arena: &'a mut Arena,
}

impl<'a> ConstraintEmitter<'a> {
    /// Borrow an arena to emit constraints into.
    pub fn new(arena: &'a mut Arena) -> Self {
        ConstraintEmitter { arena }
    }

    /// Emit `x + y - z = 0` as its defect value (zero iff the relation
    /// holds over the resolved operands).
    pub fn emit_linear(
        &mut self,
        x: impl Into<Operand>,
        y: impl Into<Operand>,
        z: impl Into<Operand>,
    ) -> Result<WitnessHandle, ArenaError> {
        let xv = x.into().value(self.arena);
        let yv = y.into().value(self.arena);
        let zv = z.into().value(self.arena);
        let defect = xv + yv - zv;
        assert!(defect.is_zero(), "linear relation must hold over the witness");
        self.arena.push_linear(defect)
    }

    /// Emit `x * y - z = 0`. Returns the three freshly-committed handles,
    /// column-aligned across the active quadratic rows (`ql`, `qr`, `qo`).
    pub fn emit_quad(
        &mut self,
        x: impl Into<Operand>,
        y: impl Into<Operand>,
        z: impl Into<Operand>,
    ) -> Result<(WitnessHandle, WitnessHandle, WitnessHandle), ArenaError> {
        let xv = x.into().value(self.arena);
        let yv = y.into().value(self.arena);
        let zv = z.into().value(self.arena);
        assert_eq!(xv * yv, zv, "quadratic relation must hold over the witness");
        self.arena.push_quadratic(xv, yv, zv)
    }

    /// Emit `x - y = 0` as a linear relation, the shape used by equality/
    /// zero-test opcode lowerings.
    pub fn emit_equal(&mut self, x: impl Into<Operand>, y: impl Into<Operand>) -> Result<WitnessHandle, ArenaError> {
        let xv = x.into().value(self.arena);
        let yv = y.into().value(self.arena);
        let defect = xv - yv;
        assert!(defect.is_zero(), "equality must hold over the witness");
        self.arena.push_linear(defect)
    }

    /// Emit a bit-validity check `b * b - b = 0`, used by bit-decomposition
    /// lowerings (`and`/`or`/`xor`/comparisons/shifts) to prove each
    /// decomposed limb is actually 0 or 1.
    pub fn emit_bit_valid(&mut self, bit: impl Into<Operand>) -> Result<(), ArenaError> {
        let b = bit.into();
        self.emit_quad(b.clone(), b.clone(), b)?;
        Ok(())
    }

    /// Emit `(sum of weight*operand over terms) - target = 0`, the general
    /// shape behind bit recombination (weighted sums of up to 32 terms) —
    /// still a single defect witness per relation instance, just one whose
    /// defect happens to be a longer sum than `emit_linear`'s two terms.
    pub fn emit_linear_combination(
        &mut self,
        terms: &[(Fp, Operand)],
        target: impl Into<Operand>,
    ) -> Result<WitnessHandle, ArenaError> {
        let mut acc = Fp::ZERO;
        for (w, op) in terms {
            acc = acc + *w * op.value(self.arena);
        }
        let tv = target.into().value(self.arena);
        let defect = acc - tv;
        assert!(defect.is_zero(), "linear combination must hold over the witness");
        self.arena.push_linear(defect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    #[test]
    fn emit_linear_pushes_the_defect() {
        let mut arena = Arena::new(8, 1);
        let mut emitter = ConstraintEmitter::new(&mut arena);
        emitter.emit_linear(Fp::new(2), Fp::new(3), Fp::new(5)).unwrap();
        assert_eq!(arena.linear_row(0)[0], Fp::ZERO);
    }

    #[test]
    fn emit_quad_pushes_aligned_triple() {
        let mut arena = Arena::new(8, 1);
        let mut emitter = ConstraintEmitter::new(&mut arena);
        emitter.emit_quad(Fp::new(3), Fp::new(4), Fp::new(12)).unwrap();
        let (ql, qr, qo) = arena.quadratic_row(0);
        assert_eq!((ql[0], qr[0], qo[0]), (Fp::new(3), Fp::new(4), Fp::new(12)));
    }

    #[test]
    fn emit_bit_valid_accepts_zero_and_one() {
        let mut arena = Arena::new(8, 1);
        let mut emitter = ConstraintEmitter::new(&mut arena);
        emitter.emit_bit_valid(Fp::ZERO).unwrap();
        emitter.emit_bit_valid(Fp::ONE).unwrap();
    }

    #[test]
    #[should_panic(expected = "quadratic relation")]
    fn emit_bit_valid_rejects_non_bit() {
        let mut arena = Arena::new(8, 1);
        let mut emitter = ConstraintEmitter::new(&mut arena);
        emitter.emit_bit_valid(Fp::new(2)).unwrap();
    }

    #[test]
    fn operand_ref_resolves_through_the_arena_not_a_caller_supplied_copy() {
        let mut arena = Arena::new(8, 1);
        let h = arena.push_linear(Fp::new(41)).unwrap();
        let mut emitter = ConstraintEmitter::new(&mut arena);
        // the relation must read 41 back through the handle, not trust a
        // mismatched literal passed alongside it.
        emitter.emit_equal(h, Fp::new(41)).unwrap();
    }

    #[test]
    fn emit_linear_combination_checks_a_weighted_sum() {
        let mut arena = Arena::new(8, 1);
        let a = arena.push_linear(Fp::new(3)).unwrap();
        let b = arena.push_linear(Fp::new(5)).unwrap();
        let mut emitter = ConstraintEmitter::new(&mut arena);
        // 2*3 + 1*5 = 11
        emitter
            .emit_linear_combination(&[(Fp::new(2), Operand::Ref(a)), (Fp::ONE, Operand::Ref(b))], Fp::new(11))
            .unwrap();
    }
}
