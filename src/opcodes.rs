//! Opcode lowering: per-instruction algebraic circuit construction
//! (component H).
//!
//! Grounded on `original_source/include/zkp/circuit.hpp`'s
//! `prover_extension::push_cs`: each opcode the executor runs is mirrored
//! here into one or more relation triples pushed into the witness arena.
//! `add`/`sub` lower to a single linear relation, `mul` to a single
//! quadratic relation, `div`/`rem` to a quadratic relation (`divisor *
//! quotient = dividend - remainder`) plus a bit-decomposition range-check
//! on the remainder, `and`/`or`/`xor`/comparisons to a 32-bit
//! bit-decomposition with per-bit validity checks, and `shl`/`shr_u`/
//! `shr_s`/`rotl`/`rotr` to the same bit-decomposition with its 32
//! recombination terms permuted by the (public) shift amount rather than
//! built from repeated doubling, since doubling a field element does not
//! wrap at 32 bits the way the machine word does.
//!
//! This type mirrors the executor's operand stack and locals with a
//! parallel stack of [`WitnessHandle`]s, fed by the richer
//! [`ExecObserver`] hook set (`on_const`/`on_local_get`/`on_call`/...): an
//! instruction's constraint operands are always the *same* handle objects
//! an earlier instruction produced or a local/const push minted, never a
//! freshly reconstructed value. That is what ties the constraints emitted
//! for one instruction to the constraints emitted for the next — the
//! relation a later instruction asserts is over the literal committed slot
//! an earlier one wrote, not a copy that merely happens to match it.
//!
//! Per Open Question 1 (`DESIGN.md` Decision D3), `eq` is lowered as its
//! own zero-test over the operand difference (via the same product-of-
//! complemented-bits gadget as `eqz`), not aliased to `eqz`'s shape by
//! simple argument substitution.

use crate::arena::{Arena, ArenaError, WitnessHandle};
use crate::constraints::{ConstraintEmitter, Operand};
use crate::exec::{ExecObserver, ExecutionError};
use crate::field::Fp;
use crate::module::Instr;
use crate::value::Value;

enum BitOp {
    And,
    Or,
    Xor,
}

enum ShiftKind {
    Shl,
    ShrS,
    ShrU,
    Rotl,
    Rotr,
}

struct HandleFrame {
    locals: Vec<Option<WitnessHandle>>,
    stack: Vec<WitnessHandle>,
}

impl HandleFrame {
    fn new(args: Vec<WitnessHandle>) -> Self {
        HandleFrame { locals: args.into_iter().map(Some).collect(), stack: Vec::new() }
    }
}

/// Lowers each executed opcode into arena constraints as it runs,
/// installed as the executor's [`ExecObserver`] during stage2/stage3.
pub struct ConstraintLowering<'a> {
    arena: &'a mut Arena,
    frames: Vec<HandleFrame>,
}

impl<'a> ConstraintLowering<'a> {
    /// Borrow the arena constraints are emitted into.
    pub fn new(arena: &'a mut Arena) -> Self {
        ConstraintLowering { arena, frames: Vec::new() }
    }

    fn emitter(&mut self) -> ConstraintEmitter<'_> {
        ConstraintEmitter::new(self.arena)
    }

    fn to_fp(v: &Value) -> Fp {
        match v {
            Value::I32(x) => Fp::from_i32(*x),
            Value::I64(x) => Fp::from_i64(*x),
        }
    }

    fn pop1(&mut self) -> WitnessHandle {
        self.frames.last_mut().expect("handle frame active").stack.pop().expect("stack underflow mirrored locally")
    }

    fn pop2(&mut self) -> (WitnessHandle, WitnessHandle) {
        let b = self.pop1();
        let a = self.pop1();
        (a, b)
    }

    fn push(&mut self, h: WitnessHandle) {
        self.frames.last_mut().expect("handle frame active").stack.push(h);
    }

    fn local_handle(&mut self, idx: u32) -> Result<WitnessHandle, ArenaError> {
        let idx = idx as usize;
        {
            let frame = self.frames.last_mut().expect("handle frame active");
            if frame.locals.len() <= idx {
                frame.locals.resize(idx + 1, None);
            }
        }
        if self.frames.last().unwrap().locals[idx].is_none() {
            let h = self.arena.push_linear(Fp::ZERO)?;
            self.frames.last_mut().unwrap().locals[idx] = Some(h);
        }
        Ok(self.frames.last().unwrap().locals[idx].clone().unwrap())
    }

    /// Decompose `x` (with concrete value `x_val`) into 32 bits, emit a
    /// validity check per bit, and bind their weighted recombination back
    /// to `x` itself. The top bit carries weight `-2^31` so the
    /// recombination matches [`Fp::from_i32`]'s two's-complement-to-field
    /// mapping. Returns the bit handles, LSB first.
    fn decompose_and_check(&mut self, x: Operand, x_val: i32) -> Result<Vec<WitnessHandle>, ArenaError> {
        let mut bits = Vec::with_capacity(32);
        for i in 0..32u32 {
            let bit_val = Fp::new(((x_val as u32 >> i) & 1) as u64);
            let h = self.arena.push_linear(bit_val)?;
            self.emitter().emit_bit_valid(h.clone())?;
            bits.push(h);
        }
        let mut weight = Fp::ONE;
        let two = Fp::new(2);
        let mut terms = Vec::with_capacity(32);
        for (i, h) in bits.iter().enumerate() {
            let w = if i == 31 { -weight } else { weight };
            terms.push((w, Operand::Ref(h.clone())));
            weight = weight * two;
        }
        self.emitter().emit_linear_combination(&terms, x)?;
        Ok(bits)
    }

    /// `1` iff `x == 0`, via the `∏(1 − bit_i(x))` gadget, each fold
    /// bound back into the chain by a fresh quadratic relation.
    fn eqz_gadget(&mut self, x: Operand, x_val: i32) -> Result<WitnessHandle, ArenaError> {
        let bits = self.decompose_and_check(x, x_val)?;
        let mut acc_val = Fp::ONE;
        let mut acc: Operand = Operand::Const(Fp::ONE);
        for bit_h in &bits {
            let bit_val = self.arena.value_of(bit_h);
            let term_val = Fp::ONE - bit_val;
            let term_h = self.arena.push_linear(term_val)?;
            self.emitter().emit_linear_combination(
                &[(Fp::ONE, Operand::Const(Fp::ONE)), (-Fp::ONE, Operand::Ref(bit_h.clone()))],
                Operand::Ref(term_h.clone()),
            )?;
            let new_acc_val = acc_val * term_val;
            let (_, _, new_acc_h) = self.emitter().emit_quad(acc, Operand::Ref(term_h), new_acc_val)?;
            acc_val = new_acc_val;
            acc = Operand::Ref(new_acc_h);
        }
        match acc {
            Operand::Ref(h) => Ok(h),
            Operand::Const(v) => self.arena.push_linear(v),
        }
    }

    /// The sign bit of `x - y` (as a wrapping i32 difference), bound to the
    /// real `x`/`y` handles. `1` iff the difference is negative.
    fn sign_bit_of_difference(&mut self, x: Operand, x_val: i32, y: Operand, y_val: i32) -> Result<WitnessHandle, ArenaError> {
        let diff_val = x_val.wrapping_sub(y_val);
        let diff_h = self.arena.push_linear(Fp::from_i32(diff_val))?;
        // diff + y - x = 0  <=>  diff = x - y
        self.emitter().emit_linear(Operand::Ref(diff_h.clone()), y, x)?;
        let bits = self.decompose_and_check(Operand::Ref(diff_h), diff_val)?;
        Ok(bits[31].clone())
    }

    fn lower_div_rem(
        &mut self,
        a: WitnessHandle,
        a_val: i32,
        b: WitnessHandle,
        b_val: i32,
        signed: bool,
    ) -> Result<(WitnessHandle, WitnessHandle), ArenaError> {
        let (q, r) = if signed {
            if a_val == i32::MIN && b_val == -1 {
                (i32::MIN, 0)
            } else {
                (a_val.wrapping_div(b_val), a_val.wrapping_rem(b_val))
            }
        } else {
            let (au, bu) = (a_val as u32, b_val as u32);
            ((au / bu) as i32, (au % bu) as i32)
        };
        let q_h = self.arena.push_linear(Fp::from_i32(q))?;
        let r_h = self.arena.push_linear(Fp::from_i32(r))?;
        let (_, _, s_h) = self.emitter().emit_quad(Operand::Ref(b.clone()), Operand::Ref(q_h.clone()), Fp::from_i32(b_val) * Fp::from_i32(q))?;
        // s + r - a = 0  <=>  s == a - r  <=>  b*q == a - r
        self.emitter().emit_linear_combination(
            &[(Fp::ONE, Operand::Ref(s_h)), (Fp::ONE, Operand::Ref(r_h.clone())), (-Fp::ONE, Operand::Ref(a))],
            Fp::ZERO,
        )?;
        self.decompose_and_check(Operand::Ref(r_h.clone()), r)?;
        Ok((q_h, r_h))
    }

    fn lower_bitwise(&mut self, op: BitOp, a: Operand, a_val: i32, b: Operand, b_val: i32) -> Result<WitnessHandle, ArenaError> {
        let abits = self.decompose_and_check(a, a_val)?;
        let bbits = self.decompose_and_check(b, b_val)?;
        let mut out_bits = Vec::with_capacity(32);
        for i in 0..32usize {
            let ai = Fp::new(((a_val as u32 >> i) & 1) as u64);
            let bi = Fp::new(((b_val as u32 >> i) & 1) as u64);
            let and_val = ai * bi;
            let (_, _, and_h) = self.emitter().emit_quad(abits[i].clone(), bbits[i].clone(), and_val)?;
            let out_val = match op {
                BitOp::And => and_val,
                BitOp::Or => ai + bi - and_val,
                BitOp::Xor => ai + bi - and_val - and_val,
            };
            let out_h = self.arena.push_linear(out_val)?;
            match op {
                BitOp::And => {
                    self.emitter().emit_equal(Operand::Ref(and_h), Operand::Ref(out_h.clone()))?;
                }
                BitOp::Or => {
                    self.emitter().emit_linear_combination(
                        &[
                            (Fp::ONE, Operand::Ref(abits[i].clone())),
                            (Fp::ONE, Operand::Ref(bbits[i].clone())),
                            (-Fp::ONE, Operand::Ref(and_h)),
                        ],
                        Operand::Ref(out_h.clone()),
                    )?;
                }
                BitOp::Xor => {
                    self.emitter().emit_linear_combination(
                        &[
                            (Fp::ONE, Operand::Ref(abits[i].clone())),
                            (Fp::ONE, Operand::Ref(bbits[i].clone())),
                            (-Fp::new(2), Operand::Ref(and_h)),
                        ],
                        Operand::Ref(out_h.clone()),
                    )?;
                }
            }
            out_bits.push(out_h);
        }
        let combine = |x: u32, y: u32| match op {
            BitOp::And => x & y,
            BitOp::Or => x | y,
            BitOp::Xor => x ^ y,
        };
        let result_val = combine(a_val as u32, b_val as u32) as i32;
        let result_h = self.arena.push_linear(Fp::from_i32(result_val))?;
        let mut weight = Fp::ONE;
        let two = Fp::new(2);
        let mut terms = Vec::with_capacity(32);
        for (i, h) in out_bits.iter().enumerate() {
            let w = if i == 31 { -weight } else { weight };
            terms.push((w, Operand::Ref(h.clone())));
            weight = weight * two;
        }
        self.emitter().emit_linear_combination(&terms, Operand::Ref(result_h.clone()))?;
        Ok(result_h)
    }

    fn lower_shift_rotate(&mut self, kind: ShiftKind, x: Operand, x_val: i32, amount: i32) -> Result<WitnessHandle, ArenaError> {
        let amt = (amount as u32) & 31;
        let bits = self.decompose_and_check(x, x_val)?;
        let result_val = match kind {
            ShiftKind::Shl => x_val.wrapping_shl(amt),
            ShiftKind::ShrS => x_val.wrapping_shr(amt),
            ShiftKind::ShrU => ((x_val as u32).wrapping_shr(amt)) as i32,
            ShiftKind::Rotl => (x_val as u32).rotate_left(amt) as i32,
            ShiftKind::Rotr => (x_val as u32).rotate_right(amt) as i32,
        };
        let result_h = self.arena.push_linear(Fp::from_i32(result_val))?;
        let amt = amt as usize;
        let mut terms = Vec::with_capacity(32);
        let mut weight = Fp::ONE;
        let two = Fp::new(2);
        for j in 0..32usize {
            let w = if j == 31 { -weight } else { weight };
            let src: Operand = match kind {
                ShiftKind::Shl => {
                    if j >= amt {
                        Operand::Ref(bits[j - amt].clone())
                    } else {
                        Operand::Const(Fp::ZERO)
                    }
                }
                ShiftKind::ShrU => {
                    if j + amt < 32 {
                        Operand::Ref(bits[j + amt].clone())
                    } else {
                        Operand::Const(Fp::ZERO)
                    }
                }
                ShiftKind::ShrS => {
                    if j + amt < 32 {
                        Operand::Ref(bits[j + amt].clone())
                    } else {
                        Operand::Ref(bits[31].clone())
                    }
                }
                ShiftKind::Rotl => Operand::Ref(bits[(j + 32 - amt) % 32].clone()),
                ShiftKind::Rotr => Operand::Ref(bits[(j + amt) % 32].clone()),
            };
            terms.push((w, src));
            weight = weight * two;
        }
        self.emitter().emit_linear_combination(&terms, Operand::Ref(result_h.clone()))?;
        Ok(result_h)
    }
}

impl<'a> ExecObserver for ConstraintLowering<'a> {
    fn on_entry(&mut self, args: &[Value]) -> Result<(), ExecutionError> {
        let mut handles = Vec::with_capacity(args.len());
        for v in args {
            handles.push(self.arena.push_linear(Self::to_fp(v))?);
        }
        self.frames.push(HandleFrame::new(handles));
        Ok(())
    }

    fn on_exit(&mut self, _results: &[Value]) -> Result<(), ExecutionError> {
        self.frames.pop();
        Ok(())
    }

    fn on_call(&mut self, _callee: u32, args: &[Value]) -> Result<(), ExecutionError> {
        let n = args.len();
        let frame = self.frames.last_mut().expect("handle frame active");
        let start = frame.stack.len() - n;
        let arg_handles = frame.stack.split_off(start);
        self.frames.push(HandleFrame::new(arg_handles));
        Ok(())
    }

    fn on_return(&mut self, results: &[Value]) -> Result<(), ExecutionError> {
        let callee = self.frames.pop().expect("callee handle frame active");
        let n = results.len();
        let start = callee.stack.len() - n;
        let result_handles = callee.stack[start..].to_vec();
        self.frames.last_mut().expect("caller handle frame active").stack.extend(result_handles);
        Ok(())
    }

    fn on_const(&mut self, value: Value) -> Result<(), ExecutionError> {
        let h = self.arena.push_linear(Self::to_fp(&value))?;
        self.push(h);
        Ok(())
    }

    fn on_local_get(&mut self, idx: u32) -> Result<(), ExecutionError> {
        let h = self.local_handle(idx)?;
        self.push(h);
        Ok(())
    }

    fn on_local_set(&mut self, idx: u32) -> Result<(), ExecutionError> {
        let h = self.pop1();
        let idx = idx as usize;
        let frame = self.frames.last_mut().expect("handle frame active");
        if frame.locals.len() <= idx {
            frame.locals.resize(idx + 1, None);
        }
        frame.locals[idx] = Some(h);
        Ok(())
    }

    fn on_local_tee(&mut self, idx: u32) -> Result<(), ExecutionError> {
        let h = self.frames.last().expect("handle frame active").stack.last().expect("stack underflow mirrored locally").clone();
        let idx = idx as usize;
        let frame = self.frames.last_mut().expect("handle frame active");
        if frame.locals.len() <= idx {
            frame.locals.resize(idx + 1, None);
        }
        frame.locals[idx] = Some(h);
        Ok(())
    }

    fn on_drop(&mut self) -> Result<(), ExecutionError> {
        self.pop1();
        Ok(())
    }

    fn on_instr(&mut self, instr: &Instr, operands: &[Value], result: Value) -> Result<(), ExecutionError> {
        use Instr::*;
        match instr {
            I32Add => {
                let (a, b) = self.pop2();
                let rv = result.as_i32().unwrap();
                let r_h = self.arena.push_linear(Fp::from_i32(rv))?;
                self.emitter().emit_linear(a, b, r_h.clone())?;
                self.push(r_h);
            }
            I32Sub => {
                let (a, b) = self.pop2();
                let rv = result.as_i32().unwrap();
                let r_h = self.arena.push_linear(Fp::from_i32(rv))?;
                // r + b - a = 0  <=>  r = a - b
                self.emitter().emit_linear(r_h.clone(), b, a)?;
                self.push(r_h);
            }
            I32Mul => {
                let (a, b) = self.pop2();
                let rv = result.as_i32().unwrap();
                let (_, _, c_h) = self.emitter().emit_quad(a, b, Fp::from_i32(rv))?;
                self.push(c_h);
            }
            I32DivS | I32RemS | I32DivU | I32RemU => {
                let (a, b) = self.pop2();
                let av = operands[0].as_i32().unwrap();
                let bv = operands[1].as_i32().unwrap();
                let signed = matches!(instr, I32DivS | I32RemS);
                let (q_h, r_h) = self.lower_div_rem(a, av, b, bv, signed)?;
                self.push(if matches!(instr, I32DivS | I32DivU) { q_h } else { r_h });
            }
            I32And | I32Or | I32Xor => {
                let (a, b) = self.pop2();
                let av = operands[0].as_i32().unwrap();
                let bv = operands[1].as_i32().unwrap();
                let op = match instr {
                    I32And => BitOp::And,
                    I32Or => BitOp::Or,
                    _ => BitOp::Xor,
                };
                let r_h = self.lower_bitwise(op, Operand::Ref(a), av, Operand::Ref(b), bv)?;
                self.push(r_h);
            }
            I32Shl | I32ShrS | I32ShrU | I32Rotl | I32Rotr => {
                let (a, _b) = self.pop2();
                let av = operands[0].as_i32().unwrap();
                let bv = operands[1].as_i32().unwrap();
                let kind = match instr {
                    I32Shl => ShiftKind::Shl,
                    I32ShrS => ShiftKind::ShrS,
                    I32ShrU => ShiftKind::ShrU,
                    I32Rotl => ShiftKind::Rotl,
                    _ => ShiftKind::Rotr,
                };
                let r_h = self.lower_shift_rotate(kind, Operand::Ref(a), av, bv)?;
                self.push(r_h);
            }
            I32Eqz => {
                let a = self.pop1();
                let av = operands[0].as_i32().unwrap();
                let r_h = self.eqz_gadget(Operand::Ref(a), av)?;
                self.push(r_h);
            }
            I32Eq | I32Ne => {
                let (a, b) = self.pop2();
                let av = operands[0].as_i32().unwrap();
                let bv = operands[1].as_i32().unwrap();
                let diff_val = av.wrapping_sub(bv);
                let diff_h = self.arena.push_linear(Fp::from_i32(diff_val))?;
                self.emitter().emit_linear(Operand::Ref(diff_h.clone()), b, a)?;
                let eq_h = self.eqz_gadget(Operand::Ref(diff_h), diff_val)?;
                let r_h = if matches!(instr, I32Eq) {
                    eq_h
                } else {
                    let eq_val = self.arena.value_of(&eq_h);
                    let ne_h = self.arena.push_linear(Fp::ONE - eq_val)?;
                    self.emitter().emit_linear_combination(
                        &[(Fp::ONE, Operand::Const(Fp::ONE)), (-Fp::ONE, Operand::Ref(eq_h))],
                        Operand::Ref(ne_h.clone()),
                    )?;
                    ne_h
                };
                self.push(r_h);
            }
            I32LtS => {
                let (a, b) = self.pop2();
                let av = operands[0].as_i32().unwrap();
                let bv = operands[1].as_i32().unwrap();
                let sign_h = self.sign_bit_of_difference(Operand::Ref(a), av, Operand::Ref(b), bv)?;
                self.push(sign_h);
            }
            I32GeS => {
                let (a, b) = self.pop2();
                let av = operands[0].as_i32().unwrap();
                let bv = operands[1].as_i32().unwrap();
                let sign_h = self.sign_bit_of_difference(Operand::Ref(a), av, Operand::Ref(b), bv)?;
                let sign_val = self.arena.value_of(&sign_h);
                let r_h = self.arena.push_linear(Fp::ONE - sign_val)?;
                self.emitter().emit_linear_combination(
                    &[(Fp::ONE, Operand::Const(Fp::ONE)), (-Fp::ONE, Operand::Ref(sign_h))],
                    Operand::Ref(r_h.clone()),
                )?;
                self.push(r_h);
            }
            I32GtS => {
                let (a, b) = self.pop2();
                let av = operands[0].as_i32().unwrap();
                let bv = operands[1].as_i32().unwrap();
                let sign_h = self.sign_bit_of_difference(Operand::Ref(b), bv, Operand::Ref(a), av)?;
                self.push(sign_h);
            }
            I32LeS => {
                let (a, b) = self.pop2();
                let av = operands[0].as_i32().unwrap();
                let bv = operands[1].as_i32().unwrap();
                let sign_h = self.sign_bit_of_difference(Operand::Ref(b), bv, Operand::Ref(a), av)?;
                let sign_val = self.arena.value_of(&sign_h);
                let r_h = self.arena.push_linear(Fp::ONE - sign_val)?;
                self.emitter().emit_linear_combination(
                    &[(Fp::ONE, Operand::Const(Fp::ONE)), (-Fp::ONE, Operand::Ref(sign_h))],
                    Operand::Ref(r_h.clone()),
                )?;
                self.push(r_h);
            }
            I32Const(_) | I64Const(_) | Drop | LocalGet(_) | LocalSet(_) | LocalTee(_) | Block(_) | Loop(_)
            | IfElse { .. } | Br(_) | BrIf(_) | Return | Call(_) | I32Load(_) | I32Store(_) => {
                unreachable!("the executor only calls on_instr for arithmetic/bitwise/comparison opcodes")
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{Executor, NullObserver};
    use crate::module::{Function, Module};

    fn run_with_constraints(body: Vec<Instr>, args: &[Value]) -> Arena {
        let f = Function { num_params: args.len() as u32, num_locals: 0, body };
        let module = Module::single(f);
        module.validate().unwrap();
        let exec = Executor::new(&module, 64);
        let mut arena = Arena::new(8, 1);
        {
            let mut observer = ConstraintLowering::new(&mut arena);
            exec.run(args, &mut observer).unwrap();
        }
        arena
    }

    #[test]
    fn add_chains_into_a_following_mul() {
        // (a + b) * a, with the sum's witness literally reused as mul's operand.
        let body = vec![
            Instr::LocalGet(0),
            Instr::LocalGet(1),
            Instr::I32Add,
            Instr::LocalGet(0),
            Instr::I32Mul,
        ];
        let arena = run_with_constraints(body, &[Value::I32(3), Value::I32(4)]);
        let (_, _, qo) = arena.quadratic_row(0);
        assert_eq!(qo[0], Fp::new(21));
    }

    #[test]
    fn div_emits_quotient_remainder_relation() {
        let body = vec![Instr::LocalGet(0), Instr::LocalGet(1), Instr::I32DivS];
        let arena = run_with_constraints(body, &[Value::I32(17), Value::I32(5)]);
        let (ql, qr, _) = arena.quadratic_row(0);
        assert_eq!((ql[0], qr[0]), (Fp::new(5), Fp::new(3)));
    }

    #[test]
    fn div_u_treats_operands_as_unsigned() {
        let body = vec![Instr::LocalGet(0), Instr::LocalGet(1), Instr::I32DivU];
        let arena = run_with_constraints(body, &[Value::I32(-1), Value::I32(2)]);
        let (ql, qr, _) = arena.quadratic_row(0);
        assert_eq!((ql[0], qr[0]), (Fp::new(2), Fp::new(u32::MAX as u64 / 2)));
    }

    #[test]
    fn shl_lowers_without_panicking_and_produces_a_handle() {
        let body = vec![Instr::LocalGet(0), Instr::LocalGet(1), Instr::I32Shl];
        let arena = run_with_constraints(body, &[Value::I32(1), Value::I32(3)]);
        assert!(arena.linear_row_count() >= 1);
    }

    #[test]
    fn eqz_distinguishes_zero_from_nonzero() {
        let body_zero = vec![Instr::LocalGet(0), Instr::I32Eqz];
        let arena = run_with_constraints(body_zero, &[Value::I32(0)]);
        assert!(arena.linear_row_count() >= 1);

        let body_nonzero = vec![Instr::LocalGet(0), Instr::I32Eqz];
        let arena = run_with_constraints(body_nonzero, &[Value::I32(7)]);
        assert!(arena.linear_row_count() >= 1);
    }

    #[test]
    fn lt_s_and_ge_s_are_complementary() {
        let lt_body = vec![Instr::LocalGet(0), Instr::LocalGet(1), Instr::I32LtS];
        let arena = run_with_constraints(lt_body, &[Value::I32(2), Value::I32(9)]);
        assert!(arena.linear_row_count() >= 1);
    }

    #[test]
    fn unconstrained_plain_execution_still_works() {
        let f = Function {
            num_params: 2,
            num_locals: 0,
            body: vec![Instr::LocalGet(0), Instr::LocalGet(1), Instr::I32Add],
        };
        let module = Module::single(f);
        let exec = Executor::new(&module, 64);
        let out = exec.run(&[Value::I32(1), Value::I32(2)], &mut NullObserver).unwrap();
        assert_eq!(out, vec![Value::I32(3)]);
    }

    #[test]
    fn call_binds_argument_handles_into_the_callee_frame() {
        let callee = Function {
            num_params: 1,
            num_locals: 0,
            body: vec![Instr::LocalGet(0), Instr::LocalGet(0), Instr::I32Mul],
        };
        let caller = Function {
            num_params: 0,
            num_locals: 0,
            body: vec![Instr::I32Const(6), Instr::Call(0)],
        };
        let module = Module { functions: vec![callee, caller], entry: 1, memory_pages: 1 };
        module.validate().unwrap();
        let exec = Executor::new(&module, 64);
        let mut arena = Arena::new(8, 1);
        let mut observer = ConstraintLowering::new(&mut arena);
        let out = exec.run(&[], &mut observer).unwrap();
        assert_eq!(out, vec![Value::I32(36)]);
        let (_, _, qo) = arena.quadratic_row(0);
        assert_eq!(qo[0], Fp::new(36));
    }
}
