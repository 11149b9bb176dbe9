//! Stack-machine executor (component G).
//!
//! Grounded on `original_source/include/execution.hpp`'s
//! `execution_context`/`basic_exe_control`: an operand stack, a locals
//! frame, and structured control flow over `block`/`loop`/`if`/`br`/
//! `br_if`/`return`/`call`. Dispatch is a plain `match` over
//! [`crate::module::Instr`] (no virtual `Executor`/`dynamic_cast`), and
//! unwinding is the [`StepResult`] sum type rather than C++ exceptions or a
//! `std::variant<std::monostate,int>` signal.
//!
//! Every opcode executed is reported to an [`ExecObserver`], which the
//! prover installs three times with different bodies (stage1: just collect
//! the witness trace; stage2/3: also emit the matching algebraic
//! constraint via `opcodes.rs`) and the verifier installs once (replay
//! only). This lets one executor core serve all four IOP passes.
//!
//! The observer sees more than just `on_instr`: every const push, local
//! access, drop, and call boundary is reported too, because
//! `opcodes.rs`'s constraint lowering needs to track *which witness slot*
//! backs each stack/local position in lockstep with the real values, so
//! that a later instruction's operands are genuine references to an
//! earlier instruction's result rather than independently-reconstructed
//! constants.

use crate::memory::{Memory, MemoryError};
use crate::module::{Function, Instr, Module};
use crate::value::Value;
use std::cell::RefCell;
use thiserror::Error;

/// A runtime trap: the unconstrained execution itself is malformed or hit
/// an undefined operation (division by zero, stack underflow, etc.), or a
/// constraint-lowering observer refused to continue (arena exhaustion).
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Division (or remainder) by zero.
    #[error("execution trap: division by zero at pc {pc}")]
    DivisionByZero { pc: usize },
    /// Signed division overflow (`i32::MIN / -1`).
    #[error("execution trap: signed division overflow at pc {pc}")]
    DivisionOverflow { pc: usize },
    /// Popped from an empty operand stack.
    #[error("execution trap: stack underflow at pc {pc}")]
    StackUnderflow { pc: usize },
    /// Accessed a local slot past the frame's width.
    #[error("execution trap: undefined local {local} (frame has {width})")]
    UndefinedLocal { local: u32, width: u32 },
    /// `br`/`br_if` targeted a depth with no enclosing block.
    #[error("execution trap: branch depth {0} has no enclosing block")]
    BadBranchDepth(u32),
    /// Recursive `call` nesting exceeded the configured bound.
    #[error("execution trap: call depth exceeded (max {0})")]
    CallDepthExceeded(u32),
    /// A value of the wrong tag reached an operator expecting another.
    #[error("execution trap: value type mismatch at pc {pc}")]
    TypeMismatch { pc: usize },
    /// A load/store address fell outside the module's linear memory.
    #[error("execution trap: {0}")]
    MemoryBounds(#[from] MemoryError),
    /// The constraint-lowering observer could not place a witness.
    #[error("execution trap: {0}")]
    ArenaExhausted(#[from] crate::arena::ArenaError),
}

impl PartialEq for ExecutionError {
    fn eq(&self, other: &Self) -> bool {
        // Arena exhaustion carries a free-text reason and isn't compared in
        // tests; every other variant is a plain data comparison.
        match (self, other) {
            (Self::DivisionByZero { pc: a }, Self::DivisionByZero { pc: b }) => a == b,
            (Self::DivisionOverflow { pc: a }, Self::DivisionOverflow { pc: b }) => a == b,
            (Self::StackUnderflow { pc: a }, Self::StackUnderflow { pc: b }) => a == b,
            (Self::UndefinedLocal { local: al, width: aw }, Self::UndefinedLocal { local: bl, width: bw }) => al == bl && aw == bw,
            (Self::BadBranchDepth(a), Self::BadBranchDepth(b)) => a == b,
            (Self::CallDepthExceeded(a), Self::CallDepthExceeded(b)) => a == b,
            (Self::TypeMismatch { pc: a }, Self::TypeMismatch { pc: b }) => a == b,
            (Self::MemoryBounds(a), Self::MemoryBounds(b)) => a == b,
            (Self::ArenaExhausted(a), Self::ArenaExhausted(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for ExecutionError {}

/// The outcome of running one instruction or one instruction list,
/// distinguishing "keep going" from the two ways a structured construct
/// can be exited early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Fall through to the next instruction.
    Continue,
    /// Unwind `depth` enclosing `block`/`loop` constructs (`br`/`br_if`).
    Break(u32),
    /// Unwind the whole function.
    Return,
}

/// Observes the executor's stack/locals traffic in lockstep with real
/// execution. A no-op by default; `opcodes.rs` provides the
/// constraint-emitting implementation used during stage2/stage3. Every
/// method may fail (constraint lowering can exhaust the witness arena), so
/// the executor propagates observer errors exactly like its own traps.
pub trait ExecObserver {
    /// Entering the top-level call, with its argument values.
    fn on_entry(&mut self, _args: &[Value]) -> Result<(), ExecutionError> {
        Ok(())
    }
    /// The top-level call has returned with these results.
    fn on_exit(&mut self, _results: &[Value]) -> Result<(), ExecutionError> {
        Ok(())
    }
    /// A nested `call` instruction is about to invoke `callee` with `args`
    /// popped off the caller's stack.
    fn on_call(&mut self, _callee: u32, _args: &[Value]) -> Result<(), ExecutionError> {
        Ok(())
    }
    /// A nested call has returned `results` onto the caller's stack.
    fn on_return(&mut self, _results: &[Value]) -> Result<(), ExecutionError> {
        Ok(())
    }
    /// A constant was pushed (`I32Const`/`I64Const`).
    fn on_const(&mut self, _value: Value) -> Result<(), ExecutionError> {
        Ok(())
    }
    /// Local `idx` was read onto the stack.
    fn on_local_get(&mut self, _idx: u32) -> Result<(), ExecutionError> {
        Ok(())
    }
    /// The stack top was popped into local `idx`.
    fn on_local_set(&mut self, _idx: u32) -> Result<(), ExecutionError> {
        Ok(())
    }
    /// As `on_local_set`, but the value also remains on the stack.
    fn on_local_tee(&mut self, _idx: u32) -> Result<(), ExecutionError> {
        Ok(())
    }
    /// The stack top was discarded.
    fn on_drop(&mut self) -> Result<(), ExecutionError> {
        Ok(())
    }
    /// Called after an arithmetic/comparison/bitwise opcode has computed
    /// its result, before it is pushed back onto the stack.
    fn on_instr(&mut self, _instr: &Instr, _operands: &[Value], _result: Value) -> Result<(), ExecutionError> {
        Ok(())
    }
}

/// An observer that does nothing, for unconstrained (plain) execution.
pub struct NullObserver;
impl ExecObserver for NullObserver {}

struct Frame {
    locals: Vec<Value>,
    stack: Vec<Value>,
}

/// Runs a [`Module`] to completion against a fixed observer.
pub struct Executor<'m> {
    module: &'m Module,
    max_call_depth: u32,
    memory: RefCell<Memory>,
}

impl<'m> Executor<'m> {
    /// A new executor over `module`, with the given recursion bound. Linear
    /// memory starts at `module.memory_pages` pages, all zeroed.
    pub fn new(module: &'m Module, max_call_depth: u32) -> Self {
        Executor {
            module,
            max_call_depth,
            memory: RefCell::new(Memory::new(module.memory_pages)),
        }
    }

    /// Write `data` into linear memory at `offset`, for materializing the
    /// statement's input bytes before `run`.
    pub fn write_memory(&self, offset: u32, data: &[u8]) -> Result<(), MemoryError> {
        self.memory.borrow_mut().write_bytes(offset, data)
    }

    /// Run the entry function with `args` as its initial locals, returning
    /// the final stack (the function's results).
    pub fn run(&self, args: &[Value], observer: &mut impl ExecObserver) -> Result<Vec<Value>, ExecutionError> {
        observer.on_entry(args)?;
        let result = self.call(self.module.entry, args, observer, 0)?;
        observer.on_exit(&result)?;
        Ok(result)
    }

    fn call(
        &self,
        func_idx: u32,
        args: &[Value],
        observer: &mut impl ExecObserver,
        depth: u32,
    ) -> Result<Vec<Value>, ExecutionError> {
        if depth > self.max_call_depth {
            return Err(ExecutionError::CallDepthExceeded(self.max_call_depth));
        }
        let function: &Function = &self.module.functions[func_idx as usize];
        let mut locals = vec![Value::I32(0); function.total_locals() as usize];
        locals[..args.len()].copy_from_slice(args);
        let mut frame = Frame { locals, stack: Vec::new() };

        match self.run_block(&function.body, &mut frame, observer, depth)? {
            StepResult::Continue | StepResult::Return => Ok(frame.stack),
            StepResult::Break(d) => Err(ExecutionError::BadBranchDepth(d)),
        }
    }

    fn run_block(
        &self,
        body: &[Instr],
        frame: &mut Frame,
        observer: &mut impl ExecObserver,
        depth: u32,
    ) -> Result<StepResult, ExecutionError> {
        for (pc, instr) in body.iter().enumerate() {
            match self.step(instr, frame, observer, depth, pc)? {
                StepResult::Continue => {}
                other => return Ok(other),
            }
        }
        Ok(StepResult::Continue)
    }

    fn pop(&self, frame: &mut Frame, pc: usize) -> Result<Value, ExecutionError> {
        frame.stack.pop().ok_or(ExecutionError::StackUnderflow { pc })
    }

    fn pop_i32(&self, frame: &mut Frame, pc: usize) -> Result<i32, ExecutionError> {
        self.pop(frame, pc)?.as_i32().ok_or(ExecutionError::TypeMismatch { pc })
    }

    fn step(
        &self,
        instr: &Instr,
        frame: &mut Frame,
        observer: &mut impl ExecObserver,
        depth: u32,
        pc: usize,
    ) -> Result<StepResult, ExecutionError> {
        use Instr::*;
        match instr {
            I32Const(v) => {
                let r = Value::I32(*v);
                observer.on_const(r)?;
                frame.stack.push(r);
            }
            I64Const(v) => {
                let r = Value::I64(*v);
                observer.on_const(r)?;
                frame.stack.push(r);
            }

            I32Add => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32(a.wrapping_add(b));
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32Sub => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32(a.wrapping_sub(b));
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32Mul => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32(a.wrapping_mul(b));
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32DivS => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                if b == 0 {
                    return Err(ExecutionError::DivisionByZero { pc });
                }
                if a == i32::MIN && b == -1 {
                    return Err(ExecutionError::DivisionOverflow { pc });
                }
                let r = Value::I32(a / b);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32RemS => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                if b == 0 {
                    return Err(ExecutionError::DivisionByZero { pc });
                }
                let r = Value::I32(if a == i32::MIN && b == -1 { 0 } else { a % b });
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32DivU => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                if b == 0 {
                    return Err(ExecutionError::DivisionByZero { pc });
                }
                let r = Value::I32(((a as u32) / (b as u32)) as i32);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32RemU => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                if b == 0 {
                    return Err(ExecutionError::DivisionByZero { pc });
                }
                let r = Value::I32(((a as u32) % (b as u32)) as i32);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32And => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32(a & b);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32Or => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32(a | b);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32Xor => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32(a ^ b);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32Shl => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32(a.wrapping_shl(b as u32 & 31));
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32ShrS => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32(a.wrapping_shr(b as u32 & 31));
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32ShrU => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32(((a as u32).wrapping_shr(b as u32 & 31)) as i32);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32Rotl => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32((a as u32).rotate_left(b as u32 & 31) as i32);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32Rotr => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32((a as u32).rotate_right(b as u32 & 31) as i32);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32Eqz => {
                let a = self.pop_i32(frame, pc)?;
                let r = Value::I32((a == 0) as i32);
                observer.on_instr(instr, &[Value::I32(a)], r)?;
                frame.stack.push(r);
            }
            I32Eq => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32((a == b) as i32);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32Ne => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32((a != b) as i32);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32LtS => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32((a < b) as i32);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32GtS => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32((a > b) as i32);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32LeS => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32((a <= b) as i32);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            I32GeS => {
                let (b, a) = (self.pop_i32(frame, pc)?, self.pop_i32(frame, pc)?);
                let r = Value::I32((a >= b) as i32);
                observer.on_instr(instr, &[Value::I32(a), Value::I32(b)], r)?;
                frame.stack.push(r);
            }
            Drop => {
                self.pop(frame, pc)?;
                observer.on_drop()?;
            }
            LocalGet(idx) => {
                let v = *frame
                    .locals
                    .get(*idx as usize)
                    .ok_or(ExecutionError::UndefinedLocal { local: *idx, width: frame.locals.len() as u32 })?;
                frame.stack.push(v);
                observer.on_local_get(*idx)?;
            }
            LocalSet(idx) => {
                let v = self.pop(frame, pc)?;
                let slot = frame
                    .locals
                    .get_mut(*idx as usize)
                    .ok_or(ExecutionError::UndefinedLocal { local: *idx, width: frame.locals.len() as u32 })?;
                *slot = v;
                observer.on_local_set(*idx)?;
            }
            LocalTee(idx) => {
                let v = self.pop(frame, pc)?;
                frame.stack.push(v);
                let slot = frame
                    .locals
                    .get_mut(*idx as usize)
                    .ok_or(ExecutionError::UndefinedLocal { local: *idx, width: frame.locals.len() as u32 })?;
                *slot = v;
                observer.on_local_tee(*idx)?;
            }
            Block(inner) => {
                return self.unwind_one_level(self.run_block(inner, frame, observer, depth)?);
            }
            Loop(inner) => loop {
                match self.run_block(inner, frame, observer, depth)? {
                    StepResult::Continue => return Ok(StepResult::Continue),
                    StepResult::Break(0) => continue,
                    StepResult::Break(d) => return Ok(StepResult::Break(d - 1)),
                    StepResult::Return => return Ok(StepResult::Return),
                }
            },
            IfElse { then_body, else_body } => {
                let cond = self.pop_i32(frame, pc)?;
                let chosen = if cond != 0 { then_body } else { else_body };
                return self.unwind_one_level(self.run_block(chosen, frame, observer, depth)?);
            }
            Br(d) => return Ok(StepResult::Break(*d)),
            BrIf(target_depth) => {
                let cond = self.pop_i32(frame, pc)?;
                if cond != 0 {
                    return Ok(StepResult::Break(*target_depth));
                }
            }
            I32Load(offset) => {
                let addr = self.pop_i32(frame, pc)?;
                let effective = (addr as u32).wrapping_add(*offset);
                let v = Value::I32(self.memory.borrow().load_i32(effective)?);
                frame.stack.push(v);
            }
            I32Store(offset) => {
                let value = self.pop_i32(frame, pc)?;
                let addr = self.pop_i32(frame, pc)?;
                let effective = (addr as u32).wrapping_add(*offset);
                self.memory.borrow_mut().store_i32(effective, value)?;
            }
            Return => return Ok(StepResult::Return),
            Call(idx) => {
                let callee = &self.module.functions[*idx as usize];
                let argc = callee.num_params as usize;
                if frame.stack.len() < argc {
                    return Err(ExecutionError::StackUnderflow { pc });
                }
                let args: Vec<Value> = frame.stack.split_off(frame.stack.len() - argc);
                observer.on_call(*idx, &args)?;
                let results = self.call(*idx, &args, observer, depth + 1)?;
                observer.on_return(&results)?;
                frame.stack.extend(results);
            }
        }
        Ok(StepResult::Continue)
    }

    /// A `Break(0)` exiting a `block`/`if` is fully absorbed there (it just
    /// falls through to the code after the block); anything deeper passes
    /// through with its depth decremented by one level of nesting.
    fn unwind_one_level(&self, result: StepResult) -> Result<StepResult, ExecutionError> {
        Ok(match result {
            StepResult::Break(0) => StepResult::Continue,
            StepResult::Break(d) => StepResult::Break(d - 1),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Function, Module};

    fn run_prog(body: Vec<Instr>, args: &[Value]) -> Result<Vec<Value>, ExecutionError> {
        let f = Function { num_params: args.len() as u32, num_locals: 0, body };
        let module = Module::single(f);
        module.validate().unwrap();
        let exec = Executor::new(&module, 64);
        exec.run(args, &mut NullObserver)
    }

    #[test]
    fn add_two_locals() {
        let body = vec![Instr::LocalGet(0), Instr::LocalGet(1), Instr::I32Add];
        let out = run_prog(body, &[Value::I32(3), Value::I32(4)]).unwrap();
        assert_eq!(out, vec![Value::I32(7)]);
    }

    #[test]
    fn division_by_zero_traps() {
        let body = vec![Instr::I32Const(1), Instr::I32Const(0), Instr::I32DivS];
        assert_eq!(run_prog(body, &[]), Err(ExecutionError::DivisionByZero { pc: 2 }));
    }

    #[test]
    fn unsigned_division_treats_negative_as_large() {
        let body = vec![Instr::I32Const(-1), Instr::I32Const(2), Instr::I32DivU];
        let out = run_prog(body, &[]).unwrap();
        assert_eq!(out, vec![Value::I32((u32::MAX / 2) as i32)]);
    }

    #[test]
    fn logical_shift_right_does_not_sign_extend() {
        let body = vec![Instr::I32Const(-1), Instr::I32Const(28), Instr::I32ShrU];
        let out = run_prog(body, &[]).unwrap();
        assert_eq!(out, vec![Value::I32(0xF)]);
    }

    #[test]
    fn rotate_left_wraps_the_high_bit_around() {
        let body = vec![Instr::I32Const(1), Instr::I32Const(31), Instr::I32Rotl];
        let out = run_prog(body, &[]).unwrap();
        assert_eq!(out, vec![Value::I32(i32::MIN)]);
    }

    #[test]
    fn rotate_right_is_the_inverse_of_rotate_left() {
        let body = vec![
            Instr::I32Const(0x1234_5678),
            Instr::I32Const(7),
            Instr::I32Rotl,
            Instr::I32Const(7),
            Instr::I32Rotr,
        ];
        let out = run_prog(body, &[]).unwrap();
        assert_eq!(out, vec![Value::I32(0x1234_5678)]);
    }

    #[test]
    fn loop_with_br_if_counts_down() {
        // locals[0] = n; loop { n = n - 1; br_if 0 (n != 0) }; result = n
        let body = vec![
            Instr::Loop(vec![
                Instr::LocalGet(0),
                Instr::I32Const(1),
                Instr::I32Sub,
                Instr::LocalTee(0),
                Instr::I32Const(0),
                Instr::I32Ne,
                Instr::BrIf(0),
            ]),
            Instr::LocalGet(0),
        ];
        let out = run_prog(body, &[Value::I32(5)]).unwrap();
        assert_eq!(out, vec![Value::I32(0)]);
    }

    #[test]
    fn br_out_of_nested_block_skips_remainder() {
        let body = vec![
            Instr::Block(vec![Instr::Br(0), Instr::I32Const(99)]),
            Instr::I32Const(1),
        ];
        let out = run_prog(body, &[]).unwrap();
        assert_eq!(out, vec![Value::I32(1)]);
    }

    #[test]
    fn call_runs_callee_and_returns_result() {
        let callee = Function {
            num_params: 1,
            num_locals: 0,
            body: vec![Instr::LocalGet(0), Instr::I32Const(10), Instr::I32Add],
        };
        let caller = Function {
            num_params: 0,
            num_locals: 0,
            body: vec![Instr::I32Const(5), Instr::Call(0)],
        };
        let module = Module { functions: vec![callee, caller], entry: 1, memory_pages: 1 };
        module.validate().unwrap();
        let exec = Executor::new(&module, 64);
        let out = exec.run(&[], &mut NullObserver).unwrap();
        assert_eq!(out, vec![Value::I32(15)]);
    }
}
