//! Minimal module image: the bytecode a [`crate::exec::Executor`] runs
//! (component G support).
//!
//! Grounded on `original_source/include/instruction.hpp`'s opcode
//! catalogue, trimmed to the subset this crate actually constrains: i32
//! arithmetic/bitwise/comparison, structured control flow
//! (`block`/`loop`/`if`/`br`/`br_if`/`return`/`call`), and locals. `f32`/
//! `f64` and multi-value returns are out of scope.

/// One instruction. Control-flow instructions carry their nested body
/// inline (a structured AST, not a flat br-target byte offset table) —
/// simpler to interpret correctly than the source's label-stack scheme,
/// at the cost of not modeling irreducible control flow (unneeded here).
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    /// Push a constant i32.
    I32Const(i32),
    /// Push a constant i64 (unconstrained path only).
    I64Const(i64),
    /// Pop two, push their sum.
    I32Add,
    /// Pop two (`b`, `a`, in that push order), push `a - b`.
    I32Sub,
    /// Pop two, push their product.
    I32Mul,
    /// Pop two (`b`, `a`), push `a / b` (signed, traps on division by zero).
    I32DivS,
    /// Pop two (`b`, `a`), push `a % b` (signed, traps on division by zero).
    I32RemS,
    /// Pop two (`b`, `a`), push `a / b` (unsigned, traps on division by zero).
    I32DivU,
    /// Pop two (`b`, `a`), push `a % b` (unsigned, traps on division by zero).
    I32RemU,
    /// Bitwise AND.
    I32And,
    /// Bitwise OR.
    I32Or,
    /// Bitwise XOR.
    I32Xor,
    /// Logical shift left; the shift amount is a public value, never itself
    /// a hidden witness.
    I32Shl,
    /// Arithmetic shift right (sign-extending); shift amount public.
    I32ShrS,
    /// Logical shift right (zero-filling); shift amount public.
    I32ShrU,
    /// Rotate left; shift amount public.
    I32Rotl,
    /// Rotate right; shift amount public.
    I32Rotr,
    /// Push `1` if the top of stack is `0`, else `0`.
    I32Eqz,
    /// Pop two, push `1` if equal else `0`.
    I32Eq,
    /// Pop two, push `1` if not equal else `0`.
    I32Ne,
    /// Pop two (`b`, `a`), push `1` if `a < b` (signed) else `0`.
    I32LtS,
    /// Pop two (`b`, `a`), push `1` if `a > b` (signed) else `0`.
    I32GtS,
    /// Pop two (`b`, `a`), push `1` if `a <= b` (signed) else `0`.
    I32LeS,
    /// Pop two (`b`, `a`), push `1` if `a >= b` (signed) else `0`.
    I32GeS,
    /// Discard the top of stack.
    Drop,
    /// Push the value of local `idx`.
    LocalGet(u32),
    /// Pop the top of stack into local `idx`.
    LocalSet(u32),
    /// As `LocalSet`, but leaves the value on the stack too.
    LocalTee(u32),
    /// Run `body`; `br 0` inside jumps to just after this block.
    Block(Vec<Instr>),
    /// Run `body` repeatedly; `br 0` inside jumps back to the top of the
    /// loop instead of past it.
    Loop(Vec<Instr>),
    /// Pop a condition; run `then_body` if nonzero, else `else_body`.
    IfElse { then_body: Vec<Instr>, else_body: Vec<Instr> },
    /// Unconditional branch to the enclosing structured construct `depth`
    /// levels out (`0` = innermost).
    Br(u32),
    /// Pop a condition; branch as `Br(depth)` if nonzero.
    BrIf(u32),
    /// Return from the current function immediately.
    Return,
    /// Call function `idx` in the same module.
    Call(u32),
    /// Pop an address, push the little-endian `i32` at `address + offset`.
    /// Unconstrained: see `memory.rs`.
    I32Load(u32),
    /// Pop a value then an address, store the value little-endian at
    /// `address + offset`. Unconstrained: see `memory.rs`.
    I32Store(u32),
}

/// One function body: parameter/local counts plus its instruction list.
#[derive(Clone, Debug)]
pub struct Function {
    /// Number of parameters, occupying locals `0..num_params`.
    pub num_params: u32,
    /// Number of additional locals beyond the parameters, zero-initialized.
    pub num_locals: u32,
    /// The function's instructions.
    pub body: Vec<Instr>,
}

impl Function {
    /// Total local slot count (`num_params + num_locals`).
    pub fn total_locals(&self) -> u32 {
        self.num_params + self.num_locals
    }
}

/// A minimal module image: an ordered function table. Execution starts at
/// `entry`.
#[derive(Clone, Debug)]
pub struct Module {
    /// Functions, indexed by `Call`.
    pub functions: Vec<Function>,
    /// Index of the entry-point function.
    pub entry: u32,
    /// Initial linear memory size, in 64 KiB pages.
    pub memory_pages: u32,
}

impl Module {
    /// A single-function module with one page of linear memory, the common
    /// case for the small programs this crate proves statements about.
    pub fn single(function: Function) -> Self {
        Module { functions: vec![function], entry: 0, memory_pages: 1 }
    }

    /// A single-function module with `memory_pages` pages of linear memory,
    /// for programs that read/write input data via `I32Load`/`I32Store`.
    pub fn single_with_memory(function: Function, memory_pages: u32) -> Self {
        Module { functions: vec![function], entry: 0, memory_pages }
    }

    /// The entry function's initial argument locals, given the raw inputs.
    pub fn entry_function(&self) -> &Function {
        &self.functions[self.entry as usize]
    }

    /// A byte fingerprint of the module's shape (function count, entry
    /// point, memory size, and every instruction's discriminant/immediate),
    /// absorbed into the Fiat-Shamir transcript by both prover and verifier
    /// so a proof is bound to the specific program it was produced for, not
    /// just to the code parameters it happens to share with another one.
    pub fn fingerprint(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.entry.to_le_bytes());
        out.extend_from_slice(&self.memory_pages.to_le_bytes());
        out.extend_from_slice(&(self.functions.len() as u32).to_le_bytes());
        for f in &self.functions {
            out.extend_from_slice(&f.num_params.to_le_bytes());
            out.extend_from_slice(&f.num_locals.to_le_bytes());
            Self::fingerprint_body(&f.body, &mut out);
        }
        out
    }

    fn fingerprint_body(body: &[Instr], out: &mut Vec<u8>) {
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        for instr in body {
            match instr {
                Instr::I32Const(v) => {
                    out.push(0);
                    out.extend_from_slice(&v.to_le_bytes());
                }
                Instr::I64Const(v) => {
                    out.push(1);
                    out.extend_from_slice(&v.to_le_bytes());
                }
                Instr::LocalGet(i) => {
                    out.push(20);
                    out.extend_from_slice(&i.to_le_bytes());
                }
                Instr::LocalSet(i) => {
                    out.push(21);
                    out.extend_from_slice(&i.to_le_bytes());
                }
                Instr::LocalTee(i) => {
                    out.push(22);
                    out.extend_from_slice(&i.to_le_bytes());
                }
                Instr::Block(b) => {
                    out.push(23);
                    Self::fingerprint_body(b, out);
                }
                Instr::Loop(b) => {
                    out.push(24);
                    Self::fingerprint_body(b, out);
                }
                Instr::IfElse { then_body, else_body } => {
                    out.push(25);
                    Self::fingerprint_body(then_body, out);
                    Self::fingerprint_body(else_body, out);
                }
                Instr::Br(d) => {
                    out.push(26);
                    out.extend_from_slice(&d.to_le_bytes());
                }
                Instr::BrIf(d) => {
                    out.push(27);
                    out.extend_from_slice(&d.to_le_bytes());
                }
                Instr::Call(idx) => {
                    out.push(29);
                    out.extend_from_slice(&idx.to_le_bytes());
                }
                Instr::I32Load(off) => {
                    out.push(30);
                    out.extend_from_slice(&off.to_le_bytes());
                }
                Instr::I32Store(off) => {
                    out.push(31);
                    out.extend_from_slice(&off.to_le_bytes());
                }
                other => {
                    // Fixed-shape opcodes: the discriminant alone identifies
                    // them (no immediate to absorb).
                    out.push(match other {
                        Instr::I32Add => 2,
                        Instr::I32Sub => 3,
                        Instr::I32Mul => 4,
                        Instr::I32DivS => 5,
                        Instr::I32RemS => 6,
                        Instr::I32DivU => 7,
                        Instr::I32RemU => 8,
                        Instr::I32And => 9,
                        Instr::I32Or => 10,
                        Instr::I32Xor => 11,
                        Instr::I32Shl => 12,
                        Instr::I32ShrS => 13,
                        Instr::I32ShrU => 14,
                        Instr::I32Rotl => 15,
                        Instr::I32Rotr => 16,
                        Instr::I32Eqz => 17,
                        Instr::I32Eq => 18,
                        Instr::I32Ne => 19,
                        Instr::I32LtS => 40,
                        Instr::I32GtS => 41,
                        Instr::I32LeS => 42,
                        Instr::I32GeS => 43,
                        Instr::Drop => 44,
                        Instr::Return => 45,
                        _ => unreachable!("every variant with an immediate is handled above"),
                    });
                }
            }
        }
    }
}

/// Errors constructing or validating a module image.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModuleError {
    /// `Call` referenced a function index past the end of the table.
    #[error("module malformed: call to undefined function index {0}")]
    UndefinedFunction(u32),
    /// `entry` referenced a function index past the end of the table.
    #[error("module malformed: entry point {0} is out of range for {1} functions")]
    BadEntryPoint(u32, usize),
}

impl Module {
    /// Validate that `entry` and every `Call` target a defined function.
    pub fn validate(&self) -> Result<(), ModuleError> {
        if self.entry as usize >= self.functions.len() {
            return Err(ModuleError::BadEntryPoint(self.entry, self.functions.len()));
        }
        for f in &self.functions {
            Self::validate_body(&f.body, self.functions.len())?;
        }
        Ok(())
    }

    fn validate_body(body: &[Instr], num_functions: usize) -> Result<(), ModuleError> {
        for instr in body {
            match instr {
                Instr::Call(idx) if *idx as usize >= num_functions => {
                    return Err(ModuleError::UndefinedFunction(*idx));
                }
                Instr::Block(b) | Instr::Loop(b) => Self::validate_body(b, num_functions)?,
                Instr::IfElse { then_body, else_body } => {
                    Self::validate_body(then_body, num_functions)?;
                    Self::validate_body(else_body, num_functions)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_bad_entry() {
        let m = Module { functions: vec![], entry: 0, memory_pages: 1 };
        assert_eq!(m.validate(), Err(ModuleError::BadEntryPoint(0, 0)));
    }

    #[test]
    fn validate_rejects_undefined_call() {
        let f = Function { num_params: 0, num_locals: 0, body: vec![Instr::Call(5)] };
        let m = Module::single(f);
        assert_eq!(m.validate(), Err(ModuleError::UndefinedFunction(5)));
    }

    #[test]
    fn validate_descends_into_nested_blocks() {
        let f = Function {
            num_params: 0,
            num_locals: 0,
            body: vec![Instr::Block(vec![Instr::Call(9)])],
        };
        let m = Module::single(f);
        assert_eq!(m.validate(), Err(ModuleError::UndefinedFunction(9)));
    }
}
