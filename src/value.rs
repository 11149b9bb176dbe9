//! Tagged stack value (component G support).
//!
//! Grounded on `original_source/include/type.hpp`/`value.hpp`'s
//! `svalue_t` variant (`i32`/`i64`/label/frame index). We keep only the
//! numeric and control tags the opcode catalogue actually uses; `f32`/
//! `f64` are out of scope.

/// A value on the interpreter's operand stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Value {
    /// A 32-bit two's-complement integer.
    I32(i32),
    /// A 64-bit two's-complement integer, used only by unconstrained
    /// execution; the constraint compiler rejects i64 arithmetic ops
    /// (Decision D2 in `DESIGN.md`).
    I64(i64),
}

impl Value {
    /// View as `i32`, trapping the caller's execution if the tag doesn't
    /// match (mirrors `execution_context`'s tagged-union accessors, which
    /// assert on mismatch rather than silently coercing).
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            Value::I64(_) => None,
        }
    }

    /// View as `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            Value::I32(_) => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}
