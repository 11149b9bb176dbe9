//! Crate-wide error categories (ambient).
//!
//! Per-module errors (`field::FieldError`, `rs::RsError`,
//! `merkle::MerkleError`, `memory::MemoryError`, `module::ModuleError`,
//! `exec::ExecutionError`) stay local to their modules, since each names a
//! failure shape specific to its own API. `Error` here is the crate-root
//! aggregate a CLI binary or library caller actually matches on, folding
//! per-module `thiserror` enums under one umbrella at the public boundary.

use thiserror::Error;

/// Top-level error type returned by prover/verifier entry points.
#[derive(Debug, Error)]
pub enum Error {
    /// The module image itself is structurally invalid.
    #[error("module malformed: {0}")]
    ModuleMalformed(#[from] crate::module::ModuleError),

    /// The program trapped during (unconstrained) execution.
    #[error("execution trap: {0}")]
    ExecutionTrap(#[from] crate::exec::ExecutionError),

    /// A field/NTT arithmetic invariant failed.
    #[error("field arithmetic error: {0}")]
    FieldArithmetic(#[from] crate::field::FieldError),

    /// The Reed-Solomon encode/decode stage failed.
    #[error("reed-solomon error: {0}")]
    Encoding(#[from] crate::rs::RsError),

    /// A Merkle commit/decommit/recommit operation failed.
    #[error("merkle error: {0}")]
    Merkle(#[from] crate::merkle::MerkleError),

    /// Linear memory access went out of bounds.
    #[error("memory error: {0}")]
    Memory(#[from] crate::memory::MemoryError),

    /// The witness arena could not accept more rows (configured bound
    /// exceeded), guarding against unbounded memory growth on a malicious
    /// or pathological program.
    #[error("arena exhausted: {reason}")]
    ArenaExhausted {
        /// Human-readable detail of which bound was exceeded.
        reason: String,
    },

    /// A proof blob was malformed (bad magic, truncated, bad version).
    #[error("proof serialization error: {0}")]
    SerializationError(String),

    /// The verifier rejected a well-formed proof.
    #[error("proof rejected: {reason}")]
    ProofRejected {
        /// Which check failed (code/linear/quadratic argument, or Merkle
        /// opening mismatch).
        reason: String,
    },

    /// The program ran to completion without trapping, but its final
    /// result was not `1`: the statement being proved is false for this
    /// witness. Distinct from [`Error::ExecutionTrap`] so callers (the
    /// `prover` binary) can tell "the program is broken" apart from "the
    /// program ran fine and disproved the statement" (exit code 2 per
    /// the CLI contract).
    #[error("statement evaluated to {got}, expected 1")]
    StatementRejected {
        /// The value actually left on top of the stack.
        got: i32,
    },
}
