//! Crate root: public surface and the top-level prove/verify entry points.
//!
//! This module is the single canonical entry point for downstream users.
//! It wires together the field/NTT primitive (A), the Reed-Solomon encoder
//! (B), the hash/Merkle commitment (C), the deterministic PRGs (D), the
//! witness arena (E), the constraint emitter (F), the stack-machine
//! executor (G), opcode lowering (H), IOP orchestration and the verifier
//! (I), and the argument accumulator (J) into one proving/verifying
//! surface: [`Prover`], [`Verifier`], [`Params`], and [`Proof`].
//!
//! ## Invariants
//!
//! - **Field.** Arithmetic is over the prime field in [`field`] (`Fp`,
//!   modulus near 2^50); all field operations are checked, never UB.
//!   Unsafe code is forbidden throughout the crate.
//! - **Fiat-Shamir.** [`transcript::Transcript`] uses HMAC-SHA256 with
//!   explicit domain separation tags and length-delimited absorbs; prover
//!   and verifier replay the same absorb/challenge sequence.
//! - **No partial proofs.** A run either completes stage 3 and returns a
//!   full [`Proof`], or returns an [`error::Error`] and produces nothing;
//!   callers (the `prover`/`verifier` binaries) are responsible for atomic
//!   file writes.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

/// Prime-field arithmetic and radix-2 NTT (component A).
pub mod field;
/// Reed-Solomon encoder/decoder over the field (component B).
pub mod rs;
/// Keyed hash/MAC primitive used by Merkle, PRG, and transcript.
pub mod hash;
/// Merkle-tree commitment, decommitment, and recommitment (component C).
pub mod merkle;
/// Deterministic random engines yielding field elements (component D).
pub mod prng;
/// Witness arena with reference-counted GC (component E).
pub mod arena;
/// Constraint emitter over the arena (component F).
pub mod constraints;
/// Tagged stack values.
pub mod value;
/// Linear memory.
pub mod memory;
/// Bytecode module image (functions, instructions).
pub mod module;
/// Stack-machine executor (component G).
pub mod exec;
/// Opcode-to-constraint lowering (component H).
pub mod opcodes;
/// Fiat-Shamir transcript.
pub mod transcript;
/// Argument accumulator (component J).
pub mod argument;
/// Crate-wide error type.
pub mod error;
/// Explicit instrumentation context (stage timings, counters).
pub mod instrumentation;
/// Versioned binary proof blob.
pub mod proof;
/// IOP orchestration: prover, verifier, public parameters (component I).
pub mod iop;

pub use error::Error;
pub use iop::{Params, Prover, Verifier};
pub use proof::Proof;
pub use value::Value;

/// Security parameter λ in bits, used to size the default spot-check count
/// (`num_spot_checks` in [`Params::with_defaults`]) against the code rate.
pub const SECURITY_LAMBDA: usize = 128;
