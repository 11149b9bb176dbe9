//! End-to-end prover/verifier scenarios over small hand-built programs:
//! a bounded distance-like metric, a count-frequency-like metric, and the
//! tamper/parameter-mismatch rejection paths.
//!
//! The real bytecode compiler toolchain is out of scope for this crate (an
//! external collaborator, per the CLI contract in `src/bin/prover.rs`), so
//! these programs are built directly against `Module`/`Instr` rather than
//! compiled from source text; the property each one exercises (prover
//! accepts/refuses, verifier accepts/rejects) is the same either way.

use myzkp::field::Fp;
use myzkp::iop::{Params, Prover, Verifier};
use myzkp::module::{Function, Instr, Module};
use myzkp::rs::CodeParams;
use myzkp::value::Value;

/// Packs one byte per 4-byte-aligned `i32` slot, little-endian, matching the
/// CLI's input memory layout.
fn pack(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 4);
    for &b in bytes {
        out.extend_from_slice(&(b as i32).to_le_bytes());
    }
    out
}

/// Counts mismatched byte positions between two equal-length buffers and
/// proves the count is at most `threshold` (locals: 0=addrA 1=addrB 2=len
/// 3=i 4=mismatches; args: addrA, addrB, len, threshold).
fn bounded_mismatch_program() -> Module {
    let body = vec![
        Instr::I32Const(0),
        Instr::LocalSet(4), // mismatches = 0
        Instr::I32Const(0),
        Instr::LocalSet(5), // i = 0 (local 5, since threshold occupies 3)
        Instr::Block(vec![Instr::Loop(vec![
            Instr::LocalGet(5),
            Instr::LocalGet(2),
            Instr::I32GeS,
            Instr::IfElse { then_body: vec![Instr::Br(2)], else_body: vec![] },
            // a = load(addrA + 4*i)
            Instr::LocalGet(0),
            Instr::LocalGet(5),
            Instr::I32Const(4),
            Instr::I32Mul,
            Instr::I32Add,
            Instr::I32Load(0),
            // b = load(addrB + 4*i)
            Instr::LocalGet(1),
            Instr::LocalGet(5),
            Instr::I32Const(4),
            Instr::I32Mul,
            Instr::I32Add,
            Instr::I32Load(0),
            Instr::I32Ne,
            Instr::IfElse {
                then_body: vec![Instr::LocalGet(4), Instr::I32Const(1), Instr::I32Add, Instr::LocalSet(4)],
                else_body: vec![],
            },
            Instr::LocalGet(5),
            Instr::I32Const(1),
            Instr::I32Add,
            Instr::LocalSet(5),
            Instr::Br(0),
        ])]),
        Instr::LocalGet(4),
        Instr::LocalGet(3),
        Instr::I32LeS,
    ];
    let f = Function { num_params: 4, num_locals: 2, body };
    Module::single_with_memory(f, 1)
}

/// Counts occurrences of `target` in a buffer and proves the count equals
/// `expected` (locals: 0=addr 1=len 2=target 3=expected 4=i 5=count; args:
/// addr, len, target, expected).
fn count_frequency_program() -> Module {
    let body = vec![
        Instr::I32Const(0),
        Instr::LocalSet(5), // count = 0
        Instr::I32Const(0),
        Instr::LocalSet(4), // i = 0
        Instr::Block(vec![Instr::Loop(vec![
            Instr::LocalGet(4),
            Instr::LocalGet(1),
            Instr::I32GeS,
            Instr::IfElse { then_body: vec![Instr::Br(2)], else_body: vec![] },
            Instr::LocalGet(0),
            Instr::LocalGet(4),
            Instr::I32Const(4),
            Instr::I32Mul,
            Instr::I32Add,
            Instr::I32Load(0),
            Instr::LocalGet(2),
            Instr::I32Eq,
            Instr::IfElse {
                then_body: vec![Instr::LocalGet(5), Instr::I32Const(1), Instr::I32Add, Instr::LocalSet(5)],
                else_body: vec![],
            },
            Instr::LocalGet(4),
            Instr::I32Const(1),
            Instr::I32Add,
            Instr::LocalSet(4),
            Instr::Br(0),
        ])]),
        Instr::LocalGet(5),
        Instr::LocalGet(3),
        Instr::I32Eq,
    ];
    let f = Function { num_params: 4, num_locals: 2, body };
    Module::single_with_memory(f, 1)
}

const ADDR_A: u32 = 0x0080_0000;

#[test]
fn bounded_mismatch_within_threshold_verifies() {
    let a = b"kitten";
    let b = b"sitten"; // one mismatch
    let addr_b = ADDR_A + a.len() as u32 * 4;
    let mut module = bounded_mismatch_program();
    module.memory_pages = 1;
    let params = Params::with_defaults(CodeParams::new(16, 16));
    let args = [Value::I32(ADDR_A as i32), Value::I32(addr_b as i32), Value::I32(a.len() as i32), Value::I32(1)];
    let memory_init = vec![(ADDR_A, pack(a)), (addr_b, pack(b))];

    let proof = Prover::prove(&module, &args, &params, &memory_init).unwrap();
    Verifier::verify(&proof, &params, &module, &args, &memory_init).unwrap();
}

#[test]
fn bounded_mismatch_exceeding_threshold_is_refused_by_the_prover() {
    let a = b"kitten";
    let b = b"sxttxn"; // two mismatches, threshold is zero
    let addr_b = ADDR_A + a.len() as u32 * 4;
    let mut module = bounded_mismatch_program();
    module.memory_pages = 1;
    let params = Params::with_defaults(CodeParams::new(16, 16));
    let args = [Value::I32(ADDR_A as i32), Value::I32(addr_b as i32), Value::I32(a.len() as i32), Value::I32(0)];
    let memory_init = vec![(ADDR_A, pack(a)), (addr_b, pack(b))];

    let err = Prover::prove(&module, &args, &params, &memory_init).unwrap_err();
    assert!(matches!(err, myzkp::Error::StatementRejected { got: 0 }));
}

#[test]
fn count_frequency_matching_expected_verifies() {
    let data = b"abracadabra";
    let module = count_frequency_program();
    let params = Params::with_defaults(CodeParams::new(16, 16));
    let target = b'a' as i32;
    let expected = data.iter().filter(|&&c| c == b'a').count() as i32;
    let args = [Value::I32(ADDR_A as i32), Value::I32(data.len() as i32), Value::I32(target), Value::I32(expected)];
    let memory_init = vec![(ADDR_A, pack(data))];

    let proof = Prover::prove(&module, &args, &params, &memory_init).unwrap();
    Verifier::verify(&proof, &params, &module, &args, &memory_init).unwrap();
}

#[test]
fn tampered_quadratic_accumulator_is_rejected() {
    let data = b"abracadabra";
    let module = count_frequency_program();
    let params = Params::with_defaults(CodeParams::new(16, 16));
    let target = b'a' as i32;
    let expected = data.iter().filter(|&&c| c == b'a').count() as i32;
    let args = [Value::I32(ADDR_A as i32), Value::I32(data.len() as i32), Value::I32(target), Value::I32(expected)];
    let memory_init = vec![(ADDR_A, pack(data))];

    let mut proof = Prover::prove(&module, &args, &params, &memory_init).unwrap();
    assert!(!proof.quad_acc.is_empty(), "this program lowers at least one multiplication");
    proof.quad_acc[0][0] += Fp::new(1);
    assert!(Verifier::verify(&proof, &params, &module, &args, &memory_init).is_err());
}

#[test]
fn tampered_merkle_leaf_is_rejected() {
    let data = b"abracadabra";
    let module = count_frequency_program();
    let params = Params::with_defaults(CodeParams::new(16, 16));
    let target = b'a' as i32;
    let expected = data.iter().filter(|&&c| c == b'a').count() as i32;
    let args = [Value::I32(ADDR_A as i32), Value::I32(data.len() as i32), Value::I32(target), Value::I32(expected)];
    let memory_init = vec![(ADDR_A, pack(data))];

    let mut proof = Prover::prove(&module, &args, &params, &memory_init).unwrap();
    let col = proof.spot_columns.first_mut().expect("at least one spot check column");
    let v = col.first_mut().expect("at least one committed row");
    *v += Fp::new(1);
    assert!(Verifier::verify(&proof, &params, &module, &args, &memory_init).is_err());
}

#[test]
fn parameter_mismatch_is_rejected() {
    let data = b"abracadabra";
    let module = count_frequency_program();
    let params = Params::with_defaults(CodeParams::new(16, 16));
    let other_params = Params::with_defaults(CodeParams::new(8, 8));
    let target = b'a' as i32;
    let expected = data.iter().filter(|&&c| c == b'a').count() as i32;
    let args = [Value::I32(ADDR_A as i32), Value::I32(data.len() as i32), Value::I32(target), Value::I32(expected)];
    let memory_init = vec![(ADDR_A, pack(data))];

    let proof = Prover::prove(&module, &args, &params, &memory_init).unwrap();
    assert!(Verifier::verify(&proof, &other_params, &module, &args, &memory_init).is_err());
}

#[test]
fn proof_is_rejected_when_checked_against_a_different_statement() {
    let data = b"abracadabra";
    let module = count_frequency_program();
    let params = Params::with_defaults(CodeParams::new(16, 16));
    let target = b'a' as i32;
    let expected = data.iter().filter(|&&c| c == b'a').count() as i32;
    let args = [Value::I32(ADDR_A as i32), Value::I32(data.len() as i32), Value::I32(target), Value::I32(expected)];
    let memory_init = vec![(ADDR_A, pack(data))];
    let proof = Prover::prove(&module, &args, &params, &memory_init).unwrap();

    // Same code parameters, wrong expected count for the same data.
    let wrong_args =
        [Value::I32(ADDR_A as i32), Value::I32(data.len() as i32), Value::I32(target), Value::I32(expected + 1)];
    assert!(Verifier::verify(&proof, &params, &module, &wrong_args, &memory_init).is_err());
}
