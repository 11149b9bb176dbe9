//! CLI prover.
//!
//! Positional arguments: `(bytecode-file, l, input-string-a, input-string-b)`.
//! `bytecode-file` names one of the built-in demo programs below — the real
//! bytecode parser is an external collaborator this crate does not provide.
//! `l` is the Reed-Solomon message length (the arena's row width).
//!
//! Exit code 0 on success (`proof.data` written to the current directory),
//! 1 on an execution trap or any other core failure, 2 if the statement the
//! program computes evaluates to something other than `1`.

#![forbid(unsafe_code)]

use std::{env, fs, process};

use myzkp::error::Error;
use myzkp::iop::{Params, Prover};
use myzkp::module::{Function, Instr, Module};
use myzkp::rs::CodeParams;
use myzkp::value::Value;

/// Where the prover materialises input bytes before invoking the entry
/// function, per the input memory layout contract.
const INPUT_BASE: u32 = 0x0080_0000;

/// `strings_equal(addrA, addrB, lenA, lenB) -> 1` iff the two byte ranges
/// have equal length and equal contents. Bytes live one per 4-byte-aligned
/// i32 slot, since the instruction set only loads/stores 4-byte words.
fn strings_equal_program() -> Module {
    // locals: 0=addrA 1=addrB 2=lenA 3=lenB 4=i
    let body = vec![
        Instr::LocalGet(2),
        Instr::LocalGet(3),
        Instr::I32Ne,
        Instr::IfElse { then_body: vec![Instr::I32Const(0), Instr::Return], else_body: vec![] },
        Instr::I32Const(0),
        Instr::LocalSet(4),
        Instr::Block(vec![Instr::Loop(vec![
            Instr::LocalGet(4),
            Instr::LocalGet(2),
            Instr::I32GeS,
            Instr::IfElse { then_body: vec![Instr::Br(2)], else_body: vec![] },
            Instr::LocalGet(0),
            Instr::LocalGet(4),
            Instr::I32Const(4),
            Instr::I32Mul,
            Instr::I32Add,
            Instr::I32Load(0),
            Instr::LocalGet(1),
            Instr::LocalGet(4),
            Instr::I32Const(4),
            Instr::I32Mul,
            Instr::I32Add,
            Instr::I32Load(0),
            Instr::I32Ne,
            Instr::IfElse { then_body: vec![Instr::I32Const(0), Instr::Return], else_body: vec![] },
            Instr::LocalGet(4),
            Instr::I32Const(1),
            Instr::I32Add,
            Instr::LocalSet(4),
            Instr::Br(0),
        ])]),
        Instr::I32Const(1),
    ];
    let f = Function { num_params: 4, num_locals: 1, body };
    // Pages are sized by the caller, once the input lengths are known.
    Module::single_with_memory(f, 1)
}

fn load_module(name: &str) -> anyhow::Result<Module> {
    match name {
        "strings-equal" => Ok(strings_equal_program()),
        other => Err(anyhow::anyhow!("unknown demo program `{other}` (known: strings-equal)")),
    }
}

/// Encode one byte per 4-byte-aligned i32 slot, little-endian.
fn pack_bytes_as_i32_slots(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 4);
    for &b in bytes {
        out.extend_from_slice(&(b as i32).to_le_bytes());
    }
    out
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 5 {
        return Err(anyhow::anyhow!(
            "usage: {} <bytecode-file> <l> <input-string-a> <input-string-b>",
            args.first().map(String::as_str).unwrap_or("prover")
        ));
    }
    let bytecode_file = &args[1];
    let l: usize = args[2].parse().map_err(|_| anyhow::anyhow!("l must be a positive integer, got `{}`", args[2]))?;
    let input_a = args[3].as_bytes();
    let input_b = args[4].as_bytes();

    let program_name = fs::read_to_string(bytecode_file)
        .map_err(|e| anyhow::anyhow!("read bytecode file {bytecode_file}: {e}"))?;
    let mut module = load_module(program_name.trim())?;

    let len_a = input_a.len() as i32;
    let len_b = input_b.len() as i32;
    let addr_a = INPUT_BASE;
    let addr_b = INPUT_BASE + input_a.len() as u32 * 4;
    let end = addr_b as u64 + input_b.len() as u64 * 4;
    module.memory_pages = (end.div_ceil(65_536)) as u32;

    let d = l.next_power_of_two();
    let params = Params::with_defaults(CodeParams::new(l, d));
    let fn_args = [Value::I32(addr_a as i32), Value::I32(addr_b as i32), Value::I32(len_a), Value::I32(len_b)];
    let memory_init = vec![(addr_a, pack_bytes_as_i32_slots(input_a)), (addr_b, pack_bytes_as_i32_slots(input_b))];

    eprintln!("proving `{}` over l={l}, d={d}...", program_name.trim());
    match Prover::prove(&module, &fn_args, &params, &memory_init) {
        Ok(proof) => {
            let bytes = proof.to_bytes();
            let tmp_path = "proof.data.tmp";
            fs::write(tmp_path, &bytes).map_err(|e| anyhow::anyhow!("write {tmp_path}: {e}"))?;
            fs::rename(tmp_path, "proof.data").map_err(|e| anyhow::anyhow!("rename to proof.data: {e}"))?;
            eprintln!("wrote proof.data ({} bytes)", bytes.len());
            Ok(())
        }
        Err(Error::StatementRejected { got }) => {
            eprintln!("statement rejected: program returned {got}, expected 1");
            process::exit(2);
        }
        Err(other) => {
            eprintln!("prover failed: {other}");
            process::exit(1);
        }
    }
}
