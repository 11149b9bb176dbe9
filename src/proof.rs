//! Versioned binary proof blob (ambient).
//!
//! Follows a file-magic + versioned-payload discipline (`MAGIC`/`VERSION`),
//! implemented over plain little-endian `Write`/`Read` byte I/O rather than
//! an Arkworks `CanonicalSerialize` type.

use crate::field::Fp;
use crate::hash::Digest;
use crate::merkle::Decommitment;
use std::io::{self, Read, Write};

const MAGIC: &[u8; 8] = b"MYZKPv1\0";
const VERSION: u16 = 1;

/// The full proof object exchanged between prover and verifier.
#[derive(Clone, Debug)]
pub struct Proof {
    /// Message length.
    pub l: u64,
    /// Padded (plaintext-domain) length.
    pub d: u64,
    /// Codeword length (`2d`).
    pub n: u64,
    /// Number of code-argument repetitions.
    pub t_code: u32,
    /// Number of linear-argument repetitions.
    pub t_lin: u32,
    /// Number of quadratic-argument repetitions.
    pub t_quad: u32,
    /// Digest binding this proof to the specific module/arguments/initial
    /// memory it was produced for, so it cannot be mistaken for a proof of a
    /// different program that happens to share the code parameters above.
    pub statement_digest: Digest,
    /// Root of the Merkle tree committing the witness matrix.
    pub witness_root: Digest,
    /// `T_code` running codewords.
    pub code_acc: Vec<Vec<Fp>>,
    /// `T_lin` running codewords (each all-zero in a sound proof).
    pub linear_acc: Vec<Vec<Fp>>,
    /// `T_quad` running codewords (each all-zero in a sound proof).
    pub quad_acc: Vec<Vec<Fp>>,
    /// Sampled column indices spot-checked during disclosure.
    pub spot_indices: Vec<usize>,
    /// For each sampled column, the revealed witness-matrix symbols in
    /// row order (linear rows, then `ql`, `qr`, `qo` rows interleaved).
    pub spot_columns: Vec<Vec<Fp>>,
    /// Merkle decommitment authenticating the spot-checked columns.
    pub decommitment: Decommitment,
}

fn write_u64(w: &mut impl Write, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}
fn write_u32(w: &mut impl Write, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}
fn write_fp(w: &mut impl Write, v: Fp) -> io::Result<()> {
    w.write_all(&v.0.to_le_bytes())
}
fn write_vec_fp(w: &mut impl Write, v: &[Fp]) -> io::Result<()> {
    write_u64(w, v.len() as u64)?;
    for f in v {
        write_fp(w, *f)?;
    }
    Ok(())
}
fn write_matrix_fp(w: &mut impl Write, m: &[Vec<Fp>]) -> io::Result<()> {
    write_u64(w, m.len() as u64)?;
    for row in m {
        write_vec_fp(w, row)?;
    }
    Ok(())
}

fn read_u64(r: &mut impl Read) -> io::Result<u64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(u64::from_le_bytes(b))
}
fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}
fn read_fp(r: &mut impl Read) -> io::Result<Fp> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(Fp::new(u64::from_le_bytes(b)))
}
fn read_vec_fp(r: &mut impl Read) -> io::Result<Vec<Fp>> {
    let len = read_u64(r)? as usize;
    (0..len).map(|_| read_fp(r)).collect()
}
fn read_matrix_fp(r: &mut impl Read) -> io::Result<Vec<Vec<Fp>>> {
    let len = read_u64(r)? as usize;
    (0..len).map(|_| read_vec_fp(r)).collect()
}

impl Proof {
    /// Serialize to the versioned little-endian binary format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        write_u64(&mut out, self.l).unwrap();
        write_u64(&mut out, self.d).unwrap();
        write_u64(&mut out, self.n).unwrap();
        write_u32(&mut out, self.t_code).unwrap();
        write_u32(&mut out, self.t_lin).unwrap();
        write_u32(&mut out, self.t_quad).unwrap();
        out.extend_from_slice(&self.statement_digest);
        out.extend_from_slice(&self.witness_root);
        write_matrix_fp(&mut out, &self.code_acc).unwrap();
        write_matrix_fp(&mut out, &self.linear_acc).unwrap();
        write_matrix_fp(&mut out, &self.quad_acc).unwrap();
        write_u64(&mut out, self.spot_indices.len() as u64).unwrap();
        for &idx in &self.spot_indices {
            write_u64(&mut out, idx as u64).unwrap();
        }
        write_matrix_fp(&mut out, &self.spot_columns).unwrap();
        write_u64(&mut out, self.decommitment.num_leaves() as u64).unwrap();
        write_u64(&mut out, self.decommitment.len() as u64).unwrap();
        for (idx, digest) in self.decommitment.entries() {
            write_u64(&mut out, idx as u64).unwrap();
            out.extend_from_slice(digest);
        }
        out
    }

    /// Deserialize from the versioned little-endian binary format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::error::Error> {
        let mut r = bytes;
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic).map_err(|e| crate::error::Error::SerializationError(e.to_string()))?;
        if &magic != MAGIC {
            return Err(crate::error::Error::SerializationError("bad magic".to_string()));
        }
        let mut version_bytes = [0u8; 2];
        r.read_exact(&mut version_bytes).map_err(|e| crate::error::Error::SerializationError(e.to_string()))?;
        let version = u16::from_le_bytes(version_bytes);
        if version != VERSION {
            return Err(crate::error::Error::SerializationError(format!("unsupported proof version {version}")));
        }
        (|| -> io::Result<Proof> {
            let l = read_u64(&mut r)?;
            let d = read_u64(&mut r)?;
            let n = read_u64(&mut r)?;
            let t_code = read_u32(&mut r)?;
            let t_lin = read_u32(&mut r)?;
            let t_quad = read_u32(&mut r)?;
            let mut statement_digest = [0u8; 32];
            r.read_exact(&mut statement_digest)?;
            let mut witness_root = [0u8; 32];
            r.read_exact(&mut witness_root)?;
            let code_acc = read_matrix_fp(&mut r)?;
            let linear_acc = read_matrix_fp(&mut r)?;
            let quad_acc = read_matrix_fp(&mut r)?;
            let spot_len = read_u64(&mut r)? as usize;
            let mut spot_indices = Vec::with_capacity(spot_len);
            for _ in 0..spot_len {
                spot_indices.push(read_u64(&mut r)? as usize);
            }
            let spot_columns = read_matrix_fp(&mut r)?;
            let num_leaves = read_u64(&mut r)? as usize;
            let sib_len = read_u64(&mut r)? as usize;
            let mut entries = Vec::with_capacity(sib_len);
            for _ in 0..sib_len {
                let idx = read_u64(&mut r)? as usize;
                let mut digest = [0u8; 32];
                r.read_exact(&mut digest)?;
                entries.push((idx, digest));
            }
            Ok(Proof {
                l,
                d,
                n,
                t_code,
                t_lin,
                t_quad,
                statement_digest,
                witness_root,
                code_acc,
                linear_acc,
                quad_acc,
                spot_indices,
                spot_columns,
                decommitment: Decommitment::from_entries(num_leaves, entries),
            })
        })()
        .map_err(|e| crate::error::Error::SerializationError(e.to_string()))
    }
}
