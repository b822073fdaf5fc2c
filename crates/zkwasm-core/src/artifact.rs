//! The binary proof archive exchanged between prover and verifier.
//!
//! Layout (little-endian throughout, per the external interface format):
//!
//! 1. Stage-1 Merkle root (32 bytes)
//! 2. Stage-2 seed (32 bytes) — SHA-256 over the three encoded aggregates
//! 3. Three encoded aggregate codewords (code / linear / quadratic), each a
//!    `u32` length prefix followed by that many field elements, LSB-limb
//!    first (32 bytes each)
//! 4. A `u32` count of sampled columns, then for each: a `u32` column index,
//!    a 32-byte leaf digest, a Merkle authentication path, and the column's
//!    field elements (Stage-3 sampled-column table)
//!
//! This is a custom wire format rather than `serde_json`/`ciborium`: the
//! format is externally specified byte-for-byte (unlike [`crate::backend`]'s
//! opaque `Proof` associated type, which individual backends are free to
//! encode however they like).

use anyhow::{bail, Context, Result};
use zkwasm_field::Scalar;
use zkwasm_merkle::{AuthPath, Digest32, PathNode};

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_digest(buf: &mut Vec<u8>, d: Digest32) {
    buf.extend_from_slice(&d);
}

fn push_scalars(buf: &mut Vec<u8>, xs: &[Scalar]) {
    push_u32(buf, xs.len() as u32);
    for x in xs {
        buf.extend_from_slice(&x.to_le_bytes());
    }
}

fn push_auth_path(buf: &mut Vec<u8>, path: &AuthPath) {
    push_u32(buf, path.leaf_index as u32);
    push_u32(buf, path.nodes.len() as u32);
    for node in &path.nodes {
        push_digest(buf, node.digest);
        buf.push(u8::from(node.sibling_is_right));
    }
}

/// A cursor over an in-memory byte slice, used only by [`ProofArchive`]'s
/// deserializer.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).context("proof archive: offset overflow")?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .context("proof archive: unexpected end of data")?;
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes(b.try_into().expect("len 4")))
    }

    fn digest(&mut self) -> Result<Digest32> {
        let b = self.take(32)?;
        Ok(b.try_into().expect("len 32"))
    }

    fn scalar(&mut self) -> Result<Scalar> {
        let b = self.take(32)?;
        Ok(Scalar::from_le_bytes(b.try_into().expect("len 32")))
    }

    fn scalars(&mut self) -> Result<Vec<Scalar>> {
        let n = self.u32()? as usize;
        (0..n).map(|_| self.scalar()).collect()
    }

    fn auth_path(&mut self) -> Result<AuthPath> {
        let leaf_index = self.u32()? as usize;
        let n = self.u32()? as usize;
        let mut nodes = Vec::with_capacity(n);
        for _ in 0..n {
            let digest = self.digest()?;
            let sibling_is_right = match self.take(1)?[0] {
                0 => false,
                1 => true,
                other => bail!("proof archive: invalid bool byte {other}"),
            };
            nodes.push(PathNode {
                digest,
                sibling_is_right,
            });
        }
        Ok(AuthPath { leaf_index, nodes })
    }

    fn finish(self) -> Result<()> {
        if self.pos != self.bytes.len() {
            bail!(
                "proof archive: {} trailing bytes after decode",
                self.bytes.len() - self.pos
            );
        }
        Ok(())
    }
}

/// One entry of the Stage-3 sampled-column table: the opened column at a
/// sampled row index, together with the Merkle decommitment proving it's the
/// column the Stage-1 root committed to.
#[derive(Clone, Debug, PartialEq)]
pub struct SampledColumn {
    /// Row index sampled by the verifier's challenge.
    pub index: u32,
    /// Leaf digest of the committed column at `index`.
    pub leaf_digest: Digest32,
    /// Authentication path from `leaf_digest` to the Stage-1 root.
    pub auth_path: AuthPath,
    /// The column's field elements across all encoded rows.
    pub column: Vec<Scalar>,
}

/// The complete, self-contained proof exchanged between prover and verifier.
#[derive(Clone, Debug, PartialEq)]
pub struct ProofArchive {
    /// Stage-1 Merkle root over the encoded witness columns.
    pub merkle_root: Digest32,
    /// Stage-2 seed: SHA-256 over the three encoded aggregates below.
    pub stage2_seed: Digest32,
    /// Encoded code-aggregate codeword.
    pub code_aggregate: Vec<Scalar>,
    /// Encoded linear-aggregate codeword.
    pub linear_aggregate: Vec<Scalar>,
    /// Encoded quadratic-aggregate codeword.
    pub quadratic_aggregate: Vec<Scalar>,
    /// Stage-3 sampled columns with their decommitments.
    pub sampled_columns: Vec<SampledColumn>,
}

impl ProofArchive {
    /// Serialize to the external binary format.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        push_digest(&mut buf, self.merkle_root);
        push_digest(&mut buf, self.stage2_seed);
        push_scalars(&mut buf, &self.code_aggregate);
        push_scalars(&mut buf, &self.linear_aggregate);
        push_scalars(&mut buf, &self.quadratic_aggregate);
        push_u32(&mut buf, self.sampled_columns.len() as u32);
        for col in &self.sampled_columns {
            push_u32(&mut buf, col.index);
            push_digest(&mut buf, col.leaf_digest);
            push_auth_path(&mut buf, &col.auth_path);
            push_scalars(&mut buf, &col.column);
        }
        buf
    }

    /// Parse from the external binary format.
    ///
    /// # Errors
    /// Returns an error if the byte stream is truncated, malformed, or
    /// carries trailing garbage.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let merkle_root = r.digest()?;
        let stage2_seed = r.digest()?;
        let code_aggregate = r.scalars()?;
        let linear_aggregate = r.scalars()?;
        let quadratic_aggregate = r.scalars()?;
        let n_cols = r.u32()? as usize;
        let mut sampled_columns = Vec::with_capacity(n_cols);
        for _ in 0..n_cols {
            let index = r.u32()?;
            let leaf_digest = r.digest()?;
            let auth_path = r.auth_path()?;
            let column = r.scalars()?;
            sampled_columns.push(SampledColumn {
                index,
                leaf_digest,
                auth_path,
                column,
            });
        }
        r.finish()?;
        Ok(Self {
            merkle_root,
            stage2_seed,
            code_aggregate,
            linear_aggregate,
            quadratic_aggregate,
            sampled_columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_archive() -> ProofArchive {
        ProofArchive {
            merkle_root: [1u8; 32],
            stage2_seed: [2u8; 32],
            code_aggregate: vec![Scalar::from_u64(1), Scalar::from_u64(2)],
            linear_aggregate: vec![Scalar::from_u64(3)],
            quadratic_aggregate: vec![Scalar::from_u64(4), Scalar::from_u64(5), Scalar::from_u64(6)],
            sampled_columns: vec![SampledColumn {
                index: 7,
                leaf_digest: [3u8; 32],
                auth_path: AuthPath {
                    leaf_index: 7,
                    nodes: vec![PathNode {
                        digest: [4u8; 32],
                        sibling_is_right: true,
                    }],
                },
                column: vec![Scalar::from_u64(9)],
            }],
        }
    }

    #[test]
    fn roundtrip() {
        let archive = sample_archive();
        let bytes = archive.to_bytes();
        let decoded = ProofArchive::from_bytes(&bytes).expect("decode");
        assert_eq!(decoded, archive);
    }

    #[test]
    fn truncated_input_errors() {
        let archive = sample_archive();
        let bytes = archive.to_bytes();
        assert!(ProofArchive::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn trailing_garbage_errors() {
        let archive = sample_archive();
        let mut bytes = archive.to_bytes();
        bytes.push(0xff);
        assert!(ProofArchive::from_bytes(&bytes).is_err());
    }
}
