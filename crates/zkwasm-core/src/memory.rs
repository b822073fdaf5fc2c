//! Linear memory with a secret-byte interval set.
//!
//! Every byte range either holds purely public data or witness-derived
//! ("secret") data. Loads overlapping any secret interval must return a
//! witness; `memory.copy` has to propagate the secret set byte-for-byte
//! using interval arithmetic rather than a coarse all-or-nothing flag.

use serde::{Deserialize, Serialize};

/// Bytes per WASM page.
pub const PAGE_SIZE: usize = 65_536;

/// A half-open byte range `[start, end)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteRange {
    /// Inclusive start offset.
    pub start: u64,
    /// Exclusive end offset.
    pub end: u64,
}

impl ByteRange {
    /// Construct a range from an offset and length.
    #[must_use]
    pub const fn new(start: u64, len: u64) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    #[must_use]
    fn len(self) -> u64 {
        self.end - self.start
    }

    #[must_use]
    fn intersect(self, other: Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Self { start, end })
    }

    #[must_use]
    fn translate(self, delta: i64) -> Self {
        Self {
            start: (self.start as i64 + delta) as u64,
            end: (self.end as i64 + delta) as u64,
        }
    }
}

/// A set of disjoint, sorted byte ranges marking which bytes of linear
/// memory currently hold witness-derived data.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SecretIntervalSet {
    ranges: Vec<ByteRange>,
}

impl SecretIntervalSet {
    /// An empty set (all memory public).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `r` overlaps any secret interval.
    #[must_use]
    pub fn overlaps(&self, r: ByteRange) -> bool {
        self.ranges.iter().any(|s| s.intersect(r).is_some())
    }

    /// Mark `r` as secret, merging with adjacent/overlapping intervals.
    pub fn mark_secret(&mut self, r: ByteRange) {
        if r.len() == 0 {
            return;
        }
        self.ranges.push(r);
        self.normalize();
    }

    /// Mark `r` as public, clearing it from the secret set.
    pub fn mark_public(&mut self, r: ByteRange) {
        if r.len() == 0 {
            return;
        }
        self.ranges = self
            .ranges
            .iter()
            .flat_map(|&s| subtract(s, r))
            .collect();
        self.normalize();
    }

    /// `memory.copy` propagation: the destination range takes on the secret
    /// shape of the source range, translated by `dst - src`; anything
    /// previously secret at the destination that isn't overwritten by a
    /// secret source byte becomes public.
    pub fn propagate_copy(&mut self, dst: u64, src: u64, len: u64) {
        if len == 0 {
            return;
        }
        let src_range = ByteRange::new(src, len);
        let dst_range = ByteRange::new(dst, len);
        let delta = dst as i64 - src as i64;

        let translated: Vec<ByteRange> = self
            .ranges
            .iter()
            .filter_map(|&s| s.intersect(src_range))
            .map(|r| r.translate(delta))
            .collect();

        self.mark_public(dst_range);
        for r in translated {
            self.ranges.push(r);
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        self.ranges.sort();
        let mut merged: Vec<ByteRange> = Vec::with_capacity(self.ranges.len());
        for r in self.ranges.drain(..) {
            if let Some(last) = merged.last_mut() {
                if r.start <= last.end {
                    last.end = last.end.max(r.end);
                    continue;
                }
            }
            merged.push(r);
        }
        self.ranges = merged;
    }
}

/// `a \ b`, as zero, one, or two sub-ranges.
fn subtract(a: ByteRange, b: ByteRange) -> Vec<ByteRange> {
    match a.intersect(b) {
        None => vec![a],
        Some(ov) => {
            let mut out = Vec::new();
            if a.start < ov.start {
                out.push(ByteRange {
                    start: a.start,
                    end: ov.start,
                });
            }
            if ov.end < a.end {
                out.push(ByteRange {
                    start: ov.end,
                    end: a.end,
                });
            }
            out
        }
    }
}

/// A WASM linear memory instance: raw bytes plus the secret-interval set
/// tracking which bytes currently hold witness-derived data.
#[derive(Clone, Debug)]
pub struct LinearMemory {
    bytes: Vec<u8>,
    secret: SecretIntervalSet,
    max_pages: Option<u32>,
}

impl LinearMemory {
    /// Construct memory with `initial` pages, optionally bounded by `max`.
    #[must_use]
    pub fn new(initial_pages: u32, max_pages: Option<u32>) -> Self {
        Self {
            bytes: vec![0u8; initial_pages as usize * PAGE_SIZE],
            secret: SecretIntervalSet::new(),
            max_pages,
        }
    }

    /// Current size in pages.
    #[must_use]
    pub fn size_pages(&self) -> u32 {
        (self.bytes.len() / PAGE_SIZE) as u32
    }

    /// Grow by `delta` pages. Returns the previous size in pages, or `None`
    /// if growth would exceed `max_pages`.
    pub fn grow(&mut self, delta: u32) -> Option<u32> {
        let prev = self.size_pages();
        let next = prev.checked_add(delta)?;
        if let Some(max) = self.max_pages {
            if next > max {
                return None;
            }
        }
        self.bytes.resize(next as usize * PAGE_SIZE, 0);
        Some(prev)
    }

    /// Raw byte slice accessor, bounds-checked.
    #[must_use]
    pub fn read(&self, offset: u64, len: u64) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(len).ok()?)?;
        self.bytes.get(start..end)
    }

    /// Write raw bytes, bounds-checked, marking the range public.
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Option<()> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(data.len())?;
        let dst = self.bytes.get_mut(start..end)?;
        dst.copy_from_slice(data);
        self.secret
            .mark_public(ByteRange::new(offset, data.len() as u64));
        Some(())
    }

    /// Write raw bytes and mark the written range secret.
    pub fn write_secret(&mut self, offset: u64, data: &[u8]) -> Option<()> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(data.len())?;
        let dst = self.bytes.get_mut(start..end)?;
        dst.copy_from_slice(data);
        self.secret.mark_secret(ByteRange::new(offset, data.len() as u64));
        Some(())
    }

    /// True if any byte in `[offset, offset+len)` is secret.
    #[must_use]
    pub fn is_secret(&self, offset: u64, len: u64) -> bool {
        self.secret.overlaps(ByteRange::new(offset, len))
    }

    /// `memory.fill`: write `len` copies of `byte` at `offset`.
    pub fn fill(&mut self, offset: u64, byte: u8, len: u64) -> Option<()> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(len).ok()?)?;
        self.bytes.get_mut(start..end)?.fill(byte);
        self.secret.mark_public(ByteRange::new(offset, len));
        Some(())
    }

    /// `memory.copy`: move `len` bytes from `src` to `dst`, propagating the
    /// secret-interval set via interval arithmetic rather than a coarse flag.
    pub fn copy(&mut self, dst: u64, src: u64, len: u64) -> Option<()> {
        let src_u = usize::try_from(src).ok()?;
        let dst_u = usize::try_from(dst).ok()?;
        let len_u = usize::try_from(len).ok()?;
        if src_u.checked_add(len_u)? > self.bytes.len() || dst_u.checked_add(len_u)? > self.bytes.len() {
            return None;
        }
        let chunk = self.bytes[src_u..src_u + len_u].to_vec();
        self.bytes[dst_u..dst_u + len_u].copy_from_slice(&chunk);
        self.secret.propagate_copy(dst, src, len);
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_respects_max() {
        let mut m = LinearMemory::new(1, Some(2));
        assert_eq!(m.grow(1), Some(1));
        assert_eq!(m.grow(1), None);
    }

    #[test]
    fn secret_copy_propagates_by_interval() {
        let mut m = LinearMemory::new(1, None);
        m.write_secret(0, &[0u8; 8]).unwrap();
        assert!(m.is_secret(0, 8));
        assert!(!m.is_secret(100, 8));

        m.copy(100, 0, 8).unwrap();
        assert!(m.is_secret(100, 8));
        // source bytes remain untouched/secret after a copy (copy doesn't clear source).
        assert!(m.is_secret(0, 8));
    }

    #[test]
    fn copy_of_public_bytes_clears_destination_secrecy() {
        let mut m = LinearMemory::new(1, None);
        m.write_secret(200, &[1u8; 8]).unwrap();
        assert!(m.is_secret(200, 8));
        m.copy(200, 0, 8).unwrap(); // source [0,8) is public
        assert!(!m.is_secret(200, 8));
    }
}
