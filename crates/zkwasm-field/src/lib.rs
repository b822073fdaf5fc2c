//! BN254 scalar field arithmetic, seeded PRNG streams, and power-of-two NTT
//! row encoding for the Ligero transcript pipeline.
//!
//! - [`scalar::Scalar`]: BN254 `Fr` plus integer-representative operations
//!   (bitwise and/or/xor/not, shifts, Euclidean division) needed by the
//!   algebraic backend.
//! - [`rng`]: seeded `ChaCha20` streams, one per named PRNG role.
//! - [`domain`], [`twiddle`], [`ntt`], [`coset`]: power-of-two evaluation
//!   domains and in-place NTT/INTT.
//! - [`encode`]: the row -> codeword transform every transcript sink uses.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::unwrap_used)]

pub mod coset;
pub mod domain;
pub mod encode;
pub mod ntt;
pub mod rng;
pub mod scalar;
pub mod twiddle;

pub use domain::{pow2_domain, Pow2Domain};
pub use rng::{FieldRng, RandomStreams};
pub use scalar::Scalar;
