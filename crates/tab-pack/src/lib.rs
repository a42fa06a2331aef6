//! # tab-pack
//!
//! Quantizes NCHW float tensors into 64-channel packed words:
//! - Ternary {-1, 0, +1}: two planes per word, `(sign, nonzero)`
//! - Binary {-1, +1}: one plane, bit set means -1
//! - Per-sample (activations) or per-filter (weights) thresholds
//! - Zero-filled padding and zero high bits in partial channel words
//!
//! Also provides the word-level product identities the GEMM kernels use and
//! an unpacker for verification.

pub mod masks;
pub mod quantize;
pub mod unpack;
pub mod word;

pub use quantize::{binarize, ternarize};
pub use unpack::{padding_clear, tail_bits_clear, unpack};
pub use word::TernaryWord;
