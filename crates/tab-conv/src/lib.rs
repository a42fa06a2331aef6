//! # tab-conv
//!
//! Ternary and binary 2D convolution on CPU.
//!
//! ```text
//! FloatTensor ──ternarize/binarize──▶ PackedTensor ──img2row──▶ WindowMatrix
//!                                                                   │
//!            FilterBank ──weights(conv_type)──▶ ConvWeights ──▶ bitwise GEMM
//!                                                                   │
//!                                 FloatTensor [N, KN, OH, OW] ◀──activate
//! ```
//!
//! Filters are packed once into a [`FilterBank`]; [`convolve`] validates the
//! call and runs the pipeline. [`reference`] holds the direct convolution the
//! bitwise path is checked against.

pub mod conv;
pub mod filters;
pub mod reference;

pub use conv::{convolve, output_shape, ConvParams, ConvWeights};
pub use filters::FilterBank;
