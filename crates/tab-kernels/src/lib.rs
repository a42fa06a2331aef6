//! # tab-kernels
//!
//! Compute kernels for packed ternary/binary convolution:
//! - `img2row`: sliding windows over packed activations
//! - `bitwise_gemm`: the TNN/TBN/BTN/BNN popcount GEMMs (rayon across rows)
//! - `correction`: per-filter nonzero counts for BTN
//! - `activation`: output reordering and PReLU
//! - `cpu`: runtime popcount feature detection

pub mod activation;
pub mod bitwise_gemm;
pub mod correction;
pub mod cpu;
pub mod img2row;

pub use activation::{activate, prelu, reconstruct};
pub use bitwise_gemm::{bnn_gemm, btn_gemm, btn_gemm_raw, tbn_gemm, tnn_gemm, BitwiseGemm};
pub use correction::{correction_counts, count_correction_bits};
pub use cpu::CpuFeatures;
pub use img2row::img2row;

/// Minimum rows before we use rayon parallelism.
pub(crate) const PAR_ROW_THRESHOLD: usize = 16;
