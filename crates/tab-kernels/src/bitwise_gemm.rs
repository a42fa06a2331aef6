//! Popcount GEMM over packed rows.
//!
//! Computes `C[m × n]` with `C[i][j] = a_row(i) · b_row(j)` where both sides
//! are rows of packed words. `k` is the number of words per plane in a row;
//! a ternary row holds `2k` words as interleaved `(sign, nonzero)` pairs, a
//! binary row holds `k`.
//!
//! | kernel | `a` (windows) | `b` (filters) | per word pair |
//! |--------|---------------|---------------|---------------|
//! | TNN    | ternary       | ternary       | `popcnt(!(a1^b1)&a2&b2) - popcnt((a1^b1)&a2&b2)` |
//! | TBN    | ternary       | binary        | `popcnt(!(a1^b)&a2) - popcnt((a1^b)&a2)` |
//! | BTN    | binary        | ternary       | `-2 * popcnt((a^b1)&b2)`, plus a per-filter count |
//! | BNN    | binary        | binary        | `-2 * popcnt(a^b)`, plus the unpacked dot length |
//!
//! Zero bits on the binary side read as +1, so padded positions and unused
//! channel bits shift BTN/BNN results; the ternary side's zero fill is exact.

use rayon::prelude::*;

use tab_core::ConvType;
use tab_pack::TernaryWord;

use crate::PAR_ROW_THRESHOLD;

/// One of the four kernels, carrying whatever per-call constant it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitwiseGemm<'a> {
    Tnn,
    Tbn,
    /// `correction[j]` is the nonzero count of filter `j`.
    Btn { correction: &'a [i32] },
    /// `k_total` is the unpacked dot length `C × KH × KW`.
    Bnn { k_total: usize },
}

impl BitwiseGemm<'_> {
    pub fn conv_type(&self) -> ConvType {
        match self {
            BitwiseGemm::Tnn => ConvType::Tnn,
            BitwiseGemm::Tbn => ConvType::Tbn,
            BitwiseGemm::Btn { .. } => ConvType::Btn,
            BitwiseGemm::Bnn { .. } => ConvType::Bnn,
        }
    }

    /// Run the kernel; see the free functions for the operand layouts.
    pub fn run(&self, a: &[u64], b: &[u64], m: usize, n: usize, k: usize) -> Vec<i32> {
        match *self {
            BitwiseGemm::Tnn => tnn_gemm(a, b, m, n, k),
            BitwiseGemm::Tbn => tbn_gemm(a, b, m, n, k),
            BitwiseGemm::Btn { correction } => btn_gemm(a, b, correction, m, n, k),
            BitwiseGemm::Bnn { k_total } => bnn_gemm(a, b, m, n, k, k_total),
        }
    }
}

/// Ternary windows `[m × 2k]` against ternary filters `[n × 2k]`.
pub fn tnn_gemm(a: &[u64], b: &[u64], m: usize, n: usize, k: usize) -> Vec<i32> {
    gemm_rows(a, b, m, n, 2 * k, 2 * k, |a_row, b_row, _| {
        a_row
            .chunks_exact(2)
            .zip(b_row.chunks_exact(2))
            .map(|(x, w)| TernaryWord::from_planes(x).dot(TernaryWord::from_planes(w)))
            .sum()
    })
}

/// Ternary windows `[m × 2k]` against binary filters `[n × k]`.
pub fn tbn_gemm(a: &[u64], b: &[u64], m: usize, n: usize, k: usize) -> Vec<i32> {
    gemm_rows(a, b, m, n, 2 * k, k, |a_row, b_row, _| {
        a_row
            .chunks_exact(2)
            .zip(b_row)
            .map(|(x, &w)| TernaryWord::from_planes(x).dot_binary(w))
            .sum()
    })
}

/// Binary windows `[m × k]` against ternary filters `[n × 2k]`, corrected.
///
/// Equals `btn_gemm_raw(..)[i][j] + correction[j]`.
///
/// # Panics
/// If `correction` has fewer than `n` entries.
pub fn btn_gemm(
    a: &[u64],
    b: &[u64],
    correction: &[i32],
    m: usize,
    n: usize,
    k: usize,
) -> Vec<i32> {
    assert!(
        correction.len() >= n,
        "btn_gemm: need {n} correction counts, got {}",
        correction.len()
    );
    gemm_rows(a, b, m, n, k, 2 * k, |a_row, b_row, j| {
        correction[j] + btn_row(a_row, b_row)
    })
}

/// BTN without the per-filter correction: `-2 × disagreements`.
pub fn btn_gemm_raw(a: &[u64], b: &[u64], m: usize, n: usize, k: usize) -> Vec<i32> {
    gemm_rows(a, b, m, n, k, 2 * k, |a_row, b_row, _| btn_row(a_row, b_row))
}

/// Binary windows `[m × k]` against binary filters `[n × k]`.
pub fn bnn_gemm(a: &[u64], b: &[u64], m: usize, n: usize, k: usize, k_total: usize) -> Vec<i32> {
    let k_total = k_total as i32;
    gemm_rows(a, b, m, n, k, k, |a_row, b_row, _| {
        let differ: u32 = a_row.iter().zip(b_row).map(|(&x, &w)| (x ^ w).count_ones()).sum();
        k_total - 2 * differ as i32
    })
}

#[inline]
fn btn_row(a_row: &[u64], b_row: &[u64]) -> i32 {
    let differ: u32 = a_row
        .iter()
        .zip(b_row.chunks_exact(2))
        .map(|(&x, w)| TernaryWord::from_planes(w).binary_disagreements(x))
        .sum();
    -2 * differ as i32
}

/// Shared driver: `dot(a_row, b_row, j)` for every output cell, parallel
/// across rows of `a` once there are enough of them.
fn gemm_rows<F>(
    a: &[u64],
    b: &[u64],
    m: usize,
    n: usize,
    a_len: usize,
    b_len: usize,
    dot: F,
) -> Vec<i32>
where
    F: Fn(&[u64], &[u64], usize) -> i32 + Sync,
{
    assert!(a.len() >= m * a_len, "gemm: a too small: need {} words, got {}", m * a_len, a.len());
    assert!(b.len() >= n * b_len, "gemm: b too small: need {} words, got {}", n * b_len, b.len());

    let mut c = vec![0i32; m * n];
    if n == 0 {
        return c;
    }

    let fill = |(i, c_row): (usize, &mut [i32])| {
        let a_row = &a[i * a_len..(i + 1) * a_len];
        for (j, out) in c_row.iter_mut().enumerate() {
            *out = dot(a_row, &b[j * b_len..(j + 1) * b_len], j);
        }
    };

    if m >= PAR_ROW_THRESHOLD {
        c.par_chunks_mut(n).enumerate().for_each(fill);
    } else {
        c.chunks_mut(n).enumerate().for_each(fill);
    }
    c
}
