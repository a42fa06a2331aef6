//! Per-filter constant for the BTN kernel.
//!
//! A binary activation times a ternary weight is `w` where the activation is
//! +1 and `-w` where it is -1. Summed over a filter's nonzero positions this
//! is `nonzero_count - 2 × disagreements`, so each filter needs its count of
//! nonzero symbols (bits of plane 1) added to the raw GEMM output.

use tab_core::{Encoding, PackedTensor};

/// Nonzero-symbol count of each of `kn` packed ternary filters.
///
/// `words` holds `kn` filters of `kh × kw × c_packed` interleaved
/// `(sign, nonzero)` pairs each, as produced by `ternarize` with no padding.
///
/// # Panics
/// If `words` is shorter than the filters it is said to hold.
pub fn count_correction_bits(
    words: &[u64],
    kn: usize,
    c_packed: usize,
    kh: usize,
    kw: usize,
) -> Vec<i32> {
    let filter_words = kh * kw * c_packed * Encoding::Ternary.planes();
    assert!(
        words.len() >= kn * filter_words,
        "count_correction_bits: need {} words, got {}",
        kn * filter_words,
        words.len()
    );
    if filter_words == 0 {
        return vec![0; kn];
    }

    words
        .chunks_exact(filter_words)
        .take(kn)
        .map(|filter| filter.chunks_exact(2).map(|pair| pair[1].count_ones() as i32).sum())
        .collect()
}

/// [`count_correction_bits`] over a packed ternary filter tensor.
///
/// # Panics
/// If `filters` is not ternary.
pub fn correction_counts(filters: &PackedTensor) -> Vec<i32> {
    assert_eq!(
        filters.encoding(),
        Encoding::Ternary,
        "correction counts need ternary filters"
    );
    let shape = filters.shape();
    count_correction_bits(filters.words(), shape.n, shape.c, shape.h, shape.w)
}
