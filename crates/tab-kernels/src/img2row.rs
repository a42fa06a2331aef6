//! Sliding-window extraction over packed activations (im2row).
//!
//! Row `r = (n * OH + oh) * OW + ow` of the result is the concatenation, in
//! `(kh, kw)` order, of the packed words of every pixel under the kernel
//! window at output position `(oh, ow)`. Each pixel contributes
//! `C_packed × planes` words, so a row holds `KH × KW × C_packed × planes`.
//! The filter tensor already stores each filter in exactly this order, which
//! lets the GEMM compare a row word-for-word with a filter.

use rayon::prelude::*;

use tab_core::{PackedTensor, Stride, WindowMatrix};

use crate::PAR_ROW_THRESHOLD;

/// Build the window matrix for a `kh × kw` kernel at `stride`.
///
/// `packed` must already carry the convolution padding.
///
/// # Panics
/// If the kernel does not fit the padded input or the stride is zero.
pub fn img2row(packed: &PackedTensor, kh: usize, kw: usize, stride: Stride) -> WindowMatrix {
    let shape = packed.shape();
    let Some((oh, ow)) = shape.output_hw(kh, kw, stride) else {
        panic!("img2row: {kh}x{kw} kernel with {stride:?} does not fit {shape}");
    };

    let pixel_words = shape.pixel_words();
    let rows = shape.n * oh * ow;
    let cols = kh * kw * pixel_words;
    tracing::trace!(rows, cols, oh, ow, "img2row");

    let mut words = vec![0u64; rows * cols];
    if cols == 0 {
        return WindowMatrix::new(words, rows, cols, shape.planes);
    }

    let fill = |(r, row): (usize, &mut [u64])| {
        let n = r / (oh * ow);
        let y = (r / ow) % oh;
        let x = r % ow;
        for i in 0..kh {
            for j in 0..kw {
                let src = packed.pixel_words(n, y * stride.h + i, x * stride.w + j);
                let at = (i * kw + j) * pixel_words;
                row[at..at + pixel_words].copy_from_slice(src);
            }
        }
    };

    if rows >= PAR_ROW_THRESHOLD {
        words.par_chunks_mut(cols).enumerate().for_each(fill);
    } else {
        words.chunks_mut(cols).enumerate().for_each(fill);
    }

    WindowMatrix::new(words, rows, cols, shape.planes)
}
