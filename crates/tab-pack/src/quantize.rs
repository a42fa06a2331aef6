//! NCHW float tensors → channel-packed ternary/binary words.
//!
//! One routine serves activations (one threshold per batch sample) and
//! filters (one threshold per filter): the threshold is indexed by the
//! leading dimension either way.
//!
//! Each spatial position is packed in two passes: whole 64-channel groups,
//! then the remaining `C % 64` channels into the low bits of one more word.
//! The output starts zeroed, so the high bits of that last word and every
//! padded position keep the zero fill.

use rayon::prelude::*;

use tab_core::{Encoding, FloatTensor, PackedTensor, Padding, WORD_BITS};

use crate::masks::BIT_MASKS;
use crate::word::TernaryWord;

/// Quantize to {-1, 0, +1} with per-sample thresholds.
///
/// `v > t` packs +1 as `(0, 1)`, `v < -t` packs -1 as `(1, 1)`, anything
/// else packs 0 as `(0, 0)`.
///
/// # Panics
/// If `thresholds` has fewer than `x.shape().n` entries.
pub fn ternarize(x: &FloatTensor, padding: Padding, thresholds: &[f32]) -> PackedTensor {
    let shape = x.shape();
    assert!(
        thresholds.len() >= shape.n,
        "ternarize: need {} thresholds, got {}",
        shape.n,
        thresholds.len()
    );
    tracing::trace!(%shape, ?padding, "ternarize");

    let mut packed = PackedTensor::zeros(shape, padding, Encoding::Ternary);
    pack_samples(x, &mut packed, |values, start, step, bits, n, out| {
        let word = ternary_group(values, start, step, bits, thresholds[n]);
        out[0] = word.sign;
        out[1] = word.nonzero;
    });
    packed
}

/// Quantize to {-1, +1}: a bit is set (meaning -1) where `v < threshold`.
///
/// `None` uses a threshold of 0 for every sample.
///
/// # Panics
/// If `thresholds` is given with fewer than `x.shape().n` entries.
pub fn binarize(x: &FloatTensor, padding: Padding, thresholds: Option<&[f32]>) -> PackedTensor {
    let shape = x.shape();
    if let Some(ths) = thresholds {
        assert!(
            ths.len() >= shape.n,
            "binarize: need {} thresholds, got {}",
            shape.n,
            ths.len()
        );
    }
    tracing::trace!(%shape, ?padding, explicit_thresholds = thresholds.is_some(), "binarize");

    let mut packed = PackedTensor::zeros(shape, padding, Encoding::Binary);
    pack_samples(x, &mut packed, |values, start, step, bits, n, out| {
        let threshold = thresholds.map_or(0.0, |ths| ths[n]);
        out[0] = binary_group(values, start, step, bits, threshold);
    });
    packed
}

/// Walk every (sample, row, col, channel group) of the unpadded interior and
/// let `pack` fill the `planes` words of that group.
///
/// `pack(values, start, step, bits, n, out)` reads channel `start + i * step`
/// for `i < bits` and writes `out[..planes]`.
fn pack_samples<F>(x: &FloatTensor, packed: &mut PackedTensor, pack: F)
where
    F: Fn(&[f32], usize, usize, usize, usize, &mut [u64]) + Sync,
{
    let shape = x.shape();
    let pshape = packed.shape();
    let padding = packed.padding();
    let planes = pshape.planes;
    let sample_words = pshape.sample_words();
    if sample_words == 0 {
        return;
    }

    let full_groups = shape.c / WORD_BITS;
    let rem = shape.c % WORD_BITS;
    let channel_step = shape.h * shape.w;
    let values = x.data();

    packed
        .words_mut()
        .par_chunks_mut(sample_words)
        .enumerate()
        .for_each(|(n, sample)| {
            for h in 0..shape.h {
                for w in 0..shape.w {
                    // pixel() with n = 0 addresses within this sample's chunk
                    let pixel = pshape.pixel(0, h + padding.h, w + padding.w);

                    for g in 0..full_groups {
                        let start = shape.index(n, g * WORD_BITS, h, w);
                        let at = pixel + g * planes;
                        let out = &mut sample[at..at + planes];
                        pack(values, start, channel_step, WORD_BITS, n, out);
                    }

                    if rem > 0 {
                        let start = shape.index(n, full_groups * WORD_BITS, h, w);
                        let at = pixel + full_groups * planes;
                        pack(values, start, channel_step, rem, n, &mut sample[at..at + planes]);
                    }
                }
            }
        });
}

#[inline]
fn ternary_group(
    values: &[f32],
    start: usize,
    step: usize,
    bits: usize,
    threshold: f32,
) -> TernaryWord {
    let mut word = TernaryWord::ZERO;
    for (bit, &mask) in BIT_MASKS.iter().enumerate().take(bits) {
        let v = values[start + bit * step];
        if v > threshold {
            word.nonzero |= mask;
        } else if v < -threshold {
            word.sign |= mask;
            word.nonzero |= mask;
        }
    }
    word
}

#[inline]
fn binary_group(values: &[f32], start: usize, step: usize, bits: usize, threshold: f32) -> u64 {
    let mut word = 0u64;
    for (bit, &mask) in BIT_MASKS.iter().enumerate().take(bits) {
        if values[start + bit * step] < threshold {
            word |= mask;
        }
    }
    word
}
