//! Packed words → symbols, for verification and debugging.

use tab_core::{Encoding, PackedTensor, WORD_BITS};

use crate::masks::tail_mask;
use crate::word::TernaryWord;

/// Decode the unpadded interior back to NCHW symbols in {-1, 0, +1}.
///
/// Binary tensors decode to {-1, +1} only.
pub fn unpack(packed: &PackedTensor) -> Vec<i8> {
    let logical = packed.logical_shape();
    let padding = packed.padding();
    let planes = packed.shape().planes;
    let mut out = vec![0i8; logical.numel()];

    for n in 0..logical.n {
        for h in 0..logical.h {
            for w in 0..logical.w {
                let pixel = packed.pixel_words(n, h + padding.h, w + padding.w);
                for c in 0..logical.c {
                    let group = &pixel[(c / WORD_BITS) * planes..];
                    let bit = c % WORD_BITS;
                    out[logical.index(n, c, h, w)] = match packed.encoding() {
                        Encoding::Ternary => TernaryWord::from_planes(group).get_trit(bit),
                        Encoding::Binary => {
                            if (group[0] >> bit) & 1 == 1 {
                                -1
                            } else {
                                1
                            }
                        }
                    };
                }
            }
        }
    }
    out
}

/// Whether every bit above channel `C` in each position's last word is zero.
///
/// Popcount reductions over whole words rely on this.
pub fn tail_bits_clear(packed: &PackedTensor) -> bool {
    let rem = packed.channels() % WORD_BITS;
    if rem == 0 {
        return true;
    }
    let shape = packed.shape();
    let high = !tail_mask(rem);
    let last = (shape.c - 1) * shape.planes;
    packed
        .words()
        .chunks_exact(shape.pixel_words())
        .all(|pixel| pixel[last..].iter().all(|&w| w & high == 0))
}

/// Whether every word in the padded border is zero.
pub fn padding_clear(packed: &PackedTensor) -> bool {
    let shape = packed.shape();
    let padding = packed.padding();
    for n in 0..shape.n {
        for h in 0..shape.h {
            for w in 0..shape.w {
                let interior = h >= padding.h
                    && h < shape.h - padding.h
                    && w >= padding.w
                    && w < shape.w - padding.w;
                if !interior && packed.pixel_words(n, h, w).iter().any(|&word| word != 0) {
                    return false;
                }
            }
        }
    }
    true
}
