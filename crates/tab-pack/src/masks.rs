//! Bit-position masks shared by the packers.

use tab_core::WORD_BITS;

/// `BIT_MASKS[i] == 1 << i`, built at compile time and never written.
pub const BIT_MASKS: [u64; WORD_BITS] = {
    let mut masks = [0u64; WORD_BITS];
    let mut i = 0;
    while i < WORD_BITS {
        masks[i] = 1u64 << i;
        i += 1;
    }
    masks
};

/// Mask with the low `bits` bits set. `bits >= 64` gives all ones.
#[inline]
pub const fn tail_mask(bits: usize) -> u64 {
    if bits >= WORD_BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
