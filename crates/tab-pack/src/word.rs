//! 64 ternary symbols packed into two `u64` bit-planes.
//!
//! ## Plane Encoding
//!
//! | sign | nonzero | Symbol |
//! |------|---------|--------|
//! |  0   |    0    |   0    |
//! |  0   |    1    |  +1    |
//! |  1   |    1    |  -1    |
//! |  1   |    0    | invalid|
//!
//! In a packed tensor the sign plane is stored first (plane 0) and the
//! nonzero plane second (plane 1). Every product identity below gates on the
//! nonzero plane, so the invalid state contributes nothing.

/// 64 ternary symbols, bit `i` of each plane describing channel `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TernaryWord {
    /// Set where the symbol is -1.
    pub sign: u64,
    /// Set where the symbol is +1 or -1.
    pub nonzero: u64,
}

// ============================================================================
// Constructors & Validation
// ============================================================================

impl TernaryWord {
    /// All 64 symbols zero.
    pub const ZERO: Self = Self { sign: 0, nonzero: 0 };

    /// Read a word from the two consecutive planes of a packed buffer.
    #[inline]
    pub fn from_planes(planes: &[u64]) -> Self {
        Self {
            sign: planes[0],
            nonzero: planes[1],
        }
    }

    /// Positions holding the unused `(1, 0)` combination.
    #[inline]
    pub fn count_invalid(self) -> u32 {
        (self.sign & !self.nonzero).count_ones()
    }
}

// ============================================================================
// Product Identities
// ============================================================================

impl TernaryWord {
    /// Ternary · ternary over 64 positions.
    ///
    /// Positions where both are nonzero add +1 if the signs agree and -1 if
    /// they differ.
    #[inline]
    pub fn dot(self, other: Self) -> i32 {
        let both = self.nonzero & other.nonzero;
        let differ = self.sign ^ other.sign;
        let agree = !differ & both;
        let disagree = differ & both;
        agree.count_ones() as i32 - disagree.count_ones() as i32
    }

    /// Ternary · binary, where `binary` has a bit set for -1 and clear for +1.
    ///
    /// The binary side has no zero, so only this word's nonzero plane gates.
    #[inline]
    pub fn dot_binary(self, binary: u64) -> i32 {
        let differ = self.sign ^ binary;
        let agree = !differ & self.nonzero;
        let disagree = differ & self.nonzero;
        agree.count_ones() as i32 - disagree.count_ones() as i32
    }

    /// Positions where this word is nonzero and its sign differs from `binary`.
    #[inline]
    pub fn binary_disagreements(self, binary: u64) -> u32 {
        ((self.sign ^ binary) & self.nonzero).count_ones()
    }
}

// ============================================================================
// Conversion Utilities
// ============================================================================

impl TernaryWord {
    /// Symbol at `index` (0-63, LSB first). Invalid positions read as 0.
    #[inline]
    pub fn get_trit(self, index: usize) -> i8 {
        if index >= 64 {
            return 0;
        }
        let mask = 1u64 << index;
        match (self.sign & mask != 0, self.nonzero & mask != 0) {
            (false, true) => 1,
            (true, true) => -1,
            _ => 0,
        }
    }

    #[inline]
    pub fn set_trit(&mut self, index: usize, trit: i8) {
        if index >= 64 {
            return;
        }
        let mask = 1u64 << index;
        self.sign &= !mask;
        self.nonzero &= !mask;
        match trit {
            1 => self.nonzero |= mask,
            -1 => {
                self.sign |= mask;
                self.nonzero |= mask;
            }
            _ => {}
        }
    }

    /// Build from up to 64 symbols; missing positions are 0.
    pub fn from_trits(trits: &[i8]) -> Self {
        let mut word = Self::ZERO;
        for (i, &t) in trits.iter().take(64).enumerate() {
            word.set_trit(i, t);
        }
        word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_trit() {
        let mut w = TernaryWord::ZERO;
        w.set_trit(0, 1);
        w.set_trit(1, -1);
        w.set_trit(63, -1);
        assert_eq!(w.get_trit(0), 1);
        assert_eq!(w.get_trit(1), -1);
        assert_eq!(w.get_trit(2), 0);
        assert_eq!(w.get_trit(63), -1);
        w.set_trit(1, 0);
        assert_eq!(w.get_trit(1), 0);
        assert_eq!(w.count_invalid(), 0);
    }

    #[test]
    fn test_from_trits() {
        let input = [1, -1, 0, 1, -1, 0, 0, 1];
        let w = TernaryWord::from_trits(&input);
        let trits: Vec<i8> = (0..64).map(|i| w.get_trit(i)).collect();
        assert_eq!(&trits[..8], &input);
        assert!(trits[8..].iter().all(|&t| t == 0));
        assert_eq!(w, TernaryWord { sign: 0b1_0010, nonzero: 0b1001_1011 });
    }

    #[test]
    fn test_dot() {
        // [1, -1, 1, 0] . [1, 1, -1, -1] = 1 - 1 - 1 + 0 = -1
        let a = TernaryWord::from_trits(&[1, -1, 1, 0]);
        let b = TernaryWord::from_trits(&[1, 1, -1, -1]);
        assert_eq!(a.dot(b), -1);
        assert_eq!(b.dot(a), -1);
        let neg = TernaryWord::from_trits(&[-1; 64]);
        let pos = TernaryWord::from_trits(&[1; 64]);
        assert_eq!(neg.dot(neg), 64);
        assert_eq!(pos.dot(neg), -64);
    }

    #[test]
    fn test_dot_binary() {
        // binary bits: 0 -> +1, 1 -> -1; [+1, -1, -1, +1]
        let b = 0b0110u64;
        let a = TernaryWord::from_trits(&[1, -1, 1, 0]);
        // 1*1 + (-1)(-1) + 1*(-1) + 0 = 1
        assert_eq!(a.dot_binary(b), 1);
        assert_eq!(a.binary_disagreements(b), 1);
    }

    #[test]
    fn test_invalid_state_contributes_nothing() {
        let bad = TernaryWord { sign: 0b1, nonzero: 0 };
        assert_eq!(bad.count_invalid(), 1);
        assert_eq!(bad.get_trit(0), 0);
        assert_eq!(bad.dot(TernaryWord::from_trits(&[-1; 64])), 0);
        assert_eq!(bad.dot_binary(0), 0);
    }
}
