//! Shape metadata for the float and packed layouts.
//!
//! All index helpers are pure functions of the shape; the buffers they
//! address live in [`crate::tensor`].

use std::fmt;

use crate::conv_type::Encoding;

/// Bit width of one storage word, i.e. logical channels per packed word.
pub const WORD_BITS: usize = 64;

/// Number of words needed to pack `channels` logical channels.
#[inline]
pub fn packed_channels(channels: usize) -> usize {
    channels.div_ceil(WORD_BITS)
}

/// Symmetric zero padding added around height and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Padding {
    pub h: usize,
    pub w: usize,
}

impl Padding {
    pub const NONE: Padding = Padding { h: 0, w: 0 };

    pub fn new(h: usize, w: usize) -> Self {
        Self { h, w }
    }

    pub fn square(p: usize) -> Self {
        Self { h: p, w: p }
    }

    pub fn is_none(&self) -> bool {
        self.h == 0 && self.w == 0
    }
}

/// Window step along height and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stride {
    pub h: usize,
    pub w: usize,
}

impl Stride {
    pub fn new(h: usize, w: usize) -> Self {
        Self { h, w }
    }

    pub fn square(s: usize) -> Self {
        Self { h: s, w: s }
    }
}

impl Default for Stride {
    fn default() -> Self {
        Self { h: 1, w: 1 }
    }
}

/// Logical NCHW shape of a float tensor (channel-major).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorShape {
    pub n: usize,
    pub c: usize,
    pub h: usize,
    pub w: usize,
}

impl TensorShape {
    pub fn new(n: usize, c: usize, h: usize, w: usize) -> Self {
        Self { n, c, h, w }
    }

    pub fn numel(&self) -> usize {
        self.n * self.c * self.h * self.w
    }

    pub fn dims(&self) -> [usize; 4] {
        [self.n, self.c, self.h, self.w]
    }

    /// Flat offset of `(n, c, h, w)`.
    #[inline]
    pub fn index(&self, n: usize, c: usize, h: usize, w: usize) -> usize {
        ((n * self.c + c) * self.h + h) * self.w + w
    }

    /// Shape after adding `padding` on both sides of H and W.
    pub fn padded(&self, padding: Padding) -> Self {
        Self {
            h: self.h + 2 * padding.h,
            w: self.w + 2 * padding.w,
            ..*self
        }
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.n, self.c, self.h, self.w)
    }
}

/// Shape of a packed tensor: `(n, h, w, c, planes)` with channel groups
/// minor and planes trailing. `h` and `w` include padding, `c` counts words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedShape {
    pub n: usize,
    pub h: usize,
    pub w: usize,
    pub c: usize,
    pub planes: usize,
}

impl PackedShape {
    /// Packed layout for quantizing `shape` with the given padding.
    pub fn for_tensor(shape: TensorShape, padding: Padding, encoding: Encoding) -> Self {
        Self {
            n: shape.n,
            h: shape.h + 2 * padding.h,
            w: shape.w + 2 * padding.w,
            c: packed_channels(shape.c),
            planes: encoding.planes(),
        }
    }

    pub fn numel(&self) -> usize {
        self.n * self.h * self.w * self.c * self.planes
    }

    pub fn dims(&self) -> [usize; 5] {
        [self.n, self.h, self.w, self.c, self.planes]
    }

    /// Words stored per spatial position.
    #[inline]
    pub fn pixel_words(&self) -> usize {
        self.c * self.planes
    }

    /// Words stored per sample (or per filter).
    #[inline]
    pub fn sample_words(&self) -> usize {
        self.h * self.w * self.pixel_words()
    }

    /// Offset of the first word at spatial position `(n, h, w)`.
    #[inline]
    pub fn pixel(&self, n: usize, h: usize, w: usize) -> usize {
        ((n * self.h + h) * self.w + w) * self.pixel_words()
    }

    /// Flat offset of `(n, h, w, c, plane)`.
    #[inline]
    pub fn index(&self, n: usize, h: usize, w: usize, c: usize, plane: usize) -> usize {
        self.pixel(n, h, w) + c * self.planes + plane
    }

    /// Output height and width when sliding a `kh × kw` window with `stride`.
    ///
    /// Truncating: windows that would run past the padded edge are dropped.
    /// Returns `None` when the kernel does not fit or a stride is zero.
    pub fn output_hw(&self, kh: usize, kw: usize, stride: Stride) -> Option<(usize, usize)> {
        Some((
            output_size(self.h, kh, stride.h)?,
            output_size(self.w, kw, stride.w)?,
        ))
    }
}

impl fmt::Display for PackedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}, {}]", self.n, self.h, self.w, self.c, self.planes)
    }
}

/// `(padded - kernel + 1) / stride`, or `None` if the kernel is larger than
/// the padded extent or the stride is zero.
#[inline]
pub fn output_size(padded: usize, kernel: usize, stride: usize) -> Option<usize> {
    if stride == 0 || kernel == 0 || kernel > padded {
        return None;
    }
    Some((padded - kernel + 1) / stride)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_channels() {
        assert_eq!(packed_channels(1), 1);
        assert_eq!(packed_channels(52), 1);
        assert_eq!(packed_channels(64), 1);
        assert_eq!(packed_channels(65), 2);
        assert_eq!(packed_channels(325), 6);
    }

    #[test]
    fn test_tensor_index() {
        let s = TensorShape::new(2, 3, 4, 5);
        assert_eq!(s.numel(), 120);
        assert_eq!(s.index(0, 0, 0, 1), 1);
        assert_eq!(s.index(0, 1, 0, 0), 20);
        assert_eq!(s.index(1, 0, 0, 0), 60);
        assert_eq!(s.index(1, 2, 3, 4), 119);
    }

    #[test]
    fn test_packed_shape_with_padding() {
        let logical = TensorShape::new(2, 130, 4, 5);
        let s = PackedShape::for_tensor(logical, Padding::square(1), Encoding::Ternary);
        assert_eq!(s.dims(), [2, 6, 7, 3, 2]);
        assert_eq!(s.pixel_words(), 6);
        assert_eq!(s.sample_words(), 6 * 7 * 6);
        assert_eq!(s.numel(), 2 * 6 * 7 * 6);
        assert_eq!(s.index(0, 0, 0, 1, 1), 3);
        assert_eq!(s.index(1, 0, 0, 0, 0), s.sample_words());
        assert_eq!(s.index(1, 5, 6, 2, 1), s.numel() - 1);
    }

    #[test]
    fn test_output_size_truncates() {
        // 3x3 kernel, padding 1, stride 1 on 2x2 input: padded 4 -> 2
        assert_eq!(output_size(4, 3, 1), Some(2));
        // 224 + 2 - 3 + 1 = 224, / 4 = 56
        assert_eq!(output_size(226, 3, 4), Some(56));
        // stride 3: 224 / 3 = 74
        assert_eq!(output_size(226, 3, 3), Some(74));
        assert_eq!(output_size(2, 3, 1), None);
        assert_eq!(output_size(4, 3, 0), None);
    }

    #[test]
    fn test_output_hw() {
        let logical = TensorShape::new(1, 80, 224, 224);
        let s = PackedShape::for_tensor(logical, Padding::square(1), Encoding::Binary);
        assert_eq!(s.output_hw(3, 3, Stride::square(4)), Some((56, 56)));
        assert_eq!(s.output_hw(3, 3, Stride::new(1, 2)), Some((224, 112)));
    }
}
