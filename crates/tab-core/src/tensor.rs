//! Owned buffers that travel through the pipeline, each paired with the
//! shape metadata that addresses it.

use crate::conv_type::Encoding;
use crate::error::TabError;
use crate::shape::{PackedShape, Padding, TensorShape};
use crate::Result;

/// A dense f32 tensor in NCHW order.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatTensor {
    data: Vec<f32>,
    shape: TensorShape,
}

impl FloatTensor {
    /// Wrap `data`, checking it holds exactly `shape.numel()` values.
    pub fn from_vec(data: Vec<f32>, shape: TensorShape) -> Result<Self> {
        if data.len() != shape.numel() {
            return Err(TabError::BufferSize {
                what: "float tensor",
                expected: shape.numel(),
                got: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    pub fn zeros(shape: TensorShape) -> Self {
        Self { data: vec![0.0; shape.numel()], shape }
    }

    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn get(&self, n: usize, c: usize, h: usize, w: usize) -> f32 {
        self.data[self.shape.index(n, c, h, w)]
    }
}

/// A bit-packed tensor in `(n, h, w, c, planes)` order.
///
/// Besides the packed shape it remembers the logical channel count and the
/// padding applied at pack time, so consumers can tell meaningful bits from
/// the zero fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedTensor {
    words: Vec<u64>,
    shape: PackedShape,
    channels: usize,
    padding: Padding,
    encoding: Encoding,
}

impl PackedTensor {
    /// All-zero packed buffer for a tensor of `logical` shape.
    ///
    /// Zero is the pad value for both encodings: ternary 0, binary +1.
    pub fn zeros(logical: TensorShape, padding: Padding, encoding: Encoding) -> Self {
        let shape = PackedShape::for_tensor(logical, padding, encoding);
        Self {
            words: vec![0; shape.numel()],
            shape,
            channels: logical.c,
            padding,
            encoding,
        }
    }

    /// Adopt words that were packed elsewhere (e.g. filters loaded from disk).
    pub fn from_words(
        words: Vec<u64>,
        logical: TensorShape,
        padding: Padding,
        encoding: Encoding,
    ) -> Result<Self> {
        let shape = PackedShape::for_tensor(logical, padding, encoding);
        if words.len() != shape.numel() {
            return Err(TabError::BufferSize {
                what: "packed tensor",
                expected: shape.numel(),
                got: words.len(),
            });
        }
        Ok(Self {
            words,
            shape,
            channels: logical.c,
            padding,
            encoding,
        })
    }

    pub fn shape(&self) -> PackedShape {
        self.shape
    }

    /// The unpadded NCHW shape this tensor was packed from.
    pub fn logical_shape(&self) -> TensorShape {
        TensorShape::new(
            self.shape.n,
            self.channels,
            self.shape.h - 2 * self.padding.h,
            self.shape.w - 2 * self.padding.w,
        )
    }

    /// Logical (unpacked) channel count.
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut [u64] {
        &mut self.words
    }

    pub fn into_words(self) -> Vec<u64> {
        self.words
    }

    /// All words at spatial position `(n, h, w)`: `c × planes` of them.
    #[inline]
    pub fn pixel_words(&self, n: usize, h: usize, w: usize) -> &[u64] {
        let start = self.shape.pixel(n, h, w);
        &self.words[start..start + self.shape.pixel_words()]
    }

    /// All words belonging to sample (or filter) `n`.
    #[inline]
    pub fn sample_words(&self, n: usize) -> &[u64] {
        let len = self.shape.sample_words();
        &self.words[n * len..(n + 1) * len]
    }
}

/// Row-major matrix of packed words, one row per output position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowMatrix {
    words: Vec<u64>,
    rows: usize,
    cols: usize,
    planes: usize,
}

impl WindowMatrix {
    /// # Panics
    /// If `words.len() != rows * cols` or `cols` is not a multiple of `planes`.
    pub fn new(words: Vec<u64>, rows: usize, cols: usize, planes: usize) -> Self {
        assert_eq!(words.len(), rows * cols, "window matrix needs {rows}x{cols} words");
        assert!(planes > 0 && cols % planes == 0, "cols {cols} not divisible by {planes} planes");
        Self { words, rows, cols, planes }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Words per row, across all planes.
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn planes(&self) -> usize {
        self.planes
    }

    /// Words per row per plane: the `K` of the bitwise GEMM.
    pub fn words_per_plane(&self) -> usize {
        self.cols / self.planes
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    #[inline]
    pub fn row(&self, r: usize) -> &[u64] {
        &self.words[r * self.cols..(r + 1) * self.cols]
    }
}
