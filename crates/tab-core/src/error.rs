use thiserror::Error;

use crate::conv_type::Encoding;

/// Errors raised when a caller hands the convolution pipeline buffers whose
/// shapes or encodings do not agree.
///
/// Kernels never produce these: they are reported once, at the public entry
/// points, before any work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TabError {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    #[error("encoding mismatch: expected {expected}, got {got}")]
    EncodingMismatch { expected: Encoding, got: Encoding },

    #[error("expected at least {expected} thresholds, got {got}")]
    ThresholdCount { expected: usize, got: usize },

    #[error("threshold {index} is {value}: must be finite, and positive for ternary")]
    InvalidThreshold { index: usize, value: f32 },

    #[error("invalid convolution geometry: {0}")]
    InvalidGeometry(String),

    #[error("{what}: expected {expected} elements, got {got}")]
    BufferSize {
        what: &'static str,
        expected: usize,
        got: usize,
    },
}
