//! Offline filter preparation.
//!
//! Filters are quantized once with the same packers as activations (no
//! padding, one threshold per filter) and reused across calls. A ternary
//! bank also carries its BTN correction counts so they are computed once.

use tab_core::{ConvType, Encoding, FloatTensor, PackedTensor, Padding, Result, TabError};
use tab_kernels::correction_counts;
use tab_pack::{binarize, ternarize, TernaryWord};

use crate::conv::ConvWeights;

/// Packed filters `[KN, KH, KW, C_packed, planes]` plus derived constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBank {
    filters: PackedTensor,
    correction: Option<Vec<i32>>,
}

impl FilterBank {
    /// Ternarize `[KN, C, KH, KW]` weights with one positive threshold per filter.
    pub fn ternary(weights: &FloatTensor, thresholds: &[f32]) -> Result<Self> {
        check_thresholds(thresholds, weights.shape().n, true)?;
        Ok(Self::from_packed_unchecked(ternarize(weights, Padding::NONE, thresholds)))
    }

    /// Binarize `[KN, C, KH, KW]` weights; `None` thresholds at 0.
    pub fn binary(weights: &FloatTensor, thresholds: Option<&[f32]>) -> Result<Self> {
        if let Some(ths) = thresholds {
            check_thresholds(ths, weights.shape().n, false)?;
        }
        Ok(Self::from_packed_unchecked(binarize(weights, Padding::NONE, thresholds)))
    }

    /// Adopt filters packed elsewhere.
    ///
    /// Fails if the tensor carries padding or, for ternary filters, holds
    /// the unused `(1, 0)` plane state.
    pub fn from_packed(filters: PackedTensor) -> Result<Self> {
        if !filters.padding().is_none() {
            return Err(TabError::InvalidGeometry(format!(
                "packed filters must be unpadded, got {:?}",
                filters.padding()
            )));
        }
        if filters.encoding() == Encoding::Ternary {
            let invalid: u32 = filters
                .words()
                .chunks_exact(2)
                .map(|p| TernaryWord::from_planes(p).count_invalid())
                .sum();
            if invalid > 0 {
                return Err(TabError::InvalidGeometry(format!(
                    "packed ternary filters hold {invalid} symbols in the (1, 0) plane state"
                )));
            }
        }
        Ok(Self::from_packed_unchecked(filters))
    }

    fn from_packed_unchecked(filters: PackedTensor) -> Self {
        let correction = match filters.encoding() {
            Encoding::Ternary => Some(correction_counts(&filters)),
            Encoding::Binary => None,
        };
        Self { filters, correction }
    }

    pub fn encoding(&self) -> Encoding {
        self.filters.encoding()
    }

    pub fn filters(&self) -> &PackedTensor {
        &self.filters
    }

    /// Per-filter nonzero counts; present for ternary banks only.
    pub fn correction(&self) -> Option<&[i32]> {
        self.correction.as_deref()
    }

    pub fn num_filters(&self) -> usize {
        self.filters.shape().n
    }

    /// Logical input channels each filter spans.
    pub fn channels(&self) -> usize {
        self.filters.channels()
    }

    /// `(KH, KW)`.
    pub fn kernel(&self) -> (usize, usize) {
        let shape = self.filters.shape();
        (shape.h, shape.w)
    }

    /// Borrow this bank as the weight operand for `conv_type`.
    pub fn weights(&self, conv_type: ConvType) -> Result<ConvWeights<'_>> {
        let expected = conv_type.weight_encoding();
        if self.encoding() != expected {
            return Err(TabError::EncodingMismatch { expected, got: self.encoding() });
        }
        let filters = &self.filters;
        Ok(match conv_type {
            ConvType::Tnn => ConvWeights::Tnn { filters },
            ConvType::Tbn => ConvWeights::Tbn { filters },
            ConvType::Btn => ConvWeights::Btn {
                filters,
                correction: self.correction.as_deref().unwrap_or_default(),
            },
            ConvType::Bnn => ConvWeights::Bnn { filters },
        })
    }
}

/// Thresholds must cover every sample and be finite; ternary ones must be
/// strictly positive.
pub(crate) fn check_thresholds(thresholds: &[f32], n: usize, ternary: bool) -> Result<()> {
    if thresholds.len() < n {
        return Err(TabError::ThresholdCount { expected: n, got: thresholds.len() });
    }
    for (index, &value) in thresholds.iter().take(n).enumerate() {
        if !value.is_finite() || (ternary && value <= 0.0) {
            return Err(TabError::InvalidThreshold { index, value });
        }
    }
    Ok(())
}
