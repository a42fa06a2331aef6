//! The convolution entry point: quantize → im2row → bitwise GEMM → activate.

use tab_core::{
    ConvType, Encoding, FloatTensor, PackedTensor, Padding, Result, Stride, TabError, TensorShape,
};
use tab_kernels::{activate, img2row, BitwiseGemm};
use tab_pack::{binarize, ternarize};

use crate::filters::check_thresholds;

/// Per-layer geometry and activation slope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvParams {
    pub padding: Padding,
    pub stride: Stride,
    /// PReLU slope for negative outputs; 1.0 leaves the accumulator as is.
    pub alpha: f32,
}

impl ConvParams {
    pub fn new(padding: Padding, stride: Stride) -> Self {
        Self { padding, stride, alpha: 1.0 }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}

impl Default for ConvParams {
    fn default() -> Self {
        Self::new(Padding::NONE, Stride::default())
    }
}

/// Pre-packed filters tagged with the conv type they serve.
///
/// BTN carries the per-filter correction counts it cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvWeights<'a> {
    Tnn { filters: &'a PackedTensor },
    Tbn { filters: &'a PackedTensor },
    Btn { filters: &'a PackedTensor, correction: &'a [i32] },
    Bnn { filters: &'a PackedTensor },
}

impl<'a> ConvWeights<'a> {
    pub fn conv_type(&self) -> ConvType {
        match self {
            ConvWeights::Tnn { .. } => ConvType::Tnn,
            ConvWeights::Tbn { .. } => ConvType::Tbn,
            ConvWeights::Btn { .. } => ConvType::Btn,
            ConvWeights::Bnn { .. } => ConvType::Bnn,
        }
    }

    pub fn filters(&self) -> &'a PackedTensor {
        match *self {
            ConvWeights::Tnn { filters }
            | ConvWeights::Tbn { filters }
            | ConvWeights::Btn { filters, .. }
            | ConvWeights::Bnn { filters } => filters,
        }
    }

    fn gemm(&self) -> BitwiseGemm<'a> {
        match *self {
            ConvWeights::Tnn { .. } => BitwiseGemm::Tnn,
            ConvWeights::Tbn { .. } => BitwiseGemm::Tbn,
            ConvWeights::Btn { correction, .. } => BitwiseGemm::Btn { correction },
            ConvWeights::Bnn { filters } => {
                let shape = filters.shape();
                BitwiseGemm::Bnn { k_total: filters.channels() * shape.h * shape.w }
            }
        }
    }
}

/// Output shape `[N, KN, OH, OW]` of a convolution, if the kernel fits.
pub fn output_shape(
    input: TensorShape,
    filters: &PackedTensor,
    params: &ConvParams,
) -> Option<TensorShape> {
    let fshape = filters.shape();
    let padded = input.padded(params.padding);
    let oh = tab_core::shape::output_size(padded.h, fshape.h, params.stride.h)?;
    let ow = tab_core::shape::output_size(padded.w, fshape.w, params.stride.w)?;
    Some(TensorShape::new(input.n, fshape.n, oh, ow))
}

/// Convolve a float NCHW `input` with pre-packed `weights`.
///
/// `thresholds[n]` quantizes sample `n` of the input: ternary conv types
/// need it strictly positive, binary ones binarize at `v < thresholds[n]`.
///
/// Returns `[N, KN, OH, OW]` with `OH = (H + 2·pad_h − KH + 1) / stride_h`.
pub fn convolve(
    input: &FloatTensor,
    thresholds: &[f32],
    weights: ConvWeights<'_>,
    params: &ConvParams,
) -> Result<FloatTensor> {
    let conv_type = weights.conv_type();
    let filters = weights.filters();
    let out_shape = validate(input, thresholds, &weights, params)?;

    let fshape = filters.shape();
    tracing::debug!(
        %conv_type,
        input = %input.shape(),
        filters = %fshape,
        padding = ?params.padding,
        stride = ?params.stride,
        output = %out_shape,
        "convolve"
    );

    let packed = match conv_type.activation_encoding() {
        Encoding::Ternary => ternarize(input, params.padding, thresholds),
        Encoding::Binary => binarize(input, params.padding, Some(thresholds)),
    };
    tracing::trace!(words = packed.words().len(), "quantized activations");

    let windows = img2row(&packed, fshape.h, fshape.w, params.stride);
    tracing::trace!(rows = windows.rows(), cols = windows.cols(), "extracted windows");

    let acc = weights.gemm().run(
        windows.words(),
        filters.words(),
        windows.rows(),
        fshape.n,
        windows.words_per_plane(),
    );
    tracing::trace!(cells = acc.len(), "bitwise gemm");

    Ok(activate(&acc, out_shape, params.alpha))
}

fn validate(
    input: &FloatTensor,
    thresholds: &[f32],
    weights: &ConvWeights<'_>,
    params: &ConvParams,
) -> Result<TensorShape> {
    let conv_type = weights.conv_type();
    let filters = weights.filters();
    let shape = input.shape();

    let expected = conv_type.weight_encoding();
    if filters.encoding() != expected {
        return Err(TabError::EncodingMismatch { expected, got: filters.encoding() });
    }
    if !filters.padding().is_none() {
        return Err(TabError::InvalidGeometry(format!(
            "filters must be packed without padding, got {:?}",
            filters.padding()
        )));
    }
    if filters.channels() != shape.c {
        return Err(TabError::ShapeMismatch {
            expected: vec![shape.c],
            got: vec![filters.channels()],
        });
    }
    if let ConvWeights::Btn { correction, .. } = weights {
        if correction.len() != filters.shape().n {
            return Err(TabError::ShapeMismatch {
                expected: vec![filters.shape().n],
                got: vec![correction.len()],
            });
        }
    }

    check_thresholds(thresholds, shape.n, conv_type.activation_encoding().has_zero())?;

    if params.stride.h == 0 || params.stride.w == 0 {
        return Err(TabError::InvalidGeometry(format!(
            "stride must be at least 1, got {:?}",
            params.stride
        )));
    }
    output_shape(shape, filters, params).ok_or_else(|| {
        let fshape = filters.shape();
        TabError::InvalidGeometry(format!(
            "{}x{} kernel does not fit {} with {:?}",
            fshape.h,
            fshape.w,
            shape.padded(params.padding),
            params.padding
        ))
    })
}
