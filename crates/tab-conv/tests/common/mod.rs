//! Shared fixtures: symbolic tensors and a one-call pipeline check.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tab_conv::reference::{compare, compare_interior, direct_conv2d, pad};
use tab_conv::{convolve, ConvParams, FilterBank};
use tab_core::{ConvType, Encoding, FloatTensor, Padding, Stride, TensorShape};

/// One layer: `c, h, w, kn, kh, kw, p, s`.
#[derive(Debug, Clone, Copy)]
pub struct Layer {
    pub c: usize,
    pub h: usize,
    pub w: usize,
    pub kn: usize,
    pub kh: usize,
    pub kw: usize,
    pub p: usize,
    pub s: usize,
}

impl Layer {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        c: usize,
        h: usize,
        w: usize,
        kn: usize,
        kh: usize,
        kw: usize,
        p: usize,
        s: usize,
    ) -> Self {
        Self { c, h, w, kn, kh, kw, p, s }
    }

    pub fn params(&self) -> ConvParams {
        ConvParams::new(Padding::square(self.p), Stride::square(self.s))
    }
}

/// Values drawn from {-1, 0, +1} (ternary) or {-1, +1} (binary).
pub fn symbols(rng: &mut StdRng, shape: TensorShape, encoding: Encoding) -> FloatTensor {
    let data = (0..shape.numel())
        .map(|_| match encoding {
            Encoding::Ternary => rng.gen_range(-1i32..=1) as f32,
            Encoding::Binary => {
                if rng.gen_bool(0.5) {
                    1.0
                } else {
                    -1.0
                }
            }
        })
        .collect();
    FloatTensor::from_vec(data, shape).unwrap()
}

pub struct Outcome {
    pub actual: FloatTensor,
    pub expected: FloatTensor,
    pub passed: bool,
}

/// Run `conv_type` on random symbols and compare with the direct
/// convolution, skipping the padded border for binary activations.
pub fn run_layer(layer: Layer, batch: usize, conv_type: ConvType, seed: u64) -> Outcome {
    const THRESHOLD: f32 = 0.5;
    let mut rng = StdRng::seed_from_u64(seed);

    let x = symbols(
        &mut rng,
        TensorShape::new(batch, layer.c, layer.h, layer.w),
        conv_type.activation_encoding(),
    );
    let w = symbols(
        &mut rng,
        TensorShape::new(layer.kn, layer.c, layer.kh, layer.kw),
        conv_type.weight_encoding(),
    );
    let bank = match conv_type.weight_encoding() {
        Encoding::Ternary => FilterBank::ternary(&w, &vec![THRESHOLD; layer.kn]).unwrap(),
        Encoding::Binary => FilterBank::binary(&w, None).unwrap(),
    };

    let params = layer.params();
    let weights = bank.weights(conv_type).unwrap();
    let actual = convolve(&x, &vec![THRESHOLD; batch], weights, &params).unwrap();
    let expected = direct_conv2d(&pad(&x, params.padding), &w, params.stride).unwrap();

    let passed = if conv_type.pads_with_ones() && !params.padding.is_none() {
        compare_interior(&actual, &expected, params.padding)
    } else {
        compare(&actual, &expected)
    };
    Outcome { actual, expected, passed }
}
