//! End-to-end checks of `convolve` against a direct convolution over the
//! same quantized symbols.

mod common;

use common::{run_layer, symbols, Layer};
use rand::rngs::StdRng;
use rand::SeedableRng;

use tab_conv::{convolve, output_shape, ConvParams, FilterBank};
use tab_core::{ConvType, Encoding, FloatTensor, Padding, Stride, TensorShape};
use tab_kernels::{btn_gemm, btn_gemm_raw, img2row};
use tab_pack::binarize;

/// Verification layers at sizes a debug build gets through quickly; each row
/// keeps the feature of its full-size counterpart (partial channel words,
/// stride truncation, non-square kernels, padding wider than the image).
const LAYERS: [Layer; 9] = [
    Layer::new(1, 2, 2, 1, 3, 3, 1, 1),
    Layer::new(64, 12, 16, 64, 1, 1, 0, 1),
    Layer::new(32, 12, 16, 52, 1, 1, 0, 2),
    Layer::new(70, 9, 9, 10, 3, 3, 1, 1),
    Layer::new(160, 12, 10, 8, 3, 3, 0, 2),
    Layer::new(65, 12, 9, 5, 5, 7, 3, 4),
    Layer::new(32, 1, 1, 120, 1, 1, 0, 1),
    Layer::new(200, 1, 1, 64, 1, 1, 0, 1),
    Layer::new(130, 1, 1, 40, 1, 1, 2, 3),
];

#[test]
fn verification_layers_match_direct_conv() {
    for (i, layer) in LAYERS.iter().enumerate() {
        for conv_type in ConvType::ALL {
            let outcome = run_layer(*layer, 2, conv_type, 42 + i as u64);
            assert!(outcome.passed, "layer {i} {layer:?} {conv_type}");
        }
    }
}

#[test]
fn smallest_padded_ternary_by_hand() {
    // input  [ 1 -1 ]    kernel [  1  0 -1 ]
    //        [ 0  1 ]           [ -1  1  0 ]
    //                           [  0  1  1 ]
    let x = FloatTensor::from_vec(vec![1.0, -1.0, 0.0, 1.0], TensorShape::new(1, 1, 2, 2)).unwrap();
    let w = FloatTensor::from_vec(
        vec![1.0, 0.0, -1.0, -1.0, 1.0, 0.0, 0.0, 1.0, 1.0],
        TensorShape::new(1, 1, 3, 3),
    )
    .unwrap();
    let bank = FilterBank::ternary(&w, &[0.5]).unwrap();
    let params = ConvParams::new(Padding::square(1), Stride::default());

    let y = convolve(&x, &[0.5], bank.weights(ConvType::Tnn).unwrap(), &params).unwrap();
    assert_eq!(y.shape(), TensorShape::new(1, 1, 2, 2));
    assert_eq!(y.data(), &[2.0, -1.0, 1.0, 2.0]);
}

#[test]
fn full_word_and_partial_word_channels() {
    for c in [64usize, 52] {
        let layer = Layer::new(c, 5, 4, 6, 3, 3, 1, 1);
        for conv_type in ConvType::ALL {
            let outcome = run_layer(layer, 1, conv_type, 7);
            assert!(outcome.passed, "c = {c} {conv_type}");
        }
    }
}

#[test]
fn partial_word_channels_agree_with_zero_extended_input() {
    // the same 52 channels, once alone and once followed by 12 zero channels
    let mut rng = StdRng::seed_from_u64(11);
    let x52 = symbols(&mut rng, TensorShape::new(1, 52, 3, 3), Encoding::Ternary);
    let w52 = symbols(&mut rng, TensorShape::new(4, 52, 1, 1), Encoding::Ternary);

    let widen = |t: &FloatTensor| {
        let s = t.shape();
        let wide = TensorShape::new(s.n, 64, s.h, s.w);
        let mut data = vec![0.0; wide.numel()];
        for n in 0..s.n {
            for c in 0..s.c {
                for h in 0..s.h {
                    for w in 0..s.w {
                        data[wide.index(n, c, h, w)] = t.get(n, c, h, w);
                    }
                }
            }
        }
        FloatTensor::from_vec(data, wide).unwrap()
    };
    let x64 = widen(&x52);
    let w64 = widen(&w52);

    let params = ConvParams::default();
    let run = |x: &FloatTensor, w: &FloatTensor| {
        let bank = FilterBank::ternary(w, &[0.5; 4]).unwrap();
        convolve(x, &[0.5], bank.weights(ConvType::Tnn).unwrap(), &params).unwrap()
    };
    assert_eq!(run(&x52, &w52), run(&x64, &w64));
}

#[test]
fn bnn_stride_four_output_shape() {
    let shape = TensorShape::new(1, 80, 224, 224);
    let x = FloatTensor::from_vec(vec![1.0; shape.numel()], shape).unwrap();
    let w = FloatTensor::from_vec(vec![-1.0; 80 * 80 * 9], TensorShape::new(80, 80, 3, 3)).unwrap();
    let bank = FilterBank::binary(&w, None).unwrap();
    let params = ConvParams::new(Padding::square(1), Stride::square(4));

    assert_eq!(
        output_shape(shape, bank.filters(), &params),
        Some(TensorShape::new(1, 80, 56, 56))
    );
    let y = convolve(&x, &[0.5], bank.weights(ConvType::Bnn).unwrap(), &params).unwrap();
    assert_eq!(y.shape(), TensorShape::new(1, 80, 56, 56));
    // padding reads as +1 too, so every window is uniformly -1 · +1
    assert!(y.data().iter().all(|&v| v == -720.0));
}

#[test]
fn binary_border_diverges_but_interior_matches() {
    let layer = Layer::new(3, 5, 5, 2, 3, 3, 1, 1);
    for conv_type in [ConvType::Btn, ConvType::Bnn] {
        let outcome = run_layer(layer, 1, conv_type, 3);
        assert!(outcome.passed, "{conv_type}");

        // all-ones input makes every border window differ from zero padding
        let x = FloatTensor::from_vec(vec![1.0; 75], TensorShape::new(1, 3, 5, 5)).unwrap();
        let w = FloatTensor::from_vec(vec![1.0; 54], TensorShape::new(2, 3, 3, 3)).unwrap();
        let bank = match conv_type.weight_encoding() {
            Encoding::Ternary => FilterBank::ternary(&w, &[0.5, 0.5]).unwrap(),
            Encoding::Binary => FilterBank::binary(&w, None).unwrap(),
        };
        let y = convolve(&x, &[0.5], bank.weights(conv_type).unwrap(), &layer.params()).unwrap();
        assert_eq!(y.get(0, 0, 0, 0), 27.0);
        assert_eq!(y.get(0, 1, 2, 2), 27.0);
    }
}

#[test]
fn btn_correction_identity_on_real_windows() {
    let mut rng = StdRng::seed_from_u64(5);
    let x = symbols(&mut rng, TensorShape::new(2, 90, 4, 4), Encoding::Binary);
    let w = symbols(&mut rng, TensorShape::new(7, 90, 2, 2), Encoding::Ternary);
    let bank = FilterBank::ternary(&w, &[0.5; 7]).unwrap();
    let counts = bank.correction().unwrap();

    let packed = binarize(&x, Padding::square(1), Some(&[0.5, 0.5]));
    let windows = img2row(&packed, 2, 2, Stride::default());
    let (m, n, k) = (windows.rows(), bank.num_filters(), windows.words_per_plane());

    let corrected = btn_gemm(windows.words(), bank.filters().words(), counts, m, n, k);
    let raw = btn_gemm_raw(windows.words(), bank.filters().words(), m, n, k);
    for r in 0..m {
        for f in 0..n {
            assert_eq!(corrected[r * n + f], raw[r * n + f] + counts[f], "row {r} filter {f}");
        }
    }
}

#[test]
fn prelu_slope_matches_reference() {
    let layer = Layer::new(20, 4, 4, 3, 3, 3, 0, 1);
    let outcome = run_layer(layer, 1, ConvType::Tnn, 9);
    assert!(outcome.passed);

    // same data with alpha = 0.1 scales exactly the negative outputs
    let mut rng = StdRng::seed_from_u64(9);
    let x = symbols(&mut rng, TensorShape::new(1, 20, 4, 4), Encoding::Ternary);
    let w = symbols(&mut rng, TensorShape::new(3, 20, 3, 3), Encoding::Ternary);
    let bank = FilterBank::ternary(&w, &[0.5; 3]).unwrap();
    let params = layer.params().with_alpha(0.1);
    let y = convolve(&x, &[0.5], bank.weights(ConvType::Tnn).unwrap(), &params).unwrap();

    for (&got, &raw) in y.data().iter().zip(outcome.expected.data()) {
        let want = if raw < 0.0 { raw * 0.1 } else { raw };
        assert_eq!(got, want);
    }
}
