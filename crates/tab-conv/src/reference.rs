//! Direct float convolution over quantized symbols, used to check the
//! bitwise path.
//!
//! Feeding the reference the same {-1, 0, +1} symbols the packers see makes
//! the two results equal exactly, except on the border of binary-activation
//! convolutions where packed padding reads as +1.

use tab_core::{FloatTensor, PackedTensor, Padding, Result, Stride, TabError, TensorShape};
use tab_pack::unpack;

/// Zero-pad height and width.
pub fn pad(x: &FloatTensor, padding: Padding) -> FloatTensor {
    let shape = x.shape();
    let mut out = FloatTensor::zeros(shape.padded(padding));
    let padded = out.shape();
    let data = out.data_mut();
    for n in 0..shape.n {
        for c in 0..shape.c {
            for h in 0..shape.h {
                let src = shape.index(n, c, h, 0);
                let dst = padded.index(n, c, h + padding.h, padding.w);
                data[dst..dst + shape.w].copy_from_slice(&x.data()[src..src + shape.w]);
            }
        }
    }
    out
}

/// Cross-correlation of an already padded `[N, C, H, W]` input with
/// `[KN, C, KH, KW]` weights, with the truncating output size of the bitwise
/// path.
pub fn direct_conv2d(
    x: &FloatTensor,
    weights: &FloatTensor,
    stride: Stride,
) -> Result<FloatTensor> {
    let xs = x.shape();
    let ws = weights.shape();
    if xs.c != ws.c {
        return Err(TabError::ShapeMismatch { expected: vec![xs.c], got: vec![ws.c] });
    }
    let (Some(oh), Some(ow)) = (
        tab_core::shape::output_size(xs.h, ws.h, stride.h),
        tab_core::shape::output_size(xs.w, ws.w, stride.w),
    ) else {
        return Err(TabError::InvalidGeometry(format!(
            "{}x{} kernel with {stride:?} does not fit {xs}",
            ws.h, ws.w
        )));
    };

    let out_shape = TensorShape::new(xs.n, ws.n, oh, ow);
    let mut out = FloatTensor::zeros(out_shape);
    let xd = x.data();
    let wd = weights.data();
    let od = out.data_mut();

    for n in 0..xs.n {
        for f in 0..ws.n {
            for y in 0..oh {
                for z in 0..ow {
                    let mut acc = 0.0f32;
                    for c in 0..xs.c {
                        for i in 0..ws.h {
                            for j in 0..ws.w {
                                acc += xd[xs.index(n, c, y * stride.h + i, z * stride.w + j)]
                                    * wd[ws.index(f, c, i, j)];
                            }
                        }
                    }
                    od[out_shape.index(n, f, y, z)] = acc;
                }
            }
        }
    }
    Ok(out)
}

/// The symbols a packed tensor holds, as a float tensor of its logical shape.
pub fn dequantize(packed: &PackedTensor) -> FloatTensor {
    let mut out = FloatTensor::zeros(packed.logical_shape());
    for (dst, s) in out.data_mut().iter_mut().zip(unpack(packed)) {
        *dst = f32::from(s);
    }
    out
}

/// Exact equality of shape and every value.
pub fn compare(actual: &FloatTensor, expected: &FloatTensor) -> bool {
    actual.shape() == expected.shape() && actual.data() == expected.data()
}

/// Like [`compare`], but skips `padding.h` output rows and `padding.w`
/// output columns on every side.
///
/// Binary activations pad with +1, so windows that overlap the padding
/// differ from a zero-padded reference; they all lie within that border.
pub fn compare_interior(actual: &FloatTensor, expected: &FloatTensor, padding: Padding) -> bool {
    let shape = actual.shape();
    if shape != expected.shape() {
        return false;
    }
    let rows = padding.h..shape.h.saturating_sub(padding.h);
    let cols = padding.w..shape.w.saturating_sub(padding.w);
    for n in 0..shape.n {
        for c in 0..shape.c {
            for h in rows.clone() {
                for w in cols.clone() {
                    if actual.get(n, c, h, w) != expected.get(n, c, h, w) {
                        return false;
                    }
                }
            }
        }
    }
    true
}
