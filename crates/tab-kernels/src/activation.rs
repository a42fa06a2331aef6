//! GEMM output → activated NCHW float tensor.

use tab_core::{FloatTensor, TensorShape};

/// PReLU in place: x = x if x >= 0, else alpha * x
pub fn prelu(data: &mut [f32], alpha: f32) {
    for v in data.iter_mut() {
        if *v < 0.0 {
            *v *= alpha;
        }
    }
}

/// Transpose GEMM output `[(n, oh, ow) × kn]` into NCHW `[n, kn, oh, ow]`.
///
/// # Panics
/// If `acc.len() != n * oh * ow * kn`.
pub fn reconstruct(acc: &[i32], n: usize, kn: usize, oh: usize, ow: usize) -> Vec<i32> {
    assert_eq!(acc.len(), n * oh * ow * kn, "reconstruct: accumulator size");
    let mut out = vec![0i32; acc.len()];
    let plane = oh * ow;
    for (r, row) in acc.chunks_exact(kn.max(1)).enumerate() {
        let s = r / plane;
        let pos = r % plane;
        for (f, &v) in row.iter().enumerate() {
            out[(s * kn + f) * plane + pos] = v;
        }
    }
    out
}

/// Reconstruct and apply PReLU in one pass, producing an `[n, kn, oh, ow]`
/// float tensor.
pub fn activate(acc: &[i32], shape: TensorShape, alpha: f32) -> FloatTensor {
    let mut out = FloatTensor::zeros(shape);
    let reordered = reconstruct(acc, shape.n, shape.c, shape.h, shape.w);
    for (dst, v) in out.data_mut().iter_mut().zip(reordered) {
        *dst = v as f32;
    }
    prelu(out.data_mut(), alpha);
    out
}
