//! Layer configurations for `tab verify` and `tab bench`.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tab_conv::ConvParams;
use tab_core::{Padding, Stride, TensorShape};

/// One convolution layer. Padding and stride are symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerCase {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub filters: usize,
    pub kernel_h: usize,
    pub kernel_w: usize,
    #[serde(default)]
    pub padding: usize,
    #[serde(default = "default_stride")]
    pub stride: usize,
}

fn default_stride() -> usize {
    1
}

impl LayerCase {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        channels: usize,
        height: usize,
        width: usize,
        filters: usize,
        kernel_h: usize,
        kernel_w: usize,
        padding: usize,
        stride: usize,
    ) -> Self {
        Self { channels, height, width, filters, kernel_h, kernel_w, padding, stride }
    }

    pub fn input_shape(&self, batch: usize) -> TensorShape {
        TensorShape::new(batch, self.channels, self.height, self.width)
    }

    /// `[KN, C, KH, KW]`.
    pub fn weight_shape(&self) -> TensorShape {
        TensorShape::new(self.filters, self.channels, self.kernel_h, self.kernel_w)
    }

    pub fn params(&self) -> ConvParams {
        ConvParams::new(Padding::square(self.padding), Stride::square(self.stride))
    }
}

impl fmt::Display for LayerCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C={} H={} W={} kernel {}x{}x{}x{} p={} s={}",
            self.channels,
            self.height,
            self.width,
            self.filters,
            self.channels,
            self.kernel_h,
            self.kernel_w,
            self.padding,
            self.stride
        )
    }
}

/// Correctness layers: single pixels, partial channel words, strides that
/// truncate, non-square kernels and padding wider than the image.
pub const VERIFY_CASES: [LayerCase; 9] = [
    // c, h, w, kn, kh, kw, p, s
    LayerCase::new(1, 2, 2, 1, 3, 3, 1, 1),
    LayerCase::new(64, 12, 16, 64, 1, 1, 0, 1),
    LayerCase::new(32, 12, 16, 52, 1, 1, 0, 2),
    LayerCase::new(256, 56, 56, 10, 3, 3, 1, 1),
    LayerCase::new(160, 64, 56, 32, 3, 3, 0, 2),
    LayerCase::new(325, 36, 25, 125, 5, 7, 3, 4),
    LayerCase::new(32, 1, 1, 120, 1, 1, 0, 1),
    LayerCase::new(512, 1, 1, 1024, 1, 1, 0, 1),
    LayerCase::new(1024, 1, 1, 1640, 1, 1, 2, 3),
];

/// Timing layers: 3x3 kernels at shrinking resolution, the same tensor at
/// strides 1 to 4, growing kernels on one tensor, then fully connected layers.
pub const BENCH_CASES: [LayerCase; 20] = [
    // c, h, w, kn, kh, kw, p, s
    LayerCase::new(64, 56, 56, 64, 3, 3, 1, 1),
    LayerCase::new(64, 56, 56, 128, 3, 3, 1, 1),
    LayerCase::new(128, 28, 28, 128, 3, 3, 1, 1),
    LayerCase::new(128, 28, 28, 256, 3, 3, 1, 1),
    LayerCase::new(256, 14, 14, 256, 3, 3, 1, 1),
    LayerCase::new(256, 14, 14, 512, 3, 3, 1, 1),
    LayerCase::new(80, 224, 224, 80, 3, 3, 1, 1),
    LayerCase::new(80, 224, 224, 80, 3, 3, 1, 2),
    LayerCase::new(80, 224, 224, 80, 3, 3, 1, 3),
    LayerCase::new(80, 224, 224, 80, 3, 3, 1, 4),
    LayerCase::new(512, 56, 56, 256, 1, 1, 0, 1),
    LayerCase::new(512, 56, 56, 256, 3, 3, 1, 1),
    LayerCase::new(512, 56, 56, 256, 5, 5, 2, 1),
    LayerCase::new(512, 56, 56, 256, 7, 7, 3, 1),
    LayerCase::new(512, 56, 56, 256, 9, 9, 3, 1),
    LayerCase::new(512, 56, 56, 256, 11, 11, 3, 1),
    LayerCase::new(2000, 1, 1, 4000, 1, 1, 0, 1),
    LayerCase::new(4000, 1, 1, 8000, 1, 1, 0, 1),
    LayerCase::new(8000, 1, 1, 16000, 1, 1, 0, 1),
    LayerCase::new(16000, 1, 1, 32000, 1, 1, 0, 1),
];

/// Read a JSON array of layer cases.
pub fn load_cases(path: &Path) -> Result<Vec<LayerCase>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cases from {}", path.display()))?;
    parse_cases(&text).with_context(|| format!("invalid cases in {}", path.display()))
}

pub fn parse_cases(text: &str) -> Result<Vec<LayerCase>> {
    let cases: Vec<LayerCase> = serde_json::from_str(text)?;
    for (i, case) in cases.iter().enumerate() {
        if case.stride == 0 {
            anyhow::bail!("case {i}: stride must be at least 1");
        }
        if case.channels == 0 || case.filters == 0 || case.kernel_h == 0 || case.kernel_w == 0 {
            anyhow::bail!("case {i}: channels, filters and kernel sizes must be positive");
        }
    }
    Ok(cases)
}

/// The built-in table, or the one in `path` if given.
pub fn select(path: Option<&Path>, builtin: &[LayerCase]) -> Result<Vec<LayerCase>> {
    match path {
        Some(p) => load_cases(p),
        None => Ok(builtin.to_vec()),
    }
}
