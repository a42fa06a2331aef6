//! Runtime CPU feature detection for the popcount kernels.
//!
//! The kernels call `u64::count_ones`, which lowers to a single instruction
//! when the target supports it; this probe reports what the host offers so
//! drivers can log it next to timings.

use std::sync::OnceLock;

/// Popcount-relevant CPU features detected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuFeatures {
    pub popcnt: bool,
    pub avx512_vpopcntdq: bool,
    pub neon: bool,
}

static DETECTED: OnceLock<CpuFeatures> = OnceLock::new();

impl CpuFeatures {
    /// Detect features for the current CPU (cached after the first call).
    pub fn detect() -> &'static CpuFeatures {
        DETECTED.get_or_init(|| {
            #[cfg(target_arch = "x86_64")]
            {
                CpuFeatures {
                    popcnt: is_x86_feature_detected!("popcnt"),
                    avx512_vpopcntdq: is_x86_feature_detected!("avx512vpopcntdq"),
                    neon: false,
                }
            }

            #[cfg(target_arch = "aarch64")]
            {
                CpuFeatures {
                    // CNT on NEON vectors; mandatory on AArch64
                    popcnt: true,
                    avx512_vpopcntdq: false,
                    neon: true,
                }
            }

            #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
            {
                CpuFeatures {
                    popcnt: false,
                    avx512_vpopcntdq: false,
                    neon: false,
                }
            }
        })
    }

    /// Best popcount path as a human-readable string.
    pub fn popcount_tier(&self) -> &'static str {
        if self.avx512_vpopcntdq {
            "AVX-512 VPOPCNTDQ"
        } else if self.neon {
            "NEON CNT"
        } else if self.popcnt {
            "POPCNT"
        } else {
            "software"
        }
    }

    /// Whether `count_ones` maps to a hardware instruction family.
    pub fn has_hardware_popcount(&self) -> bool {
        self.popcnt || self.neon || self.avx512_vpopcntdq
    }
}
