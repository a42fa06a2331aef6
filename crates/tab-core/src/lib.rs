//! # tab-core
//!
//! Shared vocabulary for ternary and binary convolution:
//! - 64-bit word constants and channel-packing arithmetic
//! - NCHW and packed `(n, h, w, c, planes)` shape metadata
//! - Owned float, packed and window-matrix buffers
//! - The four conv types and their activation/weight encodings
//! - The error type reported at public entry points

pub mod conv_type;
pub mod error;
pub mod prelude;
pub mod shape;
pub mod tensor;

pub use conv_type::{ConvType, Encoding};
pub use error::TabError;
pub use shape::{packed_channels, PackedShape, Padding, Stride, TensorShape, WORD_BITS};
pub use tensor::{FloatTensor, PackedTensor, WindowMatrix};

pub type Result<T> = std::result::Result<T, TabError>;
