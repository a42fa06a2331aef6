//! Convenience re-exports for common tab-core types.
//!
//! ```rust
//! use tab_core::prelude::*;
//! ```

pub use crate::ConvType;
pub use crate::Encoding;
pub use crate::FloatTensor;
pub use crate::PackedTensor;
pub use crate::Padding;
pub use crate::Result;
pub use crate::Stride;
pub use crate::TabError;
pub use crate::TensorShape;
pub use crate::WindowMatrix;
