use std::fmt;
use std::str::FromStr;

/// How a tensor's signs are packed into words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Encoding {
    /// {-1, +1}: one plane, bit set means -1.
    Binary,
    /// {-1, 0, +1}: two planes per word, (sign, nonzero).
    Ternary,
}

impl Encoding {
    /// Number of words stored per packed channel group.
    pub fn planes(&self) -> usize {
        match self {
            Encoding::Binary => 1,
            Encoding::Ternary => 2,
        }
    }

    /// Whether the encoding can represent a true zero.
    pub fn has_zero(&self) -> bool {
        matches!(self, Encoding::Ternary)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Binary => write!(f, "binary"),
            Encoding::Ternary => write!(f, "ternary"),
        }
    }
}

/// The four activation × weight combinations the bitwise GEMM supports.
///
/// Names read activation first: `Tbn` is ternary activations with binary
/// weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConvType {
    Tnn,
    Tbn,
    Btn,
    Bnn,
}

impl ConvType {
    pub const ALL: [ConvType; 4] = [ConvType::Tnn, ConvType::Tbn, ConvType::Btn, ConvType::Bnn];

    /// Encoding the input activations are quantized to.
    pub fn activation_encoding(&self) -> Encoding {
        match self {
            ConvType::Tnn | ConvType::Tbn => Encoding::Ternary,
            ConvType::Btn | ConvType::Bnn => Encoding::Binary,
        }
    }

    /// Encoding the filters must be pre-quantized to.
    pub fn weight_encoding(&self) -> Encoding {
        match self {
            ConvType::Tnn | ConvType::Btn => Encoding::Ternary,
            ConvType::Tbn | ConvType::Bnn => Encoding::Binary,
        }
    }

    /// Binary activations encode padding as +1 rather than 0, so the border
    /// of the output differs from a zero-padded convolution.
    pub fn pads_with_ones(&self) -> bool {
        !self.activation_encoding().has_zero()
    }
}

impl fmt::Display for ConvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvType::Tnn => write!(f, "TNN"),
            ConvType::Tbn => write!(f, "TBN"),
            ConvType::Btn => write!(f, "BTN"),
            ConvType::Bnn => write!(f, "BNN"),
        }
    }
}

impl FromStr for ConvType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tnn" => Ok(ConvType::Tnn),
            "tbn" => Ok(ConvType::Tbn),
            "btn" => Ok(ConvType::Btn),
            "bnn" => Ok(ConvType::Bnn),
            other => Err(format!("unknown conv type '{other}', expected tnn, tbn, btn or bnn")),
        }
    }
}
