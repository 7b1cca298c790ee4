//! Codec-wide settings shared by the decoder, encoder and schema bindings.

use crate::domain::{CodecError, CodecResult};
use crate::key::AtomStyle;
use serde::{Deserialize, Serialize};

/// How floating-point columns are rendered when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FloatFormat {
    /// Shortest text that reads back to the same value; exponent form for very
    /// large or very small magnitudes.
    #[default]
    General,
    Fixed { precision: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CodecConfig {
    pub atom_style: AtomStyle,
    pub float_format: FloatFormat,
}

impl CodecConfig {
    pub fn from_json_str(source: &str) -> CodecResult<Self> {
        serde_json::from_str(source).map_err(CodecError::from)
    }

    pub fn with_atom_style(mut self, atom_style: AtomStyle) -> Self {
        self.atom_style = atom_style;
        self
    }

    pub fn with_float_format(mut self, float_format: FloatFormat) -> Self {
        self.float_format = float_format;
        self
    }
}
