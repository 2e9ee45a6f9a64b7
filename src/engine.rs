//! The seam to whatever produces the module matrix from content bytes.
//!
//! This crate never encodes: symbol layout, masking and Reed-Solomon all live
//! behind [`EncodingEngine`]. A [`Document`](crate::document::Document) only
//! calls it when its content or level changed since the last render.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QrRenderError, Result};
use crate::matrix::BoolMatrix;

/// The error correction level.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    /// The QR Code can tolerate about  7% erroneous codewords.
    #[serde(rename = "L")]
    Low,
    /// The QR Code can tolerate about 15% erroneous codewords.
    #[serde(rename = "M")]
    Medium,
    /// The QR Code can tolerate about 25% erroneous codewords.
    #[default]
    #[serde(rename = "Q")]
    Quartile,
    /// The QR Code can tolerate about 30% erroneous codewords.
    #[serde(rename = "H")]
    High,
}

impl ErrorCorrection {
    /// The single-letter code used in persisted documents.
    pub fn code(self) -> &'static str {
        match self {
            ErrorCorrection::Low => "L",
            ErrorCorrection::Medium => "M",
            ErrorCorrection::Quartile => "Q",
            ErrorCorrection::High => "H",
        }
    }
}

impl fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ErrorCorrection {
    type Err = QrRenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "L" => Ok(ErrorCorrection::Low),
            "M" => Ok(ErrorCorrection::Medium),
            "Q" => Ok(ErrorCorrection::Quartile),
            "H" => Ok(ErrorCorrection::High),
            other => Err(QrRenderError::invalid_setting(
                "errorCorrection",
                format!("'{}' is not one of L, M, Q, H", other),
            )),
        }
    }
}

/// Produces a square module matrix for the given content and level.
///
/// Implementations must return module (0,0) at the top-left and include the
/// standard's own one-module margin (declared through
/// [`BoolMatrix::with_margin`]). Capacity failures are reported as
/// [`QrRenderError::EncodingFailed`].
pub trait EncodingEngine: Send + Sync {
    fn generate(&self, content: &[u8], level: ErrorCorrection) -> Result<BoolMatrix>;
}

impl<F> EncodingEngine for F
where
    F: Fn(&[u8], ErrorCorrection) -> Result<BoolMatrix> + Send + Sync,
{
    fn generate(&self, content: &[u8], level: ErrorCorrection) -> Result<BoolMatrix> {
        self(content, level)
    }
}

/// An engine that always hands back the same, already encoded matrix.
///
/// Useful for rendering symbols produced elsewhere and for tests.
#[derive(Debug, Clone)]
pub struct StaticEngine {
    matrix: BoolMatrix,
}

impl StaticEngine {
    pub fn new(matrix: BoolMatrix) -> Self {
        Self { matrix }
    }
}

impl EncodingEngine for StaticEngine {
    fn generate(&self, content: &[u8], _level: ErrorCorrection) -> Result<BoolMatrix> {
        if content.is_empty() {
            return Err(QrRenderError::EncodingFailed("no content to encode".to_string()));
        }
        Ok(self.matrix.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_codes_round_trip() {
        for level in [
            ErrorCorrection::Low,
            ErrorCorrection::Medium,
            ErrorCorrection::Quartile,
            ErrorCorrection::High,
        ] {
            assert_eq!(level.code().parse::<ErrorCorrection>().unwrap(), level);
        }
        assert!("X".parse::<ErrorCorrection>().is_err());
    }

    #[test]
    fn test_closure_engine() {
        let engine = |content: &[u8], _level: ErrorCorrection| -> Result<BoolMatrix> {
            if content.len() > 4 {
                Err(QrRenderError::EncodingFailed("too long".into()))
            } else {
                Ok(BoolMatrix::new(21))
            }
        };
        assert!(engine.generate(b"abc", ErrorCorrection::High).is_ok());
        assert!(matches!(
            engine.generate(b"abcdef", ErrorCorrection::High),
            Err(QrRenderError::EncodingFailed(_))
        ));
    }
}
