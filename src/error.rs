//! Error types shared by every rendering, registry and persistence operation.

use thiserror::Error;

/// The main error enum for all operations within the crate.
#[derive(Error, Debug)]
pub enum QrRenderError {
    /// The encoding engine rejected the content for the requested level.
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
    #[error("Unknown {family} generator '{name}'")]
    UnknownGenerator { family: &'static str, name: String },
    /// A setting was unsupported or out of range. The previous value is kept.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },
    #[error("Invalid logo region: {0}")]
    InvalidRegion(String),
    #[error("Invalid matrix: {0}")]
    InvalidMatrix(String),
    #[error("Malformed document: {0}")]
    Malformed(String),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl QrRenderError {
    pub(crate) fn invalid_setting(key: impl Into<String>, reason: impl Into<String>) -> Self {
        QrRenderError::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, QrRenderError>;

/// A value reconstructed from persisted settings, together with every
/// per-field problem that was replaced by a default along the way.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub issues: Vec<QrRenderError>,
}

impl<T> Loaded<T> {
    pub fn clean(value: T) -> Self {
        Self { value, issues: Vec::new() }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Converts the value, carrying the collected issues along.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        Loaded {
            value: f(self.value),
            issues: self.issues,
        }
    }
}
