//! Error types for the hospinv-core library.

use thiserror::Error;

/// Main error type for the hospinv library.
#[derive(Error, Debug)]
pub enum HospinvError {
    /// Layout reconstruction error.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl HospinvError {
    /// Page index the error refers to, when it is tied to one page.
    pub fn page(&self) -> Option<usize> {
        match self {
            HospinvError::Layout(LayoutError::AnchorNotFound { page, .. }) => Some(*page),
            HospinvError::Extraction(ExtractionError::UnsupportedTemplate { page, .. }) => {
                Some(*page)
            }
            _ => None,
        }
    }
}

/// Errors raised while locating regions on a page.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A required anchor matched zero tokens.
    #[error("page {page}: anchor {anchor:?} not found while locating {region}")]
    AnchorNotFound {
        page: usize,
        anchor: String,
        region: String,
    },
}

/// Errors related to invoice field extraction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The banner text does not name a supported hospital.
    #[error("page {page}: unsupported invoice template {name:?}")]
    UnsupportedTemplate { page: usize, name: String },

    /// A numeric token could not be parsed after cleaning.
    #[error("malformed numeric token: {text:?}")]
    MalformedNumericToken { text: String },

    /// OCR entry does not have the `[quad, [text, confidence]]` shape.
    #[error("malformed OCR input: {0}")]
    MalformedInput(String),
}

/// Result type for the hospinv library.
pub type Result<T> = std::result::Result<T, HospinvError>;
