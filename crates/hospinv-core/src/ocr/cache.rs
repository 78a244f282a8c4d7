//! Loading of cached OCR results.
//!
//! The cache mirrors the OCR engine output: `{"results": [page, ...]}` where
//! each page is a list of `[quad, [text, confidence]]` entries, or `null`
//! when the engine found no text on the page.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::{Token, TokenTable};
use crate::error::{ExtractionError, Result};

/// One raw OCR entry: `[[[x, y] x4], [text, confidence]]`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry(pub [[f32; 2]; 4], pub (String, f32));

impl RawEntry {
    /// Validate and convert into a token.
    ///
    /// JSON has no NaN or infinity, but a coordinate beyond the `f32` range
    /// (e.g. `1e39`) still parses to infinity and is rejected here, as are
    /// non-finite values in entries built directly.
    pub fn into_token(self) -> std::result::Result<Token, ExtractionError> {
        let RawEntry(quad, (text, confidence)) = self;

        if quad.iter().flatten().any(|c| !c.is_finite()) {
            return Err(ExtractionError::MalformedInput(format!(
                "non-finite coordinate in box of {:?}",
                text
            )));
        }

        Ok(Token::new(quad, text, confidence))
    }
}

/// Cached OCR output for a whole document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrCache {
    results: Vec<Option<Vec<RawEntry>>>,
}

impl OcrCache {
    /// Parse a cache from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a cache file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Number of pages in the cache.
    pub fn page_count(&self) -> usize {
        self.results.len()
    }

    /// Build one token table per page.
    pub fn into_pages(self) -> Result<Vec<TokenTable>> {
        let mut pages = Vec::with_capacity(self.results.len());

        for (page, entries) in self.results.into_iter().enumerate() {
            let entries = entries.unwrap_or_default();
            debug!("Page {} has {} OCR entries", page, entries.len());
            pages.push(TokenTable::from_entries(page, entries)?);
        }

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HospinvError;

    #[test]
    fn test_parse_cache() {
        let json = r#"{"results": [
            [
                [[[10, 20], [110, 20], [110, 40], [10, 40]], ["Singapore General Hospital", 0.99]],
                [[[10, 60], [80, 60], [80, 75], [10, 75]], [" TAX INVOICE ", 0.95]]
            ],
            null
        ]}"#;

        let cache = OcrCache::from_json(json).unwrap();
        assert_eq!(cache.page_count(), 2);

        let pages = cache.into_pages().unwrap();
        assert_eq!(pages[0].len(), 2);
        assert_eq!(pages[0].tokens()[1].text(), "TAX INVOICE");
        assert_eq!(pages[0].tokens()[1].upper_left().y, 60.0);
        assert!(pages[1].is_empty());
        assert_eq!(pages[1].page(), 1);
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let json = r#"{"results": [[ [[[10, 20], [110, 20]], ["short quad", 0.9]] ]]}"#;
        assert!(matches!(OcrCache::from_json(json), Err(HospinvError::Json(_))));
    }

    #[test]
    fn test_rejects_non_finite_coordinates() {
        let entry = RawEntry([[0.0, 0.0], [f32::NAN, 0.0], [10.0, 10.0], [0.0, 10.0]], ("x".to_string(), 0.9));
        assert!(matches!(entry.into_token(), Err(ExtractionError::MalformedInput(_))));

        let json = r#"{"results": [[ [[[10, 20], [1e39, 20], [110, 40], [10, 40]], ["wide", 0.9]] ]]}"#;
        let err = OcrCache::from_json(json).unwrap().into_pages().unwrap_err();
        assert!(matches!(err, HospinvError::Extraction(ExtractionError::MalformedInput(_))));
    }
}
