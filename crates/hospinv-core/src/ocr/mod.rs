//! Recognized OCR tokens and page-scoped token tables.
//!
//! The OCR engine itself is an external collaborator; this module only
//! models its output: one entry per recognized text fragment, each with a
//! quadrilateral bounding box (upper-left, upper-right, lower-right,
//! lower-left) and a confidence score.

mod cache;

pub use cache::{OcrCache, RawEntry};

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// A 2-D point in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One corner of a token quadrilateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    UpperLeft,
    UpperRight,
    LowerRight,
    LowerLeft,
}

impl Corner {
    fn slot(self) -> usize {
        match self {
            Corner::UpperLeft => 0,
            Corner::UpperRight => 1,
            Corner::LowerRight => 2,
            Corner::LowerLeft => 3,
        }
    }
}

/// A recognized text fragment with its bounding quadrilateral.
///
/// The quad is fixed at construction; corner coordinates are always
/// derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    /// Position in the page's OCR emission order.
    index: usize,

    /// Corners in the order upper-left, upper-right, lower-right, lower-left.
    quad: [Point; 4],

    /// Recognized text, trimmed.
    text: String,

    /// Recognition confidence score.
    confidence: f32,
}

impl Token {
    /// Create a token from a raw quad of `[x, y]` pairs.
    pub fn new(quad: [[f32; 2]; 4], text: impl Into<String>, confidence: f32) -> Self {
        Self {
            index: 0,
            quad: quad.map(|[x, y]| Point::new(x, y)),
            text: text.into().trim().to_string(),
            confidence,
        }
    }

    /// Create an axis-aligned token from its extreme coordinates.
    pub fn axis_aligned(text: impl Into<String>, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self::new(
            [[min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y]],
            text,
            1.0,
        )
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn quad(&self) -> &[Point; 4] {
        &self.quad
    }

    /// Get one corner of the quad.
    pub fn corner(&self, corner: Corner) -> Point {
        self.quad[corner.slot()]
    }

    pub fn upper_left(&self) -> Point {
        self.corner(Corner::UpperLeft)
    }

    pub fn upper_right(&self) -> Point {
        self.corner(Corner::UpperRight)
    }

    pub fn lower_right(&self) -> Point {
        self.corner(Corner::LowerRight)
    }

    pub fn lower_left(&self) -> Point {
        self.corner(Corner::LowerLeft)
    }

    /// Copy of this token with different text, same geometry and index.
    pub(crate) fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }
}

/// Ordered tokens of one page, in OCR emission order.
///
/// Emission order approximates reading order but is not strictly row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenTable {
    page: usize,
    tokens: Vec<Token>,
}

impl TokenTable {
    /// Build a page table, numbering tokens by their position.
    pub fn new(page: usize, tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .enumerate()
            .map(|(index, token)| Token { index, ..token })
            .collect();
        Self { page, tokens }
    }

    /// Build a page table from raw OCR entries.
    pub fn from_entries(page: usize, entries: Vec<RawEntry>) -> Result<Self, ExtractionError> {
        let tokens = entries
            .into_iter()
            .map(RawEntry::into_token)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(page, tokens))
    }

    /// Subset of this table keeping the page and original token indices.
    pub(crate) fn subset<'a>(&self, tokens: impl IntoIterator<Item = &'a Token>) -> Self {
        Self {
            page: self.page,
            tokens: tokens.into_iter().cloned().collect(),
        }
    }

    /// Tokens whose text `f` maps to `Some`, carrying the mapped text.
    pub(crate) fn filter_map_text(&self, f: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            page: self.page,
            tokens: self
                .tokens
                .iter()
                .filter_map(|t| f(t.text()).map(|text| t.with_text(text)))
                .collect(),
        }
    }

    /// Page index (0-based) in the source document.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// First token in emission order.
    pub fn first(&self) -> Option<&Token> {
        self.tokens.first()
    }

    /// Texts in emission order.
    pub fn texts(&self) -> Vec<&str> {
        self.tokens.iter().map(Token::text).collect()
    }

    /// Texts joined with single spaces.
    pub fn joined_text(&self) -> String {
        self.texts().join(" ")
    }
}

impl<'a> IntoIterator for &'a TokenTable {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_corners() {
        let token = Token::new(
            [[10.0, 20.0], [50.0, 21.0], [51.0, 35.0], [11.0, 34.0]],
            "  Visit Date  ",
            0.97,
        );

        assert_eq!(token.text(), "Visit Date");
        assert_eq!(token.upper_left(), Point::new(10.0, 20.0));
        assert_eq!(token.upper_right(), Point::new(50.0, 21.0));
        assert_eq!(token.lower_right(), Point::new(51.0, 35.0));
        assert_eq!(token.lower_left(), Point::new(11.0, 34.0));
    }

    #[test]
    fn test_table_numbers_tokens_in_order() {
        let table = TokenTable::new(
            3,
            vec![
                Token::axis_aligned("a", 0.0, 0.0, 10.0, 10.0),
                Token::axis_aligned("b", 20.0, 0.0, 30.0, 10.0),
            ],
        );

        assert_eq!(table.page(), 3);
        assert_eq!(table.tokens()[1].index(), 1);
        assert_eq!(table.joined_text(), "a b");
    }
}
