//! Line reconstruction and field/value parsing.

use regex::Regex;

use crate::ocr::TokenTable;

/// Merge tokens into text lines.
///
/// Tokens are scanned in table order and joined with a single space. A
/// line ends after a token when the next token's upper-left y exceeds the
/// current one's by more than `gap_threshold`.
pub fn reconstruct(tokens: &TokenTable, gap_threshold: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut iter = tokens.iter().peekable();

    while let Some(token) = iter.next() {
        current.push(token.text());

        let breaks = match iter.peek() {
            Some(next) => next.upper_left().y - token.upper_left().y > gap_threshold,
            None => true,
        };

        if breaks {
            lines.push(current.join(" "));
            current.clear();
        }
    }

    lines
}

/// Split a line into a field/value pair.
///
/// A line containing a colon is split once on the first colon, even when
/// nothing precedes it. Otherwise the first known field the line starts
/// with becomes the field and the value is the line with every occurrence
/// of that field removed. Lines matching neither rule yield `None`.
pub fn parse_line(line: &str, known_fields: &[String]) -> Option<(String, String)> {
    let line = line.trim();

    if let Some((field, value)) = line.split_once(':') {
        return Some((field.trim().to_string(), value.trim().to_string()));
    }

    known_fields
        .iter()
        .find(|field| !field.is_empty() && line.starts_with(field.as_str()))
        .map(|field| (field.clone(), line.replace(field.as_str(), "").trim().to_string()))
}

/// Template-specific repair of a value that OCR wrapped over two lines.
///
/// The first capture group of `pattern` is matched across line breaks and
/// has its line breaks removed.
#[derive(Debug, Clone)]
pub struct LineCorrection {
    pub name: String,
    pattern: Regex,
}

impl LineCorrection {
    pub fn new(name: impl Into<String>, pattern: Regex) -> Self {
        Self {
            name: name.into(),
            pattern,
        }
    }

    /// Apply the correction, returning the repaired lines.
    pub fn apply(&self, lines: &[String]) -> Vec<String> {
        let text = lines.join("\n");

        let Some(segment) = self
            .pattern
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
        else {
            return lines.to_vec();
        };

        let joined = segment.replace('\n', "");
        text.replacen(segment, &joined, 1)
            .split('\n')
            .map(str::to_string)
            .collect()
    }
}
