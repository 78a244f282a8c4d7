//! Row reconstruction by vertical nearest-neighbour matching.

use std::collections::BTreeMap;

use super::columns::Column;
use crate::ocr::Token;

/// One reconstructed row: column name to cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignedRow {
    cells: BTreeMap<String, String>,
}

impl AlignedRow {
    /// Cell text of a column, if that column supplied a token.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// Cell text of a column, or an empty string.
    pub fn text(&self, column: &str) -> String {
        self.get(column).unwrap_or_default().to_string()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn by_vertical_position(tokens: &mut [&Token]) {
    tokens.sort_by(|a, b| {
        a.upper_left()
            .y
            .total_cmp(&b.upper_left().y)
            .then(a.index().cmp(&b.index()))
    });
}

/// Build one row per token of the anchor column.
///
/// Anchor tokens are visited top to bottom. For each of them, every other
/// column gives up the unclaimed token whose upper-left y is nearest to the
/// anchor's; a claimed token cannot be reused by a later row. A row whose
/// column has run out of tokens has no cell for that column.
pub fn align(anchor: &Column, others: &[Column]) -> Vec<AlignedRow> {
    let mut anchors: Vec<&Token> = anchor.tokens.iter().collect();
    by_vertical_position(&mut anchors);

    let mut pools: Vec<(&str, Vec<&Token>)> = others
        .iter()
        .map(|column| {
            let mut pool: Vec<&Token> = column.tokens.iter().collect();
            by_vertical_position(&mut pool);
            (column.name.as_str(), pool)
        })
        .collect();

    anchors
        .into_iter()
        .map(|token| {
            let y = token.upper_left().y;
            let mut cells = BTreeMap::new();
            cells.insert(anchor.name.clone(), token.text().to_string());

            for (name, pool) in pools.iter_mut() {
                let nearest = pool
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| {
                        (a.upper_left().y - y)
                            .abs()
                            .total_cmp(&(b.upper_left().y - y).abs())
                    })
                    .map(|(i, _)| i);

                if let Some(i) = nearest {
                    let claimed = pool.remove(i);
                    cells.insert(name.to_string(), claimed.text().to_string());
                }
            }

            AlignedRow { cells }
        })
        .collect()
}
