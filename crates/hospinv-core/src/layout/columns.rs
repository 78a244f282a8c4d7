//! Column classification by x-axis thresholds.

use tracing::debug;

use super::region::{Aggregate, Anchor, Axis, EdgeRule};
use crate::error::LayoutError;
use crate::ocr::{Corner, TokenTable};

/// A named table column, optionally headed by a label token.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    /// Header label removed from this column's tokens after partitioning.
    pub header: Option<Anchor>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header: None,
        }
    }

    pub fn with_header(mut self, header: Anchor) -> Self {
        self.header = Some(header);
        self
    }
}

/// An x-coordinate separating two adjacent columns.
#[derive(Debug, Clone)]
pub struct ColumnBoundary {
    rule: EdgeRule,
    aggregate: Aggregate,
}

impl ColumnBoundary {
    /// Boundary just left of the leftmost matching coordinate (minus margin).
    pub fn left_of(rule: EdgeRule) -> Self {
        Self {
            rule,
            aggregate: Aggregate::Min,
        }
    }

    /// Boundary just right of the rightmost matching coordinate (plus margin).
    pub fn right_of(rule: EdgeRule) -> Self {
        Self {
            rule,
            aggregate: Aggregate::Max,
        }
    }

    /// Resolve the boundary against a region's tokens.
    pub fn resolve(&self, table: &TokenTable, margin: f32, context: &str) -> Result<f32, LayoutError> {
        let x = self.rule.resolve(table, Axis::X, self.aggregate, context)?;
        Ok(match self.aggregate {
            Aggregate::Min => x - margin,
            Aggregate::Max => x + margin,
        })
    }
}

/// Columns of a region, left to right, with the boundaries between them.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    /// One boundary per adjacent column pair.
    pub boundaries: Vec<ColumnBoundary>,
    /// Token corner compared against the thresholds.
    pub split: Corner,
}

impl ColumnLayout {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSpec>, boundaries: Vec<ColumnBoundary>) -> Self {
        debug_assert_eq!(columns.len(), boundaries.len() + 1);
        Self {
            name: name.into(),
            columns,
            boundaries,
            split: Corner::UpperRight,
        }
    }

    /// Compare a different token corner against the thresholds.
    ///
    /// Label columns whose text may run past the boundary split on the
    /// upper-left corner so long labels stay in the label column.
    pub fn split_on(mut self, corner: Corner) -> Self {
        self.split = corner;
        self
    }

    /// Resolve every boundary to an x threshold.
    pub fn thresholds(&self, table: &TokenTable, margin: f32) -> Result<Vec<f32>, LayoutError> {
        self.boundaries
            .iter()
            .map(|b| b.resolve(table, margin, &self.name))
            .collect()
    }
}

/// Tokens assigned to one column.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub tokens: TokenTable,
}

/// Partition tokens into `thresholds.len() + 1` groups by right edge.
///
/// Group `i` takes the remaining tokens whose upper-right x lies left of
/// `thresholds[i]`; the last group takes whatever is left. Groups are
/// disjoint and cover every token for any threshold ordering.
pub fn classify(table: &TokenTable, thresholds: &[f32]) -> Vec<TokenTable> {
    classify_at(table, thresholds, Corner::UpperRight)
}

/// [`classify`] comparing the x of `corner` instead of the upper-right one.
pub fn classify_at(table: &TokenTable, thresholds: &[f32], corner: Corner) -> Vec<TokenTable> {
    let mut remaining: Vec<_> = table.iter().collect();
    let mut groups = Vec::with_capacity(thresholds.len() + 1);

    for &threshold in thresholds {
        let (taken, rest): (Vec<_>, Vec<_>) = remaining
            .into_iter()
            .partition(|t| t.corner(corner).x < threshold);
        groups.push(table.subset(taken));
        remaining = rest;
    }
    groups.push(table.subset(remaining));

    groups
}

/// Classify a region's tokens into the layout's named columns, dropping
/// each column's own header label.
pub fn classify_columns(
    table: &TokenTable,
    layout: &ColumnLayout,
    margin: f32,
) -> Result<Vec<Column>, LayoutError> {
    let thresholds = layout.thresholds(table, margin)?;
    let groups = classify_at(table, &thresholds, layout.split);

    let columns: Vec<Column> = layout
        .columns
        .iter()
        .zip(groups)
        .map(|(spec, group)| {
            let tokens = match &spec.header {
                Some(header) => group.subset(group.iter().filter(|t| !header.matches(t.text()))),
                None => group,
            };
            Column {
                name: spec.name.clone(),
                tokens,
            }
        })
        .collect();

    for column in &columns {
        debug!(
            "Page {}: {} column {} has {} tokens",
            table.page(),
            layout.name,
            column.name,
            column.tokens.len()
        );
    }

    Ok(columns)
}
