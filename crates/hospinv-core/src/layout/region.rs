//! Anchor-based region location and projection.
//!
//! A [`RegionRule`] describes each edge of a region as a set of
//! coordinates taken from anchor tokens (or from the page itself). Left and
//! top edges take the minimum of their coordinates, right and bottom edges
//! the maximum, and the resulting box is expanded outward by the margin.

use regex::Regex;
use tracing::debug;

use crate::error::LayoutError;
use crate::ocr::{Corner, Point, Token, TokenTable};

/// Axis-aligned region of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Region {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Grow the region by `margin` on every side.
    pub fn expand(self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Strict containment of a token's upper-left and lower-right corners.
    pub fn contains(&self, token: &Token) -> bool {
        let ul = token.upper_left();
        let lr = token.lower_right();
        ul.x > self.min_x && ul.y > self.min_y && lr.x < self.max_x && lr.y < self.max_y
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Substring match; `needle` is lowercased when case-insensitive.
    Contains { needle: String, case_sensitive: bool },
    Pattern(Regex),
}

/// Text pattern identifying a token that marks a region edge.
#[derive(Debug, Clone)]
pub struct Anchor {
    label: String,
    matcher: Matcher,
}

impl Anchor {
    /// Case-insensitive substring anchor.
    pub fn contains(needle: impl Into<String>) -> Self {
        let label = needle.into();
        Self {
            matcher: Matcher::Contains {
                needle: label.to_lowercase(),
                case_sensitive: false,
            },
            label,
        }
    }

    /// Case-sensitive substring anchor.
    pub fn exact_case(needle: impl Into<String>) -> Self {
        let label = needle.into();
        Self {
            matcher: Matcher::Contains {
                needle: label.clone(),
                case_sensitive: true,
            },
            label,
        }
    }

    /// Regex anchor.
    pub fn pattern(pattern: Regex) -> Self {
        Self {
            label: pattern.as_str().to_string(),
            matcher: Matcher::Pattern(pattern),
        }
    }

    /// Text used when reporting a missing anchor.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matches(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Contains {
                needle,
                case_sensitive: true,
            } => text.contains(needle.as_str()),
            Matcher::Contains { needle, .. } => text.to_lowercase().contains(needle.as_str()),
            Matcher::Pattern(re) => re.is_match(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    fn of(self, point: Point) -> f32 {
        match self {
            Axis::X => point.x,
            Axis::Y => point.y,
        }
    }
}

/// How several coordinates of one edge are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Min,
    Max,
}

impl Aggregate {
    fn apply(self, values: impl IntoIterator<Item = f32>) -> Option<f32> {
        values.into_iter().reduce(|a, b| match self {
            Aggregate::Min => a.min(b),
            Aggregate::Max => a.max(b),
        })
    }
}

/// Where an edge coordinate comes from.
#[derive(Debug, Clone)]
pub enum EdgeSource {
    /// A corner of the page's first emitted token.
    FirstToken(Corner),
    /// A corner of the first token matching the anchor.
    Anchor(Anchor, Corner),
    /// A corner of every token matching the anchor.
    EveryMatch(Anchor, Corner),
    /// A corner of every token on the page.
    PageExtent(Corner),
    /// A corner of every token emitted between the first matches of `from`
    /// and `to`, both inclusive. Only `from` is taken when `to` is absent.
    Span { from: Anchor, to: Anchor, corner: Corner },
}

impl EdgeSource {
    fn label(&self) -> &str {
        match self {
            EdgeSource::FirstToken(_) => "<first token>",
            EdgeSource::PageExtent(_) => "<page>",
            EdgeSource::Anchor(anchor, _) | EdgeSource::EveryMatch(anchor, _) => anchor.label(),
            EdgeSource::Span { from, .. } => from.label(),
        }
    }

    fn coordinates(&self, table: &TokenTable, axis: Axis) -> Vec<f32> {
        let at = |token: &Token, corner: Corner| axis.of(token.corner(corner));

        match self {
            EdgeSource::FirstToken(corner) => table.first().map(|t| at(t, *corner)).into_iter().collect(),
            EdgeSource::Anchor(anchor, corner) => table.find(anchor).map(|t| at(t, *corner)).into_iter().collect(),
            EdgeSource::EveryMatch(anchor, corner) => {
                table.find_all(anchor).map(|t| at(t, *corner)).collect()
            }
            EdgeSource::PageExtent(corner) => table.iter().map(|t| at(t, *corner)).collect(),
            EdgeSource::Span { from, to, corner } => {
                let Some(start) = table.position(from) else {
                    return Vec::new();
                };
                let end = table.position(to).unwrap_or(start);
                let (lo, hi) = (start.min(end), start.max(end));
                table.tokens()[lo..=hi].iter().map(|t| at(t, *corner)).collect()
            }
        }
    }
}

#[derive(Debug, Clone)]
struct EdgeTerm {
    source: EdgeSource,
    required: bool,
}

/// Coordinates contributing to one region edge or column boundary.
#[derive(Debug, Clone)]
pub struct EdgeRule {
    terms: Vec<EdgeTerm>,
}

impl EdgeRule {
    /// Rule with a single required source.
    pub fn of(source: EdgeSource) -> Self {
        Self {
            terms: vec![EdgeTerm {
                source,
                required: true,
            }],
        }
    }

    /// Shorthand for the first token matching `anchor`.
    pub fn anchor(anchor: Anchor, corner: Corner) -> Self {
        Self::of(EdgeSource::Anchor(anchor, corner))
    }

    /// Shorthand for the page-wide extent.
    pub fn page(corner: Corner) -> Self {
        Self::of(EdgeSource::PageExtent(corner))
    }

    /// Add another required source.
    pub fn with(mut self, source: EdgeSource) -> Self {
        self.terms.push(EdgeTerm {
            source,
            required: true,
        });
        self
    }

    /// Add a source that is skipped when its anchor is absent.
    pub fn with_optional(mut self, source: EdgeSource) -> Self {
        self.terms.push(EdgeTerm {
            source,
            required: false,
        });
        self
    }

    /// Resolve the rule to one coordinate.
    pub fn resolve(
        &self,
        table: &TokenTable,
        axis: Axis,
        aggregate: Aggregate,
        context: &str,
    ) -> Result<f32, LayoutError> {
        let not_found = |label: &str| LayoutError::AnchorNotFound {
            page: table.page(),
            anchor: label.to_string(),
            region: context.to_string(),
        };

        let mut values = Vec::new();
        for term in &self.terms {
            let found = term.source.coordinates(table, axis);
            if found.is_empty() && term.required {
                return Err(not_found(term.source.label()));
            }
            values.extend(found);
        }

        aggregate.apply(values).ok_or_else(|| {
            not_found(self.terms.first().map(|t| t.source.label()).unwrap_or("<none>"))
        })
    }
}

/// Declarative description of a named region.
#[derive(Debug, Clone)]
pub struct RegionRule {
    pub name: String,
    pub left: EdgeRule,
    pub top: EdgeRule,
    pub right: EdgeRule,
    pub bottom: EdgeRule,
}

impl RegionRule {
    pub fn new(
        name: impl Into<String>,
        left: EdgeRule,
        top: EdgeRule,
        right: EdgeRule,
        bottom: EdgeRule,
    ) -> Self {
        Self {
            name: name.into(),
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Compute the margin-expanded box of a region.
pub fn locate(table: &TokenTable, rule: &RegionRule, margin: f32) -> Result<Region, LayoutError> {
    let name = rule.name.as_str();
    let region = Region::new(
        rule.left.resolve(table, Axis::X, Aggregate::Min, name)?,
        rule.top.resolve(table, Axis::Y, Aggregate::Min, name)?,
        rule.right.resolve(table, Axis::X, Aggregate::Max, name)?,
        rule.bottom.resolve(table, Axis::Y, Aggregate::Max, name)?,
    )
    .expand(margin);

    debug!(
        "Page {}: {} region ({:.1}, {:.1}) - ({:.1}, {:.1})",
        table.page(),
        name,
        region.min_x,
        region.min_y,
        region.max_x,
        region.max_y
    );

    Ok(region)
}

/// Tokens lying strictly inside `region`, in table order.
pub fn project(table: &TokenTable, region: &Region) -> TokenTable {
    table.subset(table.iter().filter(|t| region.contains(t)))
}

impl TokenTable {
    /// First token matching the anchor.
    pub fn find(&self, anchor: &Anchor) -> Option<&Token> {
        self.iter().find(|t| anchor.matches(t.text()))
    }

    /// All tokens matching the anchor.
    pub fn find_all<'a>(&'a self, anchor: &'a Anchor) -> impl Iterator<Item = &'a Token> + 'a {
        self.iter().filter(move |t| anchor.matches(t.text()))
    }

    /// Position of the first token matching the anchor.
    pub fn position(&self, anchor: &Anchor) -> Option<usize> {
        self.iter().position(|t| anchor.matches(t.text()))
    }

    /// First token matching the anchor, or an `AnchorNotFound` error.
    pub fn require(&self, anchor: &Anchor, context: &str) -> Result<&Token, LayoutError> {
        self.find(anchor).ok_or_else(|| LayoutError::AnchorNotFound {
            page: self.page(),
            anchor: anchor.label().to_string(),
            region: context.to_string(),
        })
    }

    /// Tokens lying strictly inside `region`.
    pub fn project(&self, region: &Region) -> TokenTable {
        project(self, region)
    }
}
