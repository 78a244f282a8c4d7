//! Geometric layout reconstruction over OCR token tables.
//!
//! Regions are located from anchor text, tokens are projected into them,
//! then split into columns and rows (tables) or merged into lines
//! (key/value blocks).

pub mod columns;
pub mod lines;
pub mod region;
pub mod rows;

pub use columns::{classify, classify_at, classify_columns, Column, ColumnBoundary, ColumnLayout, ColumnSpec};
pub use lines::{parse_line, reconstruct, LineCorrection};
pub use region::{locate, project, Aggregate, Anchor, Axis, EdgeRule, EdgeSource, Region, RegionRule};
pub use rows::{align, AlignedRow};
