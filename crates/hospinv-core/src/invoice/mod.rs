//! Invoice field extraction module.

mod assembler;
mod parser;
pub mod rules;
pub mod templates;

pub use assembler::{GstPageInfo, InvoiceAssembler, PageParts};
pub use parser::{
    DocumentOptions, DocumentResult, HospitalInvoiceParser, PageFailure, DEFAULT_LINE_GAP,
    DEFAULT_MARGIN,
};
pub use templates::{TemplateDescriptor, TemplateRegistry};

use crate::error::Result;
use crate::models::invoice::InvoiceRecord;
use crate::ocr::TokenTable;

/// Trait for invoice extractors working on one OCR page.
pub trait InvoiceExtractor {
    /// Extract the structured record of one page.
    fn extract(&self, page: &TokenTable) -> Result<InvoiceRecord>;
}
