//! Core library for hospital invoice OCR processing.
//!
//! This crate provides:
//! - Token tables built from per-page OCR output (quadrilateral boxes + text)
//! - Geometric layout reconstruction: anchor-located regions, column
//!   classification, row alignment and line reconstruction
//! - Numeric normalisation of amounts and quantities
//! - A registry of supported hospital invoice templates
//! - Assembly of the final structured invoice record

pub mod error;
pub mod models;
pub mod ocr;
pub mod layout;
pub mod invoice;

pub use error::{HospinvError, Result};
pub use models::invoice::{InvoiceRecord, KeyInfoRecord, LineItem, PaymentRecord};
pub use models::config::HospinvConfig;
pub use ocr::{OcrCache, Point, Token, TokenTable};
pub use layout::{Anchor, Region, RegionRule};
pub use invoice::{
    DocumentOptions, DocumentResult, HospitalInvoiceParser, InvoiceAssembler, InvoiceExtractor,
    TemplateRegistry,
};
