//! Template-driven invoice parser for hospital OCR pages.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, HospinvError, Result};
use crate::layout::{align, classify_columns, locate, parse_line, reconstruct, Column};
use crate::models::config::HospinvConfig;
use crate::models::invoice::{InvoiceRecord, KeyInfoRecord, LineItem, PaymentRecord};
use crate::ocr::TokenTable;

use super::assembler::{GstPageInfo, InvoiceAssembler, PageParts};
use super::rules::{
    amount_value, normalize_amount, normalize_key, normalize_quantity, parse_amount,
    payment_label_key, title_case, PAGE_NUMBER, PAYMENT_NOISE, TAX_INVOICE_DATE,
};
use super::templates::{
    TemplateDescriptor, TemplateRegistry, ITEM_AMOUNT, ITEM_CODE, ITEM_DESCRIPTION,
    ITEM_QUANTITY, PAYMENT_AMOUNT, PAYMENT_LABEL,
};
use super::InvoiceExtractor;

/// Default margin added around every located region.
pub const DEFAULT_MARGIN: f32 = 5.0;

/// Default vertical gap that starts a new key-info line.
pub const DEFAULT_LINE_GAP: f32 = 15.0;

/// Page loop settings for [`HospitalInvoiceParser::extract_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Process at most this many pages.
    pub max_pages: Option<usize>,
    /// Skip failed pages instead of aborting.
    pub continue_on_error: bool,
}

impl DocumentOptions {
    pub fn from_config(config: &HospinvConfig) -> Self {
        Self {
            max_pages: config.page_limit(),
            continue_on_error: config.output.continue_on_error,
        }
    }
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            max_pages: None,
            continue_on_error: true,
        }
    }
}

/// A page that could not be extracted.
#[derive(Debug)]
pub struct PageFailure {
    pub page: usize,
    pub error: HospinvError,
}

/// Outcome of a whole-document run.
#[derive(Debug, Default)]
pub struct DocumentResult {
    /// Records of the pages that succeeded, in page order.
    pub records: Vec<InvoiceRecord>,
    /// Pages that were skipped.
    pub failures: Vec<PageFailure>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Parser reconstructing invoice records from positioned OCR tokens.
#[derive(Debug, Clone)]
pub struct HospitalInvoiceParser {
    registry: TemplateRegistry,
    assembler: InvoiceAssembler,
    /// Margin added around located regions.
    margin: f32,
    /// Vertical gap starting a new key-info line.
    line_gap: f32,
}

impl HospitalInvoiceParser {
    /// Create a parser for the built-in templates with default settings.
    pub fn new() -> Self {
        Self::with_templates(TemplateRegistry::builtin())
    }

    fn with_templates(registry: TemplateRegistry) -> Self {
        Self {
            assembler: InvoiceAssembler::new(registry.names()),
            registry,
            margin: DEFAULT_MARGIN,
            line_gap: DEFAULT_LINE_GAP,
        }
    }

    /// Create a parser from configuration.
    pub fn from_config(config: &HospinvConfig) -> Self {
        let registry =
            TemplateRegistry::builtin().with_extra_known_fields(&config.templates.extra_known_fields);

        Self::with_templates(registry)
            .with_margin(config.layout.margin)
            .with_line_gap_threshold(config.layout.line_gap_threshold)
    }

    /// Use a custom template registry.
    pub fn with_registry(self, registry: TemplateRegistry) -> Self {
        Self::with_templates(registry)
            .with_margin(self.margin)
            .with_line_gap_threshold(self.line_gap)
    }

    /// Set region margin.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Set key-info line gap threshold.
    pub fn with_line_gap_threshold(mut self, gap: f32) -> Self {
        self.line_gap = gap;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Read the hospital name from the page banner.
    pub fn detect_hospital(&self, page: &TokenTable) -> Result<String> {
        let region = locate(page, self.registry.banner(), self.margin)?;
        let banner = page.project(&region);
        Ok(title_case(banner.joined_text().trim()))
    }

    fn template_for(&self, page: &TokenTable) -> Result<(String, &TemplateDescriptor)> {
        let hospital = self.detect_hospital(page)?;
        debug!("Page {}: detected hospital {:?}", page.page(), hospital);

        match self.registry.select(&hospital) {
            Some(template) => Ok((hospital, template)),
            None => Err(ExtractionError::UnsupportedTemplate {
                page: page.page(),
                name: hospital,
            }
            .into()),
        }
    }

    fn gst_page_info(&self, page: &TokenTable, template: &TemplateDescriptor) -> Result<GstPageInfo> {
        let rule = &template.regions.gst_strip;
        let strip = page.project(&locate(page, rule, self.margin)?);
        let fields = &template.strip_fields;

        let gst_number = strip
            .require(&fields.gst_number, &rule.name)?
            .text()
            .rsplit(':')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        let bill_type = match strip.find(&fields.bill_type) {
            Some(token) => token.text().to_string(),
            None => {
                warn!("Page {}: no bill type in {}", page.page(), rule.name);
                String::new()
            }
        };

        let page_text = strip.require(&fields.page, &rule.name)?.text();
        let page_number = page_number(page_text);

        let tax_invoice_date = TAX_INVOICE_DATE
            .find(page_text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        if !tax_invoice_date.is_empty() && parse_invoice_date(&tax_invoice_date).is_none() {
            warn!(
                "Page {}: tax invoice date {:?} is not a calendar date",
                page.page(),
                tax_invoice_date
            );
        }

        Ok(GstPageInfo {
            gst_number,
            bill_type,
            page_number,
            tax_invoice_date,
        })
    }

    fn key_info(&self, page: &TokenTable, template: &TemplateDescriptor) -> Result<KeyInfoRecord> {
        let tokens = page.project(&locate(page, &template.regions.key_info, self.margin)?);

        let mut lines = reconstruct(&tokens, self.line_gap);
        for correction in &template.corrections {
            lines = correction.apply(&lines);
        }

        let mut record = KeyInfoRecord::new();
        for line in &lines {
            match parse_line(line, &template.known_fields) {
                Some((field, value)) => record.insert(normalize_key(&field), value),
                None => debug!("Page {}: dropping key-info line {:?}", page.page(), line),
            }
        }

        Ok(record)
    }

    fn line_items(&self, page: &TokenTable, template: &TemplateDescriptor) -> Result<Vec<LineItem>> {
        let tokens = page.project(&locate(page, &template.regions.table, self.margin)?);
        let columns = classify_columns(&tokens, &template.table_columns, self.margin)?;

        let columns: Vec<Column> = columns
            .into_iter()
            .map(|column| {
                if column.name == ITEM_QUANTITY {
                    retain(column, normalize_quantity)
                } else if column.name == ITEM_AMOUNT {
                    retain(column, checked_amount)
                } else {
                    column
                }
            })
            .collect();

        let rows = split_anchor(columns, &template.row_anchor)
            .map(|(anchor, others)| align(&anchor, &others))
            .unwrap_or_default();

        Ok(rows
            .into_iter()
            .map(|row| LineItem {
                item_code: row.text(ITEM_CODE),
                item_description: row.text(ITEM_DESCRIPTION),
                item_quantity: row.text(ITEM_QUANTITY),
                item_amount: row.text(ITEM_AMOUNT),
            })
            .collect())
    }

    fn payments(&self, page: &TokenTable, template: &TemplateDescriptor) -> Result<PaymentRecord> {
        let tokens = page
            .project(&locate(page, &template.regions.payment, self.margin)?)
            .filter_map_text(|text| {
                let cleaned = PAYMENT_NOISE.replace_all(text, "");
                let cleaned = cleaned.trim();
                (!cleaned.is_empty()).then(|| cleaned.to_string())
            });

        let columns: Vec<Column> = classify_columns(&tokens, &template.payment_columns, self.margin)?
            .into_iter()
            .map(|column| {
                if column.name == PAYMENT_AMOUNT {
                    retain(column, checked_amount)
                } else {
                    column
                }
            })
            .collect();

        let rows = split_anchor(columns, PAYMENT_LABEL)
            .map(|(labels, amounts)| align(&labels, &amounts))
            .unwrap_or_default();

        let mut record = PaymentRecord::new();
        for row in rows {
            let label = row.text(PAYMENT_LABEL);
            let Some(amount) = row.get(PAYMENT_AMOUNT) else {
                debug!("Page {}: payment label {:?} has no amount", page.page(), label);
                continue;
            };

            let key = payment_label_key(&label);
            if key.is_empty() {
                continue;
            }
            record.insert(key, amount_value(amount)?);
        }

        Ok(record)
    }

    /// Run the page pipeline over a document.
    ///
    /// With `continue_on_error` a failed page is logged and skipped;
    /// otherwise the first failure is returned.
    pub fn extract_document(
        &self,
        pages: &[TokenTable],
        options: &DocumentOptions,
    ) -> Result<DocumentResult> {
        let start = Instant::now();
        let limit = options.max_pages.unwrap_or(pages.len()).min(pages.len());
        info!("Extracting {} of {} pages", limit, pages.len());

        let mut result = DocumentResult::default();
        for page in &pages[..limit] {
            match self.extract(page) {
                Ok(record) => result.records.push(record),
                Err(error) if options.continue_on_error => {
                    warn!("Skipping page {}: {}", page.page(), error);
                    result.failures.push(PageFailure {
                        page: page.page(),
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }

        result.processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extracted {} records, skipped {} pages in {}ms",
            result.records.len(),
            result.failures.len(),
            result.processing_time_ms
        );

        Ok(result)
    }
}

impl Default for HospitalInvoiceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceExtractor for HospitalInvoiceParser {
    fn extract(&self, page: &TokenTable) -> Result<InvoiceRecord> {
        let start = Instant::now();
        let (hospital, template) = self.template_for(page)?;

        let parts = PageParts {
            gst_page_info: self.gst_page_info(page, template)?,
            key_info: self.key_info(page, template)?,
            table: self.line_items(page, template)?,
            payments: self.payments(page, template)?,
        };

        let record = self.assembler.assemble(page.page(), &hospital, parts)?;

        info!(
            "Page {}: {} with {} line items, {} key fields in {:?}",
            page.page(),
            hospital,
            record.table.len(),
            record.key_values.len(),
            start.elapsed()
        );

        Ok(record)
    }
}

/// Number after the slash of a "Page n/m" token.
fn page_number(text: &str) -> String {
    if let Some(caps) = PAGE_NUMBER.captures(text) {
        return caps[1].to_string();
    }

    text.rsplit_once('/')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .unwrap_or_default()
        .to_string()
}

/// Parse a `dd.mm.yyyy` date, accepting spaces or repeated separators.
fn parse_invoice_date(text: &str) -> Option<NaiveDate> {
    let normalized = text
        .split(|c: char| c == '.' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(".");

    NaiveDate::parse_from_str(&normalized, "%d.%m.%Y").ok()
}

/// Normalized amount text, or `None` when it does not parse.
fn checked_amount(text: &str) -> Option<String> {
    match parse_amount(text) {
        Ok(_) => Some(normalize_amount(text)),
        Err(e) => {
            debug!("Dropping amount token: {}", e);
            None
        }
    }
}

fn retain(column: Column, clean: impl Fn(&str) -> Option<String>) -> Column {
    Column {
        tokens: column.tokens.filter_map_text(clean),
        name: column.name,
    }
}

/// Separate the named column from the rest.
fn split_anchor(columns: Vec<Column>, anchor: &str) -> Option<(Column, Vec<Column>)> {
    let (mut anchors, others): (Vec<_>, Vec<_>) =
        columns.into_iter().partition(|c| c.name == anchor);
    anchors.pop().map(|anchor| (anchor, others))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use crate::ocr::Token;
    use pretty_assertions::assert_eq;

    fn fixture_tokens() -> Vec<Token> {
        vec![
            Token::axis_aligned("Singapore General Hospital", 50.0, 20.0, 400.0, 45.0),
            Token::axis_aligned("TAX INVOICE", 250.0, 60.0, 350.0, 80.0),
            Token::axis_aligned("GST REG NO: 12345", 50.0, 100.0, 250.0, 115.0),
            Token::axis_aligned("Page 1/2 01.02.2023", 450.0, 100.0, 650.0, 115.0),
            Token::axis_aligned("Tax Invoice Number:INV001", 50.0, 140.0, 300.0, 155.0),
            Token::axis_aligned("SERVICE CODE", 50.0, 200.0, 150.0, 215.0),
            Token::axis_aligned("DESCRIPTION", 200.0, 200.0, 350.0, 215.0),
            Token::axis_aligned("QUANTITY", 400.0, 200.0, 480.0, 215.0),
            Token::axis_aligned("AMOUNT", 550.0, 200.0, 620.0, 215.0),
            Token::axis_aligned("CODE1", 50.0, 240.0, 110.0, 255.0),
            Token::axis_aligned("Consultation", 200.0, 240.0, 320.0, 255.0),
            Token::axis_aligned("2", 420.0, 240.0, 430.0, 255.0),
            Token::axis_aligned("1050", 570.0, 240.0, 610.0, 255.0),
            Token::axis_aligned("Subtotal Charges", 380.0, 280.0, 500.0, 295.0),
            Token::axis_aligned("1050", 570.0, 280.0, 610.0, 295.0),
            Token::axis_aligned("NET AMOUNT PAYABLE", 50.0, 340.0, 250.0, 355.0),
            Token::axis_aligned("1050", 570.0, 340.0, 610.0, 355.0),
        ]
    }

    fn fixture(page: usize) -> TokenTable {
        TokenTable::new(page, fixture_tokens())
    }

    fn sgh() -> TemplateDescriptor {
        TemplateDescriptor::standard("Singapore General Hospital")
    }

    #[test]
    fn test_extract_single_page() {
        let parser = HospitalInvoiceParser::new();
        let record = parser.extract(&fixture(0)).unwrap();

        assert_eq!(record.page_number, "2");
        assert_eq!(&record.key_values["GSTRegNo"], "12345");
        assert_eq!(&record.key_values["TaxInvoiceNumber"], "INV001");
        assert_eq!(&record.key_values["TaxInvoiceDate"], "01.02.2023");
        assert_eq!(&record.key_values["BillType"], "");
        assert_eq!(
            record.table,
            vec![LineItem {
                item_code: "CODE1".to_string(),
                item_description: "Consultation".to_string(),
                item_quantity: "2".to_string(),
                item_amount: "10.50".to_string(),
            }]
        );
        assert_eq!(record.total_payments.len(), 1);
        assert_eq!(record.total_payments["NetAmountPayable"], 10.5);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let parser = HospitalInvoiceParser::new();
        let page = fixture(0);

        assert_eq!(parser.extract(&page).unwrap(), parser.extract(&page).unwrap());
    }

    #[test]
    fn test_detect_hospital() {
        let parser = HospitalInvoiceParser::new();
        assert_eq!(
            parser.detect_hospital(&fixture(0)).unwrap(),
            "Singapore General Hospital"
        );
    }

    #[test]
    fn test_unsupported_hospital() {
        let mut tokens = fixture_tokens();
        tokens[0] = Token::axis_aligned("CHANGI GENERAL HOSPITAL", 50.0, 20.0, 400.0, 45.0);
        let page = TokenTable::new(3, tokens);

        let err = HospitalInvoiceParser::new().extract(&page).unwrap_err();

        assert!(matches!(
            err,
            HospinvError::Extraction(ExtractionError::UnsupportedTemplate { page: 3, ref name })
                if name == "Changi General Hospital"
        ));
        assert_eq!(err.page(), Some(3));
    }

    #[test]
    fn test_missing_table_anchor() {
        let tokens = fixture_tokens()
            .into_iter()
            .filter(|t| t.text() != "Subtotal Charges")
            .collect();
        let page = TokenTable::new(1, tokens);

        let err = HospitalInvoiceParser::new().extract(&page).unwrap_err();

        match err {
            HospinvError::Layout(LayoutError::AnchorNotFound { page, anchor, region }) => {
                assert_eq!(page, 1);
                assert_eq!(anchor, "Subtotal Charges");
                assert_eq!(region, "line-item table");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bill_type_from_strip() {
        let mut tokens = fixture_tokens();
        tokens.insert(3, Token::axis_aligned("DUPLICATE", 300.0, 100.0, 400.0, 115.0));
        let page = TokenTable::new(0, tokens);

        let info = HospitalInvoiceParser::new().gst_page_info(&page, &sgh()).unwrap();

        assert_eq!(info.bill_type, "DUPLICATE");
        assert_eq!(info.page_number, "2");
    }

    #[test]
    fn test_key_info_joins_wrapped_visit_location() {
        let page = TokenTable::new(
            0,
            vec![
                Token::axis_aligned("Tax Invoice Number: INV001", 50.0, 140.0, 300.0, 155.0),
                Token::axis_aligned("Visit/", 50.0, 160.0, 100.0, 175.0),
                Token::axis_aligned("Bill Location: Ward 5", 50.0, 180.0, 300.0, 195.0),
                Token::axis_aligned("Payment Class: A", 50.0, 200.0, 250.0, 215.0),
                Token::axis_aligned("Type of Supply: Exempt", 50.0, 220.0, 300.0, 235.0),
            ],
        );

        let record = HospitalInvoiceParser::new().key_info(&page, &sgh()).unwrap();

        assert_eq!(record.len(), 4);
        assert_eq!(&record["TaxInvoiceNumber"], "INV001");
        assert_eq!(&record["Visit/BillLocation"], "Ward 5");
        assert_eq!(&record["PaymentClass"], "A");
        assert_eq!(&record["TypeOfSupply"], "Exempt");
    }

    #[test]
    fn test_payment_block_starts_below_total_label() {
        let mut tokens = fixture_tokens();
        let net = tokens.len() - 2;
        tokens.splice(
            net..net,
            vec![
                Token::axis_aligned("Total Payable", 50.0, 300.0, 250.0, 315.0),
                Token::axis_aligned("900", 570.0, 300.0, 610.0, 315.0),
                Token::axis_aligned("GST 9%", 50.0, 320.0, 150.0, 335.0),
                Token::axis_aligned("$90", 570.0, 320.0, 610.0, 335.0),
            ],
        );
        let page = TokenTable::new(0, tokens);

        let payments = HospitalInvoiceParser::new().payments(&page, &sgh()).unwrap();

        assert_eq!(payments.len(), 2);
        assert_eq!(payments["Gst"], 0.9);
        assert_eq!(payments["NetAmountPayable"], 10.5);
        assert_eq!(payments.get("TotalPayable"), None);
    }

    #[test]
    fn test_payment_label_wider_than_boundary_keeps_its_amount() {
        let mut tokens = fixture_tokens();
        tokens.truncate(tokens.len() - 2);
        tokens.extend([
            Token::axis_aligned("Total Charges Payable", 50.0, 300.0, 250.0, 315.0),
            Token::axis_aligned("GST 9%", 50.0, 320.0, 150.0, 335.0),
            Token::axis_aligned("$90", 570.0, 320.0, 610.0, 335.0),
            Token::axis_aligned("AMOUNT PAYABLE AFTER TAX", 50.0, 340.0, 300.0, 355.0),
            Token::axis_aligned("1140", 570.0, 340.0, 610.0, 355.0),
            Token::axis_aligned("Less: MediShield Life Claim Policy 2023", 50.0, 360.0, 420.0, 375.0),
            Token::axis_aligned("200", 570.0, 360.0, 610.0, 375.0),
            Token::axis_aligned("NET AMOUNT PAYABLE", 50.0, 380.0, 250.0, 395.0),
            Token::axis_aligned("940", 570.0, 380.0, 610.0, 395.0),
        ]);
        let page = TokenTable::new(0, tokens);

        let payments = HospitalInvoiceParser::new().payments(&page, &sgh()).unwrap();

        assert_eq!(payments.len(), 4);
        assert_eq!(payments["Gst"], 0.9);
        assert_eq!(payments["AmountPayableAfterTax"], 11.4);
        assert_eq!(payments["LessMedishieldLifeClaimPolicy"], 2.0);
        assert_eq!(payments["NetAmountPayable"], 9.4);
    }

    #[test]
    fn test_extract_document_skips_failed_pages() {
        let mut bad = fixture_tokens();
        bad.retain(|t| !t.text().starts_with("SERVICE CODE"));
        let pages = vec![fixture(0), TokenTable::new(1, bad), fixture(2)];

        let result = HospitalInvoiceParser::new()
            .extract_document(&pages, &DocumentOptions::default())
            .unwrap();

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].page, 1);
    }

    #[test]
    fn test_extract_document_fail_fast() {
        let pages = vec![fixture(0), TokenTable::new(1, Vec::new())];
        let options = DocumentOptions {
            max_pages: None,
            continue_on_error: false,
        };

        let err = HospitalInvoiceParser::new()
            .extract_document(&pages, &options)
            .unwrap_err();

        assert_eq!(err.page(), Some(1));
    }

    #[test]
    fn test_extract_document_page_limit() {
        let pages = vec![fixture(0), fixture(1), fixture(2)];
        let options = DocumentOptions {
            max_pages: Some(2),
            continue_on_error: true,
        };

        let result = HospitalInvoiceParser::new()
            .extract_document(&pages, &options)
            .unwrap();

        assert_eq!(result.records.len(), 2);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_parse_invoice_date() {
        assert_eq!(
            parse_invoice_date("01. 02 2023"),
            NaiveDate::from_ymd_opt(2023, 2, 1)
        );
        assert_eq!(parse_invoice_date("31.02.2023"), None);
    }

    #[test]
    fn test_page_number_fallback() {
        assert_eq!(page_number("Page 3/4"), "4");
        assert_eq!(page_number("Pg 1/ 7 01.02.2023"), "7");
        assert_eq!(page_number("Page"), "");
    }
}
