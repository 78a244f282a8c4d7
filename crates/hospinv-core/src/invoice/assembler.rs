//! Assembly of per-page extraction results into an invoice record.

use crate::error::ExtractionError;
use crate::models::invoice::{InvoiceRecord, KeyInfoRecord, LineItem, PaymentRecord};

/// Fields read from the GST/page strip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GstPageInfo {
    pub gst_number: String,
    /// `ORIGINAL`, `DUPLICATE`, `INTERIM`, or empty when not printed.
    pub bill_type: String,
    pub page_number: String,
    pub tax_invoice_date: String,
}

/// Region outputs of one page, ready for assembly.
#[derive(Debug, Clone, Default)]
pub struct PageParts {
    pub key_info: KeyInfoRecord,
    pub gst_page_info: GstPageInfo,
    pub table: Vec<LineItem>,
    pub payments: PaymentRecord,
}

/// Merges region outputs into the final record for a supported hospital.
#[derive(Debug, Clone)]
pub struct InvoiceAssembler {
    supported: Vec<String>,
}

impl InvoiceAssembler {
    pub fn new(supported: Vec<String>) -> Self {
        Self { supported }
    }

    /// Check that `hospital_name` is one of the supported hospitals.
    pub fn validate(&self, page: usize, hospital_name: &str) -> Result<(), ExtractionError> {
        if self.supported.iter().any(|name| name == hospital_name) {
            Ok(())
        } else {
            Err(ExtractionError::UnsupportedTemplate {
                page,
                name: hospital_name.to_string(),
            })
        }
    }

    /// Build the page record.
    ///
    /// Strip fields are merged into the key-info record under `TaxInvoiceDate`,
    /// `GSTRegNo` and `BillType`, overwriting anything parsed from the
    /// key-info block under the same keys.
    pub fn assemble(
        &self,
        page: usize,
        hospital_name: &str,
        parts: PageParts,
    ) -> Result<InvoiceRecord, ExtractionError> {
        self.validate(page, hospital_name)?;

        let PageParts {
            mut key_info,
            gst_page_info,
            table,
            payments,
        } = parts;

        key_info.insert("TaxInvoiceDate", gst_page_info.tax_invoice_date);
        key_info.insert("GSTRegNo", gst_page_info.gst_number);
        key_info.insert("BillType", gst_page_info.bill_type);

        Ok(InvoiceRecord {
            page_number: gst_page_info.page_number,
            table,
            total_payments: payments,
            key_values: key_info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assembler() -> InvoiceAssembler {
        InvoiceAssembler::new(vec!["Singapore General Hospital".to_string()])
    }

    #[test]
    fn test_assemble_merges_strip_fields() {
        let mut key_info = KeyInfoRecord::new();
        key_info.insert("TaxInvoiceNumber", "INV001");
        key_info.insert("TaxInvoiceDate", "from key block");

        let mut payments = PaymentRecord::new();
        payments.insert("NetAmountPayable", 10.5);

        let parts = PageParts {
            key_info,
            gst_page_info: GstPageInfo {
                gst_number: "12345".to_string(),
                bill_type: "ORIGINAL".to_string(),
                page_number: "2".to_string(),
                tax_invoice_date: "01.02.2023".to_string(),
            },
            table: vec![LineItem {
                item_code: "CODE1".to_string(),
                item_description: "Consultation".to_string(),
                item_quantity: "2".to_string(),
                item_amount: "10.50".to_string(),
            }],
            payments,
        };

        let record = assembler()
            .assemble(0, "Singapore General Hospital", parts)
            .unwrap();

        assert_eq!(record.page_number, "2");
        assert_eq!(record.key_values.len(), 4);
        assert_eq!(&record.key_values["TaxInvoiceDate"], "01.02.2023");
        assert_eq!(&record.key_values["GSTRegNo"], "12345");
        assert_eq!(&record.key_values["BillType"], "ORIGINAL");
        assert_eq!(record.table.len(), 1);
        assert_eq!(record.total_payments["NetAmountPayable"], 10.5);
    }

    #[test]
    fn test_assemble_rejects_unsupported_hospital() {
        let err = assembler()
            .assemble(4, "Changi General Hospital", PageParts::default())
            .unwrap_err();

        assert_eq!(
            err,
            ExtractionError::UnsupportedTemplate {
                page: 4,
                name: "Changi General Hospital".to_string()
            }
        );
    }
}
