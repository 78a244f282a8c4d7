//! Common regex patterns for hospital invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Bill type printed in the GST/page strip
    pub static ref BILL_TYPE: Regex = Regex::new(
        r"ORIGINAL|DUPLICATE|INTERIM"
    ).unwrap();

    // "Page 1/2" or "Page 1 / 2"; captures the number after the slash
    pub static ref PAGE_NUMBER: Regex = Regex::new(
        r"(?i)page\s*\d*\s*/\s*(\d+)"
    ).unwrap();

    // Tax invoice date (dd.mm.yyyy, dots or spaces as separators)
    pub static ref TAX_INVOICE_DATE: Regex = Regex::new(
        r"\d{2}[.\s]+\d{2}[.\s]+\d{4}"
    ).unwrap();

    // Label opening the payment block ("Total ... Payable")
    pub static ref TOTAL_PAYABLE: Regex = Regex::new(
        r"Total[A-Za-z\s]*le"
    ).unwrap();

    // Visit/Bill Location value wrapped before the Payment Class line
    pub static ref VISIT_LOCATION: Regex = Regex::new(
        r"(?s)(\bVisit/.*?)Payment"
    ).unwrap();

    // Characters kept in payment block tokens
    pub static ref PAYMENT_NOISE: Regex = Regex::new(
        r"[^A-Za-z0-9.\s]"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number() {
        let caps = PAGE_NUMBER.captures("Page 1/2 01.02.2023").unwrap();
        assert_eq!(&caps[1], "2");

        let caps = PAGE_NUMBER.captures("Page 3 / 12").unwrap();
        assert_eq!(&caps[1], "12");
    }

    #[test]
    fn test_tax_invoice_date() {
        let m = TAX_INVOICE_DATE.find("Page 1/2 01.02.2023").unwrap();
        assert_eq!(m.as_str(), "01.02.2023");
        assert!(TAX_INVOICE_DATE.is_match("01 02 2023"));
    }

    #[test]
    fn test_total_payable_is_case_sensitive() {
        assert!(TOTAL_PAYABLE.is_match("Total Amount Payable"));
        assert!(!TOTAL_PAYABLE.is_match("Subtotal Charges"));
    }
}
