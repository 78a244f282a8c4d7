//! Invoice record models emitted by the extraction pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A complete structured record for one invoice page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Page number as printed in the GST/page strip.
    #[serde(rename = "Page_Number")]
    pub page_number: String,

    /// Line items of the charges table, top to bottom.
    #[serde(rename = "Table")]
    pub table: Vec<LineItem>,

    /// Payment summary keyed by normalized label.
    #[serde(rename = "TotalPayments")]
    pub total_payments: PaymentRecord,

    /// Header key/value fields.
    #[serde(rename = "Key_Values")]
    pub key_values: KeyInfoRecord,
}

/// One row of the charges table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Service code.
    pub item_code: String,

    /// Service description.
    pub item_description: String,

    /// Quantity, digits only.
    pub item_quantity: String,

    /// Amount with a decimal point (cents convention applied).
    pub item_amount: String,
}

/// Header fields keyed by normalized field name (e.g. `TaxInvoiceNumber`).
///
/// Keys may be written more than once during parsing; the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyInfoRecord(BTreeMap<String, String>);

impl KeyInfoRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::ops::Index<&str> for KeyInfoRecord {
    type Output = str;

    fn index(&self, key: &str) -> &str {
        &self.0[key]
    }
}

/// Payment summary keyed by alphabetic, title-cased label (e.g. `NetAmountPayable`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentRecord(BTreeMap<String, f64>);

impl PaymentRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an amount.
    pub fn insert(&mut self, label: impl Into<String>, amount: f64) {
        self.0.insert(label.into(), amount);
    }

    /// Get an amount by label.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Index<&str> for PaymentRecord {
    type Output = f64;

    fn index(&self, label: &str) -> &f64 {
        &self.0[label]
    }
}
