//! Registry of supported invoice templates.
//!
//! Each template bundles the anchor rules locating its regions, the column
//! layouts of its tables, the key-info field labels it prints and the line
//! corrections its OCR output needs. The banner rule is shared: it is used
//! to read the hospital name that selects a template.

use crate::layout::{
    Anchor, ColumnBoundary, ColumnLayout, ColumnSpec, EdgeRule, EdgeSource, LineCorrection,
    RegionRule,
};
use crate::ocr::Corner;

use super::rules::patterns::{BILL_TYPE, TOTAL_PAYABLE, VISIT_LOCATION};

/// Column names of the charges table.
pub const ITEM_CODE: &str = "item_code";
pub const ITEM_DESCRIPTION: &str = "item_description";
pub const ITEM_QUANTITY: &str = "item_quantity";
pub const ITEM_AMOUNT: &str = "item_amount";

/// Column names of the payment block.
pub const PAYMENT_LABEL: &str = "payment_info";
pub const PAYMENT_AMOUNT: &str = "payment_amount";

/// Key-info labels printed on the built-in templates, in match order.
pub const STANDARD_KNOWN_FIELDS: [&str; 11] = [
    "Tax Invoice Number",
    "Bill Ref Number",
    "Tax Invoice Date",
    "Patient NRICI/HRN",
    "Visit Date",
    "Visit/Bill Location",
    "Payment Class",
    "Type of Supply",
    "GST Reg No",
    "Page No",
    "Bill Type",
];

/// Hospitals whose invoices use the built-in layout.
pub const SUPPORTED_HOSPITALS: [&str; 2] = ["Singapore General Hospital", "Tan Tock Seng Hospital"];

/// Anchors of the fields read from the GST/page strip.
#[derive(Debug, Clone)]
pub struct StripFields {
    pub gst_number: Anchor,
    pub bill_type: Anchor,
    pub page: Anchor,
}

/// Region rules of one template.
#[derive(Debug, Clone)]
pub struct TemplateRegions {
    pub gst_strip: RegionRule,
    pub key_info: RegionRule,
    pub table: RegionRule,
    pub payment: RegionRule,
}

/// Everything template-specific about one invoice layout.
#[derive(Debug, Clone)]
pub struct TemplateDescriptor {
    /// Hospital name as read from the banner (title-cased).
    pub name: String,
    pub regions: TemplateRegions,
    pub strip_fields: StripFields,
    pub table_columns: ColumnLayout,
    /// Column whose tokens start a table row.
    pub row_anchor: String,
    pub payment_columns: ColumnLayout,
    pub known_fields: Vec<String>,
    pub corrections: Vec<LineCorrection>,
}

impl TemplateDescriptor {
    /// The layout shared by the supported public hospitals.
    pub fn standard(name: impl Into<String>) -> Self {
        let tax_invoice = Anchor::exact_case("TAX INVOICE");
        let tax_invoice_number = Anchor::exact_case("Tax Invoice Number");
        let type_of_supply = Anchor::exact_case("Type of Supply");
        let service_code = Anchor::exact_case("SERVICE CODE");
        let amount = Anchor::exact_case("AMOUNT");
        let subtotal_charges = Anchor::exact_case("Subtotal Charges");
        let net_payable = Anchor::exact_case("NET AMOUNT PAYABLE");
        let payable_after_tax = Anchor::exact_case("AMOUNT PAYABLE AFTER TAX");

        let regions = TemplateRegions {
            gst_strip: RegionRule::new(
                "GST/page strip",
                EdgeRule::page(Corner::UpperLeft),
                EdgeRule::anchor(tax_invoice, Corner::LowerLeft),
                EdgeRule::page(Corner::LowerRight),
                EdgeRule::anchor(tax_invoice_number.clone(), Corner::UpperLeft),
            ),
            key_info: RegionRule::new(
                "key info",
                EdgeRule::anchor(tax_invoice_number.clone(), Corner::UpperLeft),
                EdgeRule::anchor(tax_invoice_number.clone(), Corner::UpperLeft),
                EdgeRule::of(EdgeSource::Span {
                    from: tax_invoice_number.clone(),
                    to: type_of_supply.clone(),
                    corner: Corner::LowerRight,
                }),
                EdgeRule::anchor(tax_invoice_number, Corner::LowerRight)
                    .with_optional(EdgeSource::Anchor(type_of_supply, Corner::LowerRight)),
            ),
            table: RegionRule::new(
                "line-item table",
                EdgeRule::anchor(service_code.clone(), Corner::UpperLeft),
                EdgeRule::anchor(service_code.clone(), Corner::UpperLeft)
                    .with(EdgeSource::Anchor(amount.clone(), Corner::UpperRight)),
                EdgeRule::page(Corner::UpperRight),
                EdgeRule::anchor(subtotal_charges, Corner::LowerRight),
            ),
            payment: RegionRule::new(
                "payment block",
                EdgeRule::page(Corner::UpperLeft),
                EdgeRule::anchor(net_payable.clone(), Corner::UpperLeft).with_optional(
                    EdgeSource::Anchor(Anchor::pattern(TOTAL_PAYABLE.clone()), Corner::LowerLeft),
                ),
                EdgeRule::page(Corner::LowerRight),
                EdgeRule::of(EdgeSource::EveryMatch(net_payable.clone(), Corner::LowerRight)),
            ),
        };

        let description = Anchor::exact_case("DESCRIPTION");
        let quantity = Anchor::exact_case("QUANTITY");

        let table_columns = ColumnLayout::new(
            "line-item table",
            vec![
                ColumnSpec::new(ITEM_CODE).with_header(service_code),
                ColumnSpec::new(ITEM_DESCRIPTION).with_header(description.clone()),
                ColumnSpec::new(ITEM_QUANTITY).with_header(quantity.clone()),
                ColumnSpec::new(ITEM_AMOUNT).with_header(amount),
            ],
            vec![
                ColumnBoundary::left_of(EdgeRule::of(EdgeSource::EveryMatch(
                    description,
                    Corner::UpperLeft,
                ))),
                ColumnBoundary::left_of(EdgeRule::of(EdgeSource::EveryMatch(
                    quantity,
                    Corner::UpperLeft,
                ))),
                ColumnBoundary::right_of(EdgeRule::of(EdgeSource::EveryMatch(
                    Anchor::exact_case("Subtotal"),
                    Corner::UpperRight,
                ))),
            ],
        );

        let payment_columns = ColumnLayout::new(
            "payment block",
            vec![ColumnSpec::new(PAYMENT_LABEL), ColumnSpec::new(PAYMENT_AMOUNT)],
            vec![ColumnBoundary::right_of(
                EdgeRule::anchor(net_payable, Corner::UpperRight)
                    .with_optional(EdgeSource::Anchor(payable_after_tax, Corner::UpperRight)),
            )],
        )
        .split_on(Corner::UpperLeft);

        Self {
            name: name.into(),
            regions,
            strip_fields: StripFields {
                gst_number: Anchor::exact_case("GST REG NO"),
                bill_type: Anchor::pattern(BILL_TYPE.clone()),
                page: Anchor::exact_case("Page"),
            },
            table_columns,
            row_anchor: ITEM_CODE.to_string(),
            payment_columns,
            known_fields: STANDARD_KNOWN_FIELDS.iter().map(|s| s.to_string()).collect(),
            corrections: vec![LineCorrection::new("visit/bill location", VISIT_LOCATION.clone())],
        }
    }

    /// Append key-info labels to the known-field list.
    pub fn with_known_fields(mut self, fields: impl IntoIterator<Item = String>) -> Self {
        for field in fields {
            if !self.known_fields.contains(&field) {
                self.known_fields.push(field);
            }
        }
        self
    }
}

/// Banner rule: the box spanning the page's first token and the first
/// token mentioning "hospital".
pub fn banner_rule() -> RegionRule {
    let hospital = Anchor::contains("hospital");
    let corners = |corner: Corner| {
        EdgeRule::of(EdgeSource::FirstToken(corner))
            .with(EdgeSource::Anchor(hospital.clone(), corner))
    };

    RegionRule::new(
        "hospital banner",
        corners(Corner::UpperLeft),
        corners(Corner::UpperLeft),
        corners(Corner::LowerRight),
        corners(Corner::LowerRight),
    )
}

/// Templates selectable by hospital name.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    banner: RegionRule,
    templates: Vec<TemplateDescriptor>,
}

impl TemplateRegistry {
    /// Registry without templates.
    pub fn empty() -> Self {
        Self {
            banner: banner_rule(),
            templates: Vec::new(),
        }
    }

    /// Registry of the built-in hospital templates.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for name in SUPPORTED_HOSPITALS {
            registry.register(TemplateDescriptor::standard(name));
        }
        registry
    }

    /// Add a template, replacing any with the same name.
    pub fn register(&mut self, template: TemplateDescriptor) {
        self.templates.retain(|t| t.name != template.name);
        self.templates.push(template);
    }

    /// Append key-info labels to every template.
    pub fn with_extra_known_fields(mut self, fields: &[String]) -> Self {
        self.templates = self
            .templates
            .into_iter()
            .map(|t| t.with_known_fields(fields.iter().cloned()))
            .collect();
        self
    }

    pub fn banner(&self) -> &RegionRule {
        &self.banner
    }

    /// Template whose name equals the detected hospital name.
    pub fn select(&self, name: &str) -> Option<&TemplateDescriptor> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Names of the registered templates.
    pub fn names(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.name.clone()).collect()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = TemplateRegistry::builtin();

        assert_eq!(registry.names(), SUPPORTED_HOSPITALS.map(String::from).to_vec());
        assert!(registry.select("Singapore General Hospital").is_some());
        assert!(registry.select("Tan Tock Seng Hospital").is_some());
        assert!(registry.select("singapore general hospital").is_none());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = TemplateRegistry::builtin();
        registry.register(
            TemplateDescriptor::standard("Tan Tock Seng Hospital")
                .with_known_fields(vec!["Ward Class".to_string()]),
        );

        assert_eq!(registry.names().len(), 2);
        let ttsh = registry.select("Tan Tock Seng Hospital").unwrap();
        assert_eq!(ttsh.known_fields.last().map(String::as_str), Some("Ward Class"));
    }

    #[test]
    fn test_extra_known_fields_are_deduplicated() {
        let registry = TemplateRegistry::builtin()
            .with_extra_known_fields(&["Visit Date".to_string(), "Ward Class".to_string()]);

        let sgh = registry.select("Singapore General Hospital").unwrap();
        assert_eq!(sgh.known_fields.len(), STANDARD_KNOWN_FIELDS.len() + 1);
    }
}
