//! Rule-based text cleaning for hospital invoices.

pub mod amounts;
pub mod patterns;
pub mod text;

pub use amounts::{amount_value, normalize_amount, normalize_quantity, parse_amount};
pub use patterns::*;
pub use text::{normalize_key, payment_label_key, title_case};
