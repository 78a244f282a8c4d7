//! Text normalisation for field names and payment labels.

/// Title-case text: the first letter of every run of letters is
/// uppercased and the rest lowercased.
///
/// `"TAX INVOICE number"` → `"Tax Invoice Number"`, `"nrici/hrn"` → `"Nrici/Hrn"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }

    out
}

/// Normalize a key-info field name: trim, title-case, drop whitespace.
pub fn normalize_key(field: &str) -> String {
    title_case(field.trim())
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Normalize a payment label: title-case, keep ASCII letters only.
pub fn payment_label_key(label: &str) -> String {
    title_case(label)
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect()
}
