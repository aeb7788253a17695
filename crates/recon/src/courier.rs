//! Courier state extraction from the ERP `Courier State` payload.
//!
//! The payload is a JSON document of the shape
//! `{"courier_vouchers": [{"state_friendly": "Delivered", ...}, ...]}`.
//! Some exports serialize it twice, so the document arrives as a JSON
//! string containing the real document.

use serde_json::Value;

/// Friendly state of the first courier voucher, trimmed and lowercased.
/// Anything missing or malformed yields an empty label.
pub fn extract_state(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let Some(doc) = parse_document(raw) else {
        log::debug!("courier state: unparseable payload {raw:?}");
        return String::new();
    };

    doc.get("courier_vouchers")
        .and_then(Value::as_array)
        .and_then(|vouchers| vouchers.first())
        .and_then(|voucher| voucher.get("state_friendly"))
        .and_then(Value::as_str)
        .map(|state| state.trim().to_lowercase())
        .unwrap_or_default()
}

/// Parse the payload, unwrapping at most one extra layer of string encoding.
fn parse_document(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::String(inner) => serde_json::from_str(&inner).ok(),
        doc => Some(doc),
    }
}

/// First non-empty label in row order.
pub fn group_state<'a>(states: impl IntoIterator<Item = &'a str>) -> &'a str {
    states
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or("")
}
