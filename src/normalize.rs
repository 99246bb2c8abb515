//! Record normalization helpers.
//!
//! Host records arrive as loosely-typed JSON. Everything here is total:
//! missing or oddly-typed fields are coerced to empty strings, and only an
//! unusable id causes a record to be dropped.

use serde_json::Value;

use crate::models::Tag;

/// Case- and whitespace-insensitive projection used for all matching.
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// `"other"` and the empty namespace both mean "uncategorized".
pub fn is_otherlike(namespace: &str) -> bool {
    let ns = namespace.trim();
    ns.is_empty() || ns.eq_ignore_ascii_case("other")
}

/// Coerce any JSON value to a trimmed string.
///
/// Strings are used as-is, numbers and booleans are stringified, and
/// everything else (null, arrays, objects) becomes `""`.
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Extract a positive integer id.
///
/// Accepts JSON integers, integral floats, and numeric strings. Returns
/// `None` for anything non-finite, fractional, zero, or negative.
pub fn coerce_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else {
                float_to_id(n.as_f64()?)?
            }
        }
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i,
                Err(_) => float_to_id(s.parse::<f64>().ok()?)?,
            }
        }
        _ => return None,
    };
    (id > 0).then_some(id)
}

fn float_to_id(f: f64) -> Option<i64> {
    if !f.is_finite() || f.fract() != 0.0 || f < 1.0 || f > i64::MAX as f64 {
        return None;
    }
    Some(f as i64)
}

/// Build a [`Tag`] from a raw host record, or `None` if its id is unusable.
pub fn tag_from_value(value: &Value) -> Option<Tag> {
    let id = coerce_id(value.get("id")?)?;
    let field = |key: &str| value.get(key).map(coerce_text).unwrap_or_default();

    let translation = field("translation_text");
    Some(Tag {
        id,
        namespace: field("namespace"),
        name: field("name"),
        translation_text: (!translation.is_empty()).then_some(translation),
    })
}
