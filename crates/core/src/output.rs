//! Resolution of the loosely-typed `output` field of a completion callback.

use serde_json::Value;

/// Turn a reported output into a single output reference.
///
/// A non-empty array yields its first element, a string is used as-is, and
/// any other value is rendered as JSON text. Absent, `null`, empty strings and
/// empty arrays mean "no output".
pub fn resolve_output(output: Option<&Value>) -> Option<String> {
    match output? {
        Value::Null => None,
        Value::Array(items) => items.first().and_then(|first| resolve_output(Some(first))),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
