//! Content hashing for cache keys and exact-match detection.
//!
//! All digests are BLAKE3, rendered as lowercase hex.

use serde::Serialize;
use serde_json::{Map, Value};

/// Hex-encoded BLAKE3 digest of `data`.
#[inline]
pub fn hash_hex(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Serializes `input` to JSON with object keys sorted at every depth.
///
/// Two inputs that differ only in field order produce the same string, which is what
/// makes [`hash_canonical`] content-addressed.
pub fn canonical_json<T: Serialize + ?Sized>(input: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(input)?;
    serde_json::to_string(&canonicalize(value))
}

/// Hex digest of the canonical JSON form of `input`.
pub fn hash_canonical<T: Serialize + ?Sized>(input: &T) -> Result<String, serde_json::Error> {
    canonical_json(input).map(|json| hash_hex(json.as_bytes()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Drops blank lines and trims every remaining line.
pub fn normalize_code(code: &str) -> String {
    code.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Digest of [`normalize_code`]; stable under indentation and blank-line edits.
#[inline]
pub fn hash_code(code: &str) -> String {
    hash_hex(normalize_code(code).as_bytes())
}
