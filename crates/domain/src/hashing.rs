//! Deterministic digests of structured data.
//!
//! Values are serialized to JSON, object keys are sorted lexicographically at
//! every nesting level, and the compact UTF-8 encoding is hashed with SHA-256.
//! The resulting lowercase hex string is used both to fingerprint audit
//! payloads and to link consecutive audit entries.

use std::fmt::Write;

use custodia_core::{AppError, AppResult};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Computes the canonical SHA-256 digest of any serializable value.
pub fn compute_hash<T: Serialize + ?Sized>(value: &T) -> AppResult<String> {
    let canonical = canonical_json(value)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Returns the canonical JSON text hashed by [`compute_hash`].
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> AppResult<String> {
    let value = serde_json::to_value(value)
        .map_err(|error| AppError::Internal(format!("failed to serialize hash input: {error}")))?;

    serde_json::to_string(&canonicalize(value))
        .map_err(|error| AppError::Internal(format!("failed to encode hash input: {error}")))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(object) => {
            let mut entries: Vec<(String, Value)> = object.into_iter().collect();
            entries.sort_by(|left, right| left.0.cmp(&right.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, nested) in entries {
                sorted.insert(key, canonicalize(nested));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();

    result
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
