//! Canonical hashing (spec §6 "Canonical hashing").
//!
//! `hash_object` serializes a value with keys sorted lexicographically at
//! every object level, preserving array order, and returns the hex SHA-256
//! digest of the resulting compact JSON. Every content hash used for
//! idempotency keys and audit `inputs_hash`/`outputs_hash` goes through this
//! one function so two callers never disagree on what "the same value"
//! hashes to.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Canonicalize `v` (sorted object keys, compact JSON) and return its hex
/// SHA-256 digest.
pub fn hash_object<T: Serialize>(v: &T) -> String {
    let raw = serde_json::to_value(v).expect("value must be JSON-serializable");
    hash_value(&raw)
}

/// Same as [`hash_object`] but takes an already-built [`Value`].
pub fn hash_value(v: &Value) -> String {
    let canonical = canonical_json_string(v);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Render `v` as compact JSON with every object's keys sorted lexicographically.
/// Array order is preserved.
pub fn canonical_json_string(v: &Value) -> String {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).expect("canonical json must serialize")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}
