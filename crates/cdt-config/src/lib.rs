//! Layered YAML configuration merge with a canonical config hash (spec §6
//! "Configuration recognized"; SPEC_FULL.md's Config & Secrets component).

pub mod secrets;

use anyhow::{Context, Result};
use cdt_schemas::hash::{canonical_json_string, hash_value};
use serde_json::Value;
use std::fs;

pub use secrets::{resolve_secrets_for_env, ResolvedSecrets};

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Load + deep-merge YAML files in order (later files override earlier
/// ones), then canonicalize and hash the result.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());

    for p in paths {
        let s = fs::read_to_string(p).with_context(|| format!("read config: {p}"))?;
        let yaml_val: serde_yaml::Value =
            serde_yaml::from_str(&s).with_context(|| format!("parse yaml: {p}"))?;
        let json_val = serde_json::to_value(yaml_val).context("yaml->json conversion failed")?;
        deep_merge(&mut merged, json_val);
    }

    let canonical = canonical_json_string(&merged);
    let hash = hash_value(&merged);

    Ok(LoadedConfig {
        config_json: serde_json::from_str(&canonical).context("canonical json parse failed")?,
        canonical_json: canonical,
        config_hash: hash,
    })
}

/// Objects merge recursively; arrays and scalars are overwritten wholesale.
fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_overlays_scalars_and_recurses_objects() {
        let mut dst = json!({"a": 1, "nested": {"x": 1, "y": 2}});
        let src = json!({"a": 2, "nested": {"y": 3, "z": 4}});
        deep_merge(&mut dst, src);
        assert_eq!(dst, json!({"a": 2, "nested": {"x": 1, "y": 3, "z": 4}}));
    }

    #[test]
    fn config_hash_is_key_order_invariant() {
        let a = json!({"x": 1, "y": {"a": 2, "b": 3}});
        let b = json!({"y": {"b": 3, "a": 2}, "x": 1});
        assert_eq!(hash_value(&a), hash_value(&b));
    }
}
