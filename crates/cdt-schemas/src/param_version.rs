use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Immutable snapshot of tunable parameters, identified by `effective_from_ms`
/// (spec §3 "ParamVersion"). `kb`/`ks`/`leverage_bands`/`cooldown_rules`/
/// `portfolio_caps` are intentionally opaque structured blobs: consumers
/// (strategy engines, risk service) interpret them, this crate only carries
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamVersion {
    pub id: String,
    pub effective_from_ms: i64,
    pub kb: Value,
    pub ks: Value,
    pub leverage_bands: Value,
    pub cooldown_rules: Value,
    pub portfolio_caps: Value,
}

/// The active version at instant `t` is the one with the greatest
/// `effective_from_ms <= t`.
pub fn active_at(versions: &[ParamVersion], t_ms: i64) -> Option<&ParamVersion> {
    versions
        .iter()
        .filter(|v| v.effective_from_ms <= t_ms)
        .max_by_key(|v| v.effective_from_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn version(id: &str, from: i64) -> ParamVersion {
        ParamVersion {
            id: id.into(),
            effective_from_ms: from,
            kb: json!(1.2),
            ks: json!(0.9),
            leverage_bands: json!([]),
            cooldown_rules: json!({}),
            portfolio_caps: json!({}),
        }
    }

    #[test]
    fn active_is_greatest_effective_from_at_or_before_t() {
        let versions = vec![version("v1", 0), version("v2", 1_000), version("v3", 2_000)];
        assert_eq!(active_at(&versions, 1_500).unwrap().id, "v2");
        assert_eq!(active_at(&versions, 2_000).unwrap().id, "v3");
        assert_eq!(active_at(&versions, 2_999).unwrap().id, "v3");
    }

    #[test]
    fn no_version_before_its_effective_from_is_none() {
        let versions = vec![version("v1", 1_000)];
        assert!(active_at(&versions, 999).is_none());
    }
}
