use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// `id, ts, step, level, message, reason?, inputsHash, outputsHash,
/// paramsVersionId, metadata` (spec §3 "AuditEvent"). Every writer in this
/// workspace unifies on this one structured shape — see SPEC_FULL.md §4.10
/// for the resolution of the structured-vs-categorical divergence noted in
/// spec.md §9: categorical call sites put their category string under
/// `metadata.category` instead of using a second schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub ts_ms: i64,
    pub step: String,
    pub level: AuditLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub inputs_hash: String,
    pub outputs_hash: String,
    pub params_version_id: String,
    pub metadata: Value,
}
