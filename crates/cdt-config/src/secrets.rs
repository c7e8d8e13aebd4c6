//! Secret & env resolution — the single source of truth for runtime secret
//! resolution (spec §6 "Configuration recognized").
//!
//! Config YAML stores only **env var NAMES**; [`resolve_secrets_for_env`] is
//! called once at startup and the returned [`ResolvedSecrets`] is threaded
//! into constructors from there. `Debug` redacts every secret value; error
//! messages reference the env var NAME, never the value.
//!
//! | NODE_ENV      | Required                                              |
//! |---------------|--------------------------------------------------------|
//! | production    | exchange API_KEY, API_SECRET, DATABASE_URL             |
//! | development   | nothing (all optional)                                 |
//! | test          | nothing (all optional)                                 |

use anyhow::{bail, Result};
use serde_json::Value;

/// All runtime-resolved secrets for one engine instantiation. Built **once**
/// via [`resolve_secrets_for_env`]. `Debug` redacts every field.
#[derive(Clone)]
pub struct ResolvedSecrets {
    pub exchange_api_key: Option<String>,
    pub exchange_api_secret: Option<String>,
    pub exchange_base_url: Option<String>,
    pub database_url: Option<String>,
    pub recv_window_ms: u64,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("exchange_api_key", &self.exchange_api_key.as_ref().map(|_| "<REDACTED>"))
            .field("exchange_api_secret", &self.exchange_api_secret.as_ref().map(|_| "<REDACTED>"))
            .field("exchange_base_url", &self.exchange_base_url.as_ref().map(|_| "<REDACTED>"))
            .field("database_url", &self.database_url.as_ref().map(|_| "<REDACTED>"))
            .field("recv_window_ms", &self.recv_window_ms)
            .finish()
    }
}

/// Env var names extracted from the config JSON — the NAMES stored in YAML,
/// never the values.
struct SecretEnvNames {
    api_key_var: String,
    api_secret_var: String,
    base_url_var: String,
    database_url_var: String,
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    SecretEnvNames {
        api_key_var: read_str_at(config_json, "/exchange/keys_env/api_key")
            .unwrap_or_else(|| "API_KEY".to_string()),
        api_secret_var: read_str_at(config_json, "/exchange/keys_env/api_secret")
            .unwrap_or_else(|| "API_SECRET".to_string()),
        base_url_var: read_str_at(config_json, "/exchange/keys_env/base_url")
            .unwrap_or_else(|| "BASE_URL".to_string()),
        database_url_var: read_str_at(config_json, "/persistence/keys_env/database_url")
            .unwrap_or_else(|| "DATABASE_URL".to_string()),
    }
}

fn parse_recv_window_ms(config_json: &Value) -> u64 {
    config_json
        .pointer("/exchange/recv_window_ms")
        .and_then(Value::as_u64)
        .unwrap_or(5000)
}

/// Resolve all secrets from the environment for the given `NODE_ENV`.
/// `node_env` is case-insensitive: `"development"`, `"test"`, `"production"`.
///
/// # Errors
/// Returns `Err` naming the first missing required env var (never its
/// value) when `node_env` is `production`.
pub fn resolve_secrets_for_env(config_json: &Value, node_env: &str) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json);
    let recv_window_ms = parse_recv_window_ms(config_json);
    let env_lower = node_env.trim().to_ascii_lowercase();

    let api_key = resolve_env(&names.api_key_var);
    let api_secret = resolve_env(&names.api_secret_var);
    let base_url = resolve_env(&names.base_url_var);
    let database_url = resolve_env(&names.database_url_var);

    match env_lower.as_str() {
        "production" => {
            if api_key.is_none() {
                bail!(
                    "SECRETS_MISSING node_env=production: required env var '{}' (exchange api_key) is not set or empty",
                    names.api_key_var,
                );
            }
            if api_secret.is_none() {
                bail!(
                    "SECRETS_MISSING node_env=production: required env var '{}' (exchange api_secret) is not set or empty",
                    names.api_secret_var,
                );
            }
            if database_url.is_none() {
                bail!(
                    "SECRETS_MISSING node_env=production: required env var '{}' (database url) is not set or empty",
                    names.database_url_var,
                );
            }
        }
        "development" | "test" => {}
        other => {
            bail!(
                "SECRETS_UNKNOWN_NODE_ENV: unrecognised NODE_ENV '{}'; expected one of: development | test | production",
                other,
            );
        }
    }

    Ok(ResolvedSecrets {
        exchange_api_key: api_key,
        exchange_api_secret: api_secret,
        exchange_base_url: base_url,
        database_url,
        recv_window_ms,
    })
}
