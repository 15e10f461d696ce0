//! Provider configuration.
//!
//! Explicit configuration wins; unset values fall back to the environment:
//!
//! | attribute | environment |
//! |-----------|-------------|
//! | `api_key` | `SENDGRID_API_KEY` |
//! | `subuser` | `SENDGRID_SUBUSER` |
//! | `base_url` | `SENDGRID_BASE_URL` |

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::client::DEFAULT_BASE_URL;
use crate::retry::RetryPolicy;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "SENDGRID_API_KEY";
/// Environment variable holding the subuser to act on behalf of.
pub const SUBUSER_ENV: &str = "SENDGRID_SUBUSER";
/// Environment variable overriding the API root.
pub const BASE_URL_ENV: &str = "SENDGRID_BASE_URL";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    api_key: Option<String>,
    subuser: Option<String>,
    base_url: Option<String>,
    max_retry_attempts: Option<i64>,
    retry_timeout_seconds: Option<i64>,
}

/// Resolved provider configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// SendGrid API key.
    pub api_key: String,
    /// Subuser to act on behalf of.
    pub subuser: Option<String>,
    /// API root.
    pub base_url: String,
    /// Retry policy for rate-limited calls.
    pub retry: RetryPolicy,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("subuser", &self.subuser)
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ProviderConfig {
    /// The provider configuration schema.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("SendGrid provider configuration")
            .with_attribute(
                "api_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!("SendGrid API key. Defaults to ${}.", API_KEY_ENV)),
            )
            .with_attribute(
                "subuser",
                Attribute::optional_string().with_description(format!(
                    "Subuser to manage resources for. Defaults to ${}.",
                    SUBUSER_ENV
                )),
            )
            .with_attribute(
                "base_url",
                Attribute::optional_string().with_description(format!(
                    "API root. Defaults to ${} or {}.",
                    BASE_URL_ENV, DEFAULT_BASE_URL
                )),
            )
            .with_attribute(
                "max_retry_attempts",
                Attribute::optional_int64()
                    .with_description("Maximum attempts for a rate-limited call."),
            )
            .with_attribute(
                "retry_timeout_seconds",
                Attribute::optional_int64().with_description(
                    "Total time budget for retrying a rate-limited call. 0 disables the budget.",
                ),
            )
    }

    /// Resolve configuration from `config`, falling back to the process
    /// environment.
    pub fn resolve(config: &serde_json::Value) -> Result<Self, Vec<Diagnostic>> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Resolve configuration with a custom environment lookup.
    pub fn resolve_with<F>(config: &serde_json::Value, env: F) -> Result<Self, Vec<Diagnostic>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = if config.is_null() {
            RawConfig::default()
        } else {
            serde_json::from_value(config.clone()).map_err(|e| {
                vec![Diagnostic::error("Invalid provider configuration").with_detail(e.to_string())]
            })?
        };

        let pick = |explicit: Option<String>, var: &str| {
            explicit
                .filter(|v| !v.trim().is_empty())
                .or_else(|| env(var).filter(|v| !v.trim().is_empty()))
        };

        let mut diagnostics = Vec::new();

        let api_key = pick(raw.api_key, API_KEY_ENV);
        if api_key.is_none() {
            diagnostics.push(
                Diagnostic::error("Missing SendGrid API key")
                    .with_detail(format!(
                        "Set the api_key attribute or the {} environment variable.",
                        API_KEY_ENV
                    ))
                    .with_attribute("api_key"),
            );
        }

        let mut retry = RetryPolicy::default();
        match raw.max_retry_attempts {
            Some(n) if n < 1 || n > i64::from(u32::MAX) => diagnostics.push(
                Diagnostic::error("Invalid max_retry_attempts")
                    .with_detail("Must be at least 1.")
                    .with_attribute("max_retry_attempts"),
            ),
            Some(n) => retry.max_attempts = n as u32,
            None => {},
        }
        match raw.retry_timeout_seconds {
            Some(secs) if secs < 0 => diagnostics.push(
                Diagnostic::error("Invalid retry_timeout_seconds")
                    .with_detail("Must not be negative.")
                    .with_attribute("retry_timeout_seconds"),
            ),
            Some(0) => retry.max_elapsed = None,
            Some(secs) => retry.max_elapsed = Some(Duration::from_secs(secs as u64)),
            None => {},
        }

        match api_key {
            Some(api_key) if diagnostics.is_empty() => Ok(Self {
                api_key,
                subuser: pick(raw.subuser, SUBUSER_ENV),
                base_url: pick(raw.base_url, BASE_URL_ENV)
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                retry,
            }),
            _ => Err(diagnostics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_explicit_values_win() {
        let config = ProviderConfig::resolve_with(
            &json!({"api_key": "SG.explicit", "subuser": "child", "base_url": "http://localhost:1"}),
            env(&[(API_KEY_ENV, "SG.env"), (SUBUSER_ENV, "other")]),
        )
        .unwrap();

        assert_eq!(config.api_key, "SG.explicit");
        assert_eq!(config.subuser.as_deref(), Some("child"));
        assert_eq!(config.base_url, "http://localhost:1");
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_environment_fallback() {
        let config = ProviderConfig::resolve_with(
            &json!({"api_key": ""}),
            env(&[(API_KEY_ENV, "SG.env"), (SUBUSER_ENV, "child")]),
        )
        .unwrap();

        assert_eq!(config.api_key, "SG.env");
        assert_eq!(config.subuser.as_deref(), Some("child"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let diagnostics = ProviderConfig::resolve_with(&serde_json::Value::Null, env(&[])).unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Missing SendGrid API key");
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("api_key"));
    }

    #[test]
    fn test_retry_overrides() {
        let config = ProviderConfig::resolve_with(
            &json!({"api_key": "SG.k", "max_retry_attempts": 3, "retry_timeout_seconds": 0}),
            env(&[]),
        )
        .unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.max_elapsed, None);

        let config = ProviderConfig::resolve_with(
            &json!({"api_key": "SG.k", "retry_timeout_seconds": 90}),
            env(&[]),
        )
        .unwrap();
        assert_eq!(config.retry.max_elapsed, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_invalid_retry_overrides() {
        let diagnostics = ProviderConfig::resolve_with(
            &json!({"api_key": "SG.k", "max_retry_attempts": 0, "retry_timeout_seconds": -1}),
            env(&[]),
        )
        .unwrap_err();

        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_wrong_shape_is_reported() {
        let diagnostics =
            ProviderConfig::resolve_with(&json!({"api_key": 12}), env(&[])).unwrap_err();
        assert_eq!(diagnostics[0].summary, "Invalid provider configuration");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ProviderConfig::resolve_with(&json!({"api_key": "SG.secret"}), env(&[])).unwrap();
        assert!(!format!("{:?}", config).contains("SG.secret"));
    }
}
