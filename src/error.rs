//! Error types for the SendGrid provider.

use thiserror::Error;

use crate::client::ApiError;
use crate::retry::RetryError;
use crate::schema::Diagnostic;

/// Errors surfaced by provider callbacks.
///
/// Every variant becomes an error diagnostic at the RPC boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The remote object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// State or configuration that cannot be acted on.
    #[error("invalid value: {0}")]
    Validation(String),

    /// The provider is unconfigured or misconfigured.
    #[error("provider configuration: {0}")]
    Configuration(String),

    /// A type name the provider does not serve.
    #[error("unsupported type: {0}")]
    UnknownResource(String),

    /// A payload that is not the expected JSON.
    #[error("malformed JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SendGrid answered 409.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// SendGrid answered 401 or 403.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// SendGrid kept rate limiting until the retry budget ran out.
    #[error("rate limit retries exhausted: {0}")]
    ResourceExhausted(String),

    /// The provider was stopped while the operation was waiting.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Any other SendGrid failure.
    #[error("SendGrid API error: {0}")]
    Api(String),

    /// SendGrid answered 400 or 422.
    #[error("rejected by SendGrid: {0}")]
    InvalidRequest(String),

    /// The provider does not support the operation.
    #[error("not supported: {0}")]
    Unimplemented(String),
}

impl ProviderError {
    /// Wrap a failed SendGrid call, prefixing the message with `operation`
    /// (e.g. `creating API key`).
    pub fn from_api(operation: &str, err: RetryError<ApiError>) -> Self {
        let message = format!("{}: {}", operation, err);
        match err {
            RetryError::Exhausted { .. } => Self::ResourceExhausted(message),
            RetryError::Cancelled { .. } => Self::Cancelled(message),
            RetryError::Operation(api) => match api {
                ApiError::NotFound(_) => Self::NotFound(message),
                ApiError::Config(_) => Self::Configuration(message),
                other => match other.status() {
                    Some(401) | Some(403) => Self::PermissionDenied(message),
                    Some(400) | Some(422) => Self::InvalidRequest(message),
                    Some(409) => Self::AlreadyExists(message),
                    _ => Self::Api(message),
                },
            },
        }
    }

    /// Whether this error reports a missing remote object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Render this error as an error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status(status: u16) -> RetryError<ApiError> {
        RetryError::Operation(ApiError::Status {
            status,
            message: "rejected".to_string(),
        })
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("template d-1".to_string());
        assert_eq!(err.to_string(), "not found: template d-1");

        let err = ProviderError::UnknownResource("sendgrid_widget".to_string());
        assert_eq!(err.to_string(), "unsupported type: sendgrid_widget");

        let err = ProviderError::Cancelled("provider stopped".to_string());
        assert_eq!(err.to_string(), "cancelled: provider stopped");

        let err: ProviderError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(err.to_string().starts_with("malformed JSON: "));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ProviderError::from_api("reading API key", status(401)),
            ProviderError::PermissionDenied(_)
        ));
        assert!(matches!(
            ProviderError::from_api("reading API key", status(403)),
            ProviderError::PermissionDenied(_)
        ));
        assert!(matches!(
            ProviderError::from_api("creating API key", status(400)),
            ProviderError::InvalidRequest(_)
        ));
        assert!(matches!(
            ProviderError::from_api("creating API key", status(422)),
            ProviderError::InvalidRequest(_)
        ));
        assert!(matches!(
            ProviderError::from_api("creating subuser", status(409)),
            ProviderError::AlreadyExists(_)
        ));
        assert!(matches!(
            ProviderError::from_api("creating subuser", status(500)),
            ProviderError::Api(_)
        ));
    }

    #[test]
    fn test_not_found_mapping() {
        let err = ProviderError::from_api(
            "reading template",
            RetryError::Operation(ApiError::NotFound("resource not found".to_string())),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: reading template: not found: resource not found");
    }

    #[test]
    fn test_retry_outcomes_mapping() {
        let err = ProviderError::from_api(
            "creating API key",
            RetryError::Exhausted {
                attempts: 10,
                last: ApiError::RateLimited {
                    reset_after: Some(Duration::from_secs(1)),
                },
            },
        );
        assert!(matches!(err, ProviderError::ResourceExhausted(_)));
        assert!(err
            .to_string()
            .starts_with("rate limit retries exhausted: creating API key: gave up after 10"));

        let err = ProviderError::from_api(
            "creating API key",
            RetryError::Cancelled { attempts: 2 },
        );
        assert!(matches!(err, ProviderError::Cancelled(_)));
    }

    #[test]
    fn test_to_diagnostic() {
        let diag = ProviderError::Api("deleting template: HTTP 500: boom".to_string()).to_diagnostic();
        assert_eq!(diag.severity, crate::schema::DiagnosticSeverity::Error);
        assert_eq!(diag.summary, "SendGrid API error: deleting template: HTTP 500: boom");
    }
}
