//! Error types for the request engine.
//!
//! # Design
//! Configuration mistakes (an entity that was never registered, a collection
//! spec whose result type has no collection shape) are detected when a
//! `RequestSpec` is built and reported as `ConfigError`. Everything that can
//! go wrong while running a call lands in `ApiError`. Non-success HTTP
//! statuses and transport failures share one variant, `ApiError::Remote`,
//! so callers handle "the platform call failed" in a single place.

use serde::Deserialize;
use thiserror::Error;

use crate::registry::EntityType;
use crate::spec::{OperationKind, ResponseShape};

/// Problems with the static setup of registries, specs and client config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The entity type has no endpoint in the registry.
    #[error("entity type '{0}' is not registered")]
    UnregisteredEntity(EntityType),

    /// A collection response was requested for a type without a collection shape.
    #[error("entity type '{0}' has no registered collection shape")]
    MissingCollectionShape(EntityType),

    /// The operation kind needs a result type and none was supplied.
    #[error("operation {kind:?} on '{entity}' requires a result type")]
    MissingResultType {
        kind: OperationKind,
        entity: EntityType,
    },

    /// A collection response was declared without a result type to decode.
    #[error("collection response declared without a result type")]
    MissingCollectionResult,

    /// Neither an entity type nor a literal path was supplied.
    #[error("request spec needs an entity type or a literal path")]
    MissingEndpoint,

    /// A registration conflicts with an existing one or is otherwise unusable.
    #[error("invalid registration for '{entity}': {reason}")]
    InvalidRegistration { entity: EntityType, reason: String },

    /// The client configuration could not be loaded.
    #[error("invalid client configuration: {0}")]
    InvalidClientConfig(String),
}

/// Errors returned by the engine when building, sending or parsing a call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A caller-supplied argument is unusable (missing id, bad page bounds).
    #[error("invalid argument: {0}")]
    Validation(String),

    /// The platform answered with a non-success status, or never answered.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The outcome of a call has a different shape than the caller asked for.
    #[error("expected a {expected:?} response, got {actual:?}")]
    UnexpectedShape {
        expected: ResponseShape,
        actual: ResponseShape,
    },
}

impl ApiError {
    /// True when the platform reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Remote(remote) if remote.status == Some(404))
    }
}

/// A failed platform call.
///
/// `status` is the HTTP status for non-success responses and `None` when the
/// request never produced a response (connection refused, timeout). `body`
/// holds the raw error payload, or the transport's description of the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.status, .body))]
pub struct RemoteError {
    pub status: Option<u16>,
    pub body: String,
}

fn describe(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(status) => format!("HTTP {status}: {body}"),
        None => format!("transport failure: {body}"),
    }
}

impl RemoteError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: message.into(),
        }
    }

    /// The `returnCode` of the platform's error envelope, if the body has one.
    pub fn return_code(&self) -> Option<i64> {
        ReturnEnvelope::parse(&self.body).and_then(|env| env.return_code)
    }

    /// The `returnStatus` of the platform's error envelope, if the body has one.
    pub fn return_status(&self) -> Option<String> {
        ReturnEnvelope::parse(&self.body).and_then(|env| env.return_status)
    }

    /// Stable numeric error code for this failure.
    ///
    /// Prefers the envelope's `returnCode`, then the code registered for its
    /// `returnStatus`, then the HTTP status. Transport failures without any
    /// of these yield `None`.
    pub fn error_code(&self) -> Option<i64> {
        let envelope = ReturnEnvelope::parse(&self.body);
        envelope
            .as_ref()
            .and_then(|env| env.return_code)
            .or_else(|| {
                envelope
                    .as_ref()
                    .and_then(|env| env.return_status.as_deref())
                    .and_then(code_for_status)
            })
            .or_else(|| self.status.map(i64::from))
    }
}

/// Failures raised by a `Transport` before any response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),
}

impl From<TransportError> for RemoteError {
    fn from(err: TransportError) -> Self {
        RemoteError::transport(err.to_string())
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Remote(err.into())
    }
}

/// The platform's small result envelope: `{"returnCode": 0, "returnStatus": "SUCCESS"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnEnvelope {
    #[serde(default)]
    pub return_code: Option<i64>,
    #[serde(default)]
    pub return_status: Option<String>,
}

impl ReturnEnvelope {
    /// Parse a body as an envelope; `None` if it is not one.
    pub fn parse(body: &str) -> Option<Self> {
        let envelope: Self = serde_json::from_str(body).ok()?;
        if envelope.return_code.is_none() && envelope.return_status.is_none() {
            return None;
        }
        Some(envelope)
    }

    /// Success means code `0`, or a `SUCCESS` status when no code is present.
    pub fn is_success(&self) -> bool {
        match (self.return_code, self.return_status.as_deref()) {
            (Some(code), _) => code == 0,
            (None, Some(status)) => code_for_status(status) == Some(0),
            (None, None) => false,
        }
    }
}

/// Platform return statuses and their stable numeric codes.
pub const RETURN_STATUS_CODES: &[(&str, i64)] = &[
    ("SUCCESS", 0),
    ("INVALID_BASIC_AUTHORIZATION", 1),
    ("INVALID_CREDENTIALS", 2),
    ("INVALID_API_OPERATION", 3),
    ("INVALID_PARAMETERS", 4),
    ("METHOD_NOT_IMPLEMENTED", 5),
    ("INTERNAL_ERROR", 6),
    ("API_NOT_AUTHORIZED", 7),
    ("USER_TRANSACTION_LIMIT_EXCEEDED", 8),
    ("API_CONFIGURATION_ERROR", 9),
    ("INVALID_TENANT_ID", 10),
    ("INVALID_PAGINATION_OFFSET_VALUE", 11),
    ("OUT_OF_BOUNDS_PAGINATION_OFFSET_VALUE", 12),
    ("INVALID_PAGINATION_LIMIT_VALUE", 13),
    ("OUT_OF_BOUNDS_PAGINATION_LIMIT_VALUE", 14),
    ("INVALID_PERMISSIONS", 15),
    ("INVALID_IP_ADDRESS", 16),
    ("INACTIVE_USER", 17),
    ("NO_API_ACCESS", 18),
    ("FEATURE_DENIED", 19),
    ("MAX_FILE_SIZE_EXCEEDED", 20),
    ("MAX_FILENAME_LENGTH_EXCEEDED", 21),
    ("UNSUPPORTED_CONTENT_TYPE", 22),
    ("INVALID_FILE_EXTENSION", 23),
    ("INVALID_LOAN_ACCOUNT_ID", 100),
    ("INVALID_AMOUNT", 101),
    ("INVALID_DATE", 102),
    ("INVALID_NOTES", 103),
    ("INVALID_TRANSACTION_TYPE_ID", 104),
    ("INVALID_STATE", 105),
    ("INVALID_FIRST_REPAYMENT_DATE", 106),
    ("INVALID_ACCOUNT_STATE", 107),
    ("INVALID_CLIENT_ID", 300),
    ("INVALID_USER_ID", 301),
    ("INVALID_BRANCH_ID", 302),
    ("INVALID_CENTRE_ID", 303),
    ("INVALID_GROUP_ID", 304),
    ("INVALID_SAVINGS_ACCOUNT_ID", 400),
    ("INVALID_TASK_ID", 500),
    ("INVALID_COMMENT", 600),
];

/// Look up the numeric code of a platform return status.
pub fn code_for_status(status: &str) -> Option<i64> {
    RETURN_STATUS_CODES
        .iter()
        .find(|(name, _)| *name == status)
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_zero_code_is_success() {
        let env = ReturnEnvelope::parse(r#"{"returnCode":0,"returnStatus":"SUCCESS"}"#).unwrap();
        assert!(env.is_success());
    }

    #[test]
    fn envelope_with_status_only_uses_table() {
        let env = ReturnEnvelope::parse(r#"{"returnStatus":"SUCCESS"}"#).unwrap();
        assert!(env.is_success());
        let env = ReturnEnvelope::parse(r#"{"returnStatus":"INVALID_STATE"}"#).unwrap();
        assert!(!env.is_success());
    }

    #[test]
    fn non_envelope_body_is_rejected() {
        assert!(ReturnEnvelope::parse(r#"{"id":"1"}"#).is_none());
        assert!(ReturnEnvelope::parse("not json").is_none());
        assert!(ReturnEnvelope::parse("[]").is_none());
    }

    #[test]
    fn remote_error_prefers_envelope_code() {
        let err = RemoteError::http(400, r#"{"returnCode":101,"returnStatus":"INVALID_AMOUNT"}"#);
        assert_eq!(err.return_code(), Some(101));
        assert_eq!(err.return_status().as_deref(), Some("INVALID_AMOUNT"));
        assert_eq!(err.error_code(), Some(101));
    }

    #[test]
    fn remote_error_maps_status_string_when_code_missing() {
        let err = RemoteError::http(400, r#"{"returnStatus":"INVALID_CLIENT_ID"}"#);
        assert_eq!(err.error_code(), Some(300));
    }

    #[test]
    fn remote_error_falls_back_to_http_status() {
        let err = RemoteError::http(502, "bad gateway");
        assert_eq!(err.error_code(), Some(502));
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
    }

    #[test]
    fn transport_timeout_becomes_remote_error_without_status() {
        let err: ApiError = TransportError::Timeout("30s elapsed".to_string()).into();
        match err {
            ApiError::Remote(remote) => {
                assert_eq!(remote.status, None);
                assert!(remote.body.contains("timed out"));
                assert_eq!(remote.error_code(), None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn not_found_helper_matches_404_only() {
        assert!(ApiError::Remote(RemoteError::http(404, "")).is_not_found());
        assert!(!ApiError::Remote(RemoteError::http(500, "")).is_not_found());
        assert!(!ApiError::Validation("x".to_string()).is_not_found());
    }

    #[test]
    fn status_table_codes_are_unique() {
        let mut codes: Vec<i64> = RETURN_STATUS_CODES.iter().map(|(_, c)| *c).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), RETURN_STATUS_CODES.len());
    }
}
