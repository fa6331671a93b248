//! Domain error model.
//!
//! Every failure the API can report is one `DomainError`: an explicit
//! [`ErrorKind`], a human-readable message, and (for multi-field validation
//! failures) the ordered list of offending fields. Mapping a kind to a transport
//! status is done by the API layer with a plain `match`.

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Failure categories, serialized with their wire names.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "ValidationError")]
    Validation,
    #[serde(rename = "MissingParameter")]
    MissingParameter,
    #[serde(rename = "AuthenticationError")]
    Authentication,
    #[serde(rename = "AuthorizationError")]
    Authorization,
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "MalformedIdentifier")]
    MalformedIdentifier,
    #[serde(rename = "SignatureOrExpiryError")]
    SignatureOrExpiry,
    #[serde(rename = "InternalError")]
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::MissingParameter => "MissingParameter",
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::Authorization => "AuthorizationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::MalformedIdentifier => "MalformedIdentifier",
            ErrorKind::SignatureOrExpiry => "SignatureOrExpiryError",
            ErrorKind::Internal => "InternalError",
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failing field of a multi-field validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Domain-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct DomainError {
    kind: ErrorKind,
    message: String,
    fields: Vec<FieldViolation>,
}

impl DomainError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// A single validation failure that is not tied to a field list.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg)
    }

    /// Aggregated field-level validation failures, in field declaration order.
    ///
    /// The top-level message is the first field's message.
    pub fn invalid_fields(fields: Vec<FieldViolation>) -> Self {
        let message = fields
            .first()
            .map(|f| f.message.clone())
            .unwrap_or_else(|| "validation failed".to_string());
        Self {
            kind: ErrorKind::Validation,
            message,
            fields,
        }
    }

    pub fn missing_param(field: &str) -> Self {
        Self::new(
            ErrorKind::MissingParameter,
            format!("{field} is missing or not supplied"),
        )
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, msg)
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, msg)
    }

    /// `resource` is the display name of the missing thing, e.g. `"Post"`.
    pub fn not_found(resource: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{resource} not found"))
    }

    pub fn malformed_id(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedIdentifier, msg)
    }

    pub fn token(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::SignatureOrExpiry, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> &[FieldViolation] {
        &self.fields
    }

    /// True when this error reports a list of field violations rather than a
    /// single cause.
    pub fn is_field_list(&self) -> bool {
        !self.fields.is_empty()
    }
}
