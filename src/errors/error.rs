use std::fmt;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while talking to the remote data API
#[derive(Debug, Error, Clone, Serialize)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Server returned error {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Record not found: {0} with ID {1}")]
    NotFound(String, String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if err.is_builder() {
            ApiError::InvalidUrl(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Domain-level errors
#[derive(Debug, Error, Clone, Serialize)]
pub enum DomainError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid UUID: {0}")]
    InvalidUuid(String),

    #[error("Entity not found: {0} with ID {1}")]
    EntityNotFound(String, Uuid),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("File error: {0}")]
    File(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

/// Service-level errors (application specific)
#[derive(Debug, Error, Clone, Serialize)]
pub enum ServiceError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl From<ApiError> for ServiceError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(..) => ServiceError::Domain(DomainError::Api(err)),
            other => ServiceError::Network(other.to_string()),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Domain(DomainError::Validation(err))
    }
}

/// The four user-facing failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Validation,
    Network,
    Configuration,
    NotFound,
    Internal,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Network(_) => ErrorKind::Network,
            ServiceError::Configuration(_) => ErrorKind::Configuration,
            ServiceError::Export(_) => ErrorKind::Internal,
            ServiceError::Domain(domain) => match domain {
                DomainError::Validation(_) => ErrorKind::Validation,
                DomainError::EntityNotFound(..) => ErrorKind::NotFound,
                DomainError::Api(ApiError::NotFound(..)) => ErrorKind::NotFound,
                DomainError::Api(_) => ErrorKind::Network,
                _ => ErrorKind::Internal,
            },
        }
    }

    /// The field-level validation failure, if this is one
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ServiceError::Domain(DomainError::Validation(err)) => Some(err),
            _ => None,
        }
    }
}

/// Validation errors
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required {
        field: String,
    },

    #[error("Field '{field}' cannot exceed {max} characters")]
    MaxLength {
        field: String,
        max: usize,
    },

    #[error("Field '{field}' must be between {min} and {max}")]
    Range {
        field: String,
        min: String,
        max: String,
    },

    #[error("Field '{field}' contains invalid format: {reason}")]
    Format {
        field: String,
        reason: String,
    },

    #[error("Field '{field}' contains an invalid value: {reason}")]
    InvalidValue {
        field: String,
        reason: String,
    },

    #[error("Validation error: {0}")]
    Custom(String),
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        Self::Required {
            field: field.to_string(),
        }
    }

    pub fn max_length(field: &str, max: usize) -> Self {
        Self::MaxLength {
            field: field.to_string(),
            max,
        }
    }

    pub fn range<T: fmt::Display>(field: &str, min: T, max: T) -> Self {
        Self::Range {
            field: field.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    pub fn format(field: &str, reason: &str) -> Self {
        Self::Format {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn custom(message: &str) -> Self {
        Self::Custom(message.to_string())
    }

    /// Name of the offending field, when the error is tied to one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Required { field }
            | Self::MaxLength { field, .. }
            | Self::Range { field, .. }
            | Self::Format { field, .. }
            | Self::InvalidValue { field, .. } => Some(field),
            Self::Custom(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        let err: ServiceError = ValidationError::required("name").into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.validation().and_then(|v| v.field()), Some("name"));

        let err: ServiceError = ApiError::Transport("connection refused".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Network);

        let err = ServiceError::Domain(DomainError::EntityNotFound("Project".to_string(), Uuid::nil()));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = ServiceError::Configuration("missing API key".to_string());
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_status_error_message() {
        let err = ApiError::Status { status: 404, body: "relation does not exist".to_string() };
        assert_eq!(err.to_string(), "Server returned error 404: relation does not exist");
    }
}
