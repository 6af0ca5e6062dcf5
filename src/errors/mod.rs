mod error;

pub use error::{ApiError, DomainError, ErrorKind, ServiceError, ValidationError};

/// Result type for remote API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
