//! Error types for identity backends.

use bucketguard_core::{ApiError, ErrorCode};

/// Errors returned by [`IamService`](crate::IamService) implementations.
#[derive(Debug, thiserror::Error)]
pub enum IamError {
    /// No account exists for the access key.
    #[error("user not found: {0}")]
    NoSuchUser(String),

    /// An account with the access key already exists.
    #[error("account already exists: {0}")]
    DuplicateAccess(String),

    /// The role label is not recognized.
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// The active backend does not support the operation.
    #[error("operation not supported by the {backend} backend")]
    NotSupported {
        /// Name of the backend.
        backend: &'static str,
    },

    /// The backend could not be reached or failed transiently.
    #[error("identity backend unavailable: {0}")]
    Unavailable(String),

    /// The backend's stored data could not be decoded.
    #[error("corrupt account store: {0}")]
    Corrupt(String),

    /// The backend is misconfigured.
    #[error("identity backend configuration error: {0}")]
    Config(String),
}

impl From<IamError> for ApiError {
    fn from(err: IamError) -> Self {
        let code = match &err {
            IamError::NoSuchUser(_) => ErrorCode::InvalidAccessKeyId,
            IamError::DuplicateAccess(_) | IamError::InvalidRole(_) => ErrorCode::InvalidArgument,
            IamError::NotSupported { .. } => ErrorCode::NotImplemented,
            IamError::Unavailable(_) => ErrorCode::ServiceUnavailable,
            IamError::Corrupt(_) | IamError::Config(_) => ErrorCode::InternalError,
        };
        Self::new(code, err.to_string())
    }
}
