//! Error types for request authentication.

use bucketguard_core::{ApiError, ErrorCode};
use bucketguard_iam::IamError;

/// Errors that can occur while canonicalizing or verifying a signed request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The `Authorization` header is missing from the request.
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    /// The `Authorization` header could not be parsed.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The signing algorithm is not supported (only AWS4-HMAC-SHA256 is supported).
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A header named in `SignedHeaders` is missing from the request.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// A signed header carries a value that is not visible ASCII.
    #[error("Invalid value for header: {0}")]
    InvalidHeaderValue(String),

    /// The `Credential` component does not match
    /// `AKID/date/region/service/aws4_request`.
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The credential scope date differs from the `x-amz-date` day.
    #[error("Credential scope date {scope} does not match request date {request}")]
    ScopeDateMismatch {
        /// Date from the credential scope.
        scope: String,
        /// Date from `x-amz-date`.
        request: String,
    },

    /// The credential scope names a region other than the gateway's.
    #[error("Credential scope region {found} is wrong; expecting {expected}")]
    RegionMismatch {
        /// Region the gateway serves.
        expected: String,
        /// Region from the credential scope.
        found: String,
    },

    /// A header that must be covered by the signature is absent from `SignedHeaders`.
    #[error("Header must be signed: {0}")]
    HeaderNotSigned(String),

    /// The access key is not known to the identity backend.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,

    /// The `x-amz-date` value is not an ISO 8601 basic timestamp.
    #[error("Invalid x-amz-date: {0}")]
    InvalidDate(String),

    /// The request time differs too much from the server time.
    #[error("The difference between the request time and the server's time is too large")]
    RequestTimeTooSkewed,

    /// The identity backend failed while resolving the access key.
    #[error("identity lookup failed: {0}")]
    Backend(IamError),
}

impl From<IamError> for AuthError {
    fn from(err: IamError) -> Self {
        match err {
            IamError::NoSuchUser(access) => Self::AccessKeyNotFound(access),
            other => Self::Backend(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        let code = match err {
            AuthError::Backend(inner) => return inner.into(),
            AuthError::MissingAuthHeader => ErrorCode::AccessDenied,
            AuthError::InvalidAuthHeader
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::MissingHeader(_)
            | AuthError::InvalidHeaderValue(_)
            | AuthError::InvalidCredential
            | AuthError::InvalidDate(_) => ErrorCode::InvalidArgument,
            AuthError::ScopeDateMismatch { .. }
            | AuthError::RegionMismatch { .. }
            | AuthError::HeaderNotSigned(_) => ErrorCode::AuthorizationHeaderMalformed,
            AuthError::AccessKeyNotFound(_) => ErrorCode::InvalidAccessKeyId,
            AuthError::SignatureDoesNotMatch => ErrorCode::SignatureDoesNotMatch,
            AuthError::RequestTimeTooSkewed => ErrorCode::RequestTimeTooSkewed,
        };
        Self::new(code, message)
    }
}
