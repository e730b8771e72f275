//! Error types shared across BucketGuard crates.
//!
//! [`ApiError`] is the wire-facing error handed to the transport layer: an
//! S3 error code, a human-readable message, and the HTTP status derived from
//! the code. Domain crates keep their own error enums and convert into
//! [`ApiError`] through `From`.

use std::fmt;

use http::StatusCode;

/// S3 error codes produced by the authorization core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Access to the resource was denied.
    AccessDenied,
    /// The credential scope of the `Authorization` header does not fit the request.
    AuthorizationHeaderMalformed,
    /// The Content-MD5 or checksum did not match the payload.
    BadDigest,
    /// Internal failure.
    InternalError,
    /// The access key does not exist in the identity backend.
    InvalidAccessKeyId,
    /// A request parameter is invalid.
    InvalidArgument,
    /// The bucket name is invalid.
    InvalidBucketName,
    /// The Content-MD5 or checksum header is malformed.
    InvalidDigest,
    /// The request is malformed in some other way.
    InvalidRequest,
    /// A tag key, value, or tag set is invalid.
    InvalidTag,
    /// The object key exceeds the maximum length.
    KeyTooLongError,
    /// The bucket policy document is malformed.
    MalformedPolicy,
    /// The bucket has no policy attached.
    NoSuchBucketPolicy,
    /// The operation is not implemented by the active backend.
    NotImplemented,
    /// The request timestamp is too far from the server time.
    RequestTimeTooSkewed,
    /// A dependency (identity backend) is temporarily unavailable.
    ServiceUnavailable,
    /// The computed request signature does not match the provided one.
    SignatureDoesNotMatch,
}

impl ErrorCode {
    /// Return the code as it appears in S3 error responses.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::AuthorizationHeaderMalformed => "AuthorizationHeaderMalformed",
            Self::BadDigest => "BadDigest",
            Self::InternalError => "InternalError",
            Self::InvalidAccessKeyId => "InvalidAccessKeyId",
            Self::InvalidArgument => "InvalidArgument",
            Self::InvalidBucketName => "InvalidBucketName",
            Self::InvalidDigest => "InvalidDigest",
            Self::InvalidRequest => "InvalidRequest",
            Self::InvalidTag => "InvalidTag",
            Self::KeyTooLongError => "KeyTooLongError",
            Self::MalformedPolicy => "MalformedPolicy",
            Self::NoSuchBucketPolicy => "NoSuchBucketPolicy",
            Self::NotImplemented => "NotImplemented",
            Self::RequestTimeTooSkewed => "RequestTimeTooSkewed",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::SignatureDoesNotMatch => "SignatureDoesNotMatch",
        }
    }

    /// HTTP status code the transport should answer with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AuthorizationHeaderMalformed
            | Self::BadDigest
            | Self::InvalidArgument
            | Self::InvalidBucketName
            | Self::InvalidDigest
            | Self::InvalidRequest
            | Self::InvalidTag
            | Self::KeyTooLongError
            | Self::MalformedPolicy => StatusCode::BAD_REQUEST,
            Self::AccessDenied
            | Self::InvalidAccessKeyId
            | Self::RequestTimeTooSkewed
            | Self::SignatureDoesNotMatch => StatusCode::FORBIDDEN,
            Self::NoSuchBucketPolicy => StatusCode::NOT_FOUND,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error ready to be rendered as an S3 error response.
///
/// # Examples
///
/// ```
/// use bucketguard_core::{ApiError, ErrorCode};
///
/// let err = ApiError::new(ErrorCode::MalformedPolicy, "Policy has invalid action");
/// assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
/// assert_eq!(err.code().as_str(), "MalformedPolicy");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    code: ErrorCode,
    message: String,
}

impl ApiError {
    /// Create a new API error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The S3 error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The HTTP status derived from the code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// Whether the error is the caller's fault (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}
