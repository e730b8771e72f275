//! Validation errors for S3 request parameters.
//!
//! Every variant echoes the offending input so the caller can report it
//! without re-parsing the request.

use bucketguard_core::{ApiError, ErrorCode};

/// Errors produced by checksum, attribute and parameter validation.
#[derive(Debug, thiserror::Error)]
pub enum S3CoreError {
    /// The checksum algorithm tag is not recognized.
    #[error("unsupported checksum algorithm: {0}")]
    UnsupportedChecksumAlgorithm(String),

    /// The declared checksum is not valid base64 or has the wrong length.
    #[error("value for x-amz-checksum-{algorithm} header is invalid: {value}")]
    InvalidChecksum {
        /// Lower-case algorithm name.
        algorithm: String,
        /// Declared value.
        value: String,
    },

    /// The declared checksum does not match the payload.
    #[error("the {algorithm} checksum you specified did not match the calculated checksum")]
    ChecksumMismatch {
        /// Algorithm name.
        algorithm: String,
    },

    /// More than one `x-amz-checksum-*` header was sent.
    #[error("expecting a single x-amz-checksum- header, got {0}")]
    MultipleChecksumHeaders(usize),

    /// The `Content-MD5` header is not valid base64.
    #[error("the Content-MD5 you specified is not valid")]
    InvalidDigest,

    /// The `Content-MD5` header does not match the payload.
    #[error("the Content-MD5 you specified did not match what was received")]
    BadDigest,

    /// An object attribute name is not recognized or none was requested.
    #[error("invalid object attributes: {0}")]
    InvalidObjectAttributes(String),

    /// A pagination counter is negative or not a number.
    #[error("invalid count parameter {value:?}, using default {default}")]
    InvalidCountParameter {
        /// Raw input.
        value: String,
        /// Default the caller should fall back to.
        default: i32,
    },

    /// The bucket name violates the naming rules.
    #[error("invalid bucket name {name:?}: {reason}")]
    InvalidBucketName {
        /// Offending name.
        name: String,
        /// Rule that was violated.
        reason: &'static str,
    },

    /// The object ownership value is not recognized.
    #[error("invalid object ownership: {0}")]
    InvalidOwnership(String),

    /// The object key exceeds the maximum length.
    #[error("object key is {0} bytes, exceeding the maximum allowed length")]
    KeyTooLong(usize),

    /// A tag or tag set is invalid.
    #[error("invalid tag: {0}")]
    InvalidTag(String),

    /// Any other invalid argument.
    #[error("{0}")]
    InvalidArgument(String),
}

impl From<S3CoreError> for ApiError {
    fn from(err: S3CoreError) -> Self {
        let code = match &err {
            S3CoreError::UnsupportedChecksumAlgorithm(_)
            | S3CoreError::InvalidChecksum { .. }
            | S3CoreError::MultipleChecksumHeaders(_) => ErrorCode::InvalidRequest,
            S3CoreError::ChecksumMismatch { .. } | S3CoreError::BadDigest => ErrorCode::BadDigest,
            S3CoreError::InvalidDigest => ErrorCode::InvalidDigest,
            S3CoreError::InvalidBucketName { .. } => ErrorCode::InvalidBucketName,
            S3CoreError::KeyTooLong(_) => ErrorCode::KeyTooLongError,
            S3CoreError::InvalidTag(_) => ErrorCode::InvalidTag,
            S3CoreError::InvalidObjectAttributes(_)
            | S3CoreError::InvalidCountParameter { .. }
            | S3CoreError::InvalidOwnership(_)
            | S3CoreError::InvalidArgument(_) => ErrorCode::InvalidArgument,
        };
        Self::new(code, err.to_string())
    }
}
