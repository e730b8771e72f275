//! Policy validation errors.

use bucketguard_core::{ApiError, ErrorCode};
use bucketguard_iam::IamError;
use bucketguard_s3_core::S3CoreError;

/// Why a single statement failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatementError {
    /// `Effect` is neither `Allow` nor `Deny`.
    #[error("invalid effect: {0}")]
    InvalidEffect(String),

    /// A `Principal`, `Action` or `Resource` set is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// A named principal does not exist in the identity backend.
    #[error("user accounts don't exist: {0}")]
    UnknownPrincipal(String),

    /// A resource is not an `arn:aws:s3:::` pattern or has an invalid key pattern.
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    /// A resource names a bucket other than the one the policy is attached to.
    #[error("resource {resource} does not match bucket {bucket}")]
    BucketMismatch {
        /// The offending resource pattern.
        resource: String,
        /// The target bucket.
        bucket: String,
    },

    /// An action is not a known S3 action or matches none.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// An object action appears without any object resource.
    #[error("unsupported object action '{0}' on the specified resources")]
    ObjectActionWithoutObjectResource(String),

    /// A bucket action appears without any bucket resource.
    #[error("unsupported bucket action '{0}' on the specified resources")]
    BucketActionWithoutBucketResource(String),
}

/// Errors produced while validating or managing bucket policies.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The document exceeds the size limit.
    #[error("policy document is {size} bytes, maximum is {limit}")]
    TooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        limit: usize,
    },

    /// The document is not valid policy JSON.
    #[error("{0}")]
    Parse(#[from] serde_json::Error),

    /// A statement failed validation.
    #[error("statement {index}: {source}")]
    Statement {
        /// Position of the statement in the document.
        index: usize,
        /// What was wrong with it.
        #[source]
        source: StatementError,
    },

    /// The identity backend failed while resolving a principal.
    #[error("identity backend unavailable: {0}")]
    BackendUnavailable(IamError),

    /// The bucket name is invalid.
    #[error(transparent)]
    InvalidBucket(#[from] S3CoreError),

    /// The bucket has no policy attached.
    #[error("The bucket policy does not exist: {0}")]
    NoSuchBucketPolicy(String),
}

impl PolicyError {
    /// The principal that failed to resolve, if that is why validation failed.
    #[must_use]
    pub fn unknown_principal(&self) -> Option<&str> {
        match self {
            Self::Statement {
                source: StatementError::UnknownPrincipal(principal),
                ..
            } => Some(principal),
            _ => None,
        }
    }

    /// Whether this error is reported as `MalformedPolicy`.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::TooLarge { .. } | Self::Parse(_) | Self::Statement { .. }
        )
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        let message = err.to_string();
        let code = match err {
            PolicyError::BackendUnavailable(inner) => return inner.into(),
            PolicyError::InvalidBucket(inner) => return inner.into(),
            PolicyError::TooLarge { .. } | PolicyError::Parse(_) | PolicyError::Statement { .. } => {
                ErrorCode::MalformedPolicy
            }
            PolicyError::NoSuchBucketPolicy(_) => ErrorCode::NoSuchBucketPolicy,
        };
        Self::new(code, message)
    }
}
