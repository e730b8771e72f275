//! Small request-parameter parsers.

use std::fmt;
use std::str::FromStr;

use crate::error::S3CoreError;

/// Default page size for listing counters such as `max-keys`.
pub const DEFAULT_MAX_COUNT: i32 = 1000;

/// Parse a pagination counter (`max-keys`, `max-uploads`, `max-parts`).
///
/// An empty value yields [`DEFAULT_MAX_COUNT`].
///
/// # Errors
///
/// A negative, non-numeric or out-of-range value returns
/// [`S3CoreError::InvalidCountParameter`] carrying the default alongside the
/// offending input.
///
/// # Examples
///
/// ```
/// use bucketguard_s3_core::params::parse_count_parameter;
///
/// assert_eq!(parse_count_parameter("").unwrap(), 1000);
/// assert_eq!(parse_count_parameter("23").unwrap(), 23);
/// assert!(parse_count_parameter("-5").is_err());
/// ```
pub fn parse_count_parameter(raw: &str) -> Result<i32, S3CoreError> {
    if raw.is_empty() {
        return Ok(DEFAULT_MAX_COUNT);
    }

    match raw.parse::<i32>() {
        Ok(value) if value >= 0 => Ok(value),
        _ => Err(S3CoreError::InvalidCountParameter {
            value: raw.to_owned(),
            default: DEFAULT_MAX_COUNT,
        }),
    }
}

/// Bucket object-ownership setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectOwnership {
    /// ACLs are disabled and the bucket owner owns every object.
    #[default]
    BucketOwnerEnforced,
    /// The bucket owner owns objects uploaded with `bucket-owner-full-control`.
    BucketOwnerPreferred,
    /// The uploading account owns the object.
    ObjectWriter,
}

impl ObjectOwnership {
    /// Return the wire value of this setting.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BucketOwnerEnforced => "BucketOwnerEnforced",
            Self::BucketOwnerPreferred => "BucketOwnerPreferred",
            Self::ObjectWriter => "ObjectWriter",
        }
    }
}

impl fmt::Display for ObjectOwnership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectOwnership {
    type Err = S3CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BucketOwnerEnforced" => Ok(Self::BucketOwnerEnforced),
            "BucketOwnerPreferred" => Ok(Self::BucketOwnerPreferred),
            "ObjectWriter" => Ok(Self::ObjectWriter),
            _ => Err(S3CoreError::InvalidOwnership(s.to_owned())),
        }
    }
}

/// Whether `value` names a known object-ownership setting.
#[must_use]
pub fn is_valid_ownership(value: &str) -> bool {
    value.parse::<ObjectOwnership>().is_ok()
}
