//! Client-declared integrity checksums.
//!
//! Clients may declare one additional checksum per request through an
//! `x-amz-checksum-<algorithm>` header carrying the base64-encoded digest.
//! This module validates algorithm tags, checks that a declared value has the
//! right decoded length, and verifies it against the payload.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use digest::Digest;
use http::HeaderMap;
use tracing::debug;

use crate::error::S3CoreError;

/// Header prefix shared by all declared checksums.
pub const CHECKSUM_HEADER_PREFIX: &str = "x-amz-checksum-";

// ---------------------------------------------------------------------------
// ChecksumAlgorithm
// ---------------------------------------------------------------------------

/// Supported checksum algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    /// CRC-32 (IEEE 802.3).
    Crc32,
    /// CRC-32C (Castagnoli).
    Crc32c,
    /// CRC-64/NVME.
    Crc64Nvme,
    /// SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
}

impl ChecksumAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [Self; 5] = [
        Self::Crc32,
        Self::Crc32c,
        Self::Crc64Nvme,
        Self::Sha1,
        Self::Sha256,
    ];

    /// Return the canonical string representation used in S3 headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crc32 => "CRC32",
            Self::Crc32c => "CRC32C",
            Self::Crc64Nvme => "CRC64NVME",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
        }
    }

    /// Decoded length in bytes of a digest produced by this algorithm.
    #[must_use]
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Crc32 | Self::Crc32c => 4,
            Self::Crc64Nvme => 8,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    /// Name of the header carrying a declared checksum for this algorithm.
    #[must_use]
    pub fn header_name(&self) -> String {
        format!(
            "{CHECKSUM_HEADER_PREFIX}{}",
            self.as_str().to_ascii_lowercase()
        )
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = S3CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algo| algo.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| S3CoreError::UnsupportedChecksumAlgorithm(s.to_owned()))
    }
}

/// Validate an `x-amz-checksum-algorithm` / `x-amz-sdk-checksum-algorithm` tag.
///
/// An empty tag means the checksum feature is unused and yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`S3CoreError::UnsupportedChecksumAlgorithm`] for an unknown tag.
///
/// # Examples
///
/// ```
/// use bucketguard_s3_core::checksums::{ChecksumAlgorithm, validate_checksum_algorithm};
///
/// assert_eq!(validate_checksum_algorithm("").unwrap(), None);
/// assert_eq!(
///     validate_checksum_algorithm("CRC32C").unwrap(),
///     Some(ChecksumAlgorithm::Crc32c)
/// );
/// assert!(validate_checksum_algorithm("MD4").is_err());
/// ```
pub fn validate_checksum_algorithm(tag: &str) -> Result<Option<ChecksumAlgorithm>, S3CoreError> {
    if tag.is_empty() {
        return Ok(None);
    }
    tag.parse().map(Some)
}

/// Whether `value` is a well-formed base64 digest for `algorithm`.
///
/// The value must decode cleanly and its decoded length must equal the
/// algorithm's digest length.
///
/// # Examples
///
/// ```
/// use bucketguard_s3_core::checksums::{ChecksumAlgorithm, is_valid_checksum};
///
/// assert!(is_valid_checksum("ww2FVQ==", ChecksumAlgorithm::Crc32));
/// assert!(!is_valid_checksum("YXNkZmFzZGZhc2Rm", ChecksumAlgorithm::Crc32));
/// ```
#[must_use]
pub fn is_valid_checksum(value: &str, algorithm: ChecksumAlgorithm) -> bool {
    BASE64_STANDARD
        .decode(value)
        .is_ok_and(|decoded| decoded.len() == algorithm.digest_len())
}

/// Compute a base64-encoded checksum for the given algorithm.
///
/// # Examples
///
/// ```
/// use bucketguard_s3_core::checksums::{ChecksumAlgorithm, compute_checksum};
///
/// let b64 = compute_checksum(ChecksumAlgorithm::Sha256, b"");
/// assert_eq!(b64, "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
/// ```
#[must_use]
pub fn compute_checksum(algorithm: ChecksumAlgorithm, data: &[u8]) -> String {
    match algorithm {
        ChecksumAlgorithm::Crc32 => {
            let mut hasher = crc32fast::Hasher::new();
            hasher.update(data);
            BASE64_STANDARD.encode(hasher.finalize().to_be_bytes())
        }
        ChecksumAlgorithm::Crc32c => BASE64_STANDARD.encode(crc32c::crc32c(data).to_be_bytes()),
        ChecksumAlgorithm::Crc64Nvme => {
            let mut hasher = crc64fast_nvme::Digest::new();
            hasher.write(data);
            BASE64_STANDARD.encode(hasher.sum64().to_be_bytes())
        }
        ChecksumAlgorithm::Sha1 => BASE64_STANDARD.encode(sha1::Sha1::digest(data)),
        ChecksumAlgorithm::Sha256 => BASE64_STANDARD.encode(sha2::Sha256::digest(data)),
    }
}

// ---------------------------------------------------------------------------
// ChecksumValue
// ---------------------------------------------------------------------------

/// A base64-encoded checksum value paired with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChecksumValue {
    /// The algorithm used to compute this checksum.
    #[serde(with = "algorithm_serde")]
    pub algorithm: ChecksumAlgorithm,
    /// The base64-encoded checksum.
    pub value: String,
}

impl ChecksumValue {
    /// Read the declared checksum from request headers.
    ///
    /// Returns `Ok(None)` when no `x-amz-checksum-*` header is present.
    ///
    /// # Errors
    ///
    /// Returns [`S3CoreError::MultipleChecksumHeaders`] when more than one
    /// algorithm is declared, and [`S3CoreError::InvalidChecksum`] when the
    /// declared value is malformed for its algorithm.
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, S3CoreError> {
        let mut found = Vec::new();
        for algorithm in ChecksumAlgorithm::ALL {
            if let Some(value) = headers.get(algorithm.header_name()) {
                let value = value.to_str().unwrap_or_default().to_owned();
                found.push(Self { algorithm, value });
            }
        }

        if found.len() > 1 {
            return Err(S3CoreError::MultipleChecksumHeaders(found.len()));
        }
        let Some(declared) = found.pop() else {
            return Ok(None);
        };

        if !is_valid_checksum(&declared.value, declared.algorithm) {
            return Err(declared.invalid());
        }
        Ok(Some(declared))
    }

    fn invalid(&self) -> S3CoreError {
        S3CoreError::InvalidChecksum {
            algorithm: self.algorithm.as_str().to_ascii_lowercase(),
            value: self.value.clone(),
        }
    }
}

/// Verify a declared checksum against the payload.
///
/// # Errors
///
/// Returns [`S3CoreError::InvalidChecksum`] if the declared value is malformed
/// and [`S3CoreError::ChecksumMismatch`] if it does not match `data`.
pub fn verify_checksum(declared: &ChecksumValue, data: &[u8]) -> Result<(), S3CoreError> {
    if !is_valid_checksum(&declared.value, declared.algorithm) {
        return Err(declared.invalid());
    }

    let computed = compute_checksum(declared.algorithm, data);
    if computed != declared.value {
        debug!(algorithm = %declared.algorithm, "declared checksum does not match payload");
        return Err(S3CoreError::ChecksumMismatch {
            algorithm: declared.algorithm.to_string(),
        });
    }
    Ok(())
}

mod algorithm_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ChecksumAlgorithm;

    pub(super) fn serialize<S: Serializer>(
        algorithm: &ChecksumAlgorithm,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(algorithm.as_str())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<ChecksumAlgorithm, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
