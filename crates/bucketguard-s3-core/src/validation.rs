//! Validation for S3 request parameters.
//!
//! Bucket names follow the
//! [Amazon S3 naming rules](https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html);
//! object keys, tags and user metadata follow the documented S3 limits.

use std::net::Ipv4Addr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use md5::{Digest, Md5};

use crate::error::S3CoreError;

/// Maximum number of tags allowed on a single object or bucket.
const MAX_TAGS: usize = 10;

/// Maximum length of a tag key in characters.
const MAX_TAG_KEY_LEN: usize = 128;

/// Maximum length of a tag value in characters.
const MAX_TAG_VALUE_LEN: usize = 256;

/// Maximum total size (in bytes) of all user-defined metadata keys and values.
const MAX_METADATA_SIZE: usize = 2048;

/// Maximum object key length in bytes.
const MAX_KEY_BYTES: usize = 1024;

const MIN_BUCKET_NAME_LEN: usize = 3;
const MAX_BUCKET_NAME_LEN: usize = 63;

/// Return the first naming rule `name` violates, if any.
fn bucket_name_violation(name: &str) -> Option<&'static str> {
    let bytes = name.as_bytes();
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&bytes.len()) {
        return Some("bucket name must be between 3 and 63 characters long");
    }
    if !bytes.iter().all(|&b| alnum(b) || b == b'-' || b == b'.') {
        return Some("bucket name must only contain lowercase letters, numbers, hyphens, and dots");
    }
    if !alnum(bytes[0]) || !alnum(bytes[bytes.len() - 1]) {
        return Some("bucket name must start and end with a letter or number");
    }
    if name.contains("..") {
        return Some("bucket name must not contain consecutive dots");
    }
    if name.parse::<Ipv4Addr>().is_ok() {
        return Some("bucket name must not be formatted as an IP address");
    }
    if name.starts_with("xn--") || name.starts_with("sthree-") {
        return Some("bucket name must not start with a reserved prefix");
    }
    if name.ends_with("-s3alias") {
        return Some("bucket name must not end with '-s3alias'");
    }
    None
}

/// Validate a bucket name.
///
/// # Errors
///
/// Returns [`S3CoreError::InvalidBucketName`] naming the violated rule.
///
/// # Examples
///
/// ```
/// use bucketguard_s3_core::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("my-valid-bucket").is_ok());
/// assert!(validate_bucket_name("AB").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), S3CoreError> {
    match bucket_name_violation(name) {
        Some(reason) => Err(S3CoreError::InvalidBucketName {
            name: name.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Whether `name` is a legal bucket name.
#[must_use]
pub fn is_valid_bucket_name(name: &str) -> bool {
    bucket_name_violation(name).is_none()
}

/// Validate an object key: 1 to 1024 bytes.
///
/// # Errors
///
/// Returns [`S3CoreError::InvalidArgument`] for an empty key and
/// [`S3CoreError::KeyTooLong`] for an oversized one.
pub fn validate_object_key(key: &str) -> Result<(), S3CoreError> {
    if key.is_empty() {
        return Err(S3CoreError::InvalidArgument(
            "object key must not be empty".to_owned(),
        ));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(S3CoreError::KeyTooLong(key.len()));
    }
    Ok(())
}

/// Validate a tag set.
///
/// At most 10 tags; keys are 1 to 128 characters, values at most 256, and
/// keys are unique.
///
/// # Errors
///
/// Returns [`S3CoreError::InvalidTag`] if any rule is violated.
///
/// # Examples
///
/// ```
/// use bucketguard_s3_core::validation::validate_tags;
///
/// let tags = vec![("env".to_owned(), "prod".to_owned())];
/// assert!(validate_tags(&tags).is_ok());
/// ```
pub fn validate_tags(tags: &[(String, String)]) -> Result<(), S3CoreError> {
    if tags.len() > MAX_TAGS {
        return Err(S3CoreError::InvalidTag(format!(
            "object tags cannot be greater than {MAX_TAGS}, got {}",
            tags.len()
        )));
    }

    for (i, (key, value)) in tags.iter().enumerate() {
        let key_len = key.chars().count();
        if key_len == 0 || key_len > MAX_TAG_KEY_LEN {
            return Err(S3CoreError::InvalidTag(format!(
                "tag key must be 1 to {MAX_TAG_KEY_LEN} characters, got {key_len}"
            )));
        }
        if value.chars().count() > MAX_TAG_VALUE_LEN {
            return Err(S3CoreError::InvalidTag(format!(
                "tag value for {key:?} must not exceed {MAX_TAG_VALUE_LEN} characters"
            )));
        }
        if tags[..i].iter().any(|(k, _)| k == key) {
            return Err(S3CoreError::InvalidTag(format!("duplicate tag key {key:?}")));
        }
    }
    Ok(())
}

/// Validate user-defined metadata: keys plus values must fit in 2 KiB.
///
/// # Errors
///
/// Returns [`S3CoreError::InvalidArgument`] if the total size exceeds the limit.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use bucketguard_s3_core::validation::validate_metadata;
///
/// let meta = BTreeMap::from([("color".to_owned(), "blue".to_owned())]);
/// assert!(validate_metadata(&meta).is_ok());
/// ```
pub fn validate_metadata<'a>(
    metadata: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> Result<(), S3CoreError> {
    let total_size: usize = metadata.into_iter().map(|(k, v)| k.len() + v.len()).sum();

    if total_size > MAX_METADATA_SIZE {
        return Err(S3CoreError::InvalidArgument(format!(
            "user-defined metadata must not exceed {MAX_METADATA_SIZE} bytes, got {total_size}"
        )));
    }
    Ok(())
}

/// Validate the `Content-MD5` header against the request body.
///
/// An absent header always passes.
///
/// # Errors
///
/// Returns [`S3CoreError::InvalidDigest`] if the header is not a base64
/// MD5 digest, or [`S3CoreError::BadDigest`] if it does not match `body`.
pub fn validate_content_md5(content_md5: Option<&str>, body: &[u8]) -> Result<(), S3CoreError> {
    let Some(expected_b64) = content_md5 else {
        return Ok(());
    };

    let expected = BASE64_STANDARD
        .decode(expected_b64)
        .map_err(|_| S3CoreError::InvalidDigest)?;
    if expected.len() != 16 {
        return Err(S3CoreError::InvalidDigest);
    }

    if Md5::digest(body).as_slice() != expected.as_slice() {
        return Err(S3CoreError::BadDigest);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_should_accept_valid_bucket_names() {
        let long_name = "a".repeat(63);
        for name in [
            "my-bucket",
            "abc",
            "bucket.with.dots",
            "123bucket",
            long_name.as_str(),
        ] {
            assert!(is_valid_bucket_name(name), "expected valid: {name}");
            assert!(validate_bucket_name(name).is_ok());
        }
    }

    #[test]
    fn test_should_reject_invalid_bucket_names() {
        let too_long = "a".repeat(64);
        for name in [
            "a",
            "ab",
            "",
            too_long.as_str(),
            "-bucket",
            ".bucket",
            "bucket-",
            "bucket.",
            "my@bucket",
            "MyBucket",
            "my..bucket",
            "192.168.1.1",
            "xn--example",
            "sthree-bucket",
            "mybucket-s3alias",
        ] {
            assert!(!is_valid_bucket_name(name), "expected invalid: {name}");
        }
    }

    #[test]
    fn test_should_explain_bucket_name_violation() {
        match validate_bucket_name(".bucket") {
            Err(S3CoreError::InvalidBucketName { name, reason }) => {
                assert_eq!(name, ".bucket");
                assert!(reason.contains("start and end"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_should_validate_object_key_length() {
        assert!(validate_object_key("photos/2024/image.jpg").is_ok());
        assert!(matches!(
            validate_object_key(""),
            Err(S3CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_object_key(&"k".repeat(1025)),
            Err(S3CoreError::KeyTooLong(1025))
        ));
    }

    #[test]
    fn test_should_validate_tags() {
        let tags = vec![
            ("env".to_owned(), "prod".to_owned()),
            ("team".to_owned(), String::new()),
        ];
        assert!(validate_tags(&tags).is_ok());

        let too_many: Vec<_> = (0..11).map(|i| (format!("k{i}"), "v".to_owned())).collect();
        assert!(matches!(
            validate_tags(&too_many),
            Err(S3CoreError::InvalidTag(_))
        ));

        let empty_key = vec![(String::new(), "v".to_owned())];
        assert!(validate_tags(&empty_key).is_err());

        let long_value = vec![("k".to_owned(), "v".repeat(257))];
        assert!(validate_tags(&long_value).is_err());

        let duplicate = vec![
            ("k".to_owned(), "a".to_owned()),
            ("k".to_owned(), "b".to_owned()),
        ];
        assert!(validate_tags(&duplicate).is_err());
    }

    #[test]
    fn test_should_validate_metadata_size() {
        let at_limit = BTreeMap::from([("k".to_owned(), "v".repeat(2047))]);
        assert!(validate_metadata(&at_limit).is_ok());

        let over = BTreeMap::from([("k".to_owned(), "v".repeat(2048))]);
        assert!(matches!(
            validate_metadata(&over),
            Err(S3CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_should_validate_content_md5() {
        assert!(validate_content_md5(None, b"hello").is_ok());

        // MD5("hello") = 5d41402abc4b2a76b9719d911017c592
        assert!(validate_content_md5(Some("XUFAKrxLKna5cZ2REBfFkg=="), b"hello").is_ok());
        assert!(matches!(
            validate_content_md5(Some("XUFAKrxLKna5cZ2REBfFkg=="), b"world"),
            Err(S3CoreError::BadDigest)
        ));
        assert!(matches!(
            validate_content_md5(Some("not base64!"), b"hello"),
            Err(S3CoreError::InvalidDigest)
        ));
    }
}
