//! `GetObjectAttributes` attribute selection.
//!
//! The request names the attributes it wants in the `x-amz-object-attributes`
//! header; the response is trimmed to exactly those fields.

use std::collections::HashSet;
use std::fmt;
use std::hash::BuildHasher;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::checksums::ChecksumValue;
use crate::error::S3CoreError;

/// A queryable object attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectAttribute {
    /// Entity tag.
    ETag,
    /// Declared checksum.
    Checksum,
    /// Multipart part listing.
    ObjectParts,
    /// Object size in bytes.
    ObjectSize,
    /// Storage class.
    StorageClass,
}

impl ObjectAttribute {
    /// Every queryable attribute.
    pub const ALL: [Self; 5] = [
        Self::ETag,
        Self::Checksum,
        Self::ObjectParts,
        Self::ObjectSize,
        Self::StorageClass,
    ];

    /// Return the wire name of the attribute.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ETag => "ETag",
            Self::Checksum => "Checksum",
            Self::ObjectParts => "ObjectParts",
            Self::ObjectSize => "ObjectSize",
            Self::StorageClass => "StorageClass",
        }
    }
}

impl fmt::Display for ObjectAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectAttribute {
    type Err = S3CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|attr| attr.as_str() == s)
            .ok_or_else(|| S3CoreError::InvalidObjectAttributes(s.to_owned()))
    }
}

/// Parse the values of one or more `x-amz-object-attributes` headers.
///
/// Each value may itself be a comma-separated list.
///
/// # Errors
///
/// Returns [`S3CoreError::InvalidObjectAttributes`] if any name is unknown or
/// if no attribute is requested at all.
///
/// # Examples
///
/// ```
/// use bucketguard_s3_core::attributes::{ObjectAttribute, parse_object_attributes};
///
/// let attrs = parse_object_attributes(["ETag, ObjectSize"]).unwrap();
/// assert!(attrs.contains(&ObjectAttribute::ETag));
/// assert!(attrs.contains(&ObjectAttribute::ObjectSize));
/// ```
pub fn parse_object_attributes<'a>(
    values: impl IntoIterator<Item = &'a str>,
) -> Result<HashSet<ObjectAttribute>, S3CoreError> {
    let mut attrs = HashSet::new();
    for value in values {
        for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            attrs.insert(name.parse()?);
        }
    }

    if attrs.is_empty() {
        return Err(S3CoreError::InvalidObjectAttributes(
            "at least one object attribute must be specified".to_owned(),
        ));
    }
    Ok(attrs)
}

/// One part of a multipart object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectPart {
    /// Part number, starting at 1.
    pub part_number: i32,
    /// Part size in bytes.
    pub size: i64,
    /// Checksum declared for the part, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<ChecksumValue>,
}

/// Multipart listing returned under the `ObjectParts` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectParts {
    /// Total number of parts.
    pub total_parts_count: i32,
    /// Whether the listing is truncated.
    pub is_truncated: bool,
    /// Parts in this page.
    pub parts: Vec<ObjectPart>,
}

/// Full set of fields a `GetObjectAttributes` response may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectAttributesResponse {
    /// Entity tag.
    #[serde(rename = "ETag", skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Declared checksum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<ChecksumValue>,
    /// Multipart part listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_parts: Option<ObjectParts>,
    /// Object size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_size: Option<i64>,
    /// Storage class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    /// Version identifier. Travels in a response header, never in the body.
    #[serde(skip)]
    pub version_id: Option<String>,
    /// Last modification time. Travels in a response header.
    #[serde(skip)]
    pub last_modified: Option<DateTime<Utc>>,
    /// Delete marker flag. Travels in a response header.
    #[serde(skip)]
    pub delete_marker: Option<bool>,
}

/// Keep only the requested attributes of `response`.
///
/// Fields outside the queryable attribute set (`version_id`,
/// `last_modified`, `delete_marker`) are always dropped.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
///
/// use bucketguard_s3_core::attributes::{
///     ObjectAttribute, ObjectAttributesResponse, filter_object_attributes,
/// };
///
/// let full = ObjectAttributesResponse {
///     etag: Some("\"abc\"".into()),
///     object_size: Some(42),
///     version_id: Some("v1".into()),
///     ..Default::default()
/// };
/// let requested = HashSet::from([ObjectAttribute::ETag]);
/// let filtered = filter_object_attributes(&requested, full);
/// assert_eq!(filtered.etag.as_deref(), Some("\"abc\""));
/// assert!(filtered.object_size.is_none());
/// assert!(filtered.version_id.is_none());
/// ```
#[must_use]
pub fn filter_object_attributes<S: BuildHasher>(
    requested: &HashSet<ObjectAttribute, S>,
    response: ObjectAttributesResponse,
) -> ObjectAttributesResponse {
    let keep = |attr| requested.contains(&attr);

    ObjectAttributesResponse {
        etag: response.etag.filter(|_| keep(ObjectAttribute::ETag)),
        checksum: response.checksum.filter(|_| keep(ObjectAttribute::Checksum)),
        object_parts: response
            .object_parts
            .filter(|_| keep(ObjectAttribute::ObjectParts)),
        object_size: response
            .object_size
            .filter(|_| keep(ObjectAttribute::ObjectSize)),
        storage_class: response
            .storage_class
            .filter(|_| keep(ObjectAttribute::StorageClass)),
        version_id: None,
        last_modified: None,
        delete_marker: None,
    }
}
