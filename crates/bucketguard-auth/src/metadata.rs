//! User-defined object metadata carried in `x-amz-meta-*` headers.

use std::collections::BTreeMap;

use http::HeaderMap;

/// Header prefix identifying user metadata.
pub const USER_METADATA_PREFIX: &str = "x-amz-meta-";

/// Collect all `x-amz-meta-*` headers into a metadata map.
///
/// Keys are the header names with the prefix stripped. The prefix match is
/// case-insensitive; repeated headers are joined with `,`. An empty header set
/// yields an empty map.
///
/// # Examples
///
/// ```
/// use bucketguard_auth::metadata::extract_user_metadata;
/// use http::{HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert("X-Amz-Meta-Color", HeaderValue::from_static("blue"));
/// headers.insert("content-type", HeaderValue::from_static("text/plain"));
///
/// let meta = extract_user_metadata(&headers);
/// assert_eq!(meta.len(), 1);
/// assert_eq!(meta["color"], "blue");
/// ```
#[must_use]
pub fn extract_user_metadata(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut metadata: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in headers {
        let name = name.as_str();
        let Some(key) = name
            .get(..USER_METADATA_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(USER_METADATA_PREFIX))
            .map(|_| &name[USER_METADATA_PREFIX.len()..])
        else {
            continue;
        };
        if key.is_empty() {
            continue;
        }

        let value = String::from_utf8_lossy(value.as_bytes());
        metadata
            .entry(key.to_owned())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    metadata
}
