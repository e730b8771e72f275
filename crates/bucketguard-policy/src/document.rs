//! Wire format of a bucket policy document.
//!
//! These types mirror the JSON as clients send it and carry no validation
//! beyond structure. See [`crate::validate`] for the checks that turn a
//! [`PolicyDocument`] into an enforceable [`crate::BucketPolicy`].

use serde::Deserialize;

/// A policy document as received.
///
/// ```json
/// {
///   "Version": "2012-10-17",
///   "Statement": [{
///     "Effect": "Allow",
///     "Principal": {"AWS": ["alice"]},
///     "Action": "s3:GetObject",
///     "Resource": "arn:aws:s3:::photos/*"
///   }]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Policy language version. Not interpreted.
    #[serde(default)]
    pub version: Option<String>,
    /// Optional document identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// The statements, all of which are evaluated.
    pub statement: Vec<StatementDocument>,
}

/// One statement as received.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatementDocument {
    /// Optional statement identifier.
    #[serde(default)]
    pub sid: Option<String>,
    /// `Allow` or `Deny`; checked during validation.
    pub effect: String,
    /// Who the statement applies to.
    pub principal: PrincipalDocument,
    /// Actions covered.
    pub action: StringOrArray,
    /// Resources covered.
    pub resource: StringOrArray,
}

/// The `Principal` element: `"*"`, a list of names, or `{"AWS": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PrincipalDocument {
    /// A bare string or array.
    Plain(StringOrArray),
    /// The AWS object form.
    Aws {
        /// The principal names.
        #[serde(rename = "AWS")]
        aws: StringOrArray,
    },
}

impl PrincipalDocument {
    /// The principal names, whichever form was used.
    #[must_use]
    pub fn values(&self) -> &StringOrArray {
        match self {
            Self::Plain(values) | Self::Aws { aws: values } => values,
        }
    }
}

/// Either a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StringOrArray {
    /// A single string.
    Single(String),
    /// An array of strings.
    Array(Vec<String>),
}

impl StringOrArray {
    /// Iterate over the values.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        let values: &[String] = match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Array(values) => values,
        };
        values.iter().map(String::as_str)
    }

    /// Whether there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Array(values) if values.is_empty())
    }
}
