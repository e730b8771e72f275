//! S3 actions and the action patterns a statement may name.

use std::fmt;
use std::str::FromStr;

use crate::error::StatementError;

/// Whether an action operates on objects or on the bucket itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionScope {
    /// The action targets an object key (`arn:aws:s3:::bucket/key`).
    Object,
    /// The action targets the bucket (`arn:aws:s3:::bucket`).
    Bucket,
}

macro_rules! s3_actions {
    ($($variant:ident => $scope:ident),+ $(,)?) => {
        /// An S3 action that can be named in a bucket policy.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum S3Action {
            $(
                #[doc = concat!("`s3:", stringify!($variant), "`")]
                $variant,
            )+
        }

        impl S3Action {
            /// Every known action.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The action as written in a policy, e.g. `s3:GetObject`.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => concat!("s3:", stringify!($variant)),)+
                }
            }

            /// Whether the action targets objects or the bucket.
            #[must_use]
            pub const fn scope(&self) -> ActionScope {
                match self {
                    $(Self::$variant => ActionScope::$scope,)+
                }
            }
        }
    };
}

s3_actions! {
    AbortMultipartUpload => Object,
    BypassGovernanceRetention => Object,
    DeleteObject => Object,
    DeleteObjectTagging => Object,
    DeleteObjectVersion => Object,
    DeleteObjectVersionTagging => Object,
    GetObject => Object,
    GetObjectAcl => Object,
    GetObjectAttributes => Object,
    GetObjectLegalHold => Object,
    GetObjectRetention => Object,
    GetObjectTagging => Object,
    GetObjectVersion => Object,
    GetObjectVersionAttributes => Object,
    GetObjectVersionTagging => Object,
    ListMultipartUploadParts => Object,
    PutObject => Object,
    PutObjectAcl => Object,
    PutObjectLegalHold => Object,
    PutObjectRetention => Object,
    PutObjectTagging => Object,
    PutObjectVersionTagging => Object,
    RestoreObject => Object,

    CreateBucket => Bucket,
    DeleteBucket => Bucket,
    DeleteBucketOwnershipControls => Bucket,
    DeleteBucketPolicy => Bucket,
    DeleteBucketTagging => Bucket,
    GetBucketAcl => Bucket,
    GetBucketLocation => Bucket,
    GetBucketObjectLockConfiguration => Bucket,
    GetBucketOwnershipControls => Bucket,
    GetBucketPolicy => Bucket,
    GetBucketTagging => Bucket,
    GetBucketVersioning => Bucket,
    ListBucket => Bucket,
    ListBucketMultipartUploads => Bucket,
    ListBucketVersions => Bucket,
    PutBucketAcl => Bucket,
    PutBucketObjectLockConfiguration => Bucket,
    PutBucketOwnershipControls => Bucket,
    PutBucketPolicy => Bucket,
    PutBucketTagging => Bucket,
    PutBucketVersioning => Bucket,
}

impl FromStr for S3Action {
    type Err = StatementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| StatementError::InvalidAction(s.to_owned()))
    }
}

impl fmt::Display for S3Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled `Action` entry from a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRule {
    /// `s3:*`.
    All,
    /// A single named action.
    Exact(S3Action),
    /// `s3:<prefix>*`, matching every action with that prefix.
    Prefix(String),
}

impl ActionRule {
    /// Compile an action pattern.
    ///
    /// # Errors
    ///
    /// Returns [`StatementError::InvalidAction`] for unknown actions,
    /// wildcards not in trailing position, and prefixes matching no action.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucketguard_policy::{ActionRule, S3Action};
    ///
    /// let rule = ActionRule::parse("s3:Get*").unwrap();
    /// assert!(rule.matches(S3Action::GetObject));
    /// assert!(!rule.matches(S3Action::PutObject));
    /// assert!(ActionRule::parse("s3:Frobnicate").is_err());
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, StatementError> {
        let invalid = || StatementError::InvalidAction(pattern.to_owned());

        if pattern == "s3:*" {
            return Ok(Self::All);
        }
        let Some(prefix) = pattern.strip_suffix('*') else {
            return pattern.parse().map(Self::Exact);
        };
        if !prefix.starts_with("s3:") || prefix.contains('*') {
            return Err(invalid());
        }

        let rule = Self::Prefix(prefix.to_owned());
        if S3Action::ALL.iter().any(|action| rule.matches(*action)) {
            Ok(rule)
        } else {
            Err(invalid())
        }
    }

    /// Whether the rule covers `action`.
    #[must_use]
    pub fn matches(&self, action: S3Action) -> bool {
        match self {
            Self::All => true,
            Self::Exact(expected) => *expected == action,
            Self::Prefix(prefix) => action.as_str().starts_with(prefix.as_str()),
        }
    }

    /// The single scope every covered action shares, or `None` when the rule
    /// spans both object and bucket actions.
    #[must_use]
    pub fn scope(&self) -> Option<ActionScope> {
        let mut scopes = S3Action::ALL
            .iter()
            .filter(|action| self.matches(**action))
            .map(S3Action::scope);
        let first = scopes.next()?;
        scopes.all(|scope| scope == first).then_some(first)
    }
}
