//! Per-bucket policy storage.
//!
//! Each bucket maps to an `Arc<PolicyEntry>`. Attaching a policy builds a new
//! entry and swaps it in whole, so a reader either sees the old policy or the
//! new one, never a mix.

use std::sync::Arc;

use bucketguard_iam::IamService;
use bucketguard_s3_core::validation::validate_bucket_name;
use dashmap::DashMap;
use tracing::info;

use crate::error::PolicyError;
use crate::evaluate::{AccessRequest, BucketPolicy, Decision};
use crate::validate::validate_policy_document;

/// A validated policy together with the document it was parsed from.
#[derive(Debug)]
pub struct PolicyEntry {
    policy: BucketPolicy,
    document: String,
}

impl PolicyEntry {
    /// The validated policy.
    #[must_use]
    pub fn policy(&self) -> &BucketPolicy {
        &self.policy
    }

    /// The JSON document as it was attached.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }
}

/// Attached bucket policies, keyed by bucket name.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    policies: DashMap<String, Arc<PolicyEntry>>,
}

impl PolicyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `raw` and attach it to `bucket`, replacing any existing policy.
    ///
    /// Nothing changes if validation fails.
    pub fn put_policy(
        &self,
        bucket: &str,
        raw: &[u8],
        iam: &dyn IamService,
    ) -> Result<(), PolicyError> {
        validate_bucket_name(bucket)?;
        let policy = validate_policy_document(raw, bucket, iam)?;
        let entry = Arc::new(PolicyEntry {
            policy,
            document: String::from_utf8_lossy(raw).into_owned(),
        });

        let replaced = self.policies.insert(bucket.to_owned(), entry).is_some();
        info!(bucket, replaced, "bucket policy attached");
        Ok(())
    }

    /// The policy attached to `bucket`, if any.
    #[must_use]
    pub fn get_policy(&self, bucket: &str) -> Option<Arc<PolicyEntry>> {
        self.policies.get(bucket).map(|entry| Arc::clone(entry.value()))
    }

    /// The attached document for `bucket`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NoSuchBucketPolicy`] if none is attached.
    pub fn policy_document(&self, bucket: &str) -> Result<String, PolicyError> {
        self.get_policy(bucket)
            .map(|entry| entry.document().to_owned())
            .ok_or_else(|| PolicyError::NoSuchBucketPolicy(bucket.to_owned()))
    }

    /// Detach the policy from `bucket`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NoSuchBucketPolicy`] if none is attached.
    pub fn delete_policy(&self, bucket: &str) -> Result<(), PolicyError> {
        self.policies
            .remove(bucket)
            .ok_or_else(|| PolicyError::NoSuchBucketPolicy(bucket.to_owned()))?;
        info!(bucket, "bucket policy deleted");
        Ok(())
    }

    /// Evaluate the policy attached to `bucket`; [`Decision::NoMatch`] if none.
    #[must_use]
    pub fn authorize(&self, bucket: &str, request: &AccessRequest<'_>) -> Decision {
        self.get_policy(bucket)
            .map_or(Decision::NoMatch, |entry| entry.policy().authorize(request))
    }
}
