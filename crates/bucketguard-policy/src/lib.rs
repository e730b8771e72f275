//! Bucket policy validation and evaluation.
//!
//! A policy arrives as JSON ([`document`]), is validated against its target
//! bucket and the identity backend ([`validate`]), and is then evaluated per
//! request ([`evaluate`]). [`PolicyRegistry`] holds the attached policy of
//! every bucket.
//!
//! Evaluation considers every statement. Any matching `Deny` wins, then any
//! matching `Allow`; when nothing matches the caller applies its own default.

pub mod action;
pub mod document;
pub mod error;
pub mod evaluate;
pub mod matcher;
pub mod registry;
pub mod validate;

pub use action::{ActionRule, ActionScope, S3Action};
pub use document::{PolicyDocument, PrincipalDocument, StatementDocument, StringOrArray};
pub use error::{PolicyError, StatementError};
pub use evaluate::{AccessRequest, BucketPolicy, Decision, Effect, ResourceRule, Statement};
pub use matcher::MatchRule;
pub use registry::{PolicyEntry, PolicyRegistry};
pub use validate::{MAX_POLICY_SIZE, validate_policy_document};
