//! Validated policies and the runtime authorization decision.

use tracing::debug;

use crate::action::{ActionRule, S3Action};
use crate::matcher::MatchRule;

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Grant access.
    Allow,
    /// Refuse access, overriding any Allow.
    Deny,
}

/// A compiled `Resource` entry, already checked against the policy's bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRule {
    /// `arn:aws:s3:::bucket`.
    Bucket,
    /// `arn:aws:s3:::bucket/<key pattern>`.
    Object(MatchRule),
}

impl ResourceRule {
    fn matches(&self, key: Option<&str>) -> bool {
        match (self, key) {
            (Self::Bucket, None) => true,
            (Self::Object(rule), Some(key)) => rule.matches(key),
            _ => false,
        }
    }
}

/// A validated statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Allow or Deny.
    pub effect: Effect,
    /// Who the statement applies to.
    pub principals: Vec<MatchRule>,
    /// Actions covered.
    pub actions: Vec<ActionRule>,
    /// Resources covered.
    pub resources: Vec<ResourceRule>,
}

impl Statement {
    fn applies_to(&self, request: &AccessRequest<'_>) -> bool {
        self.principals.iter().any(|p| p.matches(request.principal))
            && self.actions.iter().any(|a| a.matches(request.action))
            && self.resources.iter().any(|r| r.matches(request.key))
    }
}

/// What the caller is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRequest<'a> {
    /// The authenticated access key.
    pub principal: &'a str,
    /// The action being performed.
    pub action: S3Action,
    /// The object key, or `None` for a bucket-level request.
    pub key: Option<&'a str>,
}

impl<'a> AccessRequest<'a> {
    /// A request against the bucket itself.
    #[must_use]
    pub fn bucket(principal: &'a str, action: S3Action) -> Self {
        Self {
            principal,
            action,
            key: None,
        }
    }

    /// A request against one object.
    #[must_use]
    pub fn object(principal: &'a str, action: S3Action, key: &'a str) -> Self {
        Self {
            principal,
            action,
            key: Some(key),
        }
    }
}

/// Outcome of evaluating a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A matching statement allows the request and none denies it.
    Allow,
    /// A matching statement denies the request.
    Deny,
    /// No statement matched.
    NoMatch,
}

impl Decision {
    /// Resolve to a yes/no answer, using `default` when no statement matched.
    #[must_use]
    pub fn is_allowed(self, default: bool) -> bool {
        match self {
            Self::Allow => true,
            Self::Deny => false,
            Self::NoMatch => default,
        }
    }
}

/// A validated bucket policy, bound to one bucket.
///
/// Immutable once built; replacing a policy means building a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPolicy {
    bucket: String,
    statements: Vec<Statement>,
}

impl BucketPolicy {
    pub(crate) fn new(bucket: impl Into<String>, statements: Vec<Statement>) -> Self {
        Self {
            bucket: bucket.into(),
            statements,
        }
    }

    /// The bucket this policy was validated against.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The statements, in document order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Evaluate every statement against the request.
    ///
    /// Any matching Deny wins, then any matching Allow; otherwise
    /// [`Decision::NoMatch`].
    #[must_use]
    pub fn authorize(&self, request: &AccessRequest<'_>) -> Decision {
        let mut decision = Decision::NoMatch;
        for statement in self.statements.iter().filter(|s| s.applies_to(request)) {
            match statement.effect {
                Effect::Deny => {
                    decision = Decision::Deny;
                    break;
                }
                Effect::Allow => decision = Decision::Allow,
            }
        }

        debug!(
            bucket = %self.bucket,
            principal = %request.principal,
            action = %request.action,
            key = ?request.key,
            ?decision,
            "evaluated bucket policy"
        );
        decision
    }
}
