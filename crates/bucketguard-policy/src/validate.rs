//! Turning a raw policy document into a [`BucketPolicy`].
//!
//! Validation is fail-fast: the first bad statement rejects the whole
//! document, and the error names the statement index and offending value.

use bucketguard_iam::{IamError, IamService};
use tracing::{debug, warn};

use crate::action::{ActionRule, ActionScope};
use crate::document::{PolicyDocument, StatementDocument, StringOrArray};
use crate::error::{PolicyError, StatementError};
use crate::evaluate::{BucketPolicy, Effect, ResourceRule, Statement};
use crate::matcher::MatchRule;

/// Maximum accepted policy document size in bytes.
pub const MAX_POLICY_SIZE: usize = 20 * 1024;

const S3_ARN_PREFIX: &str = "arn:aws:s3:::";

/// Parse and validate a policy document for `bucket`.
///
/// Every principal other than `*` is resolved through `iam`.
///
/// # Errors
///
/// Returns [`PolicyError::TooLarge`] or [`PolicyError::Parse`] for documents
/// that cannot be read, [`PolicyError::Statement`] for the first invalid
/// statement, and [`PolicyError::BackendUnavailable`] if the identity backend
/// fails while resolving a principal.
pub fn validate_policy_document(
    raw: &[u8],
    bucket: &str,
    iam: &dyn IamService,
) -> Result<BucketPolicy, PolicyError> {
    if raw.len() > MAX_POLICY_SIZE {
        return Err(PolicyError::TooLarge {
            size: raw.len(),
            limit: MAX_POLICY_SIZE,
        });
    }

    let document: PolicyDocument = serde_json::from_slice(raw)?;

    let mut statements = Vec::with_capacity(document.statement.len());
    for (index, statement) in document.statement.iter().enumerate() {
        let compiled = compile_statement(statement, bucket, iam).map_err(|err| match err {
            StatementFailure::Invalid(source) => PolicyError::Statement { index, source },
            StatementFailure::Backend(err) => PolicyError::BackendUnavailable(err),
        })?;
        statements.push(compiled);
    }

    debug!(bucket, statements = statements.len(), "validated bucket policy");
    Ok(BucketPolicy::new(bucket, statements))
}

enum StatementFailure {
    Invalid(StatementError),
    Backend(IamError),
}

impl From<StatementError> for StatementFailure {
    fn from(err: StatementError) -> Self {
        Self::Invalid(err)
    }
}

fn compile_statement(
    statement: &StatementDocument,
    bucket: &str,
    iam: &dyn IamService,
) -> Result<Statement, StatementFailure> {
    let effect = parse_effect(&statement.effect)?;
    let principals = compile_principals(statement.principal.values(), iam)?;
    let resources = compile_resources(&statement.resource, bucket)?;
    let actions = compile_actions(&statement.action, &resources)?;

    Ok(Statement {
        effect,
        principals,
        actions,
        resources,
    })
}

fn parse_effect(effect: &str) -> Result<Effect, StatementError> {
    match effect {
        "Allow" => Ok(Effect::Allow),
        "Deny" => Ok(Effect::Deny),
        other => Err(StatementError::InvalidEffect(other.to_owned())),
    }
}

fn compile_principals(
    values: &StringOrArray,
    iam: &dyn IamService,
) -> Result<Vec<MatchRule>, StatementFailure> {
    if values.is_empty() {
        return Err(StatementError::Empty("Principal").into());
    }

    values
        .iter()
        .map(|principal| {
            if principal == "*" {
                return Ok(MatchRule::Any);
            }
            match iam.get_account(principal) {
                Ok(_) => Ok(MatchRule::Exact(principal.to_owned())),
                Err(IamError::NoSuchUser(_)) => {
                    Err(StatementError::UnknownPrincipal(principal.to_owned()).into())
                }
                Err(err) => {
                    warn!(principal, error = %err, "principal lookup failed");
                    Err(StatementFailure::Backend(err))
                }
            }
        })
        .collect()
}

fn compile_resources(values: &StringOrArray, bucket: &str) -> Result<Vec<ResourceRule>, StatementError> {
    if values.is_empty() {
        return Err(StatementError::Empty("Resource"));
    }
    values.iter().map(|resource| compile_resource(resource, bucket)).collect()
}

fn compile_resource(resource: &str, bucket: &str) -> Result<ResourceRule, StatementError> {
    let invalid = || StatementError::InvalidResource(resource.to_owned());

    let path = resource.strip_prefix(S3_ARN_PREFIX).ok_or_else(invalid)?;
    let (resource_bucket, key_pattern) = match path.split_once('/') {
        Some((name, key)) => (name, Some(key)),
        None => (path, None),
    };
    if resource_bucket != bucket {
        return Err(StatementError::BucketMismatch {
            resource: resource.to_owned(),
            bucket: bucket.to_owned(),
        });
    }

    match key_pattern {
        None => Ok(ResourceRule::Bucket),
        Some("") => Err(invalid()),
        Some(pattern) => MatchRule::from_pattern(pattern)
            .map(ResourceRule::Object)
            .ok_or_else(invalid),
    }
}

fn compile_actions(
    values: &StringOrArray,
    resources: &[ResourceRule],
) -> Result<Vec<ActionRule>, StatementError> {
    if values.is_empty() {
        return Err(StatementError::Empty("Action"));
    }

    let has_object = resources.iter().any(|r| matches!(r, ResourceRule::Object(_)));
    let has_bucket = resources.iter().any(|r| matches!(r, ResourceRule::Bucket));

    values
        .iter()
        .map(|action| {
            let rule = ActionRule::parse(action)?;
            match rule.scope() {
                Some(ActionScope::Object) if !has_object => Err(
                    StatementError::ObjectActionWithoutObjectResource(action.to_owned()),
                ),
                Some(ActionScope::Bucket) if !has_bucket => Err(
                    StatementError::BucketActionWithoutBucketResource(action.to_owned()),
                ),
                _ => Ok(rule),
            }
        })
        .collect()
}
