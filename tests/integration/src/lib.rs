//! End-to-end tests for the BucketGuard authorization core.
//!
//! Each scenario wires real components together the way a gateway would: a
//! configured identity backend, a client-side SigV4 signer, the verifier and
//! the policy registry.
//!
//! ```text
//! cargo test -p bucketguard-integration
//! ```

use std::sync::Once;

use anyhow::Context;
use bucketguard_auth::CanonicalRequest;
use bucketguard_auth::sigv4::{build_string_to_sign, compute_signature, derive_signing_key, hash_payload};
use bucketguard_core::IamConfig;
use bucketguard_iam::{Account, IamBackend, IamService, Role};

static INIT: Once = Once::new();

/// Region used in every credential scope.
pub const TEST_REGION: &str = "us-east-1";

/// Timestamp used for signed requests.
pub const TEST_AMZ_DATE: &str = "20240315T120000Z";

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// An embedded-store backend in a fresh temporary directory, seeded with `accounts`.
///
/// The directory lives as long as the returned guard.
pub fn internal_backend(
    accounts: &[(&str, &str, Role)],
) -> anyhow::Result<(tempfile::TempDir, IamBackend)> {
    init_tracing();

    let dir = tempfile::tempdir().context("create iam dir")?;
    let config = IamConfig::builder()
        .iam_dir(dir.path().to_string_lossy())
        .build();
    let backend = IamBackend::from_config(&config, None)?;
    for (access, secret, role) in accounts {
        backend.create_account(Account::new(*access, *secret, *role))?;
    }
    Ok((dir, backend))
}

/// A request to sign.
#[derive(Debug, Clone)]
pub struct TestRequest<'a> {
    /// HTTP method.
    pub method: &'a str,
    /// Absolute URI, e.g. `http://photos.s3.local/cat.jpg`.
    pub uri: &'a str,
    /// Extra headers, all of which are signed.
    pub headers: Vec<(&'a str, String)>,
    /// Request body.
    pub payload: &'a [u8],
}

impl<'a> TestRequest<'a> {
    /// A request with no extra headers and an empty body.
    #[must_use]
    pub fn new(method: &'a str, uri: &'a str) -> Self {
        Self {
            method,
            uri,
            headers: Vec::new(),
            payload: b"",
        }
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: &'a str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn payload(mut self, payload: &'a [u8]) -> Self {
        self.payload = payload;
        self
    }

    /// Sign the request the way an SDK client would and return its parts.
    pub fn sign(&self, access: &str, secret: &str) -> anyhow::Result<http::request::Parts> {
        let payload_hash = hash_payload(self.payload);
        let uri: http::Uri = self.uri.parse().context("parse uri")?;
        let host = uri.authority().context("uri has no authority")?.to_string();

        let mut builder = http::Request::builder()
            .method(self.method)
            .uri(uri)
            .header("host", host)
            .header("x-amz-date", TEST_AMZ_DATE)
            .header("x-amz-content-sha256", &payload_hash);
        for (name, value) in &self.headers {
            builder = builder.header(*name, value);
        }
        let (mut parts, ()) = builder.body(()).context("build request")?.into_parts();

        let mut signed: Vec<String> = parts.headers.keys().map(|k| k.as_str().to_owned()).collect();
        signed.sort();
        signed.dedup();
        let signed_refs: Vec<&str> = signed.iter().map(String::as_str).collect();

        let canonical = CanonicalRequest::from_parts(&parts, &signed_refs, &payload_hash)?;
        let date = &TEST_AMZ_DATE[..8];
        let scope = format!("{date}/{TEST_REGION}/s3/aws4_request");
        let string_to_sign = build_string_to_sign(TEST_AMZ_DATE, &scope, &canonical.hash());
        let signing_key = derive_signing_key(secret, date, TEST_REGION, "s3");
        let signature = compute_signature(&signing_key, &string_to_sign);

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={access}/{scope},SignedHeaders={},Signature={signature}",
            signed.join(";")
        );
        parts.headers.insert(
            http::header::AUTHORIZATION,
            authorization.parse().context("authorization header")?,
        );
        Ok(parts)
    }
}

mod test_backend;
mod test_policy;
mod test_signing;
