//! AWS Signature Version 4 verification.
//!
//! 1. Parse the `Authorization` header into algorithm, credential scope,
//!    signed headers and provided signature.
//! 2. Resolve the secret key through the identity backend.
//! 3. Rebuild the [`CanonicalRequest`] from the request parts.
//! 4. Build the string to sign and derive the signing key.
//! 5. Compare signatures in constant time.
//!
//! The main entry point is [`verify_sigv4`].

use bucketguard_iam::IamService;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::CanonicalRequest;
use crate::error::AuthError;

/// The only algorithm supported by this implementation.
const SUPPORTED_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Format of the `x-amz-date` header.
const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Maximum tolerated distance between request time and server time.
pub const MAX_CLOCK_SKEW: TimeDelta = TimeDelta::minutes(15);

type HmacSha256 = Hmac<Sha256>;

/// The result of a successful verification.
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// The access key that signed the request.
    pub access_key_id: String,
    /// The region from the credential scope.
    pub region: String,
    /// The service from the credential scope.
    pub service: String,
    /// The headers covered by the signature.
    pub signed_headers: Vec<String>,
}

/// Parsed components of an `Authorization` header.
///
/// ```text
/// AWS4-HMAC-SHA256 Credential=AKID/20130524/us-east-1/s3/aws4_request,
///   SignedHeaders=host;x-amz-content-sha256;x-amz-date,
///   Signature=<hex-signature>
/// ```
#[derive(Debug, Clone)]
pub struct ParsedAuth {
    /// The access key.
    pub access_key_id: String,
    /// Date component of the credential scope (`YYYYMMDD`).
    pub date: String,
    /// Region from the credential scope.
    pub region: String,
    /// Service from the credential scope.
    pub service: String,
    /// Signed header names, lower-case.
    pub signed_headers: Vec<String>,
    /// Hex-encoded signature.
    pub signature: String,
}

impl ParsedAuth {
    /// `date/region/service/aws4_request`.
    #[must_use]
    pub fn credential_scope(&self) -> String {
        format!("{}/{}/{}/aws4_request", self.date, self.region, self.service)
    }
}

/// Parse an `Authorization` header value.
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`] if a component is missing,
/// [`AuthError::UnsupportedAlgorithm`] for anything but `AWS4-HMAC-SHA256`,
/// and [`AuthError::InvalidCredential`] for a malformed credential scope.
pub fn parse_authorization_header(header: &str) -> Result<ParsedAuth, AuthError> {
    let (algorithm, rest) = header.split_once(' ').ok_or(AuthError::InvalidAuthHeader)?;
    if algorithm != SUPPORTED_ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    let mut credential = None;
    let mut signed_headers = None;
    let mut signature = None;
    for part in rest.split(',').map(str::trim) {
        if let Some(value) = part.strip_prefix("Credential=") {
            credential = Some(value);
        } else if let Some(value) = part.strip_prefix("SignedHeaders=") {
            signed_headers = Some(value);
        } else if let Some(value) = part.strip_prefix("Signature=") {
            signature = Some(value);
        }
    }

    let credential = credential.ok_or(AuthError::InvalidAuthHeader)?;
    let signed_headers = signed_headers.ok_or(AuthError::InvalidAuthHeader)?;
    let signature = signature.ok_or(AuthError::InvalidAuthHeader)?;

    let scope: Vec<&str> = credential.splitn(5, '/').collect();
    let [access, date, region, service, terminator] = scope.as_slice() else {
        return Err(AuthError::InvalidCredential);
    };
    if *terminator != "aws4_request" || access.is_empty() {
        return Err(AuthError::InvalidCredential);
    }

    Ok(ParsedAuth {
        access_key_id: (*access).to_owned(),
        date: (*date).to_owned(),
        region: (*region).to_owned(),
        service: (*service).to_owned(),
        signed_headers: signed_headers
            .split(';')
            .filter(|h| !h.is_empty())
            .map(str::to_ascii_lowercase)
            .collect(),
        signature: signature.to_owned(),
    })
}

/// Build the string to sign.
///
/// # Examples
///
/// ```
/// use bucketguard_auth::sigv4::build_string_to_sign;
///
/// let sts = build_string_to_sign(
///     "20130524T000000Z",
///     "20130524/us-east-1/s3/aws4_request",
///     "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972",
/// );
/// assert!(sts.starts_with("AWS4-HMAC-SHA256\n20130524T000000Z\n"));
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{SUPPORTED_ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the signing key through the HMAC-SHA256 chain.
///
/// ```text
/// DateKey              = HMAC("AWS4" + secret, date)
/// DateRegionKey        = HMAC(DateKey, region)
/// DateRegionServiceKey = HMAC(DateRegionKey, service)
/// SigningKey           = HMAC(DateRegionServiceKey, "aws4_request")
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, b"aws4_request")
}

/// Hex-encoded HMAC-SHA256 of `data` under `signing_key`.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}

/// Hex-encoded SHA-256 of a payload, as sent in `x-amz-content-sha256`.
///
/// # Examples
///
/// ```
/// use bucketguard_auth::sigv4::hash_payload;
///
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Parse an `x-amz-date` value and check it lies within [`MAX_CLOCK_SKEW`] of `now`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidDate`] for a malformed timestamp and
/// [`AuthError::RequestTimeTooSkewed`] when it is too far from `now`.
pub fn check_request_time(amz_date: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, AuthError> {
    let request_time = NaiveDateTime::parse_from_str(amz_date, AMZ_DATE_FORMAT)
        .map_err(|_| AuthError::InvalidDate(amz_date.to_owned()))?
        .and_utc();

    if (now - request_time).abs() > MAX_CLOCK_SKEW {
        debug!(%request_time, %now, "request time outside allowed skew");
        return Err(AuthError::RequestTimeTooSkewed);
    }
    Ok(request_time)
}

/// Verify a SigV4-signed request against the identity backend.
///
/// The credential scope must name `region` and the day of `x-amz-date`, and
/// `host` must be among the signed headers. Only the signature is checked
/// here; callers that enforce freshness also call [`check_request_time`].
///
/// # Errors
///
/// Returns an [`AuthError`] if the `Authorization` header is missing or
/// malformed, the credential scope does not fit the request, the access key
/// is unknown, a signed header is missing, or the signature does not match.
pub fn verify_sigv4(
    parts: &http::request::Parts,
    payload_hash: &str,
    region: &str,
    iam: &dyn IamService,
) -> Result<AuthResult, AuthError> {
    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;
    let parsed = parse_authorization_header(auth_header)?;

    if !parsed.signed_headers.iter().any(|name| name == "host") {
        return Err(AuthError::HeaderNotSigned("host".to_owned()));
    }
    if parsed.region != region {
        return Err(AuthError::RegionMismatch {
            expected: region.to_owned(),
            found: parsed.region,
        });
    }

    let timestamp = parts
        .headers
        .get("x-amz-date")
        .ok_or_else(|| AuthError::MissingHeader("x-amz-date".to_owned()))?
        .to_str()
        .map_err(|_| AuthError::InvalidHeaderValue("x-amz-date".to_owned()))?;
    if timestamp.get(..8) != Some(parsed.date.as_str()) {
        return Err(AuthError::ScopeDateMismatch {
            scope: parsed.date,
            request: timestamp.to_owned(),
        });
    }

    let secret_key = iam.get_secret_key(&parsed.access_key_id)?;

    debug!(
        access_key_id = %parsed.access_key_id,
        date = %parsed.date,
        region = %parsed.region,
        service = %parsed.service,
        "verifying SigV4 signature"
    );

    let signed_refs: Vec<&str> = parsed.signed_headers.iter().map(String::as_str).collect();
    let canonical = CanonicalRequest::from_parts(parts, &signed_refs, payload_hash)?;
    let string_to_sign =
        build_string_to_sign(timestamp, &parsed.credential_scope(), &canonical.hash());

    let signing_key = derive_signing_key(
        secret_key.expose(),
        &parsed.date,
        &parsed.region,
        &parsed.service,
    );
    let expected = compute_signature(&signing_key, &string_to_sign);

    if bool::from(parsed.signature.as_bytes().ct_eq(expected.as_bytes())) {
        debug!(access_key_id = %parsed.access_key_id, "signature verified");
        Ok(AuthResult {
            access_key_id: parsed.access_key_id,
            region: parsed.region,
            service: parsed.service,
            signed_headers: parsed.signed_headers,
        })
    } else {
        debug!(
            access_key_id = %parsed.access_key_id,
            canonical_request = %canonical.canonical_string(),
            "signature mismatch"
        );
        Err(AuthError::SignatureDoesNotMatch)
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
