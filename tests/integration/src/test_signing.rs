//! Sign-then-verify scenarios against a persistent identity store.

#[cfg(test)]
mod tests {
    use bucketguard_auth::sigv4::{check_request_time, hash_payload, verify_sigv4};
    use bucketguard_auth::{AuthError, extract_user_metadata};
    use bucketguard_core::{ApiError, ErrorCode, GatewayConfig};
    use bucketguard_iam::{IamService, Role};
    use bucketguard_s3_core::checksums::{ChecksumAlgorithm, ChecksumValue, compute_checksum, verify_checksum};
    use chrono::{TimeDelta, TimeZone, Utc};

    use crate::{TEST_AMZ_DATE, TEST_REGION, TestRequest, internal_backend};

    const ALICE: (&str, &str, Role) = ("AKIAALICE", "alice/secret+key", Role::User);

    #[test]
    fn test_should_verify_signed_request_from_embedded_store() {
        let (_dir, iam) = internal_backend(&[ALICE]).expect("test backend");
        let parts = TestRequest::new("GET", "http://photos.s3.local/2024/cat.jpg?versionId=3&acl")
            .header("range", "bytes=0-99")
            .sign(ALICE.0, ALICE.1)
            .expect("test sign");

        let result =
            verify_sigv4(&parts, &hash_payload(b""), TEST_REGION, &iam).expect("test verify");
        assert_eq!(result.access_key_id, ALICE.0);
        assert!(result.signed_headers.contains(&"range".to_owned()));

        let now = Utc
            .with_ymd_and_hms(2024, 3, 15, 12, 5, 0)
            .single()
            .expect("test now");
        assert!(check_request_time(TEST_AMZ_DATE, now).is_ok());
        assert!(matches!(
            check_request_time(TEST_AMZ_DATE, now + TimeDelta::hours(1)),
            Err(AuthError::RequestTimeTooSkewed)
        ));
    }

    #[test]
    fn test_should_verify_keys_needing_escape() {
        let (_dir, iam) = internal_backend(&[ALICE]).expect("test backend");
        let parts = TestRequest::new("PUT", "http://s3.local/photos/my%20file(1)*.txt")
            .payload(b"hello")
            .sign(ALICE.0, ALICE.1)
            .expect("test sign");

        assert!(verify_sigv4(&parts, &hash_payload(b"hello"), TEST_REGION, &iam).is_ok());
    }

    #[test]
    fn test_should_reject_tampered_requests() {
        let (_dir, iam) = internal_backend(&[ALICE]).expect("test backend");
        let signed = TestRequest::new("GET", "http://photos.s3.local/cat.jpg")
            .header("x-amz-meta-owner", "alice")
            .sign(ALICE.0, ALICE.1)
            .expect("test sign");

        let mut other_path = signed.clone();
        other_path.uri = "http://photos.s3.local/dog.jpg".parse().expect("test uri");
        assert!(matches!(
            verify_sigv4(&other_path, &hash_payload(b""), TEST_REGION, &iam),
            Err(AuthError::SignatureDoesNotMatch)
        ));

        let mut other_header = signed.clone();
        other_header
            .headers
            .insert("x-amz-meta-owner", "mallory".parse().expect("test header"));
        assert!(matches!(
            verify_sigv4(&other_header, &hash_payload(b""), TEST_REGION, &iam),
            Err(AuthError::SignatureDoesNotMatch)
        ));

        let mut missing_header = signed;
        missing_header.headers.remove("x-amz-meta-owner");
        assert!(matches!(
            verify_sigv4(&missing_header, &hash_payload(b""), TEST_REGION, &iam),
            Err(AuthError::MissingHeader(ref h)) if h == "x-amz-meta-owner"
        ));
    }

    #[test]
    fn test_should_reject_requests_scoped_to_another_region() {
        let (_dir, iam) = internal_backend(&[ALICE]).expect("test backend");
        let gateway = GatewayConfig::builder().region("eu-central-1".into()).build();
        let parts = TestRequest::new("GET", "http://photos.s3.local/cat.jpg")
            .sign(ALICE.0, ALICE.1)
            .expect("test sign");

        let err = verify_sigv4(&parts, &hash_payload(b""), &gateway.region, &iam)
            .expect_err("test wrong region");
        let api: ApiError = err.into();
        assert_eq!(api.code(), ErrorCode::AuthorizationHeaderMalformed);
        assert_eq!(api.status().as_u16(), 400);
    }

    #[test]
    fn test_should_reject_deleted_account() {
        let (_dir, iam) = internal_backend(&[ALICE]).expect("test backend");
        let parts = TestRequest::new("GET", "http://photos.s3.local/cat.jpg")
            .sign(ALICE.0, ALICE.1)
            .expect("test sign");

        iam.delete_account(ALICE.0).expect("test delete");

        let err = verify_sigv4(&parts, &hash_payload(b""), TEST_REGION, &iam)
            .expect_err("test rejected");
        let api: ApiError = err.into();
        assert_eq!(api.code(), ErrorCode::InvalidAccessKeyId);
        assert!(api.is_client_error());
    }

    #[test]
    fn test_should_check_payload_checksum_and_metadata_of_signed_put() {
        let (_dir, iam) = internal_backend(&[ALICE]).expect("test backend");
        let body = b"The quick brown fox";
        let crc = compute_checksum(ChecksumAlgorithm::Crc32c, body);

        let parts = TestRequest::new("PUT", "http://photos.s3.local/fox.txt")
            .header("x-amz-checksum-crc32c", crc.clone())
            .header("x-amz-meta-Project", "zoo")
            .payload(body)
            .sign(ALICE.0, ALICE.1)
            .expect("test sign");

        verify_sigv4(&parts, &hash_payload(body), TEST_REGION, &iam).expect("test verify");

        let declared = ChecksumValue::from_headers(&parts.headers)
            .expect("test checksum header")
            .expect("test checksum present");
        assert_eq!(declared.algorithm, ChecksumAlgorithm::Crc32c);
        assert_eq!(declared.value, crc);
        verify_checksum(&declared, body).expect("test checksum matches");
        assert!(verify_checksum(&declared, b"tampered").is_err());

        let metadata = extract_user_metadata(&parts.headers);
        assert_eq!(metadata.get("project").map(String::as_str), Some("zoo"));
    }
}
