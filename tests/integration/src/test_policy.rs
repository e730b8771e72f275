//! Attach-then-authorize scenarios combining signatures and bucket policies.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bucketguard_auth::sigv4::{hash_payload, verify_sigv4};
    use bucketguard_core::{ApiError, ErrorCode, IamConfig};
    use bucketguard_iam::{
        DirectoryConnector, DirectoryCredentials, DirectoryEntry, DirectoryError, DirectoryQuery,
        IamBackend, Role,
    };
    use bucketguard_policy::{AccessRequest, Decision, PolicyError, PolicyRegistry, S3Action};

    use crate::{TEST_REGION, TestRequest, internal_backend};

    const ALICE: (&str, &str, Role) = ("alice", "alice-secret", Role::User);
    const BOB: (&str, &str, Role) = ("bob", "bob-secret", Role::UserPlus);

    const GALLERY_POLICY: &str = r#"{
        "Version": "2012-10-17",
        "Statement": [
            {
                "Sid": "PublicRead",
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": "arn:aws:s3:::gallery/public/*"
            },
            {
                "Sid": "AliceWrites",
                "Effect": "Allow",
                "Principal": {"AWS": ["alice"]},
                "Action": ["s3:PutObject", "s3:DeleteObject", "s3:ListBucket"],
                "Resource": ["arn:aws:s3:::gallery", "arn:aws:s3:::gallery/*"]
            },
            {
                "Sid": "NobodyTouchesArchive",
                "Effect": "Deny",
                "Principal": "*",
                "Action": "s3:*",
                "Resource": "arn:aws:s3:::gallery/archive/*"
            }
        ]
    }"#;

    fn authorize_signed(
        registry: &PolicyRegistry,
        iam: &IamBackend,
        (access, secret): (&str, &str),
        action: S3Action,
        key: Option<&str>,
    ) -> Decision {
        let uri = format!("http://gallery.s3.local/{}", key.unwrap_or_default());
        let parts = TestRequest::new("GET", &uri)
            .sign(access, secret)
            .expect("test sign");
        let caller =
            verify_sigv4(&parts, &hash_payload(b""), TEST_REGION, iam).expect("test verify");

        let request = match key {
            Some(key) => AccessRequest::object(&caller.access_key_id, action, key),
            None => AccessRequest::bucket(&caller.access_key_id, action),
        };
        registry.authorize("gallery", &request)
    }

    #[test]
    fn test_should_authorize_verified_callers_against_attached_policy() {
        let (_dir, iam) = internal_backend(&[ALICE, BOB]).expect("test backend");
        let registry = PolicyRegistry::new();
        registry
            .put_policy("gallery", GALLERY_POLICY.as_bytes(), &iam)
            .expect("test attach");

        let alice = (ALICE.0, ALICE.1);
        let bob = (BOB.0, BOB.1);

        let cases = [
            (bob, S3Action::GetObject, Some("public/sunset.jpg"), Decision::Allow),
            (bob, S3Action::PutObject, Some("public/sunset.jpg"), Decision::NoMatch),
            (alice, S3Action::PutObject, Some("drafts/new.jpg"), Decision::Allow),
            (alice, S3Action::ListBucket, None, Decision::Allow),
            (bob, S3Action::ListBucket, None, Decision::NoMatch),
            (alice, S3Action::DeleteObject, Some("archive/2019.jpg"), Decision::Deny),
            (bob, S3Action::GetObject, Some("archive/2019.jpg"), Decision::Deny),
        ];
        for (caller, action, key, expected) in cases {
            assert_eq!(
                authorize_signed(&registry, &iam, caller, action, key),
                expected,
                "{} {action} {key:?}",
                caller.0
            );
        }

        assert!(!Decision::NoMatch.is_allowed(false));
    }

    #[test]
    fn test_should_reject_policy_naming_unknown_account() {
        let (_dir, iam) = internal_backend(&[ALICE]).expect("test backend");
        let registry = PolicyRegistry::new();

        let err = registry
            .put_policy("gallery", GALLERY_POLICY.replace("alice", "carol").as_bytes(), &iam)
            .expect_err("test unknown principal");
        assert_eq!(err.unknown_principal(), Some("carol"));

        let api: ApiError = err.into();
        assert_eq!(api.code(), ErrorCode::MalformedPolicy);
        assert_eq!(api.status().as_u16(), 400);
        assert!(registry.get_policy("gallery").is_none());
    }

    #[test]
    fn test_should_reject_policy_for_other_bucket() {
        let (_dir, iam) = internal_backend(&[ALICE]).expect("test backend");
        let registry = PolicyRegistry::new();

        let err = registry
            .put_policy("photos", GALLERY_POLICY.as_bytes(), &iam)
            .expect_err("test bucket mismatch");
        assert!(err.is_malformed());
    }

    /// Accepts the startup bind, then loses the connection.
    #[derive(Debug)]
    struct DroppedDirectory;

    impl DirectoryConnector for DroppedDirectory {
        fn bind(&self, _: &str, _: &DirectoryCredentials) -> Result<(), DirectoryError> {
            Ok(())
        }

        fn search(&self, _: &DirectoryQuery) -> Result<Vec<DirectoryEntry>, DirectoryError> {
            Err(DirectoryError::Connection("connection refused".into()))
        }

        fn add(&self, _: DirectoryEntry) -> Result<(), DirectoryError> {
            Err(DirectoryError::Connection("connection refused".into()))
        }

        fn delete(&self, _: &str) -> Result<(), DirectoryError> {
            Err(DirectoryError::Connection("connection refused".into()))
        }
    }

    #[test]
    fn test_should_report_directory_outage_as_server_error() {
        crate::init_tracing();
        let config = IamConfig::builder()
            .ldap_url("ldap://directory.invalid:389")
            .ldap_query_base("ou=people,dc=example,dc=com")
            .ldap_object_classes("top,person")
            .ldap_access_attr("cn")
            .ldap_secret_attr("userPassword")
            .ldap_role_attr("title")
            .build();
        let iam = IamBackend::from_config(&config, Some(Arc::new(DroppedDirectory)))
            .expect("test directory backend");
        assert_eq!(iam.name(), "directory");

        let registry = PolicyRegistry::new();
        let err = registry
            .put_policy("gallery", GALLERY_POLICY.as_bytes(), &iam)
            .expect_err("test outage");
        assert!(matches!(err, PolicyError::BackendUnavailable(_)));

        let api: ApiError = err.into();
        assert_eq!(api.code(), ErrorCode::ServiceUnavailable);
        assert!(!api.is_client_error());
    }
}
