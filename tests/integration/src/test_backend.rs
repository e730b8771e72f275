//! Identity backend selection from configuration.

#[cfg(test)]
mod tests {
    use bucketguard_auth::sigv4::{hash_payload, verify_sigv4};
    use bucketguard_core::{BackendKind, GatewayConfig, IamConfig};
    use bucketguard_iam::{Account, IamBackend, IamError, IamService, InternalIam, Role};

    use crate::{TestRequest, init_tracing};

    #[test]
    fn test_should_prefer_embedded_store_over_directory() {
        init_tracing();
        let dir = tempfile::tempdir().expect("test dir");
        let config = IamConfig::builder()
            .iam_dir(dir.path().to_string_lossy())
            .ldap_url("ldap://directory.invalid:389")
            .root_access_key("root")
            .root_secret_key("rootsecret")
            .build();

        assert!(matches!(config.backend_kind(), BackendKind::Internal { .. }));
        let iam = IamBackend::from_config(&config, None).expect("test backend");
        assert_eq!(iam.name(), "internal");
        assert!(matches!(iam.get_account("root"), Err(IamError::NoSuchUser(_))));
    }

    #[test]
    fn test_should_require_connector_for_directory_backend() {
        init_tracing();
        let config = IamConfig::builder()
            .ldap_url("ldap://directory.invalid:389")
            .build();

        assert!(matches!(config.backend_kind(), BackendKind::Directory { .. }));
        assert!(matches!(
            IamBackend::from_config(&config, None),
            Err(IamError::Config(_))
        ));
    }

    #[test]
    fn test_should_fall_back_to_single_tenant_and_verify_root_signature() {
        init_tracing();
        let gateway = GatewayConfig::builder()
            .iam(
                IamConfig::builder()
                    .root_access_key("root")
                    .root_secret_key("rootsecret")
                    .build(),
            )
            .build();

        let iam = IamBackend::from_config(&gateway.iam, None).expect("test backend");
        assert_eq!(iam.name(), "single-tenant");
        assert_eq!(iam.get_account("anyone").expect("test lookup").role, Role::Admin);
        assert!(matches!(
            iam.create_account(Account::new("alice", "secret", Role::User)),
            Err(IamError::NotSupported { .. })
        ));

        let parts = TestRequest::new("GET", "http://s3.local/")
            .sign("root", "rootsecret")
            .expect("test sign");
        assert!(verify_sigv4(&parts, &hash_payload(b""), &gateway.region, &iam).is_ok());
    }

    #[test]
    fn test_should_persist_accounts_across_reopen() {
        init_tracing();
        let dir = tempfile::tempdir().expect("test dir");
        {
            let iam = InternalIam::open(dir.path()).expect("test open");
            iam.create_account(Account::new("alice", "alice-secret", Role::UserPlus))
                .expect("test create");
        }

        let reopened = InternalIam::open(dir.path()).expect("test reopen");
        let alice = reopened.get_account("alice").expect("test get");
        assert_eq!(alice.role, Role::UserPlus);
        assert_eq!(alice.secret.expose(), "alice-secret");
    }
}
