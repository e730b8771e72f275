//! Gateway configuration.
//!
//! Configuration is driven by environment variables. The identity backend
//! selection is made once from [`IamConfig`] at startup and never changes for
//! the lifetime of the process.

use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Top-level configuration for the authorization core.
///
/// # Examples
///
/// ```
/// use bucketguard_core::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.region, "us-east-1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Region the gateway verifies request signatures for.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,

    /// Identity backend settings.
    #[builder(default)]
    pub iam: IamConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            region: String::from("us-east-1"),
            iam: IamConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DEFAULT_REGION` | `us-east-1` |
    ///
    /// Identity backend variables are documented on [`IamConfig::from_env`].
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_string("DEFAULT_REGION") {
            config.region = v;
        }
        config.iam = IamConfig::from_env();

        config
    }
}

/// Which identity backend a configuration selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// Embedded account store rooted at the given directory.
    Internal {
        /// Directory holding the account store.
        dir: String,
    },
    /// Directory-service (LDAP-style) adapter.
    Directory {
        /// Directory server URL.
        url: String,
    },
    /// Single-tenant fallback that resolves every access key to the root account.
    SingleTenant,
}

/// Identity backend settings.
///
/// Precedence when more than one backend is configured: `iam_dir`, then
/// `ldap_url`, then the single-tenant fallback.
#[derive(Clone, Default, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct IamConfig {
    /// Directory of the embedded account store.
    #[builder(default, setter(strip_option, into))]
    pub iam_dir: Option<String>,

    /// Directory-service URL.
    #[builder(default, setter(strip_option, into))]
    pub ldap_url: Option<String>,

    /// Bind DN used to authenticate against the directory.
    #[builder(default, setter(into))]
    pub ldap_bind_dn: String,

    /// Bind password.
    #[serde(skip_serializing, default)]
    #[builder(default, setter(into))]
    pub ldap_password: String,

    /// Search base under which account entries live.
    #[builder(default, setter(into))]
    pub ldap_query_base: String,

    /// Comma-separated object classes of account entries.
    #[builder(default, setter(into))]
    pub ldap_object_classes: String,

    /// Attribute holding the access key.
    #[builder(default, setter(into))]
    pub ldap_access_attr: String,

    /// Attribute holding the secret key.
    #[builder(default, setter(into))]
    pub ldap_secret_attr: String,

    /// Attribute holding the role.
    #[builder(default, setter(into))]
    pub ldap_role_attr: String,

    /// Root access key, used by the single-tenant backend.
    #[builder(default, setter(into))]
    pub root_access_key: String,

    /// Root secret key, used by the single-tenant backend.
    #[serde(skip_serializing, default)]
    #[builder(default, setter(into))]
    pub root_secret_key: String,
}

impl IamConfig {
    /// Load identity settings from environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `IAM_DIR` | `iam_dir` |
    /// | `LDAP_URL` | `ldap_url` |
    /// | `LDAP_BIND_DN` | `ldap_bind_dn` |
    /// | `LDAP_PASSWORD` | `ldap_password` |
    /// | `LDAP_QUERY_BASE` | `ldap_query_base` |
    /// | `LDAP_OBJECT_CLASSES` | `ldap_object_classes` |
    /// | `LDAP_ACCESS_ATTR` | `ldap_access_attr` |
    /// | `LDAP_SECRET_ATTR` | `ldap_secret_attr` |
    /// | `LDAP_ROLE_ATTR` | `ldap_role_attr` |
    /// | `ROOT_ACCESS_KEY` / `AWS_ACCESS_KEY_ID` | `root_access_key` |
    /// | `ROOT_SECRET_KEY` / `AWS_SECRET_ACCESS_KEY` | `root_secret_key` |
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            iam_dir: env_string("IAM_DIR"),
            ldap_url: env_string("LDAP_URL"),
            ldap_bind_dn: env_string("LDAP_BIND_DN").unwrap_or_default(),
            ldap_password: env_string("LDAP_PASSWORD").unwrap_or_default(),
            ldap_query_base: env_string("LDAP_QUERY_BASE").unwrap_or_default(),
            ldap_object_classes: env_string("LDAP_OBJECT_CLASSES").unwrap_or_default(),
            ldap_access_attr: env_string("LDAP_ACCESS_ATTR").unwrap_or_default(),
            ldap_secret_attr: env_string("LDAP_SECRET_ATTR").unwrap_or_default(),
            ldap_role_attr: env_string("LDAP_ROLE_ATTR").unwrap_or_default(),
            root_access_key: env_string("ROOT_ACCESS_KEY")
                .or_else(|| env_string("AWS_ACCESS_KEY_ID"))
                .unwrap_or_default(),
            root_secret_key: env_string("ROOT_SECRET_KEY")
                .or_else(|| env_string("AWS_SECRET_ACCESS_KEY"))
                .unwrap_or_default(),
        }
    }

    /// Resolve which backend these settings select.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucketguard_core::{BackendKind, IamConfig};
    ///
    /// let config = IamConfig::builder()
    ///     .iam_dir("/var/lib/iam")
    ///     .ldap_url("ldap://localhost:389")
    ///     .build();
    /// assert!(matches!(config.backend_kind(), BackendKind::Internal { .. }));
    /// ```
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        if let Some(dir) = self.iam_dir.as_deref().filter(|d| !d.is_empty()) {
            return BackendKind::Internal {
                dir: dir.to_owned(),
            };
        }
        if let Some(url) = self.ldap_url.as_deref().filter(|u| !u.is_empty()) {
            return BackendKind::Directory {
                url: url.to_owned(),
            };
        }
        BackendKind::SingleTenant
    }
}

impl fmt::Debug for IamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamConfig")
            .field("iam_dir", &self.iam_dir)
            .field("ldap_url", &self.ldap_url)
            .field("ldap_bind_dn", &self.ldap_bind_dn)
            .field("ldap_password", &"<redacted>")
            .field("ldap_query_base", &self.ldap_query_base)
            .field("ldap_object_classes", &self.ldap_object_classes)
            .field("ldap_access_attr", &self.ldap_access_attr)
            .field("ldap_secret_attr", &self.ldap_secret_attr)
            .field("ldap_role_attr", &self.ldap_role_attr)
            .field("root_access_key", &self.root_access_key)
            .field("root_secret_key", &"<redacted>")
            .finish()
    }
}

/// Read a non-empty environment variable.
fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
