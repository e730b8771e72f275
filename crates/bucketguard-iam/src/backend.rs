//! Startup-time backend selection.

use std::sync::Arc;

use bucketguard_core::{BackendKind, IamConfig};
use tracing::info;

use crate::account::Account;
use crate::directory::{DirectoryConnector, DirectoryCredentials, DirectoryIam, DirectorySchema};
use crate::error::IamError;
use crate::internal::InternalIam;
use crate::service::IamService;
use crate::single::SingleTenantIam;

/// The identity backend active for this process.
///
/// Built once from [`IamConfig`] and then shared (usually behind an `Arc`) with
/// every component that needs identity lookups.
#[derive(Debug)]
pub enum IamBackend {
    /// Embedded account store.
    Internal(InternalIam),
    /// Directory-service adapter.
    Directory(DirectoryIam),
    /// Single-tenant fallback.
    Single(SingleTenantIam),
}

impl IamBackend {
    /// Build the backend selected by `config`.
    ///
    /// Precedence is embedded store, then directory service, then the
    /// single-tenant fallback. The directory variant needs a `connector`, which
    /// is bound with the configured credentials before use.
    ///
    /// # Errors
    ///
    /// Returns [`IamError::Config`] if the directory backend is selected without
    /// a connector or with incomplete settings, [`IamError::Unavailable`] if the
    /// directory bind fails, and any error raised while opening the embedded
    /// store.
    pub fn from_config(
        config: &IamConfig,
        connector: Option<Arc<dyn DirectoryConnector>>,
    ) -> Result<Self, IamError> {
        let backend = match config.backend_kind() {
            BackendKind::Internal { dir } => Self::Internal(InternalIam::open(&dir)?),
            BackendKind::Directory { url } => {
                let connector = connector.ok_or_else(|| {
                    IamError::Config(format!("no directory connector available for {url}"))
                })?;
                let schema = DirectorySchema::from_config(config)?;
                let credentials = DirectoryCredentials::from_config(config);
                Self::Directory(DirectoryIam::connect(
                    url,
                    schema,
                    &credentials,
                    connector,
                )?)
            }
            BackendKind::SingleTenant => Self::Single(SingleTenantIam::new(
                config.root_access_key.clone(),
                config.root_secret_key.clone(),
            )),
        };

        info!(backend = backend.name(), "selected identity backend");
        Ok(backend)
    }

    /// Short name of the active backend.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Internal(_) => "internal",
            Self::Directory(_) => "directory",
            Self::Single(_) => "single-tenant",
        }
    }

    fn inner(&self) -> &dyn IamService {
        match self {
            Self::Internal(iam) => iam,
            Self::Directory(iam) => iam,
            Self::Single(iam) => iam,
        }
    }
}

impl IamService for IamBackend {
    fn create_account(&self, account: Account) -> Result<(), IamError> {
        self.inner().create_account(account)
    }

    fn get_account(&self, access: &str) -> Result<Account, IamError> {
        self.inner().get_account(access)
    }

    fn delete_account(&self, access: &str) -> Result<(), IamError> {
        self.inner().delete_account(access)
    }

    fn list_accounts(&self) -> Result<Vec<Account>, IamError> {
        self.inner().list_accounts()
    }
}
