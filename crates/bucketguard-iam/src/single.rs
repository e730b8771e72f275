//! Single-tenant fallback backend.

use crate::account::{Account, Role, SecretKey};
use crate::error::IamError;
use crate::service::IamService;

const BACKEND_NAME: &str = "single-tenant";

/// Backend used when the gateway runs without multi-tenant identity.
///
/// Every lookup resolves to the root account, so the rest of the core can stay
/// backend-agnostic. Account management is not supported.
#[derive(Debug, Clone)]
pub struct SingleTenantIam {
    root: Account,
}

impl SingleTenantIam {
    /// Create the stub around the root credentials.
    pub fn new(root_access: impl Into<String>, root_secret: impl Into<SecretKey>) -> Self {
        Self {
            root: Account::new(root_access, root_secret, Role::Admin),
        }
    }

    /// The fixed root identity.
    #[must_use]
    pub fn root(&self) -> &Account {
        &self.root
    }
}

impl IamService for SingleTenantIam {
    fn create_account(&self, _account: Account) -> Result<(), IamError> {
        Err(IamError::NotSupported {
            backend: BACKEND_NAME,
        })
    }

    fn get_account(&self, _access: &str) -> Result<Account, IamError> {
        Ok(self.root.clone())
    }

    fn delete_account(&self, _access: &str) -> Result<(), IamError> {
        Err(IamError::NotSupported {
            backend: BACKEND_NAME,
        })
    }

    fn list_accounts(&self) -> Result<Vec<Account>, IamError> {
        Ok(vec![self.root.clone()])
    }
}
