//! Embedded account store.
//!
//! Accounts live in a single JSON document (`users.json`) inside the configured
//! directory. The document is loaded once when the store is opened and rewritten
//! on every mutation through a temporary file that is renamed into place. The
//! temporary file is removed when the write or rename fails.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::account::Account;
use crate::error::IamError;
use crate::service::IamService;

/// File name of the account document inside the store directory.
const STORE_FILE: &str = "users.json";

/// On-disk layout of the account document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(rename = "accessAccounts", default)]
    accounts: BTreeMap<String, Account>,
}

/// Identity backend persisted in a local directory.
///
/// # Examples
///
/// ```no_run
/// use bucketguard_iam::{IamService, InternalIam};
///
/// let iam = InternalIam::open("/var/lib/bucketguard/iam").unwrap();
/// let accounts = iam.list_accounts().unwrap();
/// ```
#[derive(Debug)]
pub struct InternalIam {
    path: PathBuf,
    accounts: RwLock<BTreeMap<String, Account>>,
}

impl InternalIam {
    /// Open (or initialize) the store in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`IamError::Unavailable`] if the directory cannot be read or
    /// created, or [`IamError::Corrupt`] if the stored document is not valid.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, IamError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|e| IamError::Unavailable(format!("create {}: {e}", dir.display())))?;

        let path = dir.join(STORE_FILE);
        let accounts = match fs::read(&path) {
            Ok(bytes) => {
                let doc: StoreDocument = serde_json::from_slice(&bytes)
                    .map_err(|e| IamError::Corrupt(format!("{}: {e}", path.display())))?;
                doc.accounts
            }
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(IamError::Unavailable(format!(
                    "read {}: {e}",
                    path.display()
                )));
            }
        };

        info!(path = %path.display(), accounts = accounts.len(), "opened embedded account store");

        Ok(Self {
            path,
            accounts: RwLock::new(accounts),
        })
    }

    /// Write the full account map back to disk.
    fn persist(&self, accounts: &BTreeMap<String, Account>) -> Result<(), IamError> {
        let doc = StoreDocument {
            accounts: accounts.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&doc)
            .map_err(|e| IamError::Corrupt(format!("serialize account store: {e}")))?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            IamError::Unavailable(format!("create temp file in {}: {e}", dir.display()))
        })?;
        tmp.write_all(&bytes)
            .map_err(|e| IamError::Unavailable(format!("write {}: {e}", tmp.path().display())))?;
        tmp.persist(&self.path)
            .map_err(|e| IamError::Unavailable(format!("replace {}: {e}", self.path.display())))?;
        Ok(())
    }
}

impl IamService for InternalIam {
    fn create_account(&self, account: Account) -> Result<(), IamError> {
        let mut accounts = self.accounts.write();
        if accounts.contains_key(&account.access) {
            return Err(IamError::DuplicateAccess(account.access));
        }

        let access = account.access.clone();
        accounts.insert(access.clone(), account);
        if let Err(e) = self.persist(&accounts) {
            accounts.remove(&access);
            return Err(e);
        }

        debug!(access = %access, "created account in embedded store");
        Ok(())
    }

    fn get_account(&self, access: &str) -> Result<Account, IamError> {
        self.accounts
            .read()
            .get(access)
            .cloned()
            .ok_or_else(|| IamError::NoSuchUser(access.to_owned()))
    }

    fn delete_account(&self, access: &str) -> Result<(), IamError> {
        let mut accounts = self.accounts.write();
        let removed = accounts
            .remove(access)
            .ok_or_else(|| IamError::NoSuchUser(access.to_owned()))?;

        if let Err(e) = self.persist(&accounts) {
            accounts.insert(access.to_owned(), removed);
            return Err(e);
        }

        debug!(access, "deleted account from embedded store");
        Ok(())
    }

    fn list_accounts(&self) -> Result<Vec<Account>, IamError> {
        Ok(self.accounts.read().values().cloned().collect())
    }
}
