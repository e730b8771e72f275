//! Directory-service (LDAP-style) account adapter.
//!
//! Accounts map onto directory entries through a configurable attribute
//! schema. The wire protocol itself lives behind [`DirectoryConnector`], so the
//! adapter only deals with schema mapping and error classification.

use std::collections::BTreeMap;
use std::sync::Arc;

use bucketguard_core::IamConfig;
use tracing::{debug, warn};

use crate::account::{Account, Role, SecretKey};
use crate::error::IamError;
use crate::service::IamService;

/// Attribute name that carries an entry's object classes.
const OBJECT_CLASS_ATTR: &str = "objectClass";

/// Errors reported by a [`DirectoryConnector`].
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The distinguished name does not exist.
    #[error("no such entry: {0}")]
    NoSuchEntry(String),

    /// An entry with the distinguished name already exists.
    #[error("entry already exists: {0}")]
    EntryExists(String),

    /// Connection, bind, or protocol failure.
    #[error("directory connection failed: {0}")]
    Connection(String),
}

/// A single directory entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name.
    pub dn: String,
    /// Multi-valued attributes keyed by attribute name.
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// First value of the named attribute, if any.
    #[must_use]
    pub fn first(&self, attr: &str) -> Option<&str> {
        self.attributes
            .get(attr)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// Search request issued against the directory.
///
/// Matches entries under `base` that carry every class in `object_classes`
/// and, when `equals` is set, whose attribute equals the given value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryQuery {
    /// Search base.
    pub base: String,
    /// Required object classes.
    pub object_classes: Vec<String>,
    /// Optional `(attribute, value)` equality constraint.
    pub equals: Option<(String, String)>,
}

/// Identity the adapter binds to the directory with.
///
/// An empty `bind_dn` requests an anonymous bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryCredentials {
    /// Distinguished name to bind as.
    pub bind_dn: String,
    /// Bind password.
    pub password: SecretKey,
}

impl DirectoryCredentials {
    /// Take the bind identity from identity settings.
    #[must_use]
    pub fn from_config(config: &IamConfig) -> Self {
        Self {
            bind_dn: config.ldap_bind_dn.clone(),
            password: SecretKey::from(config.ldap_password.as_str()),
        }
    }
}

/// Transport to a directory server.
///
/// Implementations own connection handling and retries.
pub trait DirectoryConnector: Send + Sync {
    /// Authenticate against the server at `url`.
    ///
    /// Called once when the adapter is built, before any other request.
    fn bind(&self, url: &str, credentials: &DirectoryCredentials) -> Result<(), DirectoryError>;

    /// Return every entry matching the query.
    fn search(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>, DirectoryError>;

    /// Add a new entry.
    fn add(&self, entry: DirectoryEntry) -> Result<(), DirectoryError>;

    /// Delete the entry with the given distinguished name.
    fn delete(&self, dn: &str) -> Result<(), DirectoryError>;
}

/// Attribute schema that maps accounts onto directory entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySchema {
    /// Base under which account entries live.
    pub query_base: String,
    /// Object classes every account entry carries.
    pub object_classes: Vec<String>,
    /// Attribute holding the access key.
    pub access_attr: String,
    /// Attribute holding the secret key.
    pub secret_attr: String,
    /// Attribute holding the role.
    pub role_attr: String,
}

impl DirectorySchema {
    /// Build the schema from identity settings.
    ///
    /// # Errors
    ///
    /// Returns [`IamError::Config`] if any required setting is empty.
    pub fn from_config(config: &IamConfig) -> Result<Self, IamError> {
        let required = [
            ("query base", &config.ldap_query_base),
            ("access attribute", &config.ldap_access_attr),
            ("secret attribute", &config.ldap_secret_attr),
            ("role attribute", &config.ldap_role_attr),
            ("object classes", &config.ldap_object_classes),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.is_empty()) {
            return Err(IamError::Config(format!("directory {name} is not set")));
        }

        Ok(Self {
            query_base: config.ldap_query_base.clone(),
            object_classes: config
                .ldap_object_classes
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned)
                .collect(),
            access_attr: config.ldap_access_attr.clone(),
            secret_attr: config.ldap_secret_attr.clone(),
            role_attr: config.ldap_role_attr.clone(),
        })
    }

    fn dn(&self, access: &str) -> String {
        format!(
            "{}={},{}",
            self.access_attr,
            escape_dn_value(access),
            self.query_base
        )
    }

    fn query(&self, access: Option<&str>) -> DirectoryQuery {
        DirectoryQuery {
            base: self.query_base.clone(),
            object_classes: self.object_classes.clone(),
            equals: access.map(|a| (self.access_attr.clone(), a.to_owned())),
        }
    }

    fn to_entry(&self, account: &Account) -> DirectoryEntry {
        let mut attributes = BTreeMap::new();
        attributes.insert(OBJECT_CLASS_ATTR.to_owned(), self.object_classes.clone());
        attributes.insert(self.access_attr.clone(), vec![account.access.clone()]);
        attributes.insert(
            self.secret_attr.clone(),
            vec![account.secret.expose().to_owned()],
        );
        attributes.insert(self.role_attr.clone(), vec![account.role.to_string()]);
        DirectoryEntry {
            dn: self.dn(&account.access),
            attributes,
        }
    }

    fn to_account(&self, entry: &DirectoryEntry) -> Result<Account, IamError> {
        let access = entry
            .first(&self.access_attr)
            .ok_or_else(|| IamError::Corrupt(format!("{}: missing access key", entry.dn)))?;
        let secret = entry
            .first(&self.secret_attr)
            .ok_or_else(|| IamError::Corrupt(format!("{}: missing secret key", entry.dn)))?;
        let role = match entry.first(&self.role_attr) {
            Some(role) => role.parse::<Role>()?,
            None => Role::default(),
        };
        Ok(Account::new(access, secret, role))
    }
}

/// Escape an attribute value for use inside a distinguished name (RFC 4514).
fn escape_dn_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '"' | '+' | ',' | ';' | '<' | '>' | '\\' | '=' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '#' if i == 0 => escaped.push_str("\\#"),
            ' ' if i == 0 || i == last => escaped.push_str("\\ "),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Identity backend that stores accounts in a directory service.
pub struct DirectoryIam {
    url: String,
    schema: DirectorySchema,
    connector: Arc<dyn DirectoryConnector>,
}

impl std::fmt::Debug for DirectoryIam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryIam")
            .field("url", &self.url)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl DirectoryIam {
    /// Bind to the directory at `url` and create an adapter over the connector.
    ///
    /// # Errors
    ///
    /// Returns [`IamError::Unavailable`] if the bind fails.
    pub fn connect(
        url: impl Into<String>,
        schema: DirectorySchema,
        credentials: &DirectoryCredentials,
        connector: Arc<dyn DirectoryConnector>,
    ) -> Result<Self, IamError> {
        let iam = Self {
            url: url.into(),
            schema,
            connector,
        };
        iam.connector
            .bind(&iam.url, credentials)
            .map_err(|e| iam.unavailable(e))?;

        debug!(url = %iam.url, bind_dn = %credentials.bind_dn, "bound to directory");
        Ok(iam)
    }

    /// Directory server URL this adapter was configured for.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn unavailable(&self, err: DirectoryError) -> IamError {
        warn!(url = %self.url, error = %err, "directory request failed");
        IamError::Unavailable(err.to_string())
    }
}

impl IamService for DirectoryIam {
    fn create_account(&self, account: Account) -> Result<(), IamError> {
        let entry = self.schema.to_entry(&account);
        match self.connector.add(entry) {
            Ok(()) => {
                debug!(access = %account.access, "created directory account");
                Ok(())
            }
            Err(DirectoryError::EntryExists(_)) => Err(IamError::DuplicateAccess(account.access)),
            Err(e) => Err(self.unavailable(e)),
        }
    }

    fn get_account(&self, access: &str) -> Result<Account, IamError> {
        let entries = self
            .connector
            .search(&self.schema.query(Some(access)))
            .map_err(|e| self.unavailable(e))?;

        match entries.as_slice() {
            [] => Err(IamError::NoSuchUser(access.to_owned())),
            [entry] => self.schema.to_account(entry),
            _ => Err(IamError::Corrupt(format!(
                "multiple directory entries for access key {access}"
            ))),
        }
    }

    fn delete_account(&self, access: &str) -> Result<(), IamError> {
        match self.connector.delete(&self.schema.dn(access)) {
            Ok(()) => {
                debug!(access, "deleted directory account");
                Ok(())
            }
            Err(DirectoryError::NoSuchEntry(_)) => Err(IamError::NoSuchUser(access.to_owned())),
            Err(e) => Err(self.unavailable(e)),
        }
    }

    fn list_accounts(&self) -> Result<Vec<Account>, IamError> {
        let entries = self
            .connector
            .search(&self.schema.query(None))
            .map_err(|e| self.unavailable(e))?;

        let mut accounts = entries
            .iter()
            .map(|entry| self.schema.to_account(entry))
            .collect::<Result<Vec<_>, _>>()?;
        accounts.sort_by(|a, b| a.access.cmp(&b.access));
        Ok(accounts)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use parking_lot::Mutex;

    use super::*;

    /// In-memory connector that mimics a directory server.
    #[derive(Default)]
    pub(crate) struct MemoryConnector {
        entries: Mutex<BTreeMap<String, DirectoryEntry>>,
        pub(crate) offline: Mutex<bool>,
        pub(crate) bound: Mutex<Option<(String, DirectoryCredentials)>>,
        pub(crate) deleted: Mutex<Vec<String>>,
    }

    impl MemoryConnector {
        fn check_online(&self) -> Result<(), DirectoryError> {
            if *self.offline.lock() {
                return Err(DirectoryError::Connection("connection refused".into()));
            }
            Ok(())
        }
    }

    impl DirectoryConnector for MemoryConnector {
        fn bind(
            &self,
            url: &str,
            credentials: &DirectoryCredentials,
        ) -> Result<(), DirectoryError> {
            self.check_online()?;
            *self.bound.lock() = Some((url.to_owned(), credentials.clone()));
            Ok(())
        }

        fn search(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>, DirectoryError> {
            self.check_online()?;
            Ok(self
                .entries
                .lock()
                .values()
                .filter(|e| e.dn.ends_with(&query.base))
                .filter(|e| {
                    query.object_classes.iter().all(|c| {
                        e.attributes
                            .get(OBJECT_CLASS_ATTR)
                            .is_some_and(|v| v.contains(c))
                    })
                })
                .filter(|e| match &query.equals {
                    Some((attr, value)) => e.first(attr) == Some(value.as_str()),
                    None => true,
                })
                .cloned()
                .collect())
        }

        fn add(&self, entry: DirectoryEntry) -> Result<(), DirectoryError> {
            self.check_online()?;
            let mut entries = self.entries.lock();
            if entries.contains_key(&entry.dn) {
                return Err(DirectoryError::EntryExists(entry.dn));
            }
            entries.insert(entry.dn.clone(), entry);
            Ok(())
        }

        fn delete(&self, dn: &str) -> Result<(), DirectoryError> {
            self.check_online()?;
            self.deleted.lock().push(dn.to_owned());
            self.entries
                .lock()
                .remove(dn)
                .map(|_| ())
                .ok_or_else(|| DirectoryError::NoSuchEntry(dn.to_owned()))
        }
    }

    pub(crate) fn test_config() -> IamConfig {
        IamConfig::builder()
            .ldap_url("ldap://localhost:389")
            .ldap_bind_dn("cn=admin,dc=example,dc=com")
            .ldap_password("admin-password")
            .ldap_query_base("ou=accounts,dc=example,dc=com")
            .ldap_object_classes("top, gatewayAccount")
            .ldap_access_attr("cn")
            .ldap_secret_attr("userPassword")
            .ldap_role_attr("businessCategory")
            .build()
    }

    fn new_iam() -> (DirectoryIam, Arc<MemoryConnector>) {
        let connector = Arc::new(MemoryConnector::default());
        let schema = DirectorySchema::from_config(&test_config()).expect("test schema");
        let credentials = DirectoryCredentials::from_config(&test_config());
        let iam = DirectoryIam::connect(
            "ldap://localhost:389",
            schema,
            &credentials,
            connector.clone(),
        )
        .expect("test connect");
        (iam, connector)
    }

    #[test]
    fn test_should_parse_schema_from_config() {
        let schema = DirectorySchema::from_config(&test_config()).expect("test schema");
        assert_eq!(schema.object_classes, vec!["top", "gatewayAccount"]);
        assert_eq!(schema.dn("AKID"), "cn=AKID,ou=accounts,dc=example,dc=com");
    }

    #[test]
    fn test_should_escape_special_characters_in_dn() {
        let schema = DirectorySchema::from_config(&test_config()).expect("test schema");
        assert_eq!(
            schema.dn("x,ou=admins"),
            "cn=x\\,ou\\=admins,ou=accounts,dc=example,dc=com"
        );
        assert_eq!(
            schema.dn("#a+b\"<c>;d\\ "),
            "cn=\\#a\\+b\\\"\\<c\\>\\;d\\\\\\ ,ou=accounts,dc=example,dc=com"
        );
        assert_eq!(escape_dn_value(" lead"), "\\ lead");
        assert_eq!(escape_dn_value("mid#dle"), "mid#dle");
    }

    #[test]
    fn test_should_send_escaped_dn_to_connector() {
        let (iam, connector) = new_iam();
        iam.create_account(Account::new("x,ou=admins", "secret", Role::User))
            .expect("test create");

        let escaped = "cn=x\\,ou\\=admins,ou=accounts,dc=example,dc=com";
        assert!(connector.entries.lock().contains_key(escaped));

        iam.delete_account("x,ou=admins").expect("test delete");
        assert_eq!(*connector.deleted.lock(), vec![escaped.to_owned()]);
    }

    #[test]
    fn test_should_bind_with_configured_credentials() {
        let (iam, connector) = new_iam();
        assert_eq!(iam.url(), "ldap://localhost:389");

        let bound = connector.bound.lock().clone().expect("test bound");
        assert_eq!(bound.0, "ldap://localhost:389");
        assert_eq!(bound.1.bind_dn, "cn=admin,dc=example,dc=com");
        assert_eq!(bound.1.password.expose(), "admin-password");
        assert!(!format!("{:?}", bound.1).contains("admin-password"));
    }

    #[test]
    fn test_should_fail_connect_when_bind_fails() {
        let connector = Arc::new(MemoryConnector::default());
        *connector.offline.lock() = true;
        let schema = DirectorySchema::from_config(&test_config()).expect("test schema");
        let credentials = DirectoryCredentials::from_config(&test_config());

        assert!(matches!(
            DirectoryIam::connect("ldap://localhost:389", schema, &credentials, connector),
            Err(IamError::Unavailable(_))
        ));
    }

    #[test]
    fn test_should_reject_incomplete_schema() {
        let config = IamConfig::builder().ldap_url("ldap://localhost").build();
        assert!(matches!(
            DirectorySchema::from_config(&config),
            Err(IamError::Config(_))
        ));
    }

    #[test]
    fn test_should_round_trip_account_through_directory() {
        let (iam, _) = new_iam();
        iam.create_account(Account::new("AKID", "secret", Role::UserPlus))
            .expect("test create");

        let account = iam.get_account("AKID").expect("test get");
        assert_eq!(account.role, Role::UserPlus);
        assert_eq!(account.secret.expose(), "secret");

        assert!(matches!(
            iam.create_account(Account::new("AKID", "other", Role::User)),
            Err(IamError::DuplicateAccess(_))
        ));
    }

    #[test]
    fn test_should_list_accounts_sorted() {
        let (iam, _) = new_iam();
        for access in ["zeta", "alpha", "mid"] {
            iam.create_account(Account::new(access, "s", Role::User))
                .expect("test create");
        }
        let listed: Vec<String> = iam
            .list_accounts()
            .expect("test list")
            .into_iter()
            .map(|a| a.access)
            .collect();
        assert_eq!(listed, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_should_map_missing_entries_to_no_such_user() {
        let (iam, _) = new_iam();
        assert!(matches!(iam.get_account("ghost"), Err(IamError::NoSuchUser(_))));
        assert!(matches!(
            iam.delete_account("ghost"),
            Err(IamError::NoSuchUser(_))
        ));
    }

    #[test]
    fn test_should_report_connector_failure_as_unavailable() {
        let (iam, connector) = new_iam();
        *connector.offline.lock() = true;
        assert!(matches!(
            iam.get_account("AKID"),
            Err(IamError::Unavailable(_))
        ));
        assert!(matches!(iam.list_accounts(), Err(IamError::Unavailable(_))));
    }
}
