//! Identity backends for BucketGuard.
//!
//! Every consumer depends on the [`IamService`] capability only. Three
//! implementations are provided and one is chosen at startup by
//! [`IamBackend::from_config`]:
//!
//! - [`InternalIam`]: embedded JSON account store in a local directory.
//! - [`DirectoryIam`]: directory-service adapter over a [`DirectoryConnector`].
//! - [`SingleTenantIam`]: resolves every access key to the root account.
//!
//! [`StaticIam`] is an in-memory implementation for tests and development.

mod account;
mod backend;
mod directory;
mod error;
mod internal;
mod service;
mod single;

pub use account::{Account, Role, SecretKey};
pub use backend::IamBackend;
pub use directory::{
    DirectoryConnector, DirectoryCredentials, DirectoryEntry, DirectoryError, DirectoryIam,
    DirectoryQuery, DirectorySchema,
};
pub use error::IamError;
pub use internal::InternalIam;
pub use service::{IamService, StaticIam};
pub use single::SingleTenantIam;
