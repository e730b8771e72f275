//! Stateless S3 request utilities for BucketGuard.
//!
//! - [`checksums`]: checksum algorithm tags, declared-value validation and
//!   payload verification.
//! - [`attributes`]: `GetObjectAttributes` attribute parsing and filtering.
//! - [`params`]: pagination counters and object-ownership values.
//! - [`validation`]: bucket names, object keys, tags, metadata and
//!   `Content-MD5`.

pub mod attributes;
pub mod checksums;
pub mod error;
pub mod params;
pub mod validation;

pub use error::S3CoreError;
