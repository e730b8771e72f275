//! Core configuration and error types for BucketGuard.
//!
//! This crate provides the building blocks shared by every BucketGuard crate:
//! the process-wide [`GatewayConfig`] (including identity backend selection)
//! and the wire-facing [`ApiError`] that domain errors convert into.

mod config;
mod error;

pub use config::{BackendKind, GatewayConfig, IamConfig};
pub use error::{ApiError, ErrorCode};
