//! # twostage-core
//!
//! Core crate for the two-stage lifecycle workspace. Contains the unified
//! error type, the result alias, and the configuration schemas shared by the
//! hook framework and its binaries.
//!
//! This crate has **no** internal dependencies on other workspace crates.

pub mod config;
pub mod error;
pub mod result;

pub use config::LifecycleConfig;
pub use error::{ErrorKind, LifecycleError};
pub use result::LifecycleResult;
