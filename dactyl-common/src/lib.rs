//! # Dactyl Common Library
//!
//! Shared code for the fingerprint capture subsystem:
//! - Database schema, initialization and row models
//! - Configuration loading and root folder resolution
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
