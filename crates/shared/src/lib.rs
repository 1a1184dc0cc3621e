//! Shared types, errors, and configuration for Scholaris.
//!
//! This crate provides common types used across all other crates:
//! - Minor-unit amounts for bookkeeping
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AcademicsConfig, AppConfig, LedgerConfig};
pub use error::{AppError, AppResult};
