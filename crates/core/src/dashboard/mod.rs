//! School dashboard types.
//!
//! This module provides types for dashboard data:
//! - Head counts
//! - Finance figures for the current fiscal year
//! - Recent journal activity

pub mod finance;
pub mod types;

pub use finance::AccountFigure;
pub use types::*;
