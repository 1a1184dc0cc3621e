//! Core business logic for Scholaris.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Double-entry bookkeeping logic
//! - `fiscal` - Fiscal year rules
//! - `posting` - Posting rules mapping school events to journal lines
//! - `academics` - Scores, grading scales and class rankings
//! - `teachers` - Multi-step teacher profile wizard
//! - `exams` - Question bank validation and exam paper generation
//! - `dashboard` - Dashboard statistic types

pub mod academics;
pub mod dashboard;
pub mod exams;
pub mod fiscal;
pub mod ledger;
pub mod posting;
pub mod teachers;
