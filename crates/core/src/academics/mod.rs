//! Grades and results.
//!
//! Continuous assessment and exam scores, grading scales, class positions,
//! subject statistics and the class report built from them.

pub mod error;
pub mod grading;
pub mod ranking;
pub mod report;
pub mod scores;
pub mod term;

pub use error::GradingError;
pub use grading::{GradeBand, GradingScale};
pub use ranking::rank_positions;
pub use report::{ClassReport, ResultRow, StudentStanding, SubjectStatistics};
pub use scores::{ScoreLimits, Scores};
pub use term::{AcademicSession, Term};
