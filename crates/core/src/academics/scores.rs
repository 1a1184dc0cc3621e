//! Continuous assessment and exam scores.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::GradingError;

/// Maximum marks for each component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLimits {
    /// Continuous assessment maximum.
    pub ca_max: Decimal,
    /// Exam maximum.
    pub exam_max: Decimal,
}

impl ScoreLimits {
    /// Creates limits from whole-mark maxima.
    #[must_use]
    pub fn new(ca_max: u32, exam_max: u32) -> Self {
        Self {
            ca_max: Decimal::from(ca_max),
            exam_max: Decimal::from(exam_max),
        }
    }
}

impl Default for ScoreLimits {
    fn default() -> Self {
        Self::new(40, 60)
    }
}

/// A student's scores in one subject for one term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    /// Continuous assessment.
    pub ca: Decimal,
    /// Examination.
    pub exam: Decimal,
}

impl Scores {
    /// Validates both components against `limits`.
    ///
    /// # Errors
    ///
    /// Returns `ScoreOutOfRange` for the first component outside `0..=max`.
    pub fn new(ca: Decimal, exam: Decimal, limits: &ScoreLimits) -> Result<Self, GradingError> {
        check("ca", ca, limits.ca_max)?;
        check("exam", exam, limits.exam_max)?;
        Ok(Self { ca, exam })
    }

    /// CA plus exam.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.ca + self.exam
    }
}

fn check(field: &'static str, value: Decimal, max: Decimal) -> Result<(), GradingError> {
    if value.is_sign_negative() || value > max {
        return Err(GradingError::ScoreOutOfRange { field, value, max });
    }
    Ok(())
}
