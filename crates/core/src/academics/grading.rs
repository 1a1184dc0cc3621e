//! Grading scales.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::GradingError;

/// Lowest total that earns `grade`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeBand {
    /// Inclusive lower bound.
    pub min_total: Decimal,
    /// Letter grade.
    pub grade: String,
    /// Teacher's remark printed on report cards.
    pub remark: String,
}

impl GradeBand {
    fn new(min_total: u32, grade: &str, remark: &str) -> Self {
        Self {
            min_total: Decimal::from(min_total),
            grade: grade.to_string(),
            remark: remark.to_string(),
        }
    }
}

/// Bands sorted by descending lower bound; the last band starts at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingScale {
    bands: Vec<GradeBand>,
}

impl GradingScale {
    /// Builds a scale from bands in any order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidScale` if there are no bands, two bands share a lower
    /// bound, or no band starts at zero.
    pub fn new(mut bands: Vec<GradeBand>) -> Result<Self, GradingError> {
        if bands.is_empty() {
            return Err(GradingError::InvalidScale("no grade bands".to_string()));
        }
        bands.sort_by(|a, b| b.min_total.cmp(&a.min_total));
        if bands.windows(2).any(|w| w[0].min_total == w[1].min_total) {
            return Err(GradingError::InvalidScale(
                "duplicate lower bound".to_string(),
            ));
        }
        if bands.last().is_some_and(|b| !b.min_total.is_zero()) {
            return Err(GradingError::InvalidScale(
                "lowest band must start at 0".to_string(),
            ));
        }
        Ok(Self { bands })
    }

    /// Band for a total; totals below zero fall into the lowest band.
    #[must_use]
    pub fn band_for(&self, total: Decimal) -> &GradeBand {
        self.bands
            .iter()
            .find(|band| total >= band.min_total)
            .unwrap_or_else(|| &self.bands[self.bands.len() - 1])
    }

    /// Letter grade for a total.
    #[must_use]
    pub fn grade_for(&self, total: Decimal) -> &str {
        &self.band_for(total).grade
    }

    /// Lower bound of the lowest passing band (every band but the last).
    #[must_use]
    pub fn pass_mark(&self) -> Decimal {
        self.bands
            .iter()
            .rev()
            .nth(1)
            .map_or(Decimal::ZERO, |band| band.min_total)
    }

    /// Bands, highest first.
    #[must_use]
    pub fn bands(&self) -> &[GradeBand] {
        &self.bands
    }
}

impl Default for GradingScale {
    fn default() -> Self {
        Self {
            bands: vec![
                GradeBand::new(70, "A", "Excellent"),
                GradeBand::new(60, "B", "Very Good"),
                GradeBand::new(50, "C", "Good"),
                GradeBand::new(45, "D", "Fair"),
                GradeBand::new(40, "E", "Pass"),
                GradeBand::new(0, "F", "Fail"),
            ],
        }
    }
}
