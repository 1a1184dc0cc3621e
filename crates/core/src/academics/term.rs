//! Academic calendar identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::GradingError;

/// School term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    /// First term.
    First,
    /// Second term.
    Second,
    /// Third term.
    Third,
}

impl Term {
    /// Lowercase name used in storage and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
            Self::Third => "third",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Term {
    type Err = GradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" | "1" => Ok(Self::First),
            "second" | "2" => Ok(Self::Second),
            "third" | "3" => Ok(Self::Third),
            _ => Err(GradingError::InvalidTerm(s.to_string())),
        }
    }
}

/// Academic session such as `2024/2025`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcademicSession {
    start_year: i32,
}

impl AcademicSession {
    /// Session starting in `start_year`.
    #[must_use]
    pub const fn starting(start_year: i32) -> Self {
        Self { start_year }
    }

    /// First calendar year of the session.
    #[must_use]
    pub const fn start_year(&self) -> i32 {
        self.start_year
    }
}

impl fmt::Display for AcademicSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start_year, self.start_year + 1)
    }
}

impl FromStr for AcademicSession {
    type Err = GradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GradingError::InvalidSession(s.to_string());
        let (first, second) = s.trim().split_once('/').ok_or_else(invalid)?;
        if first.len() != 4 || second.len() != 4 {
            return Err(invalid());
        }
        let start: i32 = first.parse().map_err(|_| invalid())?;
        let end: i32 = second.parse().map_err(|_| invalid())?;
        if end != start + 1 {
            return Err(invalid());
        }
        Ok(Self::starting(start))
    }
}

impl TryFrom<String> for AcademicSession {
    type Error = GradingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AcademicSession> for String {
    fn from(value: AcademicSession) -> Self {
        value.to_string()
    }
}
