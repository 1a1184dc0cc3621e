//! Question bank entries.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use scholaris_shared::types::QuestionId;

use super::error::ExamError;

/// Most marks a single question may carry.
pub const MAX_MARKS: u32 = 100;

/// Question format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Pick one of several options.
    MultipleChoice,
    /// True or false.
    TrueFalse,
    /// A word or short phrase.
    ShortAnswer,
    /// Free text, marked by hand.
    Essay,
}

impl QuestionKind {
    /// Snake-case name used in storage and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::ShortAnswer => "short_answer",
            Self::Essay => "essay",
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(Self::MultipleChoice),
            "true_false" => Ok(Self::TrueFalse),
            "short_answer" => Ok(Self::ShortAnswer),
            "essay" => Ok(Self::Essay),
            _ => Err(format!("Unknown question kind: {s}")),
        }
    }
}

/// Question difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Easy.
    Easy,
    /// Medium.
    Medium,
    /// Hard.
    Hard,
}

impl Difficulty {
    /// Lowercase name used in storage and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(format!("Unknown difficulty: {s}")),
        }
    }
}

/// A question in a school's bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier.
    pub id: QuestionId,
    /// Subject, e.g. "Mathematics".
    pub subject: String,
    /// Class level, e.g. "JSS2".
    pub class_level: String,
    /// Optional topic within the subject.
    pub topic: Option<String>,
    /// Format.
    pub kind: QuestionKind,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Question text.
    pub body: String,
    /// Options for multiple choice.
    pub options: Vec<String>,
    /// Correct answer, or a marking guide for essays.
    pub answer: Option<String>,
    /// Marks awarded.
    pub marks: u32,
}

impl Question {
    /// Validates the question for its kind.
    pub fn validate(&self) -> Result<(), ExamError> {
        if self.subject.trim().is_empty() {
            return Err(ExamError::invalid("subject", "is required"));
        }
        if self.class_level.trim().is_empty() {
            return Err(ExamError::invalid("class_level", "is required"));
        }
        if self.body.trim().is_empty() {
            return Err(ExamError::invalid("body", "is required"));
        }
        if self.marks == 0 {
            return Err(ExamError::invalid("marks", "must be greater than zero"));
        }
        if self.marks > MAX_MARKS {
            return Err(ExamError::invalid("marks", "must be at most 100"));
        }

        let answer = self.answer.as_deref().map(str::trim).unwrap_or_default();
        match self.kind {
            QuestionKind::MultipleChoice => {
                if self.options.len() < 2 {
                    return Err(ExamError::invalid("options", "at least two options are required"));
                }
                let mut seen = HashSet::new();
                if !self.options.iter().all(|o| seen.insert(o.trim())) {
                    return Err(ExamError::invalid("options", "options must be distinct"));
                }
                if !self.options.iter().any(|o| o.trim() == answer) {
                    return Err(ExamError::invalid("answer", "must be one of the options"));
                }
            }
            QuestionKind::TrueFalse => {
                if !matches!(answer.to_lowercase().as_str(), "true" | "false") {
                    return Err(ExamError::invalid("answer", "must be true or false"));
                }
            }
            QuestionKind::ShortAnswer => {
                if answer.is_empty() {
                    return Err(ExamError::invalid("answer", "is required"));
                }
            }
            QuestionKind::Essay => {}
        }
        Ok(())
    }
}
