//! Exam paper generation from a question bank.
//!
//! Selection is driven by a seeded RNG: the same bank and blueprint always
//! produce the same paper, so a paper can be regenerated from its seed.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use scholaris_shared::types::QuestionId;

use super::error::ExamError;
use super::question::{Difficulty, Question, QuestionKind};

/// What the paper should contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamBlueprint {
    /// Subject to draw from.
    pub subject: String,
    /// Class level to draw from.
    pub class_level: String,
    /// Number of easy questions.
    pub easy: u32,
    /// Number of medium questions.
    pub medium: u32,
    /// Number of hard questions.
    pub hard: u32,
    /// Allowed formats; empty allows every format.
    pub kinds: Vec<QuestionKind>,
    /// Shuffle multiple choice options.
    pub shuffle_options: bool,
    /// RNG seed.
    pub seed: u64,
}

impl ExamBlueprint {
    /// Total questions requested.
    #[must_use]
    pub const fn question_count(&self) -> u32 {
        self.easy.saturating_add(self.medium).saturating_add(self.hard)
    }

    fn matches(&self, question: &Question) -> bool {
        question.subject.eq_ignore_ascii_case(&self.subject)
            && question.class_level.eq_ignore_ascii_case(&self.class_level)
            && (self.kinds.is_empty() || self.kinds.contains(&question.kind))
    }
}

/// One question on a generated paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamItem {
    /// 1-based position on the paper.
    pub position: u32,
    /// Source question.
    pub question_id: QuestionId,
    /// Difficulty of the question.
    pub difficulty: Difficulty,
    /// Options in the order printed on this paper.
    pub options: Vec<String>,
    /// Marks awarded.
    pub marks: u32,
}

/// A generated paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedExam {
    /// Questions in paper order: easy, then medium, then hard.
    pub items: Vec<ExamItem>,
    /// Sum of item marks.
    pub total_marks: u32,
}

/// Draws a paper from `bank` according to `blueprint`.
///
/// # Errors
///
/// Returns `EmptyBlueprint` if no questions are requested, or
/// `NotEnoughQuestions` if a difficulty runs short.
pub fn generate_exam(bank: &[Question], blueprint: &ExamBlueprint) -> Result<GeneratedExam, ExamError> {
    if blueprint.question_count() == 0 {
        return Err(ExamError::EmptyBlueprint);
    }

    let mut rng = StdRng::seed_from_u64(blueprint.seed);
    let mut candidates: Vec<&Question> = bank.iter().filter(|q| blueprint.matches(q)).collect();
    // Bank order depends on the query; selection must not.
    candidates.sort_by_key(|q| q.id);

    let mut items = Vec::new();
    for (difficulty, requested) in [
        (Difficulty::Easy, blueprint.easy),
        (Difficulty::Medium, blueprint.medium),
        (Difficulty::Hard, blueprint.hard),
    ] {
        if requested == 0 {
            continue;
        }
        let mut pool: Vec<&Question> = candidates
            .iter()
            .copied()
            .filter(|q| q.difficulty == difficulty)
            .collect();
        let available = u32::try_from(pool.len()).unwrap_or(u32::MAX);
        if available < requested {
            return Err(ExamError::NotEnoughQuestions {
                difficulty,
                requested,
                available,
            });
        }
        pool.shuffle(&mut rng);
        pool.truncate(requested as usize);

        for question in pool {
            let mut options = question.options.clone();
            if blueprint.shuffle_options && question.kind == QuestionKind::MultipleChoice {
                options.shuffle(&mut rng);
            }
            items.push(ExamItem {
                position: 0,
                question_id: question.id,
                difficulty,
                options,
                marks: question.marks,
            });
        }
    }

    for (index, item) in items.iter_mut().enumerate() {
        item.position = u32::try_from(index + 1).unwrap_or(u32::MAX);
    }
    let total_marks = items
        .iter()
        .fold(0u32, |total, item| total.saturating_add(item.marks));

    Ok(GeneratedExam { items, total_marks })
}
