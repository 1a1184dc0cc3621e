//! Reversing entries for posted journal entries.
//!
//! A posted entry is never edited. It is cancelled by a second entry that
//! swaps every debit and credit, linked back to the original.

use super::types::JournalLine;

/// Swaps debit and credit on every line.
///
/// Accounts and amounts are preserved and descriptions are prefixed with
/// `"Reversal: "`. The result is balanced whenever the input is.
#[must_use]
pub fn reverse_lines(lines: &[JournalLine]) -> Vec<JournalLine> {
    lines
        .iter()
        .map(|line| JournalLine {
            account_id: line.account_id,
            debit: line.credit,
            credit: line.debit,
            description: Some(match &line.description {
                Some(text) => format!("Reversal: {text}"),
                None => "Reversal".to_string(),
            }),
        })
        .collect()
}

/// Header text and lines for a reversing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalPlan {
    /// Description of the reversing entry.
    pub description: String,
    /// Reference carried over from the original entry.
    pub reference: Option<String>,
    /// Swapped lines.
    pub lines: Vec<JournalLine>,
}

/// Stateless service for creating reversing entries.
pub struct ReversalService;

impl ReversalService {
    /// Builds the reversing entry for `entry_number`.
    #[must_use]
    pub fn plan(
        entry_number: &str,
        reference: Option<&str>,
        reason: &str,
        lines: &[JournalLine],
    ) -> ReversalPlan {
        let reason = reason.trim();
        let description = if reason.is_empty() {
            format!("Reversal of {entry_number}")
        } else {
            format!("Reversal of {entry_number}. Reason: {reason}")
        };

        ReversalPlan {
            description,
            reference: reference.map(ToString::to_string),
            lines: reverse_lines(lines),
        }
    }
}
