//! Class reports: subject statistics and overall student positions.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use scholaris_shared::types::StudentId;

use super::ranking::rank_positions;

/// One graded result, the input of a class report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    /// Student.
    pub student_id: StudentId,
    /// Subject name.
    pub subject: String,
    /// CA plus exam.
    pub total: Decimal,
}

/// Summary of one subject across a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectStatistics {
    /// Subject name.
    pub subject: String,
    /// Number of results.
    pub count: u32,
    /// Mean total, two decimal places.
    pub average: Decimal,
    /// Highest total.
    pub highest: Decimal,
    /// Lowest total.
    pub lowest: Decimal,
    /// Results at or above the pass mark.
    pub pass_count: u32,
}

impl SubjectStatistics {
    /// Computes statistics for a non-empty set of totals.
    #[must_use]
    pub fn from_totals(subject: &str, totals: &[Decimal], pass_mark: Decimal) -> Option<Self> {
        let highest = totals.iter().max().copied()?;
        let lowest = totals.iter().min().copied()?;
        let count = u32::try_from(totals.len()).unwrap_or(u32::MAX);
        let pass_count =
            u32::try_from(totals.iter().filter(|t| **t >= pass_mark).count()).unwrap_or(u32::MAX);
        Some(Self {
            subject: subject.to_string(),
            count,
            average: mean(totals),
            highest,
            lowest,
            pass_count,
        })
    }
}

/// A student's overall standing in the class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentStanding {
    /// Student.
    pub student_id: StudentId,
    /// Subjects with a result.
    pub subjects: u32,
    /// Sum of subject totals.
    pub total: Decimal,
    /// Mean subject total, two decimal places.
    pub average: Decimal,
    /// Competition-ranked position by average.
    pub position: u32,
}

/// Class report for one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassReport {
    /// Per-subject statistics, by subject name.
    pub subjects: Vec<SubjectStatistics>,
    /// Students ordered by position.
    pub students: Vec<StudentStanding>,
}

impl ClassReport {
    /// Builds the report from graded results.
    ///
    /// Students are ranked on their average so that a student missing one
    /// subject is not ranked on a smaller sum.
    #[must_use]
    pub fn build(rows: &[ResultRow], pass_mark: Decimal) -> Self {
        let mut by_subject: BTreeMap<&str, Vec<Decimal>> = BTreeMap::new();
        let mut by_student: BTreeMap<StudentId, Vec<Decimal>> = BTreeMap::new();
        for row in rows {
            by_subject.entry(row.subject.as_str()).or_default().push(row.total);
            by_student.entry(row.student_id).or_default().push(row.total);
        }

        let subjects = by_subject
            .iter()
            .filter_map(|(subject, totals)| SubjectStatistics::from_totals(subject, totals, pass_mark))
            .collect();

        let mut students: Vec<StudentStanding> = by_student
            .into_iter()
            .map(|(student_id, totals)| StudentStanding {
                student_id,
                subjects: u32::try_from(totals.len()).unwrap_or(u32::MAX),
                total: totals.iter().copied().sum(),
                average: mean(&totals),
                position: 0,
            })
            .collect();

        let averages: Vec<Decimal> = students.iter().map(|s| s.average).collect();
        for (student, position) in students.iter_mut().zip(rank_positions(&averages)) {
            student.position = position;
        }
        students.sort_by_key(|s| s.position);

        Self { subjects, students }
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = values.iter().copied().sum();
    (sum / Decimal::from(values.len())).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(student_id: StudentId, subject: &str, total: Decimal) -> ResultRow {
        ResultRow {
            student_id,
            subject: subject.to_string(),
            total,
        }
    }

    #[test]
    fn test_subject_statistics() {
        let stats =
            SubjectStatistics::from_totals("Mathematics", &[dec!(80), dec!(35), dec!(61)], dec!(40))
                .unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.average, dec!(58.67));
        assert_eq!(stats.highest, dec!(80));
        assert_eq!(stats.lowest, dec!(35));
        assert_eq!(stats.pass_count, 2);
    }

    #[test]
    fn test_empty_subject_has_no_statistics() {
        assert!(SubjectStatistics::from_totals("Art", &[], dec!(40)).is_none());
    }

    #[test]
    fn test_class_report_positions() {
        let ada = StudentId::new();
        let bola = StudentId::new();
        let chidi = StudentId::new();
        let rows = vec![
            row(ada, "Mathematics", dec!(90)),
            row(ada, "English", dec!(70)),
            row(bola, "Mathematics", dec!(60)),
            row(bola, "English", dec!(100)),
            row(chidi, "Mathematics", dec!(50)),
            row(chidi, "English", dec!(40)),
        ];

        let report = ClassReport::build(&rows, dec!(40));

        assert_eq!(report.subjects.len(), 2);
        assert_eq!(report.subjects[0].subject, "English");
        assert_eq!(report.students.len(), 3);
        assert_eq!(report.students[0].position, 1);
        assert_eq!(report.students[1].position, 1, "ada and bola tie on 80");
        assert_eq!(report.students[2].student_id, chidi);
        assert_eq!(report.students[2].position, 3);
        assert_eq!(report.students[2].average, dec!(45));
    }
}
