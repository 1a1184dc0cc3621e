//! Journal entry numbers.
//!
//! Numbers look like `JE-2025-000042`: prefix, fiscal year start year, and a
//! per-school, per-fiscal-year sequence padded to six digits.

/// Formats an entry number.
#[must_use]
pub fn format_entry_number(prefix: &str, year: i32, sequence: i64) -> String {
    format!("{prefix}-{year}-{sequence:06}")
}

/// Extracts the sequence from a formatted entry number.
#[must_use]
pub fn parse_entry_sequence(number: &str) -> Option<i64> {
    number.rsplit_once('-').and_then(|(_, seq)| seq.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("JE", 2025, 42, "JE-2025-000042")]
    #[case("JE", 2024, 1, "JE-2024-000001")]
    #[case("GJ", 2025, 1_234_567, "GJ-2025-1234567")]
    fn test_format(#[case] prefix: &str, #[case] year: i32, #[case] seq: i64, #[case] expected: &str) {
        assert_eq!(format_entry_number(prefix, year, seq), expected);
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_entry_sequence("JE-2025-000042"), Some(42));
        assert_eq!(parse_entry_sequence("garbage"), None);
    }
}
