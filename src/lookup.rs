use crate::error::QueryError;
use crate::models::{BriefView, DerivedRecord};

/// Parses a user-supplied identifier; non-numeric input is a caller error.
pub fn parse_identifier(input: &str) -> Result<i64, QueryError> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| QueryError::InvalidIdentifier(input.to_string()))
}

/// First record whose identifier equals `id`.
pub fn find_by_identifier(records: &[DerivedRecord], id: i64) -> Option<&DerivedRecord> {
    records.iter().find(|derived| derived.record.identifier == id)
}

pub fn brief(derived: &DerivedRecord) -> BriefView {
    let record = &derived.record;
    BriefView {
        name: record.name.clone().unwrap_or_else(|| "N/A".to_string()),
        score: record.score,
        decision: record.decision.clone().unwrap_or_else(|| "N/A".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::{sample, student};

    #[test]
    fn finds_existing_identifier() {
        let records = sample();
        let found = find_by_identifier(&records, 2).unwrap();
        assert_eq!(found.record.identifier, 2);
        assert_eq!(found.record.decision.as_deref(), Some("Refusé"));
    }

    #[test]
    fn unknown_identifier_is_not_found() {
        assert!(find_by_identifier(&sample(), 99).is_none());
        assert!(find_by_identifier(&[], 1).is_none());
    }

    #[test]
    fn first_match_wins_on_duplicates() {
        let mut records = sample();
        records.push(student(2, 19.0, "Admis", None, None));
        assert_eq!(find_by_identifier(&records, 2).unwrap().record.score, 8.0);
    }

    #[test]
    fn non_numeric_input_is_a_validation_error() {
        assert_eq!(parse_identifier(" 42 "), Ok(42));
        assert_eq!(
            parse_identifier("abc"),
            Err(QueryError::InvalidIdentifier("abc".to_string()))
        );
        assert!(parse_identifier("").is_err());
        assert!(parse_identifier("4.2").is_err());
    }

    #[test]
    fn brief_view_fills_missing_fields() {
        let mut derived = student(7, 11.5, "Admis", None, None);
        derived.record.name = None;
        derived.record.decision = None;

        let view = brief(&derived);
        assert_eq!(view.name, "N/A");
        assert_eq!(view.score, 11.5);
        assert_eq!(view.decision, "N/A");
    }
}
