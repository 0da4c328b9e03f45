use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

use crate::age::compute_age;
use crate::config::ColumnConfig;
use crate::error::{LoadError, RowError};
use crate::models::{DerivedRecord, StudentRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: u64,
    pub error: RowError,
}

#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub records: Vec<DerivedRecord>,
    pub skipped: Vec<SkippedRow>,
}

pub fn load(
    path: &Path,
    columns: &ColumnConfig,
    delimiter: u8,
    reference: NaiveDate,
) -> Result<LoadOutcome, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let outcome = load_from_reader(BufReader::new(file), columns, delimiter, reference)?;
    info!(
        "Loaded {} records from {} ({} rows skipped)",
        outcome.records.len(),
        path.display(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

pub fn load_from_reader<R: Read>(
    source: R,
    columns: &ColumnConfig,
    delimiter: u8,
    reference: NaiveDate,
) -> Result<LoadOutcome, LoadError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(source);
    let headers = reader.headers().map_err(LoadError::Header)?.clone();
    let layout = Layout::resolve(&headers, columns)?;
    let mut outcome = LoadOutcome::default();

    for (index, result) in reader.records().enumerate() {
        // header occupies line 1
        let fallback_line = index as u64 + 2;
        let parsed = result
            .map_err(|err| (fallback_line, RowError::Unreadable(err.to_string())))
            .and_then(|row| {
                let line = row.position().map_or(fallback_line, |pos| pos.line());
                layout
                    .parse(&headers, &row, reference)
                    .map_err(|err| (line, err))
            });

        match parsed {
            Ok(record) => outcome.records.push(record),
            Err((line, error)) => {
                warn!("Skipping line {}: {}", line, error);
                outcome.skipped.push(SkippedRow { line, error });
            }
        }
    }

    Ok(outcome)
}

/// Column positions resolved against one header row.
struct Layout {
    identifier: Column,
    score: Column,
    name: Option<usize>,
    decision: Option<usize>,
    region: Option<usize>,
    birthplace: Option<usize>,
    birthdate: Option<usize>,
}

struct Column {
    index: usize,
    name: String,
}

impl Layout {
    fn resolve(headers: &StringRecord, columns: &ColumnConfig) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|header| header.trim() == name);
        let required = |name: &str| {
            find(name)
                .map(|index| Column {
                    index,
                    name: name.to_string(),
                })
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            identifier: required(&columns.identifier)?,
            score: required(&columns.score)?,
            name: find(&columns.name),
            decision: find(&columns.decision),
            region: find(&columns.region),
            birthplace: find(&columns.birthplace),
            birthdate: find(&columns.birthdate),
        })
    }

    fn parse(
        &self,
        headers: &StringRecord,
        row: &StringRecord,
        reference: NaiveDate,
    ) -> Result<DerivedRecord, RowError> {
        let raw_identifier = cell(row, Some(self.identifier.index))
            .ok_or_else(|| RowError::MissingField(self.identifier.name.clone()))?;
        let identifier = raw_identifier
            .parse::<i64>()
            .map_err(|_| RowError::InvalidIdentifier(raw_identifier.clone()))?;

        let raw_score = cell(row, Some(self.score.index))
            .ok_or_else(|| RowError::MissingField(self.score.name.clone()))?;
        let score = raw_score
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| RowError::InvalidScore(raw_score.clone()))?;

        let birthdate = cell(row, self.birthdate);
        let age = compute_age(birthdate.as_deref(), reference);

        let attributes = headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header.trim().to_string(), value.to_string()))
            .collect();

        Ok(DerivedRecord {
            record: StudentRecord {
                identifier,
                name: cell(row, self.name),
                score,
                decision: cell(row, self.decision),
                region: cell(row, self.region),
                birthplace: cell(row, self.birthplace),
                birthdate,
                attributes,
            },
            age,
        })
    }
}

/// Trimmed cell value; blank or missing cells are absent.
fn cell(row: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Num_Bepc,NOM,Moyenne_Bepc,Decision,WILAYA,LIEU_NAISS,DATE_NAISS";

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn load_str(body: &str) -> Result<LoadOutcome, LoadError> {
        let data = format!("{HEADER}\n{body}");
        load_from_reader(data.as_bytes(), &ColumnConfig::default(), b',', reference())
    }

    #[test]
    fn parses_typed_fields_and_age() {
        let outcome =
            load_str("101,Aminetou,12.5,Admis,Nouakchott,Atar,15/03/2010\n").unwrap();
        assert!(outcome.skipped.is_empty());
        let derived = &outcome.records[0];
        assert_eq!(derived.record.identifier, 101);
        assert_eq!(derived.record.name.as_deref(), Some("Aminetou"));
        assert_eq!(derived.record.score, 12.5);
        assert!(derived.record.is_pass());
        assert_eq!(derived.record.region.as_deref(), Some("Nouakchott"));
        assert_eq!(derived.record.birthplace.as_deref(), Some("Atar"));
        assert_eq!(derived.age, Some(14));
        assert_eq!(derived.record.attributes.len(), 7);
        assert_eq!(
            derived.record.attributes[0],
            ("Num_Bepc".to_string(), "101".to_string())
        );
    }

    #[test]
    fn malformed_rows_are_skipped_and_load_continues() {
        let outcome = load_str(
            "1,A,10,Admis,R1,P1,01/01/2010\n\
             abc,B,11,Admis,R1,P1,01/01/2010\n\
             3,C,n/a,Refusé,R1,P1,01/01/2010\n\
             ,D,9,Refusé,R1,P1,01/01/2010\n\
             5,E,NaN,Refusé,R1,P1,01/01/2010\n\
             6,F,14.25,Admis,R2,P2,01/01/2010\n",
        )
        .unwrap();

        let ids: Vec<i64> = outcome.records.iter().map(|r| r.record.identifier).collect();
        assert_eq!(ids, vec![1, 6]);
        assert_eq!(outcome.skipped.len(), 4);
        assert_eq!(
            outcome.skipped[0],
            SkippedRow {
                line: 3,
                error: RowError::InvalidIdentifier("abc".to_string())
            }
        );
        assert_eq!(outcome.skipped[1].error, RowError::InvalidScore("n/a".to_string()));
        assert_eq!(
            outcome.skipped[2].error,
            RowError::MissingField("Num_Bepc".to_string())
        );
        assert_eq!(outcome.skipped[3].error, RowError::InvalidScore("NaN".to_string()));
    }

    #[test]
    fn blank_cells_and_short_rows_are_absent() {
        let outcome = load_str("7,,11.0,,  ,Kiffa,not a date\n8,G,9.5\n").unwrap();
        assert_eq!(outcome.records.len(), 2);

        let first = &outcome.records[0];
        assert_eq!(first.record.name, None);
        assert_eq!(first.record.decision, None);
        assert_eq!(first.record.region, None);
        assert_eq!(first.record.birthplace.as_deref(), Some("Kiffa"));
        assert_eq!(first.age, None);

        let short = &outcome.records[1];
        assert_eq!(short.record.region, None);
        assert_eq!(short.record.birthdate, None);
        assert_eq!(short.age, None);
    }

    #[test]
    fn values_are_trimmed_before_parsing() {
        let outcome = load_str(" 42 ,H, 13.5 ,Admis,R,P,01/06/2011\n").unwrap();
        assert_eq!(outcome.records[0].record.identifier, 42);
        assert_eq!(outcome.records[0].record.score, 13.5);
        assert_eq!(outcome.records[0].age, Some(13));
    }

    #[test]
    fn missing_required_column_aborts_load() {
        let data = "Num_Bepc,NOM,Decision\n1,A,Admis\n";
        let err = load_from_reader(
            data.as_bytes(),
            &ColumnConfig::default(),
            b',',
            reference(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref name) if name == "Moyenne_Bepc"));
    }

    #[test]
    fn custom_delimiter_and_column_names() {
        let columns = ColumnConfig {
            identifier: "id".to_string(),
            score: "moyenne".to_string(),
            ..ColumnConfig::default()
        };
        let data = "id;moyenne;Decision\n9;10.5;Admis\n";
        let outcome = load_from_reader(data.as_bytes(), &columns, b';', reference()).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].record.identifier, 9);
        assert_eq!(outcome.records[0].record.region, None);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = load(
            Path::new("does/not/exist.csv"),
            &ColumnConfig::default(),
            b',',
            reference(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }

    #[test]
    fn empty_file_yields_no_records() {
        let outcome = load_str("").unwrap();
        assert!(outcome.records.is_empty());
        assert!(outcome.skipped.is_empty());
    }
}
