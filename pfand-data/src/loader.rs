use std::io::Read;

use pfand_core::{AnchorKey, RawAnchors};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when reading an anchor file.
#[derive(Debug, Error)]
pub enum AnchorFileError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),
}

impl From<csv::Error> for AnchorFileError {
    fn from(err: csv::Error) -> Self {
        AnchorFileError::CsvParse(err.to_string())
    }
}

/// A single `key,value` line of an anchor file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnchorRecord {
    pub key: String,
    pub value: String,
}

/// Parses a German or plain decimal (`3,50`, `3.50`, ` 1560 `).
///
/// Thousands separators are not supported.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.replace(',', ".").parse::<Decimal>().ok()
}

/// Loader for anchor values from CSV files.
///
/// The file has a `key,value` header followed by one anchor per line:
///
/// ```text
/// key,value
/// start_income,1560.00
/// end_income,4766.99
/// start_amount_1,"4,89"
/// ```
///
/// Lines with unknown keys or unparsable values are skipped with a warning,
/// leaving that anchor to the statutory default. A later line for the same
/// key replaces an earlier one.
pub struct AnchorFileLoader;

impl AnchorFileLoader {
    /// Parse anchor records from a CSV reader without interpreting them.
    pub fn parse_records<R: Read>(reader: R) -> Result<Vec<AnchorRecord>, AnchorFileError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: AnchorRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Parse an anchor file into [`RawAnchors`].
    pub fn parse<R: Read>(reader: R) -> Result<RawAnchors, AnchorFileError> {
        let records = Self::parse_records(reader)?;
        let mut raw = RawAnchors::default();

        for record in &records {
            let Some(key) = AnchorKey::parse(&record.key) else {
                warn!(key = %record.key, "skipping unknown anchor key");
                continue;
            };
            let Some(value) = parse_amount(&record.value) else {
                warn!(key = %record.key, value = %record.value, "skipping unparsable anchor value");
                continue;
            };
            debug!(key = %key.name(), %value, "anchor");
            raw.set(key, value);
        }

        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use pfand_core::DEPENDENT_COLUMNS;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const TEST_CSV: &str = "key,value
start_income,1560.00
end_income,4766.99
start_income_1,2150.00
start_amount_1,4.89
";

    #[test]
    fn test_parse_records() {
        let records = AnchorFileLoader::parse_records(TEST_CSV.as_bytes()).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(
            records[0],
            AnchorRecord {
                key: "start_income".to_string(),
                value: "1560.00".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_canonical_keys() {
        let raw = AnchorFileLoader::parse(TEST_CSV.as_bytes()).unwrap();

        assert_eq!(raw.start_income, Some(dec!(1560.00)));
        assert_eq!(raw.end_income, Some(dec!(4766.99)));
        assert_eq!(raw.start_income_by_dependents[1], Some(dec!(2150.00)));
        assert_eq!(raw.start_amount_by_dependents[1], Some(dec!(4.89)));
        assert_eq!(raw.start_amount_by_dependents[0], None);
    }

    #[test]
    fn test_parse_legacy_aliases() {
        let csv = "key,value
start_pfand_0,3.50
start_1_dependent,2150
start_3_dependents,2800
";
        let raw = AnchorFileLoader::parse(csv.as_bytes()).unwrap();

        assert_eq!(raw.start_amount_by_dependents[0], Some(dec!(3.50)));
        assert_eq!(raw.start_income_by_dependents[1], Some(dec!(2150)));
        assert_eq!(raw.start_income_by_dependents[3], Some(dec!(2800)));
    }

    #[test]
    fn test_parse_decimal_comma() {
        let csv = "key,value\nstart_amount_2,\"1,49\"\n";
        let raw = AnchorFileLoader::parse(csv.as_bytes()).unwrap();

        assert_eq!(raw.start_amount_by_dependents[2], Some(dec!(1.49)));
    }

    #[test]
    fn test_parse_skips_unknown_keys_and_bad_values() {
        let csv = "key,value
start_income,abc
start_amount_9,1.00
footnote,1
end_income,
start_amount_5,0.56
";
        let raw = AnchorFileLoader::parse(csv.as_bytes()).unwrap();

        assert_eq!(raw.start_income, None);
        assert_eq!(raw.end_income, None);
        assert_eq!(raw.start_amount_by_dependents[5], Some(dec!(0.56)));
        assert_eq!(
            raw.start_amount_by_dependents
                .iter()
                .filter(|v| v.is_some())
                .count(),
            1
        );
    }

    #[test]
    fn test_parse_later_line_wins() {
        let csv = "key,value\nend_income,4000\nend_income,4766.99\n";
        let raw = AnchorFileLoader::parse(csv.as_bytes()).unwrap();

        assert_eq!(raw.end_income, Some(dec!(4766.99)));
    }

    #[test]
    fn test_parse_comments_and_whitespace() {
        let csv = "key,value
# published 2025-07-01
  start_income ,  1560.00
";
        let raw = AnchorFileLoader::parse(csv.as_bytes()).unwrap();

        assert_eq!(raw.start_income, Some(dec!(1560.00)));
    }

    #[test]
    fn test_parse_header_only_is_empty() {
        let raw = AnchorFileLoader::parse("key,value\n".as_bytes()).unwrap();

        assert!(raw.is_empty());
        assert_eq!(raw.start_income_by_dependents, [None; DEPENDENT_COLUMNS]);
    }

    #[test]
    fn test_parse_missing_column_is_error() {
        let result = AnchorFileLoader::parse("key\nstart_income\n".as_bytes());

        assert!(matches!(result, Err(AnchorFileError::CsvParse(_))));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("3,50"), Some(dec!(3.50)));
        assert_eq!(parse_amount(" 1560 "), Some(dec!(1560)));
        assert_eq!(parse_amount("-1"), Some(dec!(-1)));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("1.234,56"), None);
    }
}
