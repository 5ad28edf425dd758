//! Payoff / new-add confirmation lists.
//!
//! A confirmation file is either one loan ID per line or a CSV whose first
//! column holds the loan ID. Any value that does not match the loan-ID
//! pattern (titles, headers, totals, blanks) is ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use msr_tape::ConfirmationSet;
use regex::Regex;
use tracing::debug;

use crate::IngestError;

/// Default loan-ID shape.
pub const DEFAULT_LOAN_ID_PATTERN: &str = r"^MSR\d+$";

/// Compiled loan-ID matcher.
#[derive(Clone, Debug)]
pub struct LoanIdPattern(Regex);

impl LoanIdPattern {
    pub fn new(pattern: &str) -> Result<Self, IngestError> {
        Ok(Self(Regex::new(pattern)?))
    }

    pub fn is_match(&self, loan_id: &str) -> bool {
        self.0.is_match(loan_id)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Collect matching first-column loan IDs from any reader. Duplicates
/// collapse. Rows that are not valid UTF-8 cannot hold a loan ID and are
/// skipped.
pub fn parse_confirmations_reader<R: Read>(
    rdr: R,
    pattern: &LoanIdPattern,
) -> Result<ConfirmationSet, IngestError> {
    let mut csv_rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let mut set = ConfirmationSet::empty();
    for row in csv_rdr.byte_records() {
        let row = row?;
        let Some(id) = row.get(0).and_then(|cell| std::str::from_utf8(cell).ok()) else {
            continue;
        };
        if pattern.is_match(id) {
            set.insert(id);
        }
    }
    Ok(set)
}

pub fn parse_confirmations_str(
    src: &str,
    pattern: &LoanIdPattern,
) -> Result<ConfirmationSet, IngestError> {
    parse_confirmations_reader(src.as_bytes(), pattern)
}

pub fn load_confirmations(
    path: &Path,
    pattern: &LoanIdPattern,
) -> Result<ConfirmationSet, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let set = parse_confirmations_reader(file, pattern)?;
    debug!(path = %path.display(), ids = set.len(), "confirmations loaded");
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_pattern() -> LoanIdPattern {
        LoanIdPattern::new(DEFAULT_LOAN_ID_PATTERN).unwrap()
    }

    #[test]
    fn keeps_only_matching_first_cells() {
        let src = "\
Payoff Confirmation - January
Loan ID,Payoff Date,Amount
MSR0001,2025-01-15,100000
\"MSR0002\",2025-01-20,5000
MSR0001,2025-01-15,100000

TOTAL,,105000
";
        let set = parse_confirmations_str(src, &default_pattern()).unwrap();
        let ids: Vec<&str> = set.iter().collect();
        assert_eq!(ids, vec!["MSR0001", "MSR0002"]);
    }

    #[test]
    fn plain_list_and_custom_pattern() {
        let pat = LoanIdPattern::new(r"^\d{6}$").unwrap();
        let set = parse_confirmations_str("123456\n  654321  \nMSR1\n12345\n", &pat).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("654321"));
    }

    #[test]
    fn quoted_cells_with_commas_and_escaped_quotes() {
        let src = "\
\"MSR0007\",\"Smith, John\",\"said \"\"paid\"\"\"
\"MSR0008, MSR0009\",x
\"Loan \"\"A\"\"\",y
MSR0010
";
        let set = parse_confirmations_str(src, &default_pattern()).unwrap();
        let ids: Vec<&str> = set.iter().collect();
        assert_eq!(ids, vec!["MSR0007", "MSR0010"]);
    }

    #[test]
    fn non_utf8_rows_are_skipped() {
        let mut src = b"MSR0001\n".to_vec();
        src.extend_from_slice(b"\xff\xfe,1\nMSR0002\n");
        let set = parse_confirmations_reader(src.as_slice(), &default_pattern()).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn bad_pattern_is_an_error() {
        assert!(matches!(
            LoanIdPattern::new("(unclosed"),
            Err(IngestError::Pattern(_))
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_confirmations(Path::new("/no/such/payoffs.csv"), &default_pattern())
            .unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
