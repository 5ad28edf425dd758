//! CSV tape loader.
//!
//! ## Column contract (case- and punctuation-insensitive, order-independent)
//!
//! | Field              | Accepted headers                                      |
//! |--------------------|-------------------------------------------------------|
//! | loan ID (required) | `loan_id`, `Loan ID`                                  |
//! | loan type          | `loan_type`                                           |
//! | investor           | `investor`                                            |
//! | original balance   | `orig_bal`, `original_balance`, `Orig Bal ($)`        |
//! | current UPB        | `upb`, `current_upb`, `Current UPB ($)`               |
//! | note rate          | `rate`                                                |
//! | servicing fee      | `nsf`, `net_service_fee`, `Net Serv Fee`              |
//! | remaining term     | `rem_term`, `remaining_term`                          |
//! | P&I                | `pi`, `principal_interest_payment`, `P&I ($)`         |
//! | escrow             | `escrow`, `escrow_payment`                            |
//! | total payment      | `total_pmt`, `total_payment`                          |
//! | status             | `status`                                              |
//! | next due date      | `ndd`, `next_due_date`                                |
//!
//! Rows above the header (titles, disclaimers) are skipped. Reading stops at
//! the first row with an empty loan ID or one starting with `TOTAL`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use msr_tape::{decimal_to_micros, parse_whole, Investor, LoanRecord, LoanStatus, Snapshot};
use tracing::debug;

use crate::IngestError;

/// How many leading rows may precede the header.
pub const HEADER_SCAN_ROWS: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Column {
    LoanId,
    LoanType,
    Investor,
    OriginalBalance,
    CurrentUpb,
    Rate,
    NetServiceFee,
    RemainingTerm,
    PrincipalInterest,
    Escrow,
    TotalPayment,
    Status,
    NextDueDate,
}

/// Normalized header -> column. Headers are normalized by lower-casing and
/// dropping everything that is not a letter or digit.
const ALIASES: &[(&str, Column)] = &[
    ("loanid", Column::LoanId),
    ("loantype", Column::LoanType),
    ("investor", Column::Investor),
    ("origbal", Column::OriginalBalance),
    ("originalbalance", Column::OriginalBalance),
    ("upb", Column::CurrentUpb),
    ("currentupb", Column::CurrentUpb),
    ("rate", Column::Rate),
    ("noterate", Column::Rate),
    ("nsf", Column::NetServiceFee),
    ("netservicefee", Column::NetServiceFee),
    ("netservfee", Column::NetServiceFee),
    ("remterm", Column::RemainingTerm),
    ("remainingterm", Column::RemainingTerm),
    ("pi", Column::PrincipalInterest),
    ("principalinterestpayment", Column::PrincipalInterest),
    ("escrow", Column::Escrow),
    ("escrowpayment", Column::Escrow),
    ("totalpmt", Column::TotalPayment),
    ("totalpayment", Column::TotalPayment),
    ("status", Column::Status),
    ("ndd", Column::NextDueDate),
    ("nextduedate", Column::NextDueDate),
];

fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn column_for(raw: &str) -> Option<Column> {
    let key = normalize_header(raw);
    ALIASES.iter().find(|(a, _)| *a == key).map(|(_, c)| *c)
}

/// Position of each known column in the header row. First match wins when a
/// header repeats.
struct ColumnIndex {
    slots: Vec<(Column, usize)>,
}

impl ColumnIndex {
    fn from_header(header: &csv::StringRecord) -> Option<Self> {
        let mut slots: Vec<(Column, usize)> = Vec::new();
        for (i, cell) in header.iter().enumerate() {
            if let Some(col) = column_for(cell) {
                if !slots.iter().any(|(c, _)| *c == col) {
                    slots.push((col, i));
                }
            }
        }
        slots
            .iter()
            .any(|(c, _)| *c == Column::LoanId)
            .then_some(Self { slots })
    }

    fn get<'r>(&self, row: &'r csv::StringRecord, col: Column) -> Option<&'r str> {
        let (_, i) = self.slots.iter().find(|(c, _)| *c == col)?;
        row.get(*i).map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Date cell: `YYYY-MM-DD` or `MM/DD/YYYY`. A trailing time part (as
/// spreadsheet exports write it) is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().split([' ', 'T']).next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%m/%d/%Y"))
        .ok()
}

fn is_end_marker(loan_id: &str) -> bool {
    loan_id.is_empty() || loan_id.to_ascii_uppercase().starts_with("TOTAL")
}

fn build_record(cols: &ColumnIndex, row: &csv::StringRecord, loan_id: &str) -> LoanRecord {
    let money = |c: Column| cols.get(row, c).and_then(decimal_to_micros);
    LoanRecord {
        loan_id: loan_id.to_string(),
        investor: cols
            .get(row, Column::Investor)
            .map(Investor::parse)
            .unwrap_or_default(),
        loan_type: cols.get(row, Column::LoanType).map(str::to_string),
        original_balance_micros: money(Column::OriginalBalance),
        current_upb_micros: money(Column::CurrentUpb),
        rate_micros: money(Column::Rate),
        net_service_fee_micros: money(Column::NetServiceFee),
        remaining_term: cols.get(row, Column::RemainingTerm).and_then(parse_whole),
        principal_interest_micros: money(Column::PrincipalInterest),
        escrow_micros: money(Column::Escrow),
        total_payment_micros: money(Column::TotalPayment),
        status: LoanStatus::parse(cols.get(row, Column::Status).unwrap_or("")),
        next_due_date: cols.get(row, Column::NextDueDate).and_then(parse_date),
    }
}

/// Parse a tape from any reader. Row order is preserved, duplicates included.
pub fn parse_tape_reader<R: Read>(rdr: R) -> Result<Snapshot, IngestError> {
    let mut csv_rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(rdr);

    let mut columns: Option<ColumnIndex> = None;
    let mut scanned = 0usize;
    let mut records = Vec::new();

    for row in csv_rdr.records() {
        let row = row?;
        if columns.is_none() {
            scanned += 1;
            columns = ColumnIndex::from_header(&row);
            if columns.is_none() && scanned >= HEADER_SCAN_ROWS {
                return Err(IngestError::MissingHeader { scanned });
            }
            continue;
        }
        let Some(cols) = columns.as_ref() else {
            continue;
        };

        let loan_id = cols.get(&row, Column::LoanId).unwrap_or("");
        if is_end_marker(loan_id) {
            break;
        }
        records.push(build_record(cols, &row, loan_id));
    }

    if columns.is_none() {
        // Fewer rows than the scan window and still no header. An entirely
        // empty input is an empty tape.
        if scanned == 0 {
            return Ok(Snapshot::empty());
        }
        return Err(IngestError::MissingHeader { scanned });
    }

    debug!(rows = records.len(), "tape parsed");
    Ok(Snapshot::new(records))
}

pub fn parse_tape_str(src: &str) -> Result<Snapshot, IngestError> {
    parse_tape_reader(src.as_bytes())
}

pub fn load_tape(path: &Path) -> Result<Snapshot, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tape_reader(file)
}
