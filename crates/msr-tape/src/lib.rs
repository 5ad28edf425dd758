//! msr-tape
//!
//! Loan-level data model for monthly MSR servicing tapes.
//!
//! - `LoanRecord`: one loan for one period, every field optional/typed
//! - `Snapshot`: all records for a period, duplicates preserved
//! - `ConfirmationSet`: side-channel payoff / new-add confirmations
//! - fixed-point decimal parsing and rendering (integer micros)
//!
//! No IO. Parsing from files lives in `msr-ingest`.

mod decimal;
mod snapshot;
mod types;

pub use decimal::{
    decimal_to_micros, format_fraction, format_money, format_money_wide, format_percent, parse_whole,
    MICROS_SCALE,
};
pub use snapshot::{ConfirmationSet, DuplicateOccurrence, Snapshot, SnapshotIndex};
pub use types::{Investor, LoanRecord, LoanStatus};
