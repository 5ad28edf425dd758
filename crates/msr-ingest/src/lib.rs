//! msr-ingest
//!
//! File readers feeding the validation engine:
//! - servicing tapes from CSV (header aliases, preamble rows, TOTAL row stop)
//! - payoff / new-add confirmation lists (loan-ID pattern filter)
//!
//! Structural problems (unreadable file, no loan-ID column) are errors.
//! Unparseable cells load as absent fields so the engine can skip only the
//! checks that need them.

mod confirmations;
mod error;
mod tape;

pub use confirmations::{
    load_confirmations, parse_confirmations_reader, parse_confirmations_str, LoanIdPattern,
    DEFAULT_LOAN_ID_PATTERN,
};
pub use error::IngestError;
pub use tape::{load_tape, parse_date, parse_tape_reader, parse_tape_str, HEADER_SCAN_ROWS};
