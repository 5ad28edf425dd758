use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Loan status
// ---------------------------------------------------------------------------

/// Delinquency status as submitted on the tape.
///
/// Unrecognized text is valid input: it is kept verbatim so the validator
/// can report exactly what was submitted.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    Current,
    Dpd30,
    Dpd60,
    Dpd90Plus,
    PaidInFull,
    Unrecognized(String),
}

impl LoanStatus {
    /// All recognized statuses in bucket order.
    pub const RECOGNIZED: [LoanStatus; 5] = [
        LoanStatus::Current,
        LoanStatus::Dpd30,
        LoanStatus::Dpd60,
        LoanStatus::Dpd90Plus,
        LoanStatus::PaidInFull,
    ];

    /// Parse a tape status cell.
    ///
    /// An empty cell is `Current`, matching how servicers leave the column
    /// blank for performing loans.
    pub fn parse(raw: &str) -> Self {
        let t = raw.trim();
        let key: String = t
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "" | "current" => LoanStatus::Current,
            "30dpd" | "30late" | "30" => LoanStatus::Dpd30,
            "60dpd" | "60late" | "60" => LoanStatus::Dpd60,
            "90+dpd" | "90pluslate" | "90+late" | "90plusdpd" | "90+" => LoanStatus::Dpd90Plus,
            "paidinfull" | "pif" => LoanStatus::PaidInFull,
            _ => LoanStatus::Unrecognized(t.to_string()),
        }
    }

    /// Bucket ordinal: Current=0 .. PaidInFull=4. `None` for unrecognized.
    pub fn ordinal(&self) -> Option<i32> {
        match self {
            LoanStatus::Current => Some(0),
            LoanStatus::Dpd30 => Some(1),
            LoanStatus::Dpd60 => Some(2),
            LoanStatus::Dpd90Plus => Some(3),
            LoanStatus::PaidInFull => Some(4),
            LoanStatus::Unrecognized(_) => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.ordinal().is_some()
    }

    /// Canonical tape label.
    pub fn label(&self) -> &str {
        match self {
            LoanStatus::Current => "Current",
            LoanStatus::Dpd30 => "30 DPD",
            LoanStatus::Dpd60 => "60 DPD",
            LoanStatus::Dpd90Plus => "90+ DPD",
            LoanStatus::PaidInFull => "Paid in Full",
            LoanStatus::Unrecognized(s) => s.as_str(),
        }
    }
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Current
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Investor
// ---------------------------------------------------------------------------

/// Investor category. Agency-A/B/C map to FNMA/FHLMC/GNMA.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Investor {
    Fnma,
    Fhlmc,
    Gnma,
    Portfolio,
    Other(String),
}

impl Investor {
    pub fn parse(raw: &str) -> Self {
        let t = raw.trim();
        match t.to_ascii_uppercase().as_str() {
            "FNMA" => Investor::Fnma,
            "FHLMC" => Investor::Fhlmc,
            "GNMA" => Investor::Gnma,
            "PORTFOLIO" => Investor::Portfolio,
            _ => Investor::Other(t.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Investor::Fnma => "FNMA",
            Investor::Fhlmc => "FHLMC",
            Investor::Gnma => "GNMA",
            Investor::Portfolio => "Portfolio",
            Investor::Other(s) => s.as_str(),
        }
    }
}

impl Default for Investor {
    fn default() -> Self {
        Investor::Other(String::new())
    }
}

impl fmt::Display for Investor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Loan record
// ---------------------------------------------------------------------------

/// One loan's fields for one reporting period.
///
/// Nothing here is trusted. Every numeric field is optional: `None` means
/// the cell was absent or unparseable, which is distinct from zero.
/// Money, rate and fee values are integer micros (see [`crate::MICROS_SCALE`]).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub loan_id: String,
    pub investor: Investor,
    pub loan_type: Option<String>,
    pub original_balance_micros: Option<i64>,
    pub current_upb_micros: Option<i64>,
    /// Note rate as a decimal fraction in micros (6.5% = 65_000).
    pub rate_micros: Option<i64>,
    /// Net servicing fee as a decimal fraction in micros (25bps = 2_500).
    pub net_service_fee_micros: Option<i64>,
    /// Remaining term in months.
    pub remaining_term: Option<i64>,
    pub principal_interest_micros: Option<i64>,
    pub escrow_micros: Option<i64>,
    pub total_payment_micros: Option<i64>,
    pub status: LoanStatus,
    pub next_due_date: Option<NaiveDate>,
}

impl LoanRecord {
    pub fn new(loan_id: impl Into<String>) -> Self {
        Self {
            loan_id: loan_id.into(),
            ..Self::default()
        }
    }
}
