//! msr-testkit
//!
//! Loan fixtures for scenario tests. `LoanBuilder::clean(id)` starts from a
//! record that passes every field-level rule for a 2025-02-01 report date;
//! tests then change only the fields under test.

use chrono::NaiveDate;
use msr_tape::{decimal_to_micros, ConfirmationSet, Investor, LoanRecord, LoanStatus, Snapshot};

/// Report date the clean fixture is valid for.
pub fn report_date() -> NaiveDate {
    date(2025, 2, 1)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Decimal literal to micros; fixtures only, so bad input is a bug.
pub fn micros(s: &str) -> i64 {
    match decimal_to_micros(s) {
        Some(v) => v,
        None => panic!("bad fixture decimal: {s}"),
    }
}

#[derive(Clone, Debug)]
pub struct LoanBuilder {
    rec: LoanRecord,
}

impl LoanBuilder {
    /// Record with only a loan ID; every other field absent.
    pub fn bare(loan_id: &str) -> Self {
        Self {
            rec: LoanRecord::new(loan_id),
        }
    }

    /// FNMA, $300,000 original, $250,000 UPB, 6.5% rate, 25 bp fee,
    /// 300 months left, $1,688.00 P&I, Current, due 2025-03-01.
    pub fn clean(loan_id: &str) -> Self {
        Self::bare(loan_id)
            .investor("FNMA")
            .orig("300000")
            .upb("250000")
            .rate("0.065")
            .fee("0.0025")
            .term(300)
            .pi("1688.00")
            .status("Current")
            .due(date(2025, 3, 1))
    }

    pub fn investor(mut self, raw: &str) -> Self {
        self.rec.investor = Investor::parse(raw);
        self
    }

    pub fn loan_type(mut self, raw: &str) -> Self {
        self.rec.loan_type = Some(raw.to_string());
        self
    }

    pub fn orig(mut self, dollars: &str) -> Self {
        self.rec.original_balance_micros = Some(micros(dollars));
        self
    }

    pub fn upb(mut self, dollars: &str) -> Self {
        self.rec.current_upb_micros = Some(micros(dollars));
        self
    }

    pub fn no_upb(mut self) -> Self {
        self.rec.current_upb_micros = None;
        self
    }

    pub fn rate(mut self, fraction: &str) -> Self {
        self.rec.rate_micros = Some(micros(fraction));
        self
    }

    pub fn fee(mut self, fraction: &str) -> Self {
        self.rec.net_service_fee_micros = Some(micros(fraction));
        self
    }

    pub fn term(mut self, months: i64) -> Self {
        self.rec.remaining_term = Some(months);
        self
    }

    pub fn pi(mut self, dollars: &str) -> Self {
        self.rec.principal_interest_micros = Some(micros(dollars));
        self
    }

    pub fn status(mut self, raw: &str) -> Self {
        self.rec.status = LoanStatus::parse(raw);
        self
    }

    pub fn due(mut self, d: NaiveDate) -> Self {
        self.rec.next_due_date = Some(d);
        self
    }

    pub fn build(self) -> LoanRecord {
        self.rec
    }
}

impl From<LoanBuilder> for LoanRecord {
    fn from(b: LoanBuilder) -> Self {
        b.build()
    }
}

/// Snapshot in the given order (duplicates kept).
pub fn snapshot<I, R>(records: I) -> Snapshot
where
    I: IntoIterator<Item = R>,
    R: Into<LoanRecord>,
{
    records.into_iter().map(Into::into).collect()
}

pub fn confirmations(ids: &[&str]) -> ConfirmationSet {
    ids.iter().copied().collect()
}
