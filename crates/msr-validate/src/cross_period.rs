//! Layer 2: checks that need the prior snapshot or the confirmation lists.

use msr_tape::{
    format_fraction, format_money, format_money_wide, ConfirmationSet, LoanRecord, LoanStatus,
    SnapshotIndex, MICROS_SCALE,
};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::Thresholds;
use crate::finding::{Evidence, Finding, Rule};

/// Loans on the prior tape that are absent from the current one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MissingPartition {
    /// Listed on the payoff confirmation.
    pub explained: BTreeSet<String>,
    /// Not confirmed; each one is a hard stop.
    pub unexplained: BTreeSet<String>,
}

impl MissingPartition {
    pub fn len(&self) -> usize {
        self.explained.len() + self.unexplained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> BTreeSet<&str> {
        self.explained
            .iter()
            .chain(&self.unexplained)
            .map(String::as_str)
            .collect()
    }
}

/// Loans on the current tape that were absent from the prior one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NewLoanPartition {
    /// Listed on the new-add confirmation.
    pub confirmed: BTreeSet<String>,
    /// Not confirmed; each one is a yellow light.
    pub unconfirmed: BTreeSet<String>,
}

impl NewLoanPartition {
    pub fn len(&self) -> usize {
        self.confirmed.len() + self.unconfirmed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> BTreeSet<&str> {
        self.confirmed
            .iter()
            .chain(&self.unconfirmed)
            .map(String::as_str)
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct CrossPeriodOutcome {
    pub findings: Vec<Finding>,
    pub missing: MissingPartition,
    pub new_loans: NewLoanPartition,
    pub continuing_count: usize,
}

/// Run Layer 2 over deduplicated prior and current snapshots.
pub fn cross_period(
    prior: &SnapshotIndex<'_>,
    current: &SnapshotIndex<'_>,
    payoffs: &ConfirmationSet,
    new_adds: &ConfirmationSet,
    thresholds: &Thresholds,
) -> CrossPeriodOutcome {
    let mut out = CrossPeriodOutcome::default();

    // ----- Missing loans -----
    for (&id, &p) in &prior.by_id {
        if current.contains(id) {
            continue;
        }
        if payoffs.contains(id) {
            out.missing.explained.insert(id.to_string());
            continue;
        }
        out.missing.unexplained.insert(id.to_string());
        out.findings.push(Finding::new(
            Rule::MissingLoan,
            id,
            p.investor.label(),
            Evidence::new(
                "Not present",
                "Present, or listed on the payoff confirmation",
                format!(
                    "Loan was on the prior tape with UPB {} and is neither on the current tape nor confirmed paid off.",
                    p.current_upb_micros.map(format_money).unwrap_or_else(|| "unknown".into())
                ),
            ),
        ));
    }

    // ----- New loans -----
    for (&id, &c) in &current.by_id {
        if prior.contains(id) {
            continue;
        }
        if new_adds.contains(id) {
            out.new_loans.confirmed.insert(id.to_string());
            continue;
        }
        out.new_loans.unconfirmed.insert(id.to_string());
        out.findings.push(Finding::new(
            Rule::UnboardedLoan,
            id,
            c.investor.label(),
            Evidence::new(
                "New this period",
                "Listed on the new-add confirmation",
                "Loan appears for the first time but was not confirmed as a new add.",
            ),
        ));
    }

    // ----- Continuing loans -----
    for (&id, &c) in &current.by_id {
        let Some(p) = prior.get(id) else {
            continue;
        };
        out.continuing_count += 1;
        out.findings.extend(check_continuing(p, c, thresholds));
    }

    out
}

/// Month-over-month checks for one loan present in both periods.
pub fn check_continuing(prior: &LoanRecord, current: &LoanRecord, t: &Thresholds) -> Vec<Finding> {
    let mut out = Vec::new();
    let finding = |rule: Rule, ev: Evidence| {
        Finding::new(rule, current.loan_id.as_str(), current.investor.label(), ev)
    };

    // Unrecognized statuses sit in the Current bucket for this comparison.
    let from = prior.status.ordinal().unwrap_or(0);
    let to = current.status.ordinal().unwrap_or(0);
    let jump = to - from;
    if jump >= t.status_skip_buckets {
        out.push(finding(
            Rule::StatusBucketSkip,
            Evidence::new(
                format!("{} -> {}", prior.status.label(), current.status.label()),
                format!("At most {} bucket(s) of deterioration per month", t.status_skip_buckets - 1),
                format!("Status moved {jump} buckets in one period."),
            ),
        ));
    }

    if prior.status == LoanStatus::Current {
        if let (Some(p), Some(c)) = (prior.remaining_term, current.remaining_term) {
            if c >= p {
                out.push(finding(
                    Rule::RemainingTermNotDecreased,
                    Evidence::new(
                        c.to_string(),
                        format!("< {p}"),
                        "Remaining term should fall each month for a loan that was Current.",
                    ),
                ));
            }
        }
    }

    if let (Some(p), Some(c)) = (prior.rate_micros, current.rate_micros) {
        let plausible = p < t.rate_max_micros && c < t.rate_max_micros;
        if plausible && (i128::from(c) - i128::from(p)).abs() > i128::from(t.rate_change_epsilon_micros) {
            out.push(finding(
                Rule::RateChanged,
                Evidence::new(
                    format_fraction(c, 4),
                    format_fraction(p, 4),
                    "Note rate changed between periods; confirm an ARM reset or modification.",
                ),
            ));
        }
    }

    if let (Some(p), Some(c)) = (prior.principal_interest_micros, current.principal_interest_micros) {
        let ceiling = MICROS_SCALE.saturating_add(t.payment_inflation_micros);
        if (c as i128) * (MICROS_SCALE as i128) > (p as i128) * (ceiling as i128) {
            out.push(finding(
                Rule::PaymentInflated,
                Evidence::new(
                    format_money(c),
                    format!(
                        "<= {} (prior {})",
                        format_money_wide(p as i128 * ceiling as i128 / MICROS_SCALE as i128),
                        format_money(p)
                    ),
                    "P&I rose by more than the allowed margin; possible escrow or fees included.",
                ),
            ));
        }
    }

    out
}
