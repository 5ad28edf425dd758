//! Layer 1: field-level checks on a single record.
//!
//! Rules are arranged in groups. Within a group the first matching rule
//! wins, so a record never gets two findings for the same underlying
//! problem (e.g. a fee of 44 is "whole basis points", not also "out of
//! range"). Groups are independent of one another.

use chrono::NaiveDate;
use msr_tape::{
    format_fraction, format_money, format_money_wide, format_percent, LoanRecord, LoanStatus,
    SnapshotIndex, MICROS_SCALE,
};

use crate::config::ValidationConfig;
use crate::finding::{Evidence, Finding, Rule};

/// Inputs a field rule may consult besides the record itself.
#[derive(Clone, Copy, Debug)]
pub struct RuleContext<'c> {
    pub cfg: &'c ValidationConfig,
    pub report_date: NaiveDate,
}

type Check = fn(&LoanRecord, &RuleContext<'_>) -> Option<Evidence>;

/// One named predicate.
#[derive(Clone, Copy)]
pub struct FieldRule {
    pub rule: Rule,
    check: Check,
}

/// Mutually exclusive rules over one concern; first match wins.
#[derive(Clone, Copy)]
pub struct RuleGroup {
    pub name: &'static str,
    pub rules: &'static [FieldRule],
}

/// Evaluation order of Layer 1.
pub const FIELD_RULE_GROUPS: &[RuleGroup] = &[
    RuleGroup {
        name: "upb_zero",
        rules: &[FieldRule { rule: Rule::UpbZeroActiveLoan, check: upb_zero }],
    },
    RuleGroup {
        name: "upb_vs_original",
        rules: &[FieldRule { rule: Rule::UpbExceedsOriginalBalance, check: upb_over_original }],
    },
    RuleGroup {
        name: "rate",
        rules: &[
            FieldRule { rule: Rule::RateWholeNumber, check: rate_whole_number },
            FieldRule { rule: Rule::RateUnrealisticallyLow, check: rate_low },
        ],
    },
    RuleGroup {
        name: "servicing_fee",
        rules: &[
            FieldRule { rule: Rule::FeeWholeBasisPoints, check: fee_whole_bps },
            FieldRule { rule: Rule::FeePercentFormatted, check: fee_percent },
            FieldRule { rule: Rule::FeeSuspiciouslyLow, check: fee_low },
            FieldRule { rule: Rule::FeeOutOfInvestorRange, check: fee_out_of_band },
        ],
    },
    RuleGroup {
        name: "next_due_date",
        rules: &[FieldRule { rule: Rule::DueDateInPast, check: due_date_past }],
    },
    RuleGroup {
        name: "status",
        rules: &[FieldRule { rule: Rule::InvalidStatus, check: invalid_status }],
    },
    RuleGroup {
        name: "payment",
        rules: &[FieldRule { rule: Rule::PaymentAboveAmortized, check: payment_above_amortized }],
    },
];

/// Run every rule group against one record.
pub fn check_record(rec: &LoanRecord, ctx: &RuleContext<'_>) -> Vec<Finding> {
    FIELD_RULE_GROUPS
        .iter()
        .filter_map(|group| {
            group.rules.iter().find_map(|r| {
                (r.check)(rec, ctx)
                    .map(|ev| Finding::new(r.rule, rec.loan_id.as_str(), rec.investor.label(), ev))
            })
        })
        .collect()
}

/// Layer 1 over a whole snapshot: field rules on the first occurrence of
/// each loan ID, plus one duplicate finding per repeat occurrence.
pub fn field_level(index: &SnapshotIndex<'_>, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let mut out = per_record(index, ctx);

    for dup in &index.duplicates {
        let investor = index
            .get(&dup.loan_id)
            .map(|r| r.investor.label().to_string())
            .unwrap_or_default();
        out.push(Finding::new(
            Rule::DuplicateLoanId,
            dup.loan_id.as_str(),
            investor,
            Evidence::new(
                format!("occurrence {} (row {})", dup.occurrence, dup.position + 1),
                "Each Loan ID appears exactly once",
                format!(
                    "Loan ID {} appears more than once; row {} is used for validation.",
                    dup.loan_id,
                    dup.first_position + 1
                ),
            ),
        ));
    }
    out
}

#[cfg(not(feature = "parallel"))]
fn per_record(index: &SnapshotIndex<'_>, ctx: &RuleContext<'_>) -> Vec<Finding> {
    index.records().flat_map(|r| check_record(r, ctx)).collect()
}

#[cfg(feature = "parallel")]
fn per_record(index: &SnapshotIndex<'_>, ctx: &RuleContext<'_>) -> Vec<Finding> {
    use rayon::prelude::*;
    let records: Vec<&LoanRecord> = index.records().collect();
    records
        .par_iter()
        .flat_map_iter(|r| check_record(r, ctx))
        .collect()
}

// ----- UPB -----

fn upb_zero(rec: &LoanRecord, _ctx: &RuleContext<'_>) -> Option<Evidence> {
    let upb = rec.current_upb_micros?;
    if upb != 0 || rec.status == LoanStatus::PaidInFull {
        return None;
    }
    Some(Evidence::new(
        format_money(upb),
        "> $0.00 (or status Paid in Full)",
        "Active loan submitted with zero UPB; either the balance or the status is wrong.",
    ))
}

fn upb_over_original(rec: &LoanRecord, ctx: &RuleContext<'_>) -> Option<Evidence> {
    let upb = rec.current_upb_micros?;
    let orig = rec.original_balance_micros?;
    let allowance = MICROS_SCALE.saturating_add(ctx.cfg.thresholds.upb_over_original_micros);
    if (upb as i128) * (MICROS_SCALE as i128) <= (orig as i128) * (allowance as i128) {
        return None;
    }
    Some(Evidence::new(
        format_money(upb),
        format!("<= {} (Orig Bal)", format_money(orig)),
        "Current UPB is higher than the original balance; check for a transposition or a non-amortizing product.",
    ))
}

// ----- Rate -----

fn rate_whole_number(rec: &LoanRecord, ctx: &RuleContext<'_>) -> Option<Evidence> {
    let rate = rec.rate_micros?;
    let max = ctx.cfg.thresholds.rate_max_micros;
    if rate <= max {
        return None;
    }
    Some(Evidence::new(
        format_fraction(rate, 4),
        format!("<= {} as a decimal (e.g. 0.0650 for 6.50%)", format_fraction(max, 4)),
        format!(
            "Rate of {} looks like a whole-number percent; expected {}.",
            format_fraction(rate, 4),
            format_fraction(rate / 100, 4)
        ),
    ))
}

fn rate_low(rec: &LoanRecord, ctx: &RuleContext<'_>) -> Option<Evidence> {
    let rate = rec.rate_micros?;
    let min = ctx.cfg.thresholds.rate_min_micros;
    if rate >= min {
        return None;
    }
    Some(Evidence::new(
        format_percent(rate),
        format!(">= {}", format_percent(min)),
        "Note rate is below any plausible market rate; check units and source.",
    ))
}

// ----- Servicing fee -----

fn fee_whole_bps(rec: &LoanRecord, ctx: &RuleContext<'_>) -> Option<Evidence> {
    let fee = rec.net_service_fee_micros?;
    if fee <= ctx.cfg.thresholds.fee_whole_bps_micros {
        return None;
    }
    Some(Evidence::new(
        format_fraction(fee, 4),
        "Decimal fraction (e.g. 0.0025 for 25 bps)",
        format!(
            "Fee of {} looks like whole basis points; expected {}.",
            format_fraction(fee, 4),
            format_fraction(fee / 10_000, 4)
        ),
    ))
}

fn fee_percent(rec: &LoanRecord, ctx: &RuleContext<'_>) -> Option<Evidence> {
    let fee = rec.net_service_fee_micros?;
    if fee <= ctx.cfg.thresholds.fee_percent_micros {
        return None;
    }
    Some(Evidence::new(
        format_fraction(fee, 4),
        "Decimal fraction (e.g. 0.0025 for 25 bps)",
        format!(
            "Fee of {} may be a percent; as a fraction it would be {}.",
            format_fraction(fee, 4),
            format_fraction(fee / 100, 4)
        ),
    ))
}

fn fee_low(rec: &LoanRecord, ctx: &RuleContext<'_>) -> Option<Evidence> {
    let fee = rec.net_service_fee_micros?;
    let floor = ctx.cfg.thresholds.fee_low_micros;
    if fee <= 0 || fee >= floor {
        return None;
    }
    Some(Evidence::new(
        format_fraction(fee, 4),
        format!(">= {}", format_fraction(floor, 4)),
        "Servicing fee is below the minimum plausible strip.",
    ))
}

fn fee_out_of_band(rec: &LoanRecord, ctx: &RuleContext<'_>) -> Option<Evidence> {
    let fee = rec.net_service_fee_micros?;
    let t = &ctx.cfg.thresholds;
    // Band applies only inside the plausible decimal range.
    if fee < t.fee_low_micros || fee > t.fee_percent_micros {
        return None;
    }
    let band = ctx.cfg.band_for(&rec.investor)?;
    if band.contains(fee) {
        return None;
    }
    Some(Evidence::new(
        format_fraction(fee, 4),
        format!(
            "{} to {}",
            format_fraction(band.min_micros, 4),
            format_fraction(band.max_micros, 4)
        ),
        format!(
            "Fee is outside the configured range for {}.",
            rec.investor.label()
        ),
    ))
}

// ----- Next due date -----

fn due_date_past(rec: &LoanRecord, ctx: &RuleContext<'_>) -> Option<Evidence> {
    let ndd = rec.next_due_date?;
    if rec.status != LoanStatus::Current || ndd >= ctx.report_date {
        return None;
    }
    Some(Evidence::new(
        ndd.format("%Y-%m-%d").to_string(),
        format!(">= {} for a Current loan", ctx.report_date.format("%Y-%m-%d")),
        "Loan is reported Current but its next due date is before the report date.",
    ))
}

// ----- Status -----

fn invalid_status(rec: &LoanRecord, _ctx: &RuleContext<'_>) -> Option<Evidence> {
    let LoanStatus::Unrecognized(raw) = &rec.status else {
        return None;
    };
    let allowed: Vec<&str> = LoanStatus::RECOGNIZED.iter().map(LoanStatus::label).collect();
    Some(Evidence::new(
        raw.as_str(),
        format!("One of: {}", allowed.join(", ")),
        format!("Status '{raw}' is not in the recognized vocabulary."),
    ))
}

// ----- Payment (opt-in) -----

/// Level monthly payment that fully amortizes `upb` over `term` months at
/// annual `rate`. Returns micros; `None` when inputs cannot produce one.
pub fn amortized_payment_micros(upb_micros: i64, rate_micros: i64, term: i64) -> Option<i64> {
    if upb_micros <= 0 || rate_micros < 0 || term <= 0 {
        return None;
    }
    let upb = upb_micros as f64 / MICROS_SCALE as f64;
    let r = rate_micros as f64 / MICROS_SCALE as f64 / 12.0;
    let n = term as f64;
    let pmt = if r == 0.0 {
        upb / n
    } else {
        let growth = (1.0 + r).powf(n);
        upb * r * growth / (growth - 1.0)
    };
    pmt.is_finite()
        .then(|| (pmt * MICROS_SCALE as f64).round() as i64)
}

fn payment_above_amortized(rec: &LoanRecord, ctx: &RuleContext<'_>) -> Option<Evidence> {
    let check = &ctx.cfg.payment_check;
    if !check.enabled {
        return None;
    }
    // Only meaningful when the rate itself is plausible.
    let rate = rec.rate_micros.filter(|r| *r <= ctx.cfg.thresholds.rate_max_micros)?;
    let pi = rec.principal_interest_micros?;
    let expected = amortized_payment_micros(rec.current_upb_micros?, rate, rec.remaining_term?)?;
    let ceiling = MICROS_SCALE.saturating_add(check.tolerance_micros);
    if (pi as i128) * (MICROS_SCALE as i128) <= (expected as i128) * (ceiling as i128) {
        return None;
    }
    Some(Evidence::new(
        format_money(pi),
        format!(
            "<= {} (amortized {} + {})",
            format_money_wide(expected as i128 * ceiling as i128 / MICROS_SCALE as i128),
            format_money(expected),
            format_percent(check.tolerance_micros)
        ),
        "P&I is well above the level payment implied by UPB, rate and remaining term.",
    ))
}
