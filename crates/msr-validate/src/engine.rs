use chrono::NaiveDate;
use msr_reconcile::compute_bridge;
use msr_tape::{ConfirmationSet, Snapshot};
use tracing::debug;

use crate::config::ValidationConfig;
use crate::cross_period::cross_period;
use crate::field_rules::{field_level, RuleContext};
use crate::finding::{sort_findings, Finding, Severity};
use crate::result::ValidationResult;

/// Validate `current` against `prior` with default thresholds.
pub fn validate(
    prior: &Snapshot,
    current: &Snapshot,
    payoffs: &ConfirmationSet,
    new_adds: &ConfirmationSet,
    report_date: NaiveDate,
) -> ValidationResult {
    validate_with(
        &ValidationConfig::default(),
        prior,
        current,
        payoffs,
        new_adds,
        report_date,
    )
}

/// Validate `current` against `prior`.
///
/// Both snapshots are deduplicated first-seen before any comparison. The
/// inputs are never mutated and identical inputs give identical output.
pub fn validate_with(
    cfg: &ValidationConfig,
    prior: &Snapshot,
    current: &Snapshot,
    payoffs: &ConfirmationSet,
    new_adds: &ConfirmationSet,
    report_date: NaiveDate,
) -> ValidationResult {
    let p_idx = prior.index();
    let c_idx = current.index();

    let ctx = RuleContext { cfg, report_date };
    let layer1 = field_level(&c_idx, &ctx);
    let layer2 = cross_period(&p_idx, &c_idx, payoffs, new_adds, &cfg.thresholds);
    let bridge = compute_bridge(&cfg.bridge, prior, current);

    debug!(
        layer1 = layer1.len(),
        layer2 = layer2.findings.len(),
        duplicates = c_idx.duplicates.len(),
        balance_variance_micros = %bridge.balance.variance_micros,
        "validation layers complete"
    );

    let mut all: Vec<Finding> = layer1;
    all.extend(layer2.findings);
    sort_findings(&mut all);

    let (hard_stops, yellow_lights): (Vec<Finding>, Vec<Finding>) = all
        .into_iter()
        .partition(|f| f.severity == Severity::HardStop);

    let flagged: std::collections::BTreeSet<&str> = hard_stops
        .iter()
        .chain(&yellow_lights)
        .map(|f| f.loan_id.as_str())
        .collect();
    let clean_ids = c_idx
        .ids()
        .into_iter()
        .filter(|id| !flagged.contains(id))
        .map(str::to_string)
        .collect();

    ValidationResult {
        report_date,
        prior_count: p_idx.len(),
        current_count: c_idx.len(),
        submitted_count: c_idx.raw_count,
        duplicate_count: c_idx.duplicates.len(),
        continuing_count: layer2.continuing_count,
        missing: layer2.missing,
        new_loans: layer2.new_loans,
        hard_stops,
        yellow_lights,
        clean_ids,
        bridge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msr_tape::{LoanRecord, LoanStatus};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
    }

    #[test]
    fn empty_inputs_give_empty_result() {
        let e = Snapshot::empty();
        let none = ConfirmationSet::empty();
        let r = validate(&e, &e, &none, &none, date());
        assert!(r.is_acceptable());
        assert!(r.findings().is_empty());
        assert!(r.clean_ids.is_empty());
        assert!(r.bridge.ties());
    }

    #[test]
    fn clean_ids_exclude_every_flagged_loan() {
        let mut bad = LoanRecord::new("MSR2");
        bad.rate_micros = Some(6_500_000);
        let prior: Snapshot = vec![LoanRecord::new("MSR1"), LoanRecord::new("MSR2")]
            .into_iter()
            .collect();
        let current: Snapshot = vec![LoanRecord::new("MSR1"), bad, LoanRecord::new("MSR3")]
            .into_iter()
            .collect();
        let none = ConfirmationSet::empty();
        let r = validate(&prior, &current, &none, &none, date());

        assert_eq!(r.clean_ids.iter().collect::<Vec<_>>(), vec!["MSR1"]);
        assert_eq!(r.flagged_ids().into_iter().collect::<Vec<_>>(), vec!["MSR2", "MSR3"]);
        assert!(!r.is_acceptable());
        assert_eq!(r.current_count, 3);
        assert_eq!(r.continuing_count, 2);
    }

    #[test]
    fn findings_are_split_by_severity_and_sorted() {
        let mut a = LoanRecord::new("MSR9");
        a.current_upb_micros = Some(0);
        a.status = LoanStatus::Unrecognized("??".into());
        let mut b = LoanRecord::new("MSR1");
        b.net_service_fee_micros = Some(440_000);
        let current: Snapshot = vec![a, b].into_iter().collect();
        let prior = current.clone();
        let none = ConfirmationSet::empty();
        let r = validate(&prior, &current, &none, &none, date());

        assert!(r.hard_stops.iter().all(|f| f.severity == Severity::HardStop));
        assert!(r.yellow_lights.iter().all(|f| f.severity == Severity::YellowLight));
        let findings = r.findings();
        let order: Vec<&str> = findings.iter().map(|f| f.loan_id.as_str()).collect();
        assert_eq!(order, vec!["MSR1", "MSR9", "MSR9"]);

        let breakdown = r.rule_breakdown();
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].severity, Severity::HardStop);
        assert!(breakdown.iter().all(|c| c.count == 1));
    }
}
