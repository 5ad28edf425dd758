//! A loan ID submitted twice yields one duplicate hard stop, and every other
//! check (field-level and cross-period) sees only the first occurrence.

use chrono::NaiveDate;
use msr_tape::{ConfirmationSet, LoanRecord, LoanStatus, Snapshot};
use msr_validate::*;

fn current_loan(upb: i64, term: i64) -> LoanRecord {
    let mut r = LoanRecord::new("MSR7");
    r.status = LoanStatus::Current;
    r.current_upb_micros = Some(upb);
    r.remaining_term = Some(term);
    r
}

#[test]
fn duplicate_reported_once_and_second_row_ignored() {
    let prior = Snapshot::new(vec![current_loan(100_000_000_000, 300)]);
    // Second row would trip both "UPB = Zero" and "term did not decrease".
    let current = Snapshot::new(vec![
        current_loan(99_500_000_000, 299),
        current_loan(0, 300),
    ]);
    let none = ConfirmationSet::empty();
    let r = validate(
        &prior,
        &current,
        &none,
        &none,
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
    );

    assert_eq!(r.hard_stops.len(), 1);
    let dup = &r.hard_stops[0];
    assert_eq!(dup.rule, Rule::DuplicateLoanId);
    assert_eq!(dup.loan_id, "MSR7");
    assert!(dup.submitted.contains("row 2"));
    assert!(r.yellow_lights.is_empty());

    assert_eq!(r.submitted_count, 2);
    assert_eq!(r.current_count, 1);
    assert_eq!(r.duplicate_count, 1);
    assert_eq!(r.continuing_count, 1);
    assert!(r.clean_ids.is_empty());
}

#[test]
fn each_repeat_gets_its_own_finding() {
    let current = Snapshot::new(vec![
        LoanRecord::new("MSR1"),
        LoanRecord::new("MSR1"),
        LoanRecord::new("MSR1"),
    ]);
    let none = ConfirmationSet::empty();
    let r = validate(
        &current,
        &current,
        &none,
        &none,
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
    );
    let dups: Vec<&str> = r
        .hard_stops
        .iter()
        .filter(|f| f.rule == Rule::DuplicateLoanId)
        .map(|f| f.submitted.as_str())
        .collect();
    assert_eq!(dups, vec!["occurrence 2 (row 2)", "occurrence 3 (row 3)"]);
}
