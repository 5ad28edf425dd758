//! A repeated loan ID is one hard stop, and month-over-month checks compare
//! against the first occurrence only.

use msr_testkit::*;
use msr_validate::{validate, Rule, Severity};

#[test]
fn duplicate_is_single_hard_stop_and_first_row_wins() {
    let prior = snapshot([LoanBuilder::clean("MSR7")]);
    let current = snapshot([
        LoanBuilder::clean("MSR7").upb("249700").term(299),
        // Second row would trip the term and P&I checks if it were used.
        LoanBuilder::clean("MSR7").term(300).pi("5000"),
    ]);

    let r = validate(
        &prior,
        &current,
        &confirmations(&[]),
        &confirmations(&[]),
        report_date(),
    );

    let found: Vec<_> = r.findings_for("MSR7").collect();
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(found[0].rule, Rule::DuplicateLoanId);
    assert_eq!(found[0].severity, Severity::HardStop);

    assert_eq!(r.submitted_count, 2);
    assert_eq!(r.current_count, 1);
    assert_eq!(r.duplicate_count, 1);
    assert_eq!(r.continuing_count, 1);
}
