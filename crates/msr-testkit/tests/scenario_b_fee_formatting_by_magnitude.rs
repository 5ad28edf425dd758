//! Servicing fee classification for a GNMA loan: in band, percent-formatted,
//! whole basis points.

use msr_testkit::*;
use msr_validate::{validate, Rule, Severity};

#[test]
fn gnma_fee_magnitudes_classify_exclusively() {
    let loans = [
        LoanBuilder::clean("MSR1").investor("GNMA").fee("0.0046"),
        LoanBuilder::clean("MSR2").investor("GNMA").fee("0.44"),
        LoanBuilder::clean("MSR3").investor("GNMA").fee("44"),
    ];
    let prior = snapshot(loans.clone());
    let current = snapshot(loans.map(|b| b.upb("249700").term(299)));

    let r = validate(
        &prior,
        &current,
        &confirmations(&[]),
        &confirmations(&[]),
        report_date(),
    );

    assert!(r.findings_for("MSR1").next().is_none());

    let msr2: Vec<_> = r.findings_for("MSR2").collect();
    assert_eq!(msr2.len(), 1);
    assert_eq!(msr2[0].rule, Rule::FeePercentFormatted);
    assert_eq!(msr2[0].severity, Severity::YellowLight);

    let msr3: Vec<_> = r.findings_for("MSR3").collect();
    assert_eq!(msr3.len(), 1);
    assert_eq!(msr3[0].rule, Rule::FeeWholeBasisPoints);
    assert_eq!(msr3[0].severity, Severity::HardStop);

    assert!(!r.is_acceptable());
}
