//! Running the engine twice over the same inputs yields byte-identical
//! serialized output, including finding order.

use chrono::NaiveDate;
use msr_tape::{ConfirmationSet, Investor, LoanRecord, LoanStatus, Snapshot};
use msr_validate::*;

fn messy_tape(seed: i64) -> Snapshot {
    (0..40)
        .map(|i| {
            let mut r = LoanRecord::new(format!("MSR{:03}", (i * 7 + seed) % 37));
            r.investor = match i % 4 {
                0 => Investor::Fnma,
                1 => Investor::Fhlmc,
                2 => Investor::Gnma,
                _ => Investor::Portfolio,
            };
            r.current_upb_micros = Some((i % 5) * 50_000_000_000);
            r.original_balance_micros = Some(150_000_000_000);
            r.rate_micros = Some(if i % 6 == 0 { 6_250_000 } else { 60_000 + i * 10 });
            r.net_service_fee_micros = Some([2_500, 440_000, 44_000_000, 500, 6_000][(i % 5) as usize]);
            r.remaining_term = Some(300 - seed);
            r.principal_interest_micros = Some(1_000_000_000 + seed * 60_000_000);
            r.status = LoanStatus::RECOGNIZED[(i % 5) as usize].clone();
            r
        })
        .collect()
}

#[test]
fn two_runs_serialize_identically() {
    let prior = messy_tape(0);
    let current = messy_tape(3);
    let payoffs: ConfirmationSet = ["MSR001", "MSR002"].into_iter().collect();
    let adds: ConfirmationSet = ["MSR036"].into_iter().collect();
    let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();

    let a = validate(&prior, &current, &payoffs, &adds, date);
    let b = validate(&prior, &current, &payoffs, &adds, date);

    let ja = serde_json::to_vec_pretty(&a).unwrap();
    let jb = serde_json::to_vec_pretty(&b).unwrap();
    assert_eq!(ja, jb);
    assert!(!a.findings().is_empty());

    // Output order is the documented sort, not discovery order.
    let mut sorted = a.findings();
    sort_findings(&mut sorted);
    assert_eq!(sorted, a.findings());
    let keys: Vec<(&str, &str)> = a
        .hard_stops
        .iter()
        .map(|f| (f.loan_id.as_str(), f.rule.name()))
        .collect();
    let mut expect = keys.clone();
    expect.sort();
    assert_eq!(keys, expect);
}

#[test]
fn inputs_are_not_mutated() {
    let prior = messy_tape(1);
    let current = messy_tape(2);
    let before = (prior.clone(), current.clone());
    let none = ConfirmationSet::empty();
    let _ = validate(&prior, &current, &none, &none, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    assert_eq!((prior, current), before);
}
