use std::collections::BTreeMap;

use msr_tape::{LoanRecord, LoanStatus, Snapshot, SnapshotIndex};

use crate::{
    BalanceBridge, BridgeConfig, BridgeReport, BucketMigration, CountBridge, CurtailmentCandidate,
    DelinquencyMigration, InvestorMixRow, StatusChange, OTHER_BUCKET,
};

/// UPB as i128: sums and differences of parseable balances cannot overflow.
fn upb_or_zero(rec: &LoanRecord) -> i128 {
    i128::from(rec.current_upb_micros.unwrap_or(0))
}

fn total_upb<'r>(records: impl Iterator<Item = &'r LoanRecord>) -> i128 {
    records.map(upb_or_zero).sum()
}

fn bucket_label(status: &LoanStatus) -> &str {
    if status.is_recognized() {
        status.label()
    } else {
        OTHER_BUCKET
    }
}

fn count_buckets(idx: &SnapshotIndex<'_>) -> BTreeMap<String, usize> {
    let mut out: BTreeMap<String, usize> = BTreeMap::new();
    for rec in idx.records() {
        *out.entry(bucket_label(&rec.status).to_string()).or_insert(0) += 1;
    }
    out
}

fn migration(prior: &SnapshotIndex<'_>, current: &SnapshotIndex<'_>) -> DelinquencyMigration {
    let p = count_buckets(prior);
    let c = count_buckets(current);

    let recognized = LoanStatus::RECOGNIZED;
    let labels = recognized
        .iter()
        .map(|s| s.label().to_string())
        .chain(std::iter::once(OTHER_BUCKET.to_string()));

    let buckets = labels
        .map(|bucket| {
            let prior_count = p.get(&bucket).copied().unwrap_or(0);
            let current_count = c.get(&bucket).copied().unwrap_or(0);
            BucketMigration {
                delta: current_count as i64 - prior_count as i64,
                bucket,
                prior_count,
                current_count,
            }
        })
        .collect();

    DelinquencyMigration { buckets }
}

fn investor_mix(prior: &SnapshotIndex<'_>, current: &SnapshotIndex<'_>) -> Vec<InvestorMixRow> {
    let mut rows: BTreeMap<String, InvestorMixRow> = BTreeMap::new();
    let row_for = |inv: &str| InvestorMixRow {
        investor: inv.to_string(),
        prior_count: 0,
        prior_upb_micros: 0,
        current_count: 0,
        current_upb_micros: 0,
    };

    for rec in prior.records() {
        let key = investor_key(rec);
        let row = rows.entry(key.clone()).or_insert_with(|| row_for(&key));
        row.prior_count += 1;
        row.prior_upb_micros += upb_or_zero(rec);
    }
    for rec in current.records() {
        let key = investor_key(rec);
        let row = rows.entry(key.clone()).or_insert_with(|| row_for(&key));
        row.current_count += 1;
        row.current_upb_micros += upb_or_zero(rec);
    }

    rows.into_values().collect()
}

fn investor_key(rec: &LoanRecord) -> String {
    let label = rec.investor.label();
    if label.is_empty() {
        "Unknown".to_string()
    } else {
        label.to_string()
    }
}

/// Curtailment candidates among continuing loans that are Current this
/// period and carry a UPB on both tapes.
///
/// Returns the candidates and the average decrease across the pool.
fn curtailments(
    cfg: &BridgeConfig,
    continuing: &[(&LoanRecord, &LoanRecord)],
) -> (Vec<CurtailmentCandidate>, i128) {
    let pool: Vec<(&LoanRecord, i64, i64)> = continuing
        .iter()
        .filter(|(_, c)| c.status == LoanStatus::Current)
        .filter_map(|(p, c)| match (p.current_upb_micros, c.current_upb_micros) {
            (Some(pu), Some(cu)) => Some((*c, pu, cu)),
            _ => None,
        })
        .collect();

    let n = pool.len() as i128;
    let total_decrease: i128 = pool
        .iter()
        .map(|(_, pu, cu)| (i128::from(*pu) - i128::from(*cu)).max(0))
        .sum();

    if n == 0 || total_decrease == 0 {
        return (Vec::new(), 0);
    }

    let average = total_decrease / n;
    let multiple = i128::from(cfg.curtailment_multiple_micros);

    let out = pool
        .into_iter()
        .filter_map(|(rec, pu, cu)| {
            let decrease = i128::from(pu) - i128::from(cu);
            // decrease > multiple x (total / n), cross-multiplied.
            let is_candidate = decrease > 0
                && decrease
                    .saturating_mul(n)
                    .saturating_mul(i128::from(msr_tape::MICROS_SCALE))
                    > multiple.saturating_mul(total_decrease);
            is_candidate.then(|| CurtailmentCandidate {
                loan_id: rec.loan_id.clone(),
                prior_upb_micros: pu,
                current_upb_micros: cu,
                decrease_micros: decrease,
                extra_payment_micros: decrease - average,
            })
        })
        .collect();

    (out, average)
}

/// Compute count and balance bridges, delinquency migration and the
/// curtailment heuristic for two snapshots.
///
/// Deterministic: every collection in the report is in loan-ID (or
/// bucket / investor label) order.
pub fn compute_bridge(cfg: &BridgeConfig, prior: &Snapshot, current: &Snapshot) -> BridgeReport {
    let p_idx = prior.index();
    let c_idx = current.index();

    let mut missing: Vec<&LoanRecord> = Vec::new();
    let mut continuing: Vec<(&LoanRecord, &LoanRecord)> = Vec::new();
    for (&id, &p) in &p_idx.by_id {
        match c_idx.get(id) {
            Some(c) => continuing.push((p, c)),
            None => missing.push(p),
        }
    }
    let new_adds: Vec<&LoanRecord> = c_idx
        .records()
        .filter(|c| !p_idx.contains(&c.loan_id))
        .collect();

    // --- Count bridge ---
    let computed_count = p_idx.len() as i64 + new_adds.len() as i64 - missing.len() as i64;
    let count = CountBridge {
        prior_count: p_idx.len(),
        new_count: new_adds.len(),
        missing_count: missing.len(),
        continuing_count: continuing.len(),
        current_count: c_idx.len(),
        computed_count,
        variance: computed_count - c_idx.len() as i64,
    };

    // --- Continuing-loan deltas, split by sign ---
    let mut decreases: i128 = 0;
    let mut capitalizations: i128 = 0;
    for (p, c) in &continuing {
        let delta = upb_or_zero(c) - upb_or_zero(p);
        if delta < 0 {
            decreases += -delta;
        } else {
            capitalizations += delta;
        }
    }

    let (curtailment_candidates, average_decrease) = curtailments(cfg, &continuing);
    let curtailed: i128 = curtailment_candidates
        .iter()
        .map(|c| c.extra_payment_micros)
        .sum();

    // --- Balance bridge ---
    let prior_total = total_upb(prior.records.iter());
    let current_total = total_upb(current.records.iter());
    let payoff_upb = total_upb(missing.iter().copied());
    let new_add_upb = total_upb(new_adds.iter().copied());
    let scheduled = decreases - curtailed;

    let computed = prior_total - scheduled - curtailed + capitalizations - payoff_upb + new_add_upb;
    let balance = BalanceBridge {
        prior_total_upb_micros: prior_total,
        scheduled_amortization_micros: scheduled,
        curtailments_micros: curtailed,
        capitalizations_micros: capitalizations,
        payoff_upb_micros: payoff_upb,
        new_add_upb_micros: new_add_upb,
        computed_ending_upb_micros: computed,
        current_total_upb_micros: current_total,
        variance_micros: computed - current_total,
        tolerance_micros: cfg.balance_tolerance_micros,
    };

    let status_changes = continuing
        .iter()
        .filter(|(p, c)| p.status != c.status)
        .map(|(p, c)| StatusChange {
            loan_id: c.loan_id.clone(),
            from: p.status.clone(),
            to: c.status.clone(),
            current_upb_micros: c.current_upb_micros,
        })
        .collect();

    BridgeReport {
        count,
        balance,
        migration: migration(&p_idx, &c_idx),
        status_changes,
        investor_mix: investor_mix(&p_idx, &c_idx),
        curtailments: curtailment_candidates,
        average_decrease_micros: average_decrease,
        unknown_upb_prior: prior
            .records
            .iter()
            .filter(|r| r.current_upb_micros.is_none())
            .count(),
        unknown_upb_current: current
            .records
            .iter()
            .filter(|r| r.current_upb_micros.is_none())
            .count(),
    }
}

/// [`compute_bridge`] with default tolerance and curtailment multiple.
pub fn bridge(prior: &Snapshot, current: &Snapshot) -> BridgeReport {
    compute_bridge(&BridgeConfig::default(), prior, current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use msr_tape::Investor;

    const D: i64 = 1_000_000;
    const W: i128 = 1_000_000;

    fn loan(id: &str, upb: i64, status: LoanStatus) -> LoanRecord {
        LoanRecord {
            investor: Investor::Fnma,
            current_upb_micros: Some(upb * D),
            status,
            ..LoanRecord::new(id)
        }
    }

    fn current(id: &str, upb: i64) -> LoanRecord {
        loan(id, upb, LoanStatus::Current)
    }

    #[test]
    fn empty_snapshots_tie() {
        let r = bridge(&Snapshot::empty(), &Snapshot::empty());
        assert!(r.ties());
        assert_eq!(r.count.computed_count, 0);
        assert_eq!(r.balance.variance_micros, 0);
        assert!(r.curtailments.is_empty());
    }

    #[test]
    fn roll_forward_components() {
        let prior = Snapshot::new(vec![
            current("MSR1", 1_000),
            current("MSR2", 2_000),
            current("MSR3", 3_000),
        ]);
        let cur = Snapshot::new(vec![
            current("MSR2", 1_990),
            current("MSR3", 3_050),
            current("MSR4", 500),
        ]);

        let r = bridge(&prior, &cur);
        assert_eq!(r.count.prior_count, 3);
        assert_eq!(r.count.new_count, 1);
        assert_eq!(r.count.missing_count, 1);
        assert_eq!(r.count.continuing_count, 2);
        assert!(r.count.ties());

        let b = &r.balance;
        assert_eq!(b.prior_total_upb_micros, 6_000 * W);
        assert_eq!(b.payoff_upb_micros, 1_000 * W);
        assert_eq!(b.new_add_upb_micros, 500 * W);
        assert_eq!(b.scheduled_amortization_micros + b.curtailments_micros, 10 * W);
        assert_eq!(b.capitalizations_micros, 50 * W);
        assert_eq!(b.computed_ending_upb_micros, 5_540 * W);
        assert_eq!(b.current_total_upb_micros, 5_540 * W);
        assert!(b.ties());
    }

    #[test]
    fn duplicate_rows_show_up_as_balance_variance() {
        let prior = Snapshot::new(vec![current("MSR1", 1_000)]);
        let cur = Snapshot::new(vec![current("MSR1", 990), current("MSR1", 990)]);

        let r = bridge(&prior, &cur);
        assert!(r.count.ties());
        assert_eq!(r.balance.current_total_upb_micros, 1_980 * W);
        assert_eq!(r.balance.computed_ending_upb_micros, 990 * W);
        assert_eq!(r.balance.variance_micros, -990 * W);
        assert!(!r.balance.ties());
    }

    #[test]
    fn tolerance_is_strict() {
        let b = BalanceBridge {
            prior_total_upb_micros: 0,
            scheduled_amortization_micros: 0,
            curtailments_micros: 0,
            capitalizations_micros: 0,
            payoff_upb_micros: 0,
            new_add_upb_micros: 0,
            computed_ending_upb_micros: 0,
            current_total_upb_micros: 0,
            variance_micros: 999_999,
            tolerance_micros: 1_000_000,
        };
        assert!(b.ties());
        let b = BalanceBridge {
            variance_micros: -1_000_000,
            ..b
        };
        assert!(!b.ties());
    }

    #[test]
    fn curtailment_flags_outsized_decrease() {
        // Four loans amortize by 100, one pays down 1_000.
        // Average decrease = 1_400 / 5 = 280; 2.5x = 700.
        let prior = Snapshot::new(vec![
            current("MSR1", 10_000),
            current("MSR2", 10_000),
            current("MSR3", 10_000),
            current("MSR4", 10_000),
            current("MSR5", 10_000),
        ]);
        let cur = Snapshot::new(vec![
            current("MSR1", 9_900),
            current("MSR2", 9_900),
            current("MSR3", 9_900),
            current("MSR4", 9_900),
            current("MSR5", 9_000),
        ]);

        let r = bridge(&prior, &cur);
        assert_eq!(r.average_decrease_micros, 280 * W);
        assert_eq!(r.curtailments.len(), 1);
        let c = &r.curtailments[0];
        assert_eq!(c.loan_id, "MSR5");
        assert_eq!(c.decrease_micros, 1_000 * W);
        assert_eq!(c.extra_payment_micros, 720 * W);

        assert_eq!(r.balance.curtailments_micros, 720 * W);
        assert_eq!(r.balance.scheduled_amortization_micros, 680 * W);
        assert!(r.balance.ties());
    }

    #[test]
    fn curtailment_ignores_delinquent_and_unknown_upb() {
        let prior = Snapshot::new(vec![
            current("MSR1", 10_000),
            current("MSR2", 10_000),
            loan("MSR3", 10_000, LoanStatus::Current),
        ]);
        let mut no_upb = current("MSR2", 0);
        no_upb.current_upb_micros = None;
        let cur = Snapshot::new(vec![
            current("MSR1", 9_900),
            no_upb,
            loan("MSR3", 1_000, LoanStatus::Dpd30),
        ]);

        let r = bridge(&prior, &cur);
        assert!(r.curtailments.is_empty());
        assert_eq!(r.unknown_upb_current, 1);
        assert!(r.balance.ties());
    }

    #[test]
    fn migration_counts_and_status_changes() {
        let prior = Snapshot::new(vec![
            current("MSR1", 100),
            current("MSR2", 100),
            loan("MSR3", 100, LoanStatus::Dpd30),
        ]);
        let cur = Snapshot::new(vec![
            loan("MSR1", 100, LoanStatus::Dpd30),
            current("MSR2", 100),
            loan("MSR3", 100, LoanStatus::Unrecognized("REO".to_string())),
        ]);

        let r = bridge(&prior, &cur);
        let labels: Vec<&str> = r.migration.buckets.iter().map(|b| b.bucket.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Current", "30 DPD", "60 DPD", "90+ DPD", "Paid in Full", "Other"]
        );
        let curr = r.migration.bucket("Current").unwrap();
        assert_eq!((curr.prior_count, curr.current_count, curr.delta), (2, 1, -1));
        assert_eq!(r.migration.bucket("Other").unwrap().current_count, 1);

        let changed: Vec<&str> = r.status_changes.iter().map(|s| s.loan_id.as_str()).collect();
        assert_eq!(changed, vec!["MSR1", "MSR3"]);
        assert_eq!(r.status_changes[0].from, LoanStatus::Current);
        assert_eq!(r.status_changes[0].to, LoanStatus::Dpd30);
    }

    #[test]
    fn investor_mix_spans_both_periods() {
        let mut gnma = current("MSR9", 300);
        gnma.investor = Investor::Gnma;
        let prior = Snapshot::new(vec![current("MSR1", 100)]);
        let cur = Snapshot::new(vec![current("MSR1", 90), gnma]);

        let r = bridge(&prior, &cur);
        let rows: Vec<(&str, usize, usize)> = r
            .investor_mix
            .iter()
            .map(|m| (m.investor.as_str(), m.prior_count, m.current_count))
            .collect();
        assert_eq!(rows, vec![("FNMA", 1, 1), ("GNMA", 0, 1)]);
    }

    #[test]
    fn extreme_balances_do_not_overflow() {
        let big = i64::MAX - 1;
        let mut a = current("MSR1", 0);
        a.current_upb_micros = Some(big);
        let mut b = current("MSR2", 0);
        b.current_upb_micros = Some(big);
        let mut gone = current("MSR3", 0);
        gone.current_upb_micros = Some(-big);

        let prior = Snapshot::new(vec![a.clone(), b.clone(), gone]);
        let mut a_paid_down = a;
        a_paid_down.current_upb_micros = Some(-big);
        let cur = Snapshot::new(vec![a_paid_down, b]);

        let r = bridge(&prior, &cur);
        let w = i128::from(big);
        assert_eq!(r.balance.prior_total_upb_micros, w);
        assert_eq!(r.balance.current_total_upb_micros, 0);
        assert_eq!(r.balance.scheduled_amortization_micros + r.balance.curtailments_micros, 2 * w);
        assert_eq!(r.balance.payoff_upb_micros, -w);
        assert_eq!(r.investor_mix[0].prior_upb_micros, w);
        assert!(r.ties());
    }
}
