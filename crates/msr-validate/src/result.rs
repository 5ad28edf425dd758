use chrono::NaiveDate;
use msr_reconcile::BridgeReport;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::cross_period::{MissingPartition, NewLoanPartition};
use crate::finding::{sort_findings, Finding, Rule, Severity};

/// Outcome of one validation run. Pure data; rendering is the caller's job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub report_date: NaiveDate,
    /// Unique loan IDs on the prior tape.
    pub prior_count: usize,
    /// Unique loan IDs on the current tape.
    pub current_count: usize,
    /// Raw current rows, duplicates included.
    pub submitted_count: usize,
    /// Repeat occurrences on the current tape.
    pub duplicate_count: usize,
    pub continuing_count: usize,
    pub missing: MissingPartition,
    pub new_loans: NewLoanPartition,
    pub hard_stops: Vec<Finding>,
    pub yellow_lights: Vec<Finding>,
    /// Current loan IDs with no finding of either severity.
    pub clean_ids: BTreeSet<String>,
    pub bridge: BridgeReport,
}

/// Number of findings for one rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RuleCount {
    pub severity: Severity,
    pub rule: Rule,
    pub count: usize,
}

impl ValidationResult {
    /// All findings in output order.
    pub fn findings(&self) -> Vec<Finding> {
        let mut all: Vec<Finding> = self
            .hard_stops
            .iter()
            .chain(&self.yellow_lights)
            .cloned()
            .collect();
        sort_findings(&mut all);
        all
    }

    /// True when nothing blocks acceptance.
    pub fn is_acceptable(&self) -> bool {
        self.hard_stops.is_empty()
    }

    /// Loan IDs carrying at least one finding.
    pub fn flagged_ids(&self) -> BTreeSet<&str> {
        self.hard_stops
            .iter()
            .chain(&self.yellow_lights)
            .map(|f| f.loan_id.as_str())
            .collect()
    }

    /// Finding counts by severity, then rule name.
    pub fn rule_breakdown(&self) -> Vec<RuleCount> {
        let mut counts: BTreeMap<(Severity, &'static str), (Rule, usize)> = BTreeMap::new();
        for f in self.hard_stops.iter().chain(&self.yellow_lights) {
            counts
                .entry((f.severity, f.rule.name()))
                .or_insert((f.rule, 0))
                .1 += 1;
        }
        counts
            .into_iter()
            .map(|((severity, _), (rule, count))| RuleCount {
                severity,
                rule,
                count,
            })
            .collect()
    }

    /// Findings for one loan, in output order.
    pub fn findings_for<'a>(&'a self, loan_id: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.hard_stops
            .iter()
            .chain(&self.yellow_lights)
            .filter(move |f| f.loan_id == loan_id)
    }
}
