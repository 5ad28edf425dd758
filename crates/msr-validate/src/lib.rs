//! msr-validate
//!
//! Two-layer validation of a monthly MSR servicing tape.
//!
//! - Layer 1 (field-level): each current record in isolation, ordered rule
//!   groups with first-match-wins exclusivity, plus duplicate loan IDs
//! - Layer 2 (cross-period): missing/new loans against payoff and new-add
//!   confirmations, month-over-month checks on continuing loans
//! - Reconciliation bridge from `msr-reconcile`, carried on the result
//!
//! Every data problem is a `Finding`; nothing here returns an error for
//! bad tape content. Deterministic, pure logic. No IO.

mod config;
mod cross_period;
mod engine;
mod field_rules;
mod finding;
mod result;

pub use config::{FeeBand, PaymentCheck, Thresholds, ValidationConfig};
pub use cross_period::{
    check_continuing, cross_period, CrossPeriodOutcome, MissingPartition, NewLoanPartition,
};
pub use engine::{validate, validate_with};
pub use field_rules::{
    amortized_payment_micros, check_record, field_level, FieldRule, RuleContext, RuleGroup,
    FIELD_RULE_GROUPS,
};
pub use finding::{sort_findings, Evidence, Finding, Layer, Rule, Severity};
pub use result::{RuleCount, ValidationResult};
