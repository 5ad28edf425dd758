use serde::{Serialize, Serializer};
use std::fmt;

/// How serious a finding is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// Submission must be corrected before acceptance.
    HardStop,
    /// Accepted conditionally; flagged for manual review.
    YellowLight,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::HardStop => "HARD_STOP",
            Severity::YellowLight => "YELLOW_LIGHT",
        }
    }
}

/// Which validation layer produced a finding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// Field-level checks on one record in isolation.
    FieldLevel,
    /// Cross-period checks against the prior snapshot and confirmations.
    CrossPeriod,
}

impl Layer {
    pub fn number(&self) -> u8 {
        match self {
            Layer::FieldLevel => 1,
            Layer::CrossPeriod => 2,
        }
    }
}

impl Serialize for Layer {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(self.number())
    }
}

/// Every rule the engine can fire. Display names are stable and are part
/// of the deterministic output ordering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rule {
    // Layer 1
    UpbZeroActiveLoan,
    UpbExceedsOriginalBalance,
    RateWholeNumber,
    RateUnrealisticallyLow,
    FeeWholeBasisPoints,
    FeePercentFormatted,
    FeeSuspiciouslyLow,
    FeeOutOfInvestorRange,
    DueDateInPast,
    InvalidStatus,
    DuplicateLoanId,
    PaymentAboveAmortized,
    // Layer 2
    MissingLoan,
    UnboardedLoan,
    StatusBucketSkip,
    RemainingTermNotDecreased,
    RateChanged,
    PaymentInflated,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::UpbZeroActiveLoan => "UPB = Zero (active loan)",
            Rule::UpbExceedsOriginalBalance => "UPB Exceeds Original Balance",
            Rule::RateWholeNumber => "Rate Expressed as Whole Number",
            Rule::RateUnrealisticallyLow => "Rate Unrealistically Low",
            Rule::FeeWholeBasisPoints => "NSF Expressed as Whole Basis Points",
            Rule::FeePercentFormatted => "NSF May Be Expressed as Percent",
            Rule::FeeSuspiciouslyLow => "NSF Suspiciously Low",
            Rule::FeeOutOfInvestorRange => "NSF Out of Investor Range",
            Rule::DueDateInPast => "Next Due Date in Past (Current Loan)",
            Rule::InvalidStatus => "Invalid Status Value",
            Rule::DuplicateLoanId => "Duplicate Loan ID",
            Rule::PaymentAboveAmortized => "P&I Above Amortized Expectation",
            Rule::MissingLoan => "Missing Loan (not in payoff confirmation)",
            Rule::UnboardedLoan => "Unboarded Loan (not in new-add confirmation)",
            Rule::StatusBucketSkip => "Status Bucket Skip",
            Rule::RemainingTermNotDecreased => "Remaining Term Did Not Decrease",
            Rule::RateChanged => "Rate Changed Month-over-Month",
            Rule::PaymentInflated => "P&I Inflated vs Prior Month",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Rule::UpbZeroActiveLoan
            | Rule::UpbExceedsOriginalBalance
            | Rule::RateWholeNumber
            | Rule::RateUnrealisticallyLow
            | Rule::FeeWholeBasisPoints
            | Rule::DuplicateLoanId
            | Rule::MissingLoan => Severity::HardStop,
            _ => Severity::YellowLight,
        }
    }

    pub fn layer(&self) -> Layer {
        match self {
            Rule::MissingLoan
            | Rule::UnboardedLoan
            | Rule::StatusBucketSkip
            | Rule::RemainingTermNotDecreased
            | Rule::RateChanged
            | Rule::PaymentInflated => Layer::CrossPeriod,
            _ => Layer::FieldLevel,
        }
    }

    /// Tape column the rule inspects.
    pub fn field(&self) -> &'static str {
        match self {
            Rule::UpbZeroActiveLoan | Rule::UpbExceedsOriginalBalance => "Current UPB ($)",
            Rule::RateWholeNumber | Rule::RateUnrealisticallyLow | Rule::RateChanged => "Rate",
            Rule::FeeWholeBasisPoints
            | Rule::FeePercentFormatted
            | Rule::FeeSuspiciouslyLow
            | Rule::FeeOutOfInvestorRange => "Net Serv Fee",
            Rule::DueDateInPast => "Next Due Date",
            Rule::InvalidStatus | Rule::StatusBucketSkip => "Status",
            Rule::DuplicateLoanId | Rule::MissingLoan | Rule::UnboardedLoan => "Loan ID",
            Rule::RemainingTermNotDecreased => "Rem Term",
            Rule::PaymentAboveAmortized | Rule::PaymentInflated => "P&I ($)",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.name())
    }
}

/// What a rule observed, in human-readable form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evidence {
    pub submitted: String,
    pub expected: String,
    pub detail: String,
}

impl Evidence {
    pub fn new(
        submitted: impl Into<String>,
        expected: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            submitted: submitted.into(),
            expected: expected.into(),
            detail: detail.into(),
        }
    }
}

/// One data-quality problem on one loan. Immutable once emitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub layer: Layer,
    pub loan_id: String,
    pub investor: String,
    pub rule: Rule,
    pub field: &'static str,
    pub submitted: String,
    pub expected: String,
    pub detail: String,
}

impl Finding {
    /// Build a finding; severity, layer and field come from the rule.
    pub fn new(
        rule: Rule,
        loan_id: impl Into<String>,
        investor: impl Into<String>,
        evidence: Evidence,
    ) -> Self {
        Self {
            severity: rule.severity(),
            layer: rule.layer(),
            loan_id: loan_id.into(),
            investor: investor.into(),
            rule,
            field: rule.field(),
            submitted: evidence.submitted,
            expected: evidence.expected,
            detail: evidence.detail,
        }
    }

    pub fn is_hard_stop(&self) -> bool {
        self.severity == Severity::HardStop
    }

    /// Output order: loan ID, then rule name, then the remaining text.
    pub(crate) fn sort_key(&self) -> (&str, &str, Layer, &str, &str) {
        (
            self.loan_id.as_str(),
            self.rule.name(),
            self.layer,
            self.submitted.as_str(),
            self.detail.as_str(),
        )
    }
}

/// Sort findings into the engine's deterministic output order.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}
