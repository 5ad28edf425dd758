use msr_tape::LoanStatus;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Bridge policy knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Balance bridge ties when |variance| < tolerance. Default $1.00.
    pub balance_tolerance_micros: i64,
    /// A continuing Current loan is a curtailment candidate when its UPB
    /// decrease exceeds this multiple of the average decrease.
    /// Micros-scaled: 2.5x = 2_500_000.
    pub curtailment_multiple_micros: i64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            balance_tolerance_micros: 1_000_000,
            curtailment_multiple_micros: 2_500_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Count bridge
// ---------------------------------------------------------------------------

/// Loan-count roll-forward over unique loan IDs.
///
/// `prior + new - missing == current` is a set identity; `variance` is
/// computed rather than assumed so callers can use it as a self-check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CountBridge {
    pub prior_count: usize,
    pub new_count: usize,
    pub missing_count: usize,
    pub continuing_count: usize,
    pub current_count: usize,
    pub computed_count: i64,
    pub variance: i64,
}

impl CountBridge {
    pub fn ties(&self) -> bool {
        self.variance == 0
    }
}

// ---------------------------------------------------------------------------
// Balance bridge
// ---------------------------------------------------------------------------

/// UPB roll-forward from prior to current period.
///
/// Opening and closing totals are taken over the tapes as submitted
/// (duplicate rows included); the components are taken over unique loans.
/// A repeated loan therefore shows up as variance equal to its extra rows'
/// UPB. Totals over first-seen loans would tie instead and hide the repeat.
/// Absent UPB counts as zero throughout.
///
/// Amounts are i128 micros; tape values are i64 but their sums need not be.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceBridge {
    pub prior_total_upb_micros: i128,
    pub scheduled_amortization_micros: i128,
    pub curtailments_micros: i128,
    pub capitalizations_micros: i128,
    pub payoff_upb_micros: i128,
    pub new_add_upb_micros: i128,
    /// prior - amortization - curtailments + capitalizations - payoffs + new adds
    pub computed_ending_upb_micros: i128,
    pub current_total_upb_micros: i128,
    /// computed - actual
    pub variance_micros: i128,
    pub tolerance_micros: i64,
}

impl BalanceBridge {
    pub fn ties(&self) -> bool {
        self.variance_micros.abs() < i128::from(self.tolerance_micros)
    }
}

// ---------------------------------------------------------------------------
// Delinquency migration
// ---------------------------------------------------------------------------

/// Bucket label used for statuses outside the recognized set.
pub const OTHER_BUCKET: &str = "Other";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BucketMigration {
    pub bucket: String,
    pub prior_count: usize,
    pub current_count: usize,
    pub delta: i64,
}

/// Per-status loan counts for both periods. Descriptive only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DelinquencyMigration {
    /// Current, 30 DPD, 60 DPD, 90+ DPD, Paid in Full, Other, in that order.
    pub buckets: Vec<BucketMigration>,
}

impl DelinquencyMigration {
    pub fn bucket(&self, label: &str) -> Option<&BucketMigration> {
        self.buckets.iter().find(|b| b.bucket == label)
    }
}

/// A continuing loan whose status differs between periods.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub loan_id: String,
    pub from: LoanStatus,
    pub to: LoanStatus,
    pub current_upb_micros: Option<i64>,
}

// ---------------------------------------------------------------------------
// Investor mix
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvestorMixRow {
    pub investor: String,
    pub prior_count: usize,
    pub prior_upb_micros: i128,
    pub current_count: usize,
    pub current_upb_micros: i128,
}

// ---------------------------------------------------------------------------
// Curtailments
// ---------------------------------------------------------------------------

/// Informational signal: an unusually large principal reduction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CurtailmentCandidate {
    pub loan_id: String,
    pub prior_upb_micros: i64,
    pub current_upb_micros: i64,
    pub decrease_micros: i128,
    /// Decrease beyond the average decrease (the presumed extra payment).
    pub extra_payment_micros: i128,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Full bridge output. Independent of validation findings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BridgeReport {
    pub count: CountBridge,
    pub balance: BalanceBridge,
    pub migration: DelinquencyMigration,
    pub status_changes: Vec<StatusChange>,
    pub investor_mix: Vec<InvestorMixRow>,
    pub curtailments: Vec<CurtailmentCandidate>,
    /// Average UPB decrease across continuing Current loans.
    pub average_decrease_micros: i128,
    /// Records (as submitted) whose UPB was absent.
    pub unknown_upb_prior: usize,
    pub unknown_upb_current: usize,
}

impl BridgeReport {
    pub fn ties(&self) -> bool {
        self.count.ties() && self.balance.ties()
    }
}
