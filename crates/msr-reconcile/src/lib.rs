//! msr-reconcile
//!
//! Portfolio roll-forward between two tape snapshots.
//!
//! - Count bridge: prior + new adds - missing == current (set identity, self-check)
//! - Balance bridge: prior UPB - amortization - curtailments + capitalizations
//!   - payoffs + new adds vs. actual ending UPB, within a tolerance
//! - Delinquency migration and loan-level status changes (descriptive)
//! - Curtailment heuristic (informational, never a finding)
//!
//! Independent of validation findings. Deterministic, pure logic. No IO.

mod engine;
mod types;

pub use engine::{bridge, compute_bridge};
pub use types::*;
