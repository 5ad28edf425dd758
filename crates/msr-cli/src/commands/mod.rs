//! Command handler modules for msr-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod reconcile;
pub mod validate;

use anyhow::{Context, Result};
use msr_config::{ConfigMode, LoadedConfig, UnusedKeyPolicy};
use msr_ingest::{LoanIdPattern, DEFAULT_LOAN_ID_PATTERN};
use msr_reconcile::BridgeReport;
use msr_tape::{format_money_wide, Snapshot};
use msr_validate::ValidationConfig;
use std::path::Path;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Merge config layers (none is fine) and run the unused-key guard.
pub fn load_config(
    config_paths: &[String],
    mode: ConfigMode,
    policy: UnusedKeyPolicy,
) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = msr_config::load_layered_yaml(&path_refs)?;

    let report = msr_config::report_unused_keys(mode, &loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(
            mode = %report.mode,
            unused = ?report.unused_leaf_pointers,
            "config carries keys no consumer reads"
        );
    }

    info!(
        layers = config_paths.len(),
        config_hash = %loaded.config_hash,
        "config loaded"
    );
    Ok(loaded)
}

pub fn validation_config(loaded: &LoadedConfig) -> Result<ValidationConfig> {
    ValidationConfig::from_config_json(&loaded.config_json)
}

/// `ingest.loan_id_pattern`, or the default `MSR<digits>` shape.
pub fn loan_id_pattern(loaded: &LoadedConfig) -> Result<LoanIdPattern> {
    let raw = loaded
        .str_at("/ingest/loan_id_pattern")
        .unwrap_or(DEFAULT_LOAN_ID_PATTERN);
    LoanIdPattern::new(raw).with_context(|| format!("invalid ingest.loan_id_pattern: '{raw}'"))
}

pub fn read_tape(label: &str, path: &str) -> Result<Snapshot> {
    let snap = msr_ingest::load_tape(Path::new(path))
        .with_context(|| format!("load {label} tape failed: {path}"))?;
    info!(tape = label, path, rows = snap.len(), "tape loaded");
    Ok(snap)
}

/// Bridge lines shared by `validate` and `reconcile`.
pub fn print_bridge(bridge: &BridgeReport) {
    let c = &bridge.count;
    println!(
        "count_bridge prior={} new={} missing={} continuing={} current={} computed={} variance={} ties={}",
        c.prior_count,
        c.new_count,
        c.missing_count,
        c.continuing_count,
        c.current_count,
        c.computed_count,
        c.variance,
        c.ties()
    );

    let b = &bridge.balance;
    println!(
        "balance_bridge prior_upb={} scheduled_amortization={} curtailments={} capitalizations={} payoffs={} new_adds={} computed_upb={} current_upb={} variance={} ties={}",
        format_money_wide(b.prior_total_upb_micros),
        format_money_wide(b.scheduled_amortization_micros),
        format_money_wide(b.curtailments_micros),
        format_money_wide(b.capitalizations_micros),
        format_money_wide(b.payoff_upb_micros),
        format_money_wide(b.new_add_upb_micros),
        format_money_wide(b.computed_ending_upb_micros),
        format_money_wide(b.current_total_upb_micros),
        format_money_wide(b.variance_micros),
        b.ties()
    );

    for m in &bridge.migration.buckets {
        println!(
            "migration bucket=\"{}\" prior={} current={} delta={}",
            m.bucket, m.prior_count, m.current_count, m.delta
        );
    }

    for row in &bridge.investor_mix {
        println!(
            "investor_mix investor=\"{}\" prior_count={} prior_upb={} current_count={} current_upb={}",
            row.investor,
            row.prior_count,
            format_money_wide(row.prior_upb_micros),
            row.current_count,
            format_money_wide(row.current_upb_micros)
        );
    }

    println!("status_changes={}", bridge.status_changes.len());
    println!("curtailment_candidates={}", bridge.curtailments.len());
    if bridge.unknown_upb_prior > 0 || bridge.unknown_upb_current > 0 {
        println!(
            "unknown_upb prior={} current={}",
            bridge.unknown_upb_prior, bridge.unknown_upb_current
        );
    }
    println!("bridge_ties={}", bridge.ties());
}
