//! `msr reconcile`: count and balance bridge between two tapes.

use anyhow::Result;
use msr_config::{ConfigMode, UnusedKeyPolicy};

use super::{load_config, print_bridge, read_tape, validation_config};

pub fn run_reconcile(prior: &str, current: &str, config_paths: &[String]) -> Result<()> {
    let loaded = load_config(config_paths, ConfigMode::Reconcile, UnusedKeyPolicy::Warn)?;
    let cfg = validation_config(&loaded)?;

    let prior_snap = read_tape("prior", prior)?;
    let current_snap = read_tape("current", current)?;

    let report = msr_reconcile::compute_bridge(&cfg.bridge, &prior_snap, &current_snap);

    println!("config_hash={}", loaded.config_hash);
    print_bridge(&report);
    Ok(())
}
