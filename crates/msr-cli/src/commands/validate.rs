//! `msr validate`: both validation layers, the bridge, and run artifacts.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use msr_config::{ConfigMode, UnusedKeyPolicy};
use msr_ingest::LoanIdPattern;
use msr_tape::ConfirmationSet;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use super::{load_config, loan_id_pattern, print_bridge, read_tape, validation_config};
use crate::artifacts::{write_run_artifacts, RunInputs, WriteRunArtifactsArgs};

pub struct ValidateArgs {
    pub prior: String,
    pub current: String,
    pub payoffs: Option<String>,
    pub new_adds: Option<String>,
    pub report_date: Option<NaiveDate>,
    pub config_paths: Vec<String>,
    pub out_dir: String,
    pub strict_config: bool,
}

/// Returns `Ok(false)` when the tape carries hard stops.
pub fn run_validate(args: ValidateArgs) -> Result<bool> {
    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let loaded = load_config(&args.config_paths, ConfigMode::Validate, policy)?;
    let cfg = validation_config(&loaded)?;
    let pattern = loan_id_pattern(&loaded)?;

    let Some(report_date) = args.report_date.or(cfg.report_date) else {
        bail!("report date required: pass --report-date or set validation.report_date");
    };

    let prior = read_tape("prior", &args.prior)?;
    let current = read_tape("current", &args.current)?;
    let payoffs = read_confirmations("payoffs", args.payoffs.as_deref(), &pattern)?;
    let new_adds = read_confirmations("new_adds", args.new_adds.as_deref(), &pattern)?;

    let result = msr_validate::validate_with(&cfg, &prior, &current, &payoffs, &new_adds, report_date);

    let run_id = Uuid::new_v4();
    let art = write_run_artifacts(WriteRunArtifactsArgs {
        out_root: Path::new(&args.out_dir),
        run_id,
        config_hash: &loaded.config_hash,
        report_date,
        inputs: RunInputs {
            prior_tape: args.prior.clone(),
            current_tape: args.current.clone(),
            payoffs: args.payoffs.clone(),
            new_adds: args.new_adds.clone(),
            config_paths: args.config_paths.clone(),
        },
        result: &result,
    })?;

    info!(
        run_id = %run_id,
        hard_stops = result.hard_stops.len(),
        yellow_lights = result.yellow_lights.len(),
        "validation complete"
    );

    println!("run_id={}", run_id);
    println!("config_hash={}", loaded.config_hash);
    println!("report_date={}", result.report_date);
    println!("prior_loans={}", result.prior_count);
    println!("current_loans={}", result.current_count);
    println!("submitted_rows={}", result.submitted_count);
    println!("duplicate_rows={}", result.duplicate_count);
    println!("continuing_loans={}", result.continuing_count);
    println!(
        "missing explained={} unexplained={}",
        result.missing.explained.len(),
        result.missing.unexplained.len()
    );
    println!(
        "new_loans confirmed={} unconfirmed={}",
        result.new_loans.confirmed.len(),
        result.new_loans.unconfirmed.len()
    );
    println!("hard_stops={}", result.hard_stops.len());
    println!("yellow_lights={}", result.yellow_lights.len());
    println!("clean_loans={}", result.clean_ids.len());
    for rc in result.rule_breakdown() {
        println!(
            "rule severity={} name=\"{}\" count={}",
            rc.severity.as_str(),
            rc.rule.name(),
            rc.count
        );
    }
    print_bridge(&result.bridge);
    println!("artifacts_dir={}", art.run_dir.display());
    println!("manifest_path={}", art.manifest_path.display());
    println!("validation_path={}", art.validation_path.display());

    let accepted = result.is_acceptable();
    println!("acceptable={}", accepted);
    Ok(accepted)
}

fn read_confirmations(
    label: &str,
    path: Option<&str>,
    pattern: &LoanIdPattern,
) -> Result<ConfirmationSet> {
    let Some(path) = path else {
        return Ok(ConfirmationSet::empty());
    };
    let set = msr_ingest::load_confirmations(Path::new(path), pattern)
        .with_context(|| format!("load {label} confirmations failed: {path}"))?;
    info!(list = label, path, ids = set.len(), "confirmations loaded");
    Ok(set)
}
