//! Per-run artifact directory: `<out-dir>/<run_id>/`.
//!
//! - `validation.json`: the full `ValidationResult`
//! - `manifest.json`: run identity, config hash and inputs

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: i32,
    pub run_id: Uuid,
    pub config_hash: String,
    pub report_date: NaiveDate,
    pub created_at_utc: DateTime<Utc>,
    pub inputs: RunInputs,
    pub artifacts: ArtifactList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInputs {
    pub prior_tape: String,
    pub current_tape: String,
    pub payoffs: Option<String>,
    pub new_adds: Option<String>,
    pub config_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactList {
    pub manifest_json: String,
    pub validation_json: String,
}

pub struct WriteRunArtifactsArgs<'a, T: Serialize> {
    pub out_root: &'a Path,
    pub run_id: Uuid,
    pub config_hash: &'a str,
    pub report_date: NaiveDate,
    pub inputs: RunInputs,
    pub result: &'a T,
}

pub struct WriteRunArtifactsResult {
    pub run_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub validation_path: PathBuf,
}

pub fn write_run_artifacts<T: Serialize>(
    args: WriteRunArtifactsArgs<'_, T>,
) -> Result<WriteRunArtifactsResult> {
    let run_dir = args.out_root.join(args.run_id.to_string());
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("create run dir failed: {}", run_dir.display()))?;

    let validation_path = run_dir.join("validation.json");
    write_json(&validation_path, args.result).context("serialize validation result failed")?;

    let manifest = RunManifest {
        schema_version: SCHEMA_VERSION,
        run_id: args.run_id,
        config_hash: args.config_hash.to_string(),
        report_date: args.report_date,
        created_at_utc: Utc::now(),
        inputs: args.inputs,
        artifacts: ArtifactList {
            manifest_json: "manifest.json".to_string(),
            validation_json: "validation.json".to_string(),
        },
    };
    let manifest_path = run_dir.join("manifest.json");
    write_json(&manifest_path, &manifest).context("serialize manifest failed")?;

    Ok(WriteRunArtifactsResult {
        run_dir,
        manifest_path,
        validation_path,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("write failed: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_manifest_and_result_under_run_id() {
        let dir = tempfile::tempdir().unwrap();
        let run_id = Uuid::new_v4();
        let out = write_run_artifacts(WriteRunArtifactsArgs {
            out_root: dir.path(),
            run_id,
            config_hash: "abc",
            report_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            inputs: RunInputs {
                prior_tape: "jan.csv".into(),
                current_tape: "feb.csv".into(),
                payoffs: None,
                new_adds: Some("adds.csv".into()),
                config_paths: vec![],
            },
            result: &serde_json::json!({"ok": true}),
        })
        .unwrap();

        assert_eq!(out.run_dir, dir.path().join(run_id.to_string()));
        let m: RunManifest =
            serde_json::from_str(&fs::read_to_string(&out.manifest_path).unwrap()).unwrap();
        assert_eq!(m.run_id, run_id);
        assert_eq!(m.report_date.to_string(), "2025-02-01");
        assert_eq!(m.inputs.new_adds.as_deref(), Some("adds.csv"));
        let v: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out.validation_path).unwrap()).unwrap();
        assert_eq!(v["ok"], true);
    }
}
