use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod artifacts;
mod commands;

#[derive(Parser)]
#[command(name = "msr")]
#[command(about = "MSR servicing tape validation and reconciliation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both validation layers plus the bridge and write run artifacts.
    /// Exits 2 when any hard stop is found.
    Validate {
        /// Prior-period tape (CSV)
        #[arg(long)]
        prior: String,

        /// Current-period tape (CSV)
        #[arg(long)]
        current: String,

        /// Payoff confirmation list
        #[arg(long)]
        payoffs: Option<String>,

        /// New-add (boarding) confirmation list
        #[arg(long = "new-adds")]
        new_adds: Option<String>,

        /// Reporting date (YYYY-MM-DD). Falls back to validation.report_date.
        #[arg(long = "report-date")]
        report_date: Option<NaiveDate>,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Artifacts root; each run writes to <out-dir>/<run_id>/
        #[arg(long = "out-dir", default_value = "exports")]
        out_dir: String,

        /// Fail instead of warn when the config carries keys nothing reads.
        #[arg(long = "strict-config", default_value_t = false)]
        strict_config: bool,
    },

    /// Print the reconciliation bridge only. Never fails on data.
    Reconcile {
        /// Prior-period tape (CSV)
        #[arg(long)]
        prior: String,

        /// Current-period tape (CSV)
        #[arg(long)]
        current: String,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> desk -> month overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn main() -> Result<ExitCode> {
    // dev-time env bootstrap (RUST_LOG etc.); absent file is fine
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Validate {
            prior,
            current,
            payoffs,
            new_adds,
            report_date,
            config_paths,
            out_dir,
            strict_config,
        } => {
            let accepted = commands::validate::run_validate(commands::validate::ValidateArgs {
                prior,
                current,
                payoffs,
                new_adds,
                report_date,
                config_paths,
                out_dir,
                strict_config,
            })?;
            if !accepted {
                return Ok(ExitCode::from(2));
            }
        }

        Commands::Reconcile {
            prior,
            current,
            config_paths,
        } => {
            commands::reconcile::run_reconcile(&prior, &current, &config_paths)?;
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = msr_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr; stdout carries only key=value result lines.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
