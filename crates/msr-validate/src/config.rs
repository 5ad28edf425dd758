use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use msr_reconcile::BridgeConfig;
use msr_tape::{decimal_to_micros, Investor, MICROS_SCALE};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Rule thresholds. Fractions are micros-scaled (0.005 => 5_000).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    /// UPB may exceed original balance by this fraction before flagging.
    pub upb_over_original_micros: i64,
    /// Rate above this is taken as a whole-number percent.
    pub rate_max_micros: i64,
    /// Rate below this is unrealistic.
    pub rate_min_micros: i64,
    /// Fee above this is taken as whole basis points.
    pub fee_whole_bps_micros: i64,
    /// Fee above this (and not above `fee_whole_bps_micros`) looks like a percent.
    pub fee_percent_micros: i64,
    /// Fee below this is suspiciously low.
    pub fee_low_micros: i64,
    /// Month-over-month rate moves at or below this are noise.
    pub rate_change_epsilon_micros: i64,
    /// Current P&I may exceed prior P&I by this fraction before flagging.
    pub payment_inflation_micros: i64,
    /// Forward status moves of at least this many buckets are flagged.
    pub status_skip_buckets: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            upb_over_original_micros: 1_000,
            rate_max_micros: MICROS_SCALE,
            rate_min_micros: 5_000,
            fee_whole_bps_micros: MICROS_SCALE,
            fee_percent_micros: 50_000,
            fee_low_micros: 1_000,
            rate_change_epsilon_micros: 100,
            payment_inflation_micros: 100_000,
            status_skip_buckets: 2,
        }
    }
}

/// Inclusive servicing-fee range for one investor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FeeBand {
    pub min_micros: i64,
    pub max_micros: i64,
}

impl FeeBand {
    pub const fn new(min_micros: i64, max_micros: i64) -> Self {
        Self {
            min_micros,
            max_micros,
        }
    }

    pub fn contains(&self, fee_micros: i64) -> bool {
        (self.min_micros..=self.max_micros).contains(&fee_micros)
    }
}

/// Opt-in comparison of submitted P&I against a level amortizing payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentCheck {
    pub enabled: bool,
    /// Allowed excess over the amortized payment (0.15 => 150_000).
    pub tolerance_micros: i64,
}

impl Default for PaymentCheck {
    fn default() -> Self {
        Self {
            enabled: false,
            tolerance_micros: 150_000,
        }
    }
}

/// Everything the engine needs besides the tapes themselves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationConfig {
    /// Default report date for callers that do not supply one.
    pub report_date: Option<NaiveDate>,
    pub thresholds: Thresholds,
    /// Keyed by investor label (FNMA, FHLMC, GNMA, Portfolio, ...).
    pub investor_bands: BTreeMap<String, FeeBand>,
    pub payment_check: PaymentCheck,
    pub bridge: BridgeConfig,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let agency = FeeBand::new(1_000, 5_000);
        let investor_bands = BTreeMap::from([
            ("FNMA".to_string(), agency),
            ("FHLMC".to_string(), agency),
            ("GNMA".to_string(), FeeBand::new(1_000, 10_000)),
            ("Portfolio".to_string(), agency),
        ]);
        Self {
            report_date: None,
            thresholds: Thresholds::default(),
            investor_bands,
            payment_check: PaymentCheck::default(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl ValidationConfig {
    /// Fee band for an investor, if one is configured.
    pub fn band_for(&self, investor: &Investor) -> Option<FeeBand> {
        self.investor_bands.get(investor.label()).copied()
    }

    /// Build from canonical config JSON (produced by msr-config).
    ///
    /// Every key is optional; absent keys keep their defaults. Decimal values
    /// may be numbers or strings and are converted to micros without floats.
    ///
    /// - validation.report_date (YYYY-MM-DD)
    /// - validation.thresholds.{upb_over_original, rate_max, rate_min,
    ///   fee_whole_bps, fee_percent, fee_low, rate_change_epsilon,
    ///   payment_inflation, status_skip_buckets}
    /// - validation.investor_bands.<INVESTOR> = [min, max]
    /// - validation.payment_check.{enabled, tolerance_pct}
    /// - reconcile.{balance_tolerance, curtailment_multiple}
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let mut out = Self::default();

        if let Some(v) = cfg.pointer("/validation/report_date") {
            let s = v
                .as_str()
                .context("validation.report_date must be a YYYY-MM-DD string")?;
            let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("validation.report_date invalid: '{s}'"))?;
            out.report_date = Some(d);
        }

        let t = &mut out.thresholds;
        read_micros(cfg, "/validation/thresholds/upb_over_original", &mut t.upb_over_original_micros)?;
        read_micros(cfg, "/validation/thresholds/rate_max", &mut t.rate_max_micros)?;
        read_micros(cfg, "/validation/thresholds/rate_min", &mut t.rate_min_micros)?;
        read_micros(cfg, "/validation/thresholds/fee_whole_bps", &mut t.fee_whole_bps_micros)?;
        read_micros(cfg, "/validation/thresholds/fee_percent", &mut t.fee_percent_micros)?;
        read_micros(cfg, "/validation/thresholds/fee_low", &mut t.fee_low_micros)?;
        read_micros(cfg, "/validation/thresholds/rate_change_epsilon", &mut t.rate_change_epsilon_micros)?;
        read_micros(cfg, "/validation/thresholds/payment_inflation", &mut t.payment_inflation_micros)?;
        if let Some(v) = cfg.pointer("/validation/thresholds/status_skip_buckets") {
            let n = v
                .as_i64()
                .filter(|n| (1..=4).contains(n))
                .context("validation.thresholds.status_skip_buckets must be an integer in 1..=4")?;
            t.status_skip_buckets = n as i32;
        }
        if t.rate_min_micros >= t.rate_max_micros {
            bail!("validation.thresholds.rate_min must be below rate_max");
        }
        if t.fee_low_micros >= t.fee_percent_micros || t.fee_percent_micros >= t.fee_whole_bps_micros {
            bail!("validation.thresholds must satisfy fee_low < fee_percent < fee_whole_bps");
        }

        if let Some(v) = cfg.pointer("/validation/investor_bands") {
            let map = v
                .as_object()
                .context("validation.investor_bands must be a mapping")?;
            for (investor, band) in map {
                let band = parse_band(band)
                    .with_context(|| format!("validation.investor_bands.{investor} invalid"))?;
                out.investor_bands.insert(investor.clone(), band);
            }
        }

        if let Some(v) = cfg.pointer("/validation/payment_check/enabled") {
            out.payment_check.enabled = v
                .as_bool()
                .context("validation.payment_check.enabled must be a bool")?;
        }
        read_micros(
            cfg,
            "/validation/payment_check/tolerance_pct",
            &mut out.payment_check.tolerance_micros,
        )?;

        read_micros(cfg, "/reconcile/balance_tolerance", &mut out.bridge.balance_tolerance_micros)?;
        read_micros(
            cfg,
            "/reconcile/curtailment_multiple",
            &mut out.bridge.curtailment_multiple_micros,
        )?;
        if out.bridge.balance_tolerance_micros <= 0 {
            bail!("reconcile.balance_tolerance must be positive");
        }

        Ok(out)
    }
}

fn value_to_micros(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => decimal_to_micros(&n.to_string()),
        Value::String(s) => decimal_to_micros(s),
        _ => None,
    }
}

fn read_micros(cfg: &Value, pointer: &str, slot: &mut i64) -> Result<()> {
    if let Some(v) = cfg.pointer(pointer) {
        let m = value_to_micros(v)
            .ok_or_else(|| anyhow!("{} must be a decimal (got {v})", dotted(pointer)))?;
        if m < 0 {
            bail!("{} must not be negative", dotted(pointer));
        }
        *slot = m;
    }
    Ok(())
}

fn parse_band(v: &Value) -> Result<FeeBand> {
    let (lo, hi) = match v {
        Value::Array(items) if items.len() == 2 => (&items[0], &items[1]),
        Value::Object(m) => (
            m.get("min").context("band missing min")?,
            m.get("max").context("band missing max")?,
        ),
        _ => bail!("expected [min, max] or {{min, max}}"),
    };
    let min = value_to_micros(lo).context("band min is not a decimal")?;
    let max = value_to_micros(hi).context("band max is not a decimal")?;
    if min > max {
        bail!("band min exceeds max");
    }
    Ok(FeeBand::new(min, max))
}

fn dotted(pointer: &str) -> String {
    pointer.trim_start_matches('/').replace('/', ".")
}
