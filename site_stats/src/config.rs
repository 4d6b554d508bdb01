//! Run configuration: parsing, normalization, and loading.
//!
//! A TOML file describes one site run:
//! - site id, local time zone, and database location
//! - the analysis window (rolling `months = N` or explicit `from`/`to`)
//! - the solar observer used for the night filter
//! - where series come from and which category holds the meters
//! - the injection price series and the list of pricing models
//!
//! Key behaviors:
//! - Normalization trims everything, lowercases model names, and de-duplicates models (by name)
//!   and analyses while preserving order.
//! - Validation rejects unknown time zones, non-finite scalers/adders, observers off the globe,
//!   and inverted or ambiguous windows.
//!
//! Entrypoints: [`load_settings_str`] and [`load_settings_path`].

use std::collections::HashSet;
use std::mem;
use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::analysis::{Analysis, PriceDerivation, PricingModel};
use crate::solar::Observer;
use crate::tz;

pub const DEFAULT_TIMEZONE: &str = "Europe/Brussels";
pub const DEFAULT_METER_CATEGORY: &str = "digital_meter";
pub const DEFAULT_INJECTION_PRICES: &str = "Epex/BE/15";
pub const DEFAULT_WINDOW_MONTHS: u32 = 12;

fn default_site_id() -> String {
    "00000".into()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.into()
}

fn default_analyses() -> Vec<Analysis> {
    Analysis::ALL.to_vec()
}

fn default_scaler() -> f64 {
    1.0
}

/// Top-level run settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// IANA zone deciding month boundaries and local days.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// SQLite path or `sqlite:` URL; `DATABASE_URL` and `--database` take precedence.
    pub database_url: Option<String>,
    #[serde(default = "default_analyses")]
    pub analyses: Vec<Analysis>,
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub observer: Observer,
    #[serde(default)]
    pub meters: MetersCfg,
    pub source: SourceCfg,
    #[serde(default)]
    pub injection: InjectionCfg,
    #[serde(default)]
    pub pricing_models: Vec<PricingModelCfg>,
}

/// Analysis window. Either `months` or `from` (with optional `to`), not both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WindowCfg {
    /// Rolling window: from the first of the month `months` months ago up to now.
    pub months: Option<u32>,
    /// RFC3339 start (inclusive).
    pub from: Option<String>,
    /// RFC3339 end (exclusive); defaults to now.
    pub to: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetersCfg {
    /// Series category holding the meters to analyse.
    pub category: String,
}

impl Default for MetersCfg {
    fn default() -> Self {
        Self {
            category: DEFAULT_METER_CATEGORY.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceCfg {
    /// Root of a warehouse JSON export.
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InjectionCfg {
    /// Name of the price series splitting injection by price sign.
    pub price_series: String,
}

impl Default for InjectionCfg {
    fn default() -> Self {
        Self {
            price_series: DEFAULT_INJECTION_PRICES.into(),
        }
    }
}

/// One pricing model.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingModelCfg {
    /// Key segment; normalized to lowercase.
    pub name: String,
    /// Description label; defaults to the raw name.
    pub label: Option<String>,
    /// Name of the price series.
    pub series: String,
    #[serde(default = "default_scaler")]
    pub scaler: f64,
    #[serde(default)]
    pub adder: f64,
    #[serde(default)]
    pub derive: PriceDerivation,
}

impl PricingModelCfg {
    pub fn to_model(&self) -> PricingModel {
        PricingModel::new(
            self.name.clone(),
            self.label.clone().unwrap_or_else(|| self.name.clone()),
            self.scaler,
            self.adder,
        )
        .with_derive(self.derive)
    }
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Model names changed by trimming or lowercasing.
    pub models_renamed: usize,
    /// Models dropped because an earlier model had the same name.
    pub models_deduped: usize,
    /// Repeated analyses removed.
    pub analyses_deduped: usize,
}

impl Settings {
    /// Parsed [`Settings::timezone`].
    pub fn tz(&self) -> anyhow::Result<Tz> {
        tz::parse_tz(&self.timezone).with_context(|| format!("timezone {:?}", self.timezone))
    }

    pub fn runs(&self, analysis: Analysis) -> bool {
        self.analyses.contains(&analysis)
    }
}

impl WindowCfg {
    /// Concrete `[from, to)` in UTC, relative to `now` for rolling windows.
    pub fn resolve(&self, now: DateTime<Utc>, tz: Tz) -> anyhow::Result<(DateTime<Utc>, DateTime<Utc>)> {
        let to = match &self.to {
            Some(s) => tz::parse_ts_to_utc(s).context("window.to")?,
            None => now,
        };
        let from = match (&self.from, self.months) {
            (Some(_), Some(_)) => bail!("window: set either months or from, not both"),
            (Some(s), None) => tz::parse_ts_to_utc(s).context("window.from")?,
            (None, months) => rolling_start(now, months.unwrap_or(DEFAULT_WINDOW_MONTHS), tz)?,
        };
        if to <= from {
            bail!("window end {to} is not after start {from}");
        }
        Ok((from, to))
    }
}

/// Local midnight on the first of the month `months` months before the month of `now`.
fn rolling_start(now: DateTime<Utc>, months: u32, tz: Tz) -> anyhow::Result<DateTime<Utc>> {
    let local = tz::localize(now, tz).date_naive();
    let first = NaiveDate::from_ymd_opt(local.year(), local.month(), 1)
        .and_then(|d| d.checked_sub_months(Months::new(months)))
        .with_context(|| format!("window of {months} months before {local} is out of range"))?;
    Ok(tz::local_midnight_utc(first, tz)?)
}

/// Normalize and validate settings in place.
///
/// Errors:
/// - empty site id, meter category, source dir, model name or series name after trimming
/// - unknown time zone
/// - non-finite scaler or adder
/// - observer latitude outside -90..=90 or longitude outside -180..=180
/// - both `window.months` and `window.from`, or unparsable window bounds
pub fn normalize_settings(s: &mut Settings) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    s.site_id = s.site_id.trim().to_string();
    if s.site_id.is_empty() {
        bail!("site_id cannot be empty after trimming");
    }
    s.timezone = s.timezone.trim().to_string();
    s.tz()?;

    s.meters.category = s.meters.category.trim().to_string();
    if s.meters.category.is_empty() {
        bail!("meters.category cannot be empty after trimming");
    }
    if s.source.dir.as_os_str().is_empty() {
        bail!("source.dir cannot be empty");
    }
    s.injection.price_series = s.injection.price_series.trim().to_string();
    if s.injection.price_series.is_empty() {
        bail!("injection.price_series cannot be empty after trimming");
    }

    let Observer { latitude, longitude } = s.observer;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        bail!("observer ({latitude}, {longitude}) is not a valid location");
    }

    if s.window.months.is_some() && s.window.from.is_some() {
        bail!("window: set either months or from, not both");
    }
    for bound in [&s.window.from, &s.window.to].into_iter().flatten() {
        tz::parse_ts_to_utc(bound).with_context(|| format!("window bound {bound:?}"))?;
    }

    // --- analyses (dedupe, preserve order)
    let before = s.analyses.len();
    let mut seen = HashSet::new();
    s.analyses.retain(|a| seen.insert(*a));
    report.analyses_deduped = before - s.analyses.len();

    // --- pricing models (dedupe by normalized name, first wins)
    let mut rebuilt: IndexMap<String, PricingModelCfg> = IndexMap::new();
    for mut m in mem::take(&mut s.pricing_models) {
        let name = m.name.trim().to_lowercase();
        if name.is_empty() {
            bail!("pricing model name cannot be empty after trimming");
        }
        if m.label.is_none() {
            m.label = Some(m.name.trim().to_string());
        }
        if name != m.name {
            report.models_renamed += 1;
        }
        m.name = name;
        m.series = m.series.trim().to_string();
        if m.series.is_empty() {
            bail!("pricing model {}: series cannot be empty after trimming", m.name);
        }
        if !m.scaler.is_finite() || !m.adder.is_finite() {
            bail!("pricing model {}: scaler and adder must be finite", m.name);
        }
        if rebuilt.contains_key(&m.name) {
            report.models_deduped += 1;
            continue;
        }
        rebuilt.insert(m.name.clone(), m);
    }
    s.pricing_models = rebuilt.into_values().collect();

    Ok(report)
}

/// Parse and normalize settings from a TOML string.
pub fn load_settings_str(toml_str: &str) -> anyhow::Result<Settings> {
    let mut s: Settings = from_str(toml_str).context("failed to parse settings TOML")?;
    let report = normalize_settings(&mut s).context("normalize_settings failed")?;
    if report != NormalizationReport::default() {
        tracing::debug!(?report, "settings normalized");
    }
    Ok(s)
}

/// Read a settings TOML file from disk, parse, and normalize it.
pub fn load_settings_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Settings> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read settings file {}", path.as_ref().display()))?;
    load_settings_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FULL: &str = r#"
        site_id = " 00042 "
        timezone = "Europe/Brussels"
        database_url = "stats.db"
        analyses = ["pricing", "peaks", "pricing"]

        [window]
        months = 3

        [observer]
        latitude = 51.05
        longitude = 3.72

        [meters]
        category = "digital_meter"

        [source]
        dir = "data"

        [injection]
        price_series = "Epex/BE/15"

        [[pricing_models]]
        name = " EPEX "
        series = "Epex/BE/15"
        scaler = 0.001

        [[pricing_models]]
        name = "average_epex"
        label = "average EPEX"
        series = "Epex/BE/15"
        scaler = 0.001
        derive = "monthly_average"

        [[pricing_models]]
        name = "epex"
        series = "Other"
    "#;

    #[test]
    fn normalizes_models_and_analyses() {
        let s = load_settings_str(FULL).unwrap();
        assert_eq!(s.site_id, "00042");
        assert_eq!(s.analyses, vec![Analysis::Pricing, Analysis::Peaks]);
        let names: Vec<&str> = s.pricing_models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["epex", "average_epex"]);
        // first definition wins
        assert_eq!(s.pricing_models[0].series, "Epex/BE/15");
        let models: Vec<_> = s.pricing_models.iter().map(PricingModelCfg::to_model).collect();
        assert_eq!(models[0].label, "EPEX");
        assert_eq!(models[1].derive, PriceDerivation::MonthlyAverage);
        assert_eq!(models[0].adder, 0.0);
        assert!(s.runs(Analysis::Peaks));
        assert!(!s.runs(Analysis::Baseload));
    }

    #[test]
    fn defaults_fill_a_minimal_file() {
        let s = load_settings_str("[source]\ndir = \"data\"\n").unwrap();
        assert_eq!(s.timezone, DEFAULT_TIMEZONE);
        assert_eq!(s.meters.category, DEFAULT_METER_CATEGORY);
        assert_eq!(s.injection.price_series, DEFAULT_INJECTION_PRICES);
        assert_eq!(s.observer, Observer::BRUSSELS);
        assert_eq!(s.analyses, Analysis::ALL.to_vec());
        assert!(s.pricing_models.is_empty());
    }

    #[test]
    fn rejects_bad_input() {
        let base = "[source]\ndir = \"data\"\n";
        assert!(load_settings_str(&format!("timezone = \"Mars/Base\"\n{base}")).is_err());
        assert!(load_settings_str(&format!("bogus = 1\n{base}")).is_err());
        assert!(
            load_settings_str(&format!("{base}[window]\nmonths = 2\nfrom = \"2025-01-01T00:00:00Z\"\n"))
                .is_err()
        );
        assert!(
            load_settings_str(&format!("{base}[observer]\nlatitude = 91.0\nlongitude = 0.0\n")).is_err()
        );
        let nan = format!("{base}[[pricing_models]]\nname = \"x\"\nseries = \"s\"\nscaler = nan\n");
        let err = load_settings_str(&nan).unwrap_err();
        assert!(format!("{err:#}").contains("finite"));
    }

    #[test]
    fn rolling_window_starts_on_local_month_boundary() {
        let tz = tz::parse_tz("Europe/Brussels").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 8, 14, 9, 0, 0).unwrap();
        let w = WindowCfg {
            months: Some(12),
            ..Default::default()
        };
        let (from, to) = w.resolve(now, tz).unwrap();
        // 2024-08-01T00:00 CEST
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 7, 31, 22, 0, 0).unwrap());
        assert_eq!(to, now);
    }

    #[test]
    fn explicit_window_must_be_ordered() {
        let tz = tz::parse_tz("Europe/Brussels").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 8, 14, 9, 0, 0).unwrap();
        let w = WindowCfg {
            months: None,
            from: Some("2025-03-01T00:00:00+01:00".into()),
            to: Some("2025-02-01T00:00:00+01:00".into()),
        };
        assert!(w.resolve(now, tz).is_err());
        let w = WindowCfg {
            to: None,
            ..w
        };
        let (from, to) = w.resolve(now, tz).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2025, 2, 28, 23, 0, 0).unwrap());
        assert_eq!(to, now);
    }
}
