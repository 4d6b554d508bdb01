//! One statistics run over every meter of a site.
//!
//! 1. List meters and resolve the configured price series by name; a missing price series only
//!    drops the models (or the injection split) that need it.
//! 2. Fetch each price series once over the month-aligned cover of the window and derive
//!    monthly averages where a model asks for them.
//! 3. Analyse meters concurrently. Each meter is fetched, evaluated, and persisted as one batch;
//!    a failing meter is recorded in the [`RunSummary`] and the others carry on.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use series_source::{SeriesFilter, SeriesMeta, SeriesSource};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::analysis::{
    Analysis, PriceDerivation, PricingEvaluator, baseload_rows, injection_rows, peak_rows,
};
use crate::calendar::{CalendarWindow, month_windows};
use crate::config::Settings;
use crate::error::{StatsError, StatsResult};
use crate::series::{MeterSeries, PriceSeries, SeriesSourceExt};
use crate::solar::Observer;
use crate::statistic::{RunStamp, StatisticRow};
use crate::store::StatisticsStore;

pub type SharedSource = Arc<dyn SeriesSource + Send + Sync>;
pub type SharedStore = Arc<dyn StatisticsStore>;

/// Options for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Compute everything but write nothing.
    pub dry_run: bool,
    /// Reference instant for rolling windows and the rows' computation time.
    pub now: DateTime<Utc>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            now: Utc::now(),
        }
    }
}

/// A meter whose batch did not make it to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterFailure {
    pub series: String,
    pub error: String,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub meters: usize,
    pub rows_computed: usize,
    pub rows_written: usize,
    pub failures: Vec<MeterFailure>,
}

struct RunContext {
    source: SharedSource,
    store: SharedStore,
    stamp: RunStamp,
    tz: Tz,
    observer: Observer,
    window: (DateTime<Utc>, DateTime<Utc>),
    months: Vec<CalendarWindow>,
    analyses: Vec<Analysis>,
    evaluator: PricingEvaluator,
    model_prices: IndexMap<String, PriceSeries>,
    injection_prices: Option<PriceSeries>,
    dry_run: bool,
}

impl RunContext {
    fn runs(&self, analysis: Analysis) -> bool {
        self.analyses.contains(&analysis)
    }
}

struct MeterOutcome {
    computed: usize,
    written: usize,
}

/// Run every configured analysis for every meter.
///
/// Errors only when the run cannot start (bad window, source unreachable while listing meters).
/// Per-meter failures end up in [`RunSummary::failures`].
pub async fn run_analysis(
    settings: &Settings,
    source: SharedSource,
    store: SharedStore,
    opts: RunOptions,
) -> anyhow::Result<RunSummary> {
    let tz = settings.tz()?;
    let window = settings.window.resolve(opts.now, tz)?;
    let months = month_windows(window.0, window.1, tz)?;
    info!(from = %window.0, to = %window.1, months = months.len(), dry_run = opts.dry_run, "statistics run");

    let meters = source
        .list_series(&SeriesFilter::category(&settings.meters.category))
        .await
        .with_context(|| format!("list meters of category {}", settings.meters.category))?;

    // prices cover whole months so monthly averages are over complete months
    let cover = match (months.first(), months.last()) {
        (Some(first), Some(last)) => (first.start, last.end),
        _ => window,
    };
    let mut fetched = PriceCache::default();

    let mut models = Vec::new();
    let mut model_prices = IndexMap::new();
    if settings.runs(Analysis::Pricing) {
        for cfg in &settings.pricing_models {
            let Some(series) = fetched.get(source.as_ref(), &cfg.series, cover).await else {
                warn!(model = %cfg.name, series = %cfg.series, "price series unavailable; model skipped");
                continue;
            };
            let prices = match cfg.derive {
                PriceDerivation::None => series.clone(),
                PriceDerivation::MonthlyAverage => series.monthly_average(tz)?,
            };
            model_prices.insert(cfg.name.clone(), prices);
            models.push(cfg.to_model());
        }
    }
    let injection_prices = if settings.runs(Analysis::Injection) {
        let series = fetched.get(source.as_ref(), &settings.injection.price_series, cover).await;
        if series.is_none() {
            warn!(series = %settings.injection.price_series, "injection price series unavailable; split skipped");
        }
        series.cloned()
    } else {
        None
    };

    let ctx = Arc::new(RunContext {
        source,
        store,
        stamp: RunStamp::new(settings.site_id.clone(), opts.now),
        tz,
        observer: settings.observer,
        window,
        months,
        analyses: settings.analyses.clone(),
        evaluator: PricingEvaluator::new(models),
        model_prices,
        injection_prices,
        dry_run: opts.dry_run,
    });

    let mut summary = RunSummary {
        window: Some(window),
        meters: meters.len(),
        ..Default::default()
    };
    let mut tasks = JoinSet::new();
    for meta in meters {
        let ctx = Arc::clone(&ctx);
        tasks.spawn(async move {
            let name = meta.name.clone();
            // inner task so a panic is reported under the meter's name
            let outcome = match tokio::spawn(process_meter(ctx, meta)).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(e) => Err(format!("meter task aborted: {e}")),
            };
            (name, outcome)
        });
    }
    while let Some(joined) = tasks.join_next().await {
        let (series, outcome) = match joined {
            Ok(done) => done,
            Err(e) => ("<unknown>".to_string(), Err(format!("meter task aborted: {e}"))),
        };
        match outcome {
            Ok(outcome) => {
                summary.rows_computed += outcome.computed;
                summary.rows_written += outcome.written;
            }
            Err(error) => {
                warn!(%series, %error, "meter failed");
                summary.failures.push(MeterFailure { series, error });
            }
        }
    }
    info!(
        meters = summary.meters,
        rows_computed = summary.rows_computed,
        rows_written = summary.rows_written,
        failures = summary.failures.len(),
        "statistics run finished"
    );
    Ok(summary)
}

/// Price series fetched during one run, by name. Unavailable series are remembered as `None`.
#[derive(Default)]
struct PriceCache {
    by_name: IndexMap<String, Option<PriceSeries>>,
}

impl PriceCache {
    async fn get(
        &mut self,
        source: &(dyn SeriesSource + Send + Sync),
        name: &str,
        (from, to): (DateTime<Utc>, DateTime<Utc>),
    ) -> Option<&PriceSeries> {
        if !self.by_name.contains_key(name) {
            let fetched = match fetch_price_series(source, name, from, to).await {
                Ok(p) => p,
                Err(e) => {
                    warn!(series = %name, error = %e, "price series fetch failed");
                    None
                }
            };
            self.by_name.insert(name.to_string(), fetched);
        }
        self.by_name.get(name).and_then(Option::as_ref)
    }
}

async fn fetch_price_series(
    source: &(dyn SeriesSource + Send + Sync),
    name: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> StatsResult<Option<PriceSeries>> {
    let Some(meta) = source.list_series(&SeriesFilter::name(name)).await?.into_iter().next() else {
        return Ok(None);
    };
    let prices = source.get_price_series(&meta, from, to).await?;
    info!(series = %name, points = prices.points.len(), "prices loaded");
    Ok(Some(prices))
}

#[tracing::instrument(skip(ctx, meta), fields(series_id = meta.id, meter = %meta.name))]
async fn process_meter(ctx: Arc<RunContext>, meta: SeriesMeta) -> StatsResult<MeterOutcome> {
    let (from, to) = ctx.window;
    let meter = ctx.source.get_meter_series(&meta, from, to).await?;
    if meter.points.is_empty() {
        warn!("no readings in window");
        return Ok(MeterOutcome {
            computed: 0,
            written: 0,
        });
    }
    let rows = meter_rows(&ctx, &meter);
    let computed = rows.len();
    if ctx.dry_run {
        info!(rows = computed, "dry run; nothing written");
        return Ok(MeterOutcome { computed, written: 0 });
    }

    let store = Arc::clone(&ctx.store);
    let written = tokio::task::spawn_blocking(move || {
        store.register_series(std::slice::from_ref(&meta))?;
        store.upsert(&rows)
    })
    .await
    .map_err(|e| StatsError::Persistence(format!("store task failed: {e}")))??;
    info!(rows = written, "meter statistics stored");
    Ok(MeterOutcome { computed, written })
}

fn meter_rows(ctx: &RunContext, meter: &MeterSeries) -> Vec<StatisticRow> {
    let mut rows = Vec::new();
    if ctx.runs(Analysis::Pricing) {
        rows.extend(ctx.evaluator.evaluate(&ctx.stamp, meter, ctx.window, &ctx.model_prices));
    }
    if ctx.runs(Analysis::Peaks) {
        rows.extend(peak_rows(&ctx.stamp, meter, &ctx.months));
    }
    if ctx.runs(Analysis::Baseload) {
        rows.extend(baseload_rows(&ctx.stamp, meter, &ctx.months, &ctx.observer, ctx.tz));
    }
    if let Some(prices) = ctx.injection_prices.as_ref().filter(|_| ctx.runs(Analysis::Injection)) {
        match injection_rows(&ctx.stamp, meter, prices, &ctx.months) {
            Ok(r) => rows.extend(r),
            Err(e) => warn!(error = %e, "injection split skipped"),
        }
    }
    rows
}
