//! Typed meter and price series on the bucket axis.
//!
//! Raw [`DataPoint`]s carry positional values; this module resolves them by field name and
//! checks the invariants every analysis relies on: 15-minute aligned starts, strictly
//! ascending buckets, finite values.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use series_source::{DataPoint, SeriesMeta, SeriesSource};
use tracing::warn;

use crate::bucket::{Bucket, to_bucket, to_bucket_aligned};
use crate::calendar::{month_of, month_window};
use crate::error::{StatsError, StatsResult};

pub const OFFTAKE_FIELD: &str = "offtake";
pub const INJECTION_FIELD: &str = "injection";
pub const PRICE_FIELD: &str = "price";

/// Anything positioned on the bucket axis.
pub trait Bucketed {
    fn bucket(&self) -> Bucket;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterPoint {
    pub bucket: Bucket,
    /// Energy drawn from the grid in the bucket.
    pub offtake: f64,
    /// Energy exported to the grid in the bucket.
    pub injection: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub bucket: Bucket,
    pub price: f64,
}

impl Bucketed for MeterPoint {
    fn bucket(&self) -> Bucket {
        self.bucket
    }
}

impl Bucketed for PricePoint {
    fn bucket(&self) -> Bucket {
        self.bucket
    }
}

/// Readings of one meter over an analysis window.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterSeries {
    pub id: i64,
    pub name: String,
    pub points: Vec<MeterPoint>,
}

/// One price curve over an analysis window.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub id: i64,
    pub name: String,
    pub points: Vec<PricePoint>,
}

fn ensure_ascending<P: Bucketed>(name: &str, points: &[P]) -> StatsResult<()> {
    for pair in points.windows(2) {
        let (a, b) = (pair[0].bucket(), pair[1].bucket());
        if b <= a {
            return Err(StatsError::SeriesMismatch(format!(
                "series {name}: bucket {b} does not follow {a}"
            )));
        }
    }
    Ok(())
}

fn required_field(meta: &SeriesMeta, field: &str) -> StatsResult<usize> {
    meta.field_index(field).ok_or_else(|| {
        StatsError::SeriesMismatch(format!("series {} has no field {field:?}", meta.name))
    })
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn report_dropped(meta: &SeriesMeta, dropped: usize) {
    if dropped > 0 {
        warn!(series_id = meta.id, series = %meta.name, dropped, "dropped points with missing values");
    }
}

impl MeterSeries {
    /// Wrap already-typed points, checking bucket order.
    pub fn new(id: i64, name: impl Into<String>, points: Vec<MeterPoint>) -> StatsResult<Self> {
        let name = name.into();
        ensure_ascending(&name, &points)?;
        Ok(Self { id, name, points })
    }

    /// Typed view of raw readings.
    ///
    /// `offtake` is required in the layout; a meter without an `injection` field injects nothing.
    /// Points with a missing or non-finite value are dropped.
    pub fn from_datapoints(meta: &SeriesMeta, raw: &[DataPoint]) -> StatsResult<Self> {
        let offtake_idx = required_field(meta, OFFTAKE_FIELD)?;
        let injection_idx = meta.field_index(INJECTION_FIELD);

        let mut points = Vec::with_capacity(raw.len());
        let mut dropped = 0usize;
        for dp in raw {
            let bucket = to_bucket_aligned(dp.start)?;
            let offtake = finite(dp.value(offtake_idx));
            let injection = match injection_idx {
                Some(i) => finite(dp.value(i)),
                None => Some(0.0),
            };
            match (offtake, injection) {
                (Some(offtake), Some(injection)) => points.push(MeterPoint {
                    bucket,
                    offtake,
                    injection,
                }),
                _ => dropped += 1,
            }
        }
        report_dropped(meta, dropped);
        Self::new(meta.id, meta.name.clone(), points)
    }

    /// Whether any bucket exports energy.
    pub fn has_injection(&self) -> bool {
        self.points.iter().any(|p| p.injection > 0.0)
    }
}

impl PriceSeries {
    /// Wrap already-typed points, checking bucket order.
    pub fn new(id: i64, name: impl Into<String>, points: Vec<PricePoint>) -> StatsResult<Self> {
        let name = name.into();
        ensure_ascending(&name, &points)?;
        Ok(Self { id, name, points })
    }

    /// Typed view of raw readings; points without a finite price are dropped.
    pub fn from_datapoints(meta: &SeriesMeta, raw: &[DataPoint]) -> StatsResult<Self> {
        let price_idx = required_field(meta, PRICE_FIELD)?;
        let mut points = Vec::with_capacity(raw.len());
        let mut dropped = 0usize;
        for dp in raw {
            let bucket = to_bucket_aligned(dp.start)?;
            match finite(dp.value(price_idx)) {
                Some(price) => points.push(PricePoint { bucket, price }),
                None => dropped += 1,
            }
        }
        report_dropped(meta, dropped);
        Self::new(meta.id, meta.name.clone(), points)
    }

    /// One point per local calendar month: the mean price, placed on the month's first bucket.
    pub fn monthly_average(&self, tz: Tz) -> StatsResult<PriceSeries> {
        let mut points: Vec<PricePoint> = Vec::new();
        let mut current: Option<((i32, u32), f64, usize)> = None;
        for p in &self.points {
            let month = month_of(p.bucket.start_utc(), tz);
            if let Some((m, sum, n)) = current.as_mut() {
                if *m == month {
                    *sum += p.price;
                    *n += 1;
                    continue;
                }
            }
            if let Some((m, sum, n)) = current.take() {
                points.push(month_point(m, sum, n, tz)?);
            }
            current = Some((month, p.price, 1));
        }
        if let Some((m, sum, n)) = current {
            points.push(month_point(m, sum, n, tz)?);
        }
        PriceSeries::new(self.id, self.name.clone(), points)
    }
}

fn month_point((year, month): (i32, u32), sum: f64, n: usize, tz: Tz) -> StatsResult<PricePoint> {
    let window = month_window(year, month, tz)?;
    Ok(PricePoint {
        bucket: to_bucket(window.start)?,
        price: sum / n as f64,
    })
}

/// Typed fetches for every [`SeriesSource`].
#[async_trait]
pub trait SeriesSourceExt: SeriesSource + Sync {
    /// Meter readings of `meta` with `from <= start < to`.
    async fn get_meter_series(
        &self,
        meta: &SeriesMeta,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StatsResult<MeterSeries> {
        let raw = self.get_datapoints(meta.id, from, to).await?;
        MeterSeries::from_datapoints(meta, &raw)
    }

    /// Prices of `meta` with `from <= start < to`.
    async fn get_price_series(
        &self,
        meta: &SeriesMeta,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StatsResult<PriceSeries> {
        let raw = self.get_datapoints(meta.id, from, to).await?;
        PriceSeries::from_datapoints(meta, &raw)
    }
}

impl<T: SeriesSource + Sync + ?Sized> SeriesSourceExt for T {}
