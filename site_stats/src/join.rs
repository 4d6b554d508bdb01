//! Alignment of two bucketed series.

use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::error::{StatsError, StatsResult};
use crate::series::Bucketed;

/// How secondary points are matched to primary buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// Keep only buckets present in both series.
    #[default]
    Inner,
    /// Carry each secondary point forward over every primary bucket until the next one.
    /// Primary buckets before the first secondary point are dropped.
    LeftFill,
}

/// One aligned bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aligned<P, S> {
    pub bucket: Bucket,
    pub primary: P,
    pub secondary: S,
}

impl<P, S> Bucketed for Aligned<P, S> {
    fn bucket(&self) -> Bucket {
        self.bucket
    }
}

/// Align `secondary` onto `primary`. Both inputs must be sorted ascending by bucket.
///
/// Errors with [`StatsError::SeriesMismatch`] when `primary` is empty.
pub fn join<P, S>(primary: &[P], secondary: &[S], mode: JoinMode) -> StatsResult<Vec<Aligned<P, S>>>
where
    P: Bucketed + Copy,
    S: Bucketed + Copy,
{
    if primary.is_empty() {
        return Err(StatsError::SeriesMismatch("primary series is empty".into()));
    }
    let mut out = Vec::with_capacity(primary.len());
    let mut j = 0usize;
    match mode {
        JoinMode::Inner => {
            for p in primary {
                let b = p.bucket();
                while j < secondary.len() && secondary[j].bucket() < b {
                    j += 1;
                }
                if let Some(s) = secondary.get(j).filter(|s| s.bucket() == b) {
                    out.push(Aligned {
                        bucket: b,
                        primary: *p,
                        secondary: *s,
                    });
                }
            }
        }
        JoinMode::LeftFill => {
            let mut current: Option<S> = None;
            for p in primary {
                let b = p.bucket();
                while j < secondary.len() && secondary[j].bucket() <= b {
                    current = Some(secondary[j]);
                    j += 1;
                }
                if let Some(s) = current {
                    out.push(Aligned {
                        bucket: b,
                        primary: *p,
                        secondary: s,
                    });
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{MeterPoint, PricePoint};

    fn meter(minutes: &[i64]) -> Vec<MeterPoint> {
        minutes
            .iter()
            .map(|m| MeterPoint {
                bucket: Bucket::from_minutes(*m).unwrap(),
                offtake: 1.0,
                injection: 0.0,
            })
            .collect()
    }

    fn prices(points: &[(i64, f64)]) -> Vec<PricePoint> {
        points
            .iter()
            .map(|(m, price)| PricePoint {
                bucket: Bucket::from_minutes(*m).unwrap(),
                price: *price,
            })
            .collect()
    }

    #[test]
    fn inner_keeps_common_buckets_only() {
        let got = join(&meter(&[0, 15, 30, 45]), &prices(&[(15, 1.0), (45, 3.0), (60, 4.0)]), JoinMode::Inner)
            .unwrap();
        let buckets: Vec<i64> = got.iter().map(|a| a.bucket.minutes()).collect();
        assert_eq!(buckets, [15, 45]);
        assert_eq!(got[1].secondary.price, 3.0);
    }

    #[test]
    fn left_fill_repeats_monthly_price_over_every_bucket() {
        // one price at the month start covers the whole 31-day month
        let month: Vec<i64> = (0..31 * 96).map(|i| 28_927_440 + i * 15).collect();
        let next_month = month[month.len() - 1] + 15;
        let got = join(
            &meter(&month),
            &prices(&[(28_927_440, 85.0), (next_month, 90.0)]),
            JoinMode::LeftFill,
        )
        .unwrap();
        assert_eq!(got.len(), month.len());
        assert!(got.iter().all(|a| a.secondary.price == 85.0));
    }

    #[test]
    fn left_fill_switches_when_superseded_and_skips_uncovered_head() {
        let got = join(&meter(&[0, 15, 30, 45]), &prices(&[(15, 1.0), (45, 2.0)]), JoinMode::LeftFill).unwrap();
        let pairs: Vec<(i64, f64)> = got.iter().map(|a| (a.bucket.minutes(), a.secondary.price)).collect();
        assert_eq!(pairs, [(15, 1.0), (30, 1.0), (45, 2.0)]);
    }

    #[test]
    fn empty_primary_is_a_mismatch() {
        let empty: Vec<MeterPoint> = Vec::new();
        assert!(matches!(
            join(&empty, &prices(&[(0, 1.0)]), JoinMode::Inner),
            Err(StatsError::SeriesMismatch(_))
        ));
        // empty secondary is not an error, just no overlap
        assert!(join(&meter(&[0]), &prices(&[]), JoinMode::Inner).unwrap().is_empty());
    }
}
