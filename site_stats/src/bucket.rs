//! bucket.rs: 15-minute UTC bucket mapping
//!
//! - One stable epoch: Unix (1970-01-01T00:00:00Z). Earlier instants are rejected.
//! - A [`Bucket`] is identified by its start expressed as whole minutes since the
//!   epoch, so every bucket value is a multiple of [`BUCKET_MINUTES`].
//! - All functions take and return UTC; local time only enters through [`crate::tz`].

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::error::{StatsError, StatsResult};

/// Unix epoch start (1970-01-01T00:00:00Z).
pub const EPOCH_UNIX: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Number of seconds in a minute.
pub const SECS_PER_MINUTE: i64 = 60;
/// Width of one bucket in minutes.
pub const BUCKET_MINUTES: i64 = 15;
/// Width of one bucket in seconds.
pub const BUCKET_SECS: i64 = BUCKET_MINUTES * SECS_PER_MINUTE;
/// Buckets per hour; scales a 15-minute energy reading to average power.
pub const BUCKETS_PER_HOUR: i64 = 60 / BUCKET_MINUTES;

/// A 15-minute slot, identified by its start in minutes since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bucket(i64);

impl Bucket {
    /// Bucket starting `minutes` after the epoch.
    ///
    /// Errors with [`StatsError::InvalidTimestamp`] if `minutes` is negative or
    /// not a multiple of [`BUCKET_MINUTES`].
    pub fn from_minutes(minutes: i64) -> StatsResult<Self> {
        if minutes < 0 {
            return Err(StatsError::InvalidTimestamp(format!(
                "bucket minute {minutes} precedes the epoch"
            )));
        }
        if minutes.rem_euclid(BUCKET_MINUTES) != 0 {
            return Err(StatsError::InvalidTimestamp(format!(
                "minute {minutes} is not aligned to {BUCKET_MINUTES}-minute buckets"
            )));
        }
        Ok(Self(minutes))
    }

    /// Minutes since the epoch of the bucket start.
    pub const fn minutes(self) -> i64 {
        self.0
    }

    /// The bucket `n` slots later (earlier for negative `n`).
    pub const fn offset(self, n: i64) -> Self {
        Self(self.0 + n * BUCKET_MINUTES)
    }

    /// The following bucket.
    pub const fn next(self) -> Self {
        self.offset(1)
    }

    /// UTC start instant of the bucket.
    pub fn start_utc(self) -> DateTime<Utc> {
        from_bucket(self)
    }

    /// Exclusive UTC end instant (start + 15 minutes).
    pub fn end_exclusive_utc(self) -> DateTime<Utc> {
        from_bucket(self.next())
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::tz::to_rfc3339_millis(self.start_utc()))
    }
}

/// Floor a UTC instant to the bucket containing it.
pub fn to_bucket(ts_utc: DateTime<Utc>) -> StatsResult<Bucket> {
    if ts_utc < EPOCH_UNIX {
        return Err(StatsError::InvalidTimestamp(format!(
            "{ts_utc} precedes the epoch"
        )));
    }
    let secs = ts_utc.signed_duration_since(EPOCH_UNIX).num_seconds();
    Ok(Bucket(secs.div_euclid(BUCKET_SECS) * BUCKET_MINUTES))
}

/// Like [`to_bucket`], but rejects instants that are not exactly on a bucket boundary.
pub fn to_bucket_aligned(ts_utc: DateTime<Utc>) -> StatsResult<Bucket> {
    let bucket = to_bucket(ts_utc)?;
    if from_bucket(bucket) != ts_utc {
        return Err(StatsError::InvalidTimestamp(format!(
            "{ts_utc} is not aligned to {BUCKET_MINUTES}-minute buckets"
        )));
    }
    Ok(bucket)
}

/// UTC start instant of a bucket. Exact inverse of [`to_bucket`] on aligned input.
pub fn from_bucket(bucket: Bucket) -> DateTime<Utc> {
    EPOCH_UNIX + Duration::minutes(bucket.0)
}
