use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use site_stats::bucket::{BUCKET_MINUTES, Bucket, from_bucket, to_bucket, to_bucket_aligned};
use site_stats::calendar::month_windows;
use site_stats::tz::parse_tz;

// 1970 .. ~2100, in seconds
const MAX_SECS: i64 = 4_102_444_800;

fn instant(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(secs)
}

proptest! {
    #[test]
    fn aligned_instants_roundtrip(slot in 0i64..MAX_SECS / 900) {
        let t = instant(slot * 900);
        let b = to_bucket_aligned(t).unwrap();
        prop_assert_eq!(from_bucket(b), t);
        prop_assert_eq!(b.minutes() % BUCKET_MINUTES, 0);
    }

    #[test]
    fn floor_stays_inside_its_bucket(secs in 0i64..MAX_SECS) {
        let t = instant(secs);
        let b = to_bucket(t).unwrap();
        prop_assert!(b.start_utc() <= t && t < b.end_exclusive_utc());
        prop_assert_eq!(Bucket::from_minutes(b.minutes()).unwrap(), b);
    }

    #[test]
    fn month_windows_tile_the_interval(start in 0i64..MAX_SECS - 40_000_000, len in 1i64..40_000_000) {
        let tz = parse_tz("Europe/Brussels").unwrap();
        let (from, to) = (instant(start), instant(start + len));
        let windows = month_windows(from, to, tz).unwrap();
        prop_assert!(!windows.is_empty());
        prop_assert!(windows[0].start <= from);
        prop_assert!(windows[windows.len() - 1].end >= to);
        for pair in windows.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
    }
}
