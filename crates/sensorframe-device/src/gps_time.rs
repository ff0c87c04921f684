//! Approximate GPS time from the host clock.
//!
//! Receivers acquire faster when seeded with a rough week number and
//! time-of-week. The week is reported modulo 1024, as in the legacy
//! navigation message.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds between the Unix epoch and the GPS epoch (1980-01-06).
pub const GPS_EPOCH_UNIX: u64 = 315_964_800;

pub const SECONDS_PER_WEEK: u64 = 604_800;

/// GPS week (mod 1024) and seconds into that week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsTime {
    pub week_1024: u32,
    pub seconds: u32,
}

impl GpsTime {
    /// The receiver command that seeds this time.
    pub fn command(&self) -> String {
        format!("SETAPPROXTIME {} {}", self.week_1024, self.seconds)
    }
}

impl fmt::Display for GpsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "week {} + {}s", self.week_1024, self.seconds)
    }
}

/// Convert Unix seconds to approximate GPS time.
///
/// Returns `None` before the GPS epoch, and whenever the full week count or
/// the time-of-week is zero: a clock that reads zero there has almost
/// certainly never been set.
pub fn approx_gps_time(unix_secs: u64) -> Option<GpsTime> {
    let gps = unix_secs.checked_sub(GPS_EPOCH_UNIX)?;
    let week = gps / SECONDS_PER_WEEK;
    let seconds = gps % SECONDS_PER_WEEK;
    if week == 0 || seconds == 0 {
        return None;
    }

    Some(GpsTime {
        week_1024: (week % 1024) as u32,
        seconds: seconds as u32,
    })
}

/// Source of the current Unix time.
pub trait Clock {
    /// Seconds since the Unix epoch, or `None` if unavailable.
    fn unix_time(&self) -> Option<u64>;
}

/// Host wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_time(&self) -> Option<u64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|elapsed| elapsed.as_secs())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn unix_time(&self) -> Option<u64> {
        (**self).unix_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_known_instant() {
        // 2024-01-01T00:00:00Z is GPS week 2295, day 1.
        let time = approx_gps_time(1_704_067_200).unwrap();
        assert_eq!(time.week_1024, 2295 % 1024);
        assert_eq!(time.seconds, 86_400);
        assert_eq!(time.command(), "SETAPPROXTIME 247 86400");
    }

    #[test]
    fn rejects_before_epoch_and_zero_fields() {
        assert_eq!(approx_gps_time(0), None);
        assert_eq!(approx_gps_time(GPS_EPOCH_UNIX - 1), None);
        // Week zero.
        assert_eq!(approx_gps_time(GPS_EPOCH_UNIX + 1000), None);
        // Exactly on a week boundary.
        assert_eq!(approx_gps_time(GPS_EPOCH_UNIX + 3 * SECONDS_PER_WEEK), None);
    }

    #[test]
    fn week_rollover_keeps_validity_of_full_week() {
        // Full week 1024 maps to 0 but is still a valid time.
        let time = approx_gps_time(GPS_EPOCH_UNIX + 1024 * SECONDS_PER_WEEK + 5).unwrap();
        assert_eq!(time, GpsTime { week_1024: 0, seconds: 5 });
    }

    #[test]
    fn system_clock_is_after_gps_epoch() {
        let now = SystemClock.unix_time().unwrap();
        assert!(now > GPS_EPOCH_UNIX);
    }
}
