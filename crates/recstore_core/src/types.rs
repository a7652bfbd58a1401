//! Core type definitions for recstore.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A point in time, in milliseconds since the Unix epoch (UTC).
///
/// The default value is the epoch itself, which is what stub entities and
/// records inserted without a time carry.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Self = Self(0);

    /// Creates a timestamp from milliseconds since the epoch.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns milliseconds since the epoch.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the current time.
    #[must_use]
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Converts a `SystemTime`, saturating at the representable range.
    #[must_use]
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self(i64::try_from(after.as_millis()).unwrap_or(i64::MAX)),
            Err(before) => Self(
                i64::try_from(before.duration().as_millis())
                    .map(|m| -m)
                    .unwrap_or(i64::MIN),
            ),
        }
    }

    /// Converts back to a `SystemTime`.
    #[must_use]
    pub fn to_system_time(self) -> SystemTime {
        let magnitude = Duration::from_millis(self.0.unsigned_abs());
        if self.0 >= 0 {
            UNIX_EPOCH + magnitude
        } else {
            UNIX_EPOCH - magnitude
        }
    }

    /// Midnight UTC of the given calendar date.
    ///
    /// Returns `None` for an out-of-range month or day.
    #[must_use]
    pub fn from_date(year: i32, month: u32, day: u32) -> Option<Self> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return None;
        }
        Some(Self(days_from_civil(year, month, day) * 86_400_000))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

fn is_leap(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Days since 1970-01-01 in the proleptic Gregorian calendar.
fn days_from_civil(year: i32, month: u32, day: u32) -> i64 {
    let y = i64::from(year) - i64::from(month <= 2);
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = i64::from(month);
    let doy = (153 * (m + if m > 2 { -3 } else { 9 }) + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_epoch() {
        assert_eq!(Timestamp::default(), Timestamp::EPOCH);
        assert_eq!(Timestamp::EPOCH.to_system_time(), UNIX_EPOCH);
    }

    #[test]
    fn from_date_known_values() {
        assert_eq!(Timestamp::from_date(1970, 1, 1), Some(Timestamp::EPOCH));
        assert_eq!(
            Timestamp::from_date(1996, 3, 15),
            Some(Timestamp::from_millis(826_848_000_000))
        );
        assert_eq!(
            Timestamp::from_date(1969, 12, 31),
            Some(Timestamp::from_millis(-86_400_000))
        );
    }

    #[test]
    fn from_date_rejects_invalid() {
        assert_eq!(Timestamp::from_date(1996, 13, 1), None);
        assert_eq!(Timestamp::from_date(1995, 2, 29), None);
        assert_eq!(Timestamp::from_date(1996, 4, 0), None);
        assert!(Timestamp::from_date(1996, 2, 29).is_some());
    }

    #[test]
    fn system_time_roundtrip() {
        let ts = Timestamp::from_millis(1_700_000_000_123);
        assert_eq!(Timestamp::from_system_time(ts.to_system_time()), ts);

        let before = Timestamp::from_millis(-5_000);
        assert_eq!(Timestamp::from(before.to_system_time()), before);
    }

    #[test]
    fn ordering_follows_time() {
        let a = Timestamp::from_date(1996, 3, 15).unwrap();
        let b = Timestamp::from_date(1996, 3, 16).unwrap();
        assert!(a < b);
        assert!(Timestamp::now() > b);
    }
}
