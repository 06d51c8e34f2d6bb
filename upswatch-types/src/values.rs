//! Value types with explicit sentinels.

use chrono::{DateTime, NaiveDate, Utc};

/// A point in time reported by the daemon.
///
/// Fields that may legitimately carry `N/A` (manufacture date, last transfer
/// times) decode that literal to [`Timestamp::Unknown`]. A field whose key was
/// never reported is `None` at the record level instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Timestamp {
    /// A concrete instant, normalized to UTC.
    At(DateTime<Utc>),
    /// The daemon reported the value as not available.
    Unknown,
}

impl Timestamp {
    /// Midnight UTC on the given calendar date.
    ///
    /// Date-only fields (manufacture and battery replacement dates) carry no
    /// time of day, so they are anchored here.
    pub fn from_date(date: NaiveDate) -> Self {
        Timestamp::At(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// The instant, if known.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::At(at) => Some(*at),
            Timestamp::Unknown => None,
        }
    }

    /// Seconds since the Unix epoch, if known.
    pub fn unix_seconds(&self) -> Option<i64> {
        self.instant().map(|at| at.timestamp())
    }

    /// Returns true for the `N/A` sentinel.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Timestamp::Unknown)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Timestamp::At(at)
    }
}

/// Delay between alarm beeps while on battery (`ALARMDEL`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlarmInterval {
    /// Beep every this many seconds.
    Seconds(f64),
    /// The daemon reported `No alarm`.
    Disabled,
}

impl AlarmInterval {
    /// The interval in seconds, or `None` when the alarm is disabled.
    pub fn seconds(&self) -> Option<f64> {
        match self {
            AlarmInterval::Seconds(secs) => Some(*secs),
            AlarmInterval::Disabled => None,
        }
    }
}
