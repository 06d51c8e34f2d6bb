//! UPS status text and the status flag bitmask.

use core::fmt;

/// The `STATUS` word reported by the daemon.
///
/// The set is open: drivers emit combinations such as `ONLINE LOWBATT` or
/// vendor specific words, so anything other than the two exact states the
/// exporter distinguishes is kept verbatim in [`UpsStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum UpsStatus {
    /// `ONLINE`
    Online,
    /// `ONBATT`
    OnBattery,
    /// Any other status text.
    Other(String),
}

impl UpsStatus {
    /// The status text as reported.
    pub fn as_str(&self) -> &str {
        match self {
            UpsStatus::Online => "ONLINE",
            UpsStatus::OnBattery => "ONBATT",
            UpsStatus::Other(text) => text,
        }
    }

    /// Numeric encoding used for the status gauge.
    ///
    /// `ONLINE` is 1, `ONBATT` is 2, everything else is -1.
    pub fn metric_value(&self) -> f64 {
        match self {
            UpsStatus::Online => 1.0,
            UpsStatus::OnBattery => 2.0,
            UpsStatus::Other(_) => -1.0,
        }
    }
}

impl From<&str> for UpsStatus {
    fn from(text: &str) -> Self {
        match text {
            "ONLINE" => UpsStatus::Online,
            "ONBATT" => UpsStatus::OnBattery,
            other => UpsStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for UpsStatus {
    fn from(text: String) -> Self {
        match text.as_str() {
            "ONLINE" => UpsStatus::Online,
            "ONBATT" => UpsStatus::OnBattery,
            _ => UpsStatus::Other(text),
        }
    }
}

impl From<UpsStatus> for String {
    fn from(status: UpsStatus) -> Self {
        match status {
            UpsStatus::Other(text) => text,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for UpsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `STATFLAG` bitmask.
///
/// `STATUS` is the human readable rendering of these bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StatusFlags(pub i64);

impl StatusFlags {
    /// Running on line power.
    pub const ONLINE: i64 = 0x0000_0008;
    /// Running on battery.
    pub const ON_BATTERY: i64 = 0x0000_0010;
    /// Output overloaded.
    pub const OVERLOAD: i64 = 0x0000_0020;
    /// Battery charge is low.
    pub const BATTERY_LOW: i64 = 0x0000_0040;
    /// Battery needs replacing.
    pub const REPLACE_BATTERY: i64 = 0x0000_0080;
    /// The daemon lost communication with the UPS.
    pub const COMM_LOST: i64 = 0x0000_0100;

    /// The raw bitmask.
    pub const fn bits(&self) -> i64 {
        self.0
    }

    /// Check whether every bit of `flag` is set.
    pub const fn contains(&self, flag: i64) -> bool {
        self.0 & flag == flag
    }

    /// Shorthand for [`StatusFlags::ONLINE`].
    pub const fn is_online(&self) -> bool {
        self.contains(Self::ONLINE)
    }

    /// Shorthand for [`StatusFlags::ON_BATTERY`].
    pub const fn is_on_battery(&self) -> bool {
        self.contains(Self::ON_BATTERY)
    }
}

impl From<i64> for StatusFlags {
    fn from(bits: i64) -> Self {
        StatusFlags(bits)
    }
}

impl fmt::Display for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
