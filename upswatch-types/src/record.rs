//! StatusRecord - one decoded status report.
//!
//! Field documentation names the NIS key each field is decoded from. See the
//! apcupsd manual, "Status report fields", for the daemon's own descriptions.

use crate::{AlarmInterval, StatusFlags, Timestamp, UpsStatus};

/// A decoded status report.
///
/// Built fresh for every fetch and never mutated once returned. Data reported
/// by the UPS itself lives under [`StatusRecord::ups`]; values that describe
/// the daemon, its configuration and its bookkeeping live under
/// [`StatusRecord::daemon`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusRecord {
    /// When the daemon last obtained data from the UPS (`DATE`).
    pub observed_at: Option<Timestamp>,

    /// Data reported by the UPS.
    pub ups: UpsInfo,

    /// Data reported by the daemon.
    pub daemon: DaemonInfo,
}

impl StatusRecord {
    /// Create an empty record with every field absent.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Values reported by the UPS.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpsInfo {
    /// `UPSNAME`, from the EEPROM or the configuration file.
    pub name: Option<String>,
    /// `STATUS`
    pub status: Option<UpsStatus>,
    /// `STATFLAG`
    pub status_flags: Option<StatusFlags>,
    /// `MODEL`
    pub model: Option<String>,
    /// `FIRMWARE`
    pub firmware: Option<String>,
    /// `SERIALNO`
    pub serial_number: Option<String>,
    /// `MANDATE`
    pub manufactured_at: Option<Timestamp>,

    /// `LOADPCT`
    pub load_percent: Option<f64>,
    /// `LINEV`
    pub line_voltage: Option<f64>,
    /// `MAXLINEV`, since the last status poll.
    pub max_line_voltage: Option<f64>,
    /// `MINLINEV`, since the last status poll.
    pub min_line_voltage: Option<f64>,
    /// `OUTPUTV`
    pub output_voltage: Option<f64>,
    /// `LINEFREQ`, in hertz.
    pub line_frequency: Option<f64>,
    /// `SENSE`
    pub line_sensitivity: Option<String>,

    /// `ALARMDEL`
    pub alarm_interval: Option<AlarmInterval>,
    /// `SELFTEST`
    pub self_test_result: Option<String>,
    /// `STESTI`, in hours.
    pub self_test_interval_hours: Option<f64>,
    /// `ITEMP`, in degrees Celsius.
    pub internal_temperature: Option<f64>,

    pub battery: BatteryInfo,
    pub nominal: NominalRatings,
}

/// Battery values reported by the UPS.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatteryInfo {
    /// `BCHARGE`
    pub charge_percent: Option<f64>,
    /// `TIMELEFT`
    pub remaining_runtime_minutes: Option<f64>,
    /// `BATTV`
    pub voltage: Option<f64>,
    /// `BATTDATE`
    pub replaced_at: Option<Timestamp>,
    /// `DLOWBATT`: remaining runtime below which the UPS signals low battery.
    pub low_threshold_minutes: Option<f64>,
    /// `EXTBATTS`
    pub external_count: Option<i64>,
}

/// Ratings the UPS is configured to expect.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NominalRatings {
    /// `NOMINV`
    pub input_voltage: Option<f64>,
    /// `NOMBATTV`
    pub battery_voltage: Option<f64>,
    /// `NOMPOWER`
    pub power_watts: Option<f64>,
}

/// Values reported by the daemon about itself.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DaemonInfo {
    /// `HOSTNAME`
    pub host_name: Option<String>,
    /// `VERSION`
    pub version: Option<String>,
    /// `STARTTIME`
    pub started_at: Option<Timestamp>,
    /// `DRIVER`
    pub driver: Option<String>,

    pub config: DaemonConfig,
    pub transfers: TransferInfo,
    pub time_on_battery: TimeOnBattery,
}

/// Values the daemon echoes from its configuration file.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DaemonConfig {
    /// `CABLE`
    pub cable: Option<String>,
    /// `UPSMODE`
    pub operating_mode: Option<String>,
    /// `MBATTCHG`: shut down when the charge drops below this.
    pub min_battery_charge_percent: Option<f64>,
    /// `MINTIMEL`: shut down when the runtime drops to this.
    pub min_runtime_minutes: Option<f64>,
    /// `MAXTIME`: shut down after this long on battery; zero disables.
    pub max_time_on_battery_seconds: Option<f64>,
}

/// Transfers to and from battery.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransferInfo {
    /// `NUMXFERS`, since the daemon started.
    pub count: Option<i64>,
    /// `LASTXFER`
    pub last_reason: Option<String>,
    /// `XONBATT`
    pub last_on_battery_at: Option<Timestamp>,
    /// `XOFFBATT`
    pub last_off_battery_at: Option<Timestamp>,
    /// `LOTRANS`
    pub low_voltage: Option<f64>,
    /// `HITRANS`
    pub high_voltage: Option<f64>,
}

/// Time spent on battery, in seconds.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeOnBattery {
    /// `TONBATT`, zero while on line power.
    pub current_seconds: Option<f64>,
    /// `CUMONBATT`, since the daemon started.
    pub cumulative_seconds: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_empty() {
        let record = StatusRecord::new();
        assert!(record.observed_at.is_none());
        assert!(record.ups.status.is_none());
        assert!(record.ups.battery.charge_percent.is_none());
        assert!(record.daemon.transfers.count.is_none());
        assert_eq!(record, StatusRecord::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let mut record = StatusRecord::new();
        record.ups.status = Some(UpsStatus::Online);
        record.ups.status_flags = Some(StatusFlags(0x0500_0008));
        record.ups.alarm_interval = Some(AlarmInterval::Disabled);
        record.ups.battery.charge_percent = Some(100.0);
        record.daemon.transfers.count = Some(3);
        record.daemon.transfers.last_off_battery_at = Some(Timestamp::Unknown);

        let json = serde_json::to_string(&record).unwrap();
        let parsed: StatusRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(record, parsed);
    }
}
