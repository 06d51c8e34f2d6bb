//! Status report decoder.
//!
//! A report is a block of `KEY : value` lines. Values carry unit labels
//! (`230.0 Volts`), free text, hexadecimal flags, and dates in several
//! formats depending on the UPS firmware. Decoding is table driven: each known
//! key maps to a [`Field`] that pairs a conversion with the record field it
//! fills. Unknown keys are skipped so newer daemons keep working.

use chrono::{DateTime, NaiveDate, Utc};
use upswatch_types::{AlarmInterval, StatusFlags, StatusRecord, Timestamp, UpsStatus};

use crate::DecodeError;

/// Unit labels stripped from the end of a value. At most one is removed.
const UNIT_SUFFIXES: &[&str] = &[
    " Volts", " Seconds", " Minutes", " Percent", " Watts", " Hz", " C",
];

/// Format of full timestamps such as `2024-03-15 10:20:03 +0000`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Date-only formats in the order they are tried, with the exact text length
/// each one accepts. chrono reads `%Y` and `%m` with flexible widths, so the
/// length pins `03/15/24` to the two-digit-year format.
const DATE_FORMATS: &[(&str, usize)] = &[("%Y-%m-%d", 10), ("%m/%d/%Y", 10), ("%m/%d/%y", 8)];

/// Literal used for dates the UPS cannot supply.
const NOT_AVAILABLE: &str = "N/A";

/// Literal `ALARMDEL` value for a silenced alarm.
const NO_ALARM: &str = "No alarm";

/// How a value is converted and which record field receives it.
///
/// Each accessor returns the target field; the conversion decides what is
/// written into it.
enum Field {
    Text(fn(&mut StatusRecord) -> &mut Option<String>),
    Number(fn(&mut StatusRecord) -> &mut Option<f64>),
    Count(fn(&mut StatusRecord) -> &mut Option<i64>),
    /// Full timestamp; `N/A` accepted when the flag is set.
    Time(bool, fn(&mut StatusRecord) -> &mut Option<Timestamp>),
    /// Date only; `N/A` accepted when the flag is set.
    Date(bool, fn(&mut StatusRecord) -> &mut Option<Timestamp>),
    Status,
    Flags,
    Alarm,
}

static FIELDS: &[(&str, Field)] = &[
    ("DATE", Field::Time(false, |r| &mut r.observed_at)),
    // UPS
    ("UPSNAME", Field::Text(|r| &mut r.ups.name)),
    ("STATUS", Field::Status),
    ("STATFLAG", Field::Flags),
    ("MODEL", Field::Text(|r| &mut r.ups.model)),
    ("FIRMWARE", Field::Text(|r| &mut r.ups.firmware)),
    ("SERIALNO", Field::Text(|r| &mut r.ups.serial_number)),
    ("MANDATE", Field::Date(true, |r| &mut r.ups.manufactured_at)),
    ("LOADPCT", Field::Number(|r| &mut r.ups.load_percent)),
    ("LINEV", Field::Number(|r| &mut r.ups.line_voltage)),
    ("MAXLINEV", Field::Number(|r| &mut r.ups.max_line_voltage)),
    ("MINLINEV", Field::Number(|r| &mut r.ups.min_line_voltage)),
    ("OUTPUTV", Field::Number(|r| &mut r.ups.output_voltage)),
    ("LINEFREQ", Field::Number(|r| &mut r.ups.line_frequency)),
    ("SENSE", Field::Text(|r| &mut r.ups.line_sensitivity)),
    ("ALARMDEL", Field::Alarm),
    ("SELFTEST", Field::Text(|r| &mut r.ups.self_test_result)),
    ("STESTI", Field::Number(|r| &mut r.ups.self_test_interval_hours)),
    ("ITEMP", Field::Number(|r| &mut r.ups.internal_temperature)),
    // Battery
    ("BCHARGE", Field::Number(|r| &mut r.ups.battery.charge_percent)),
    ("TIMELEFT", Field::Number(|r| &mut r.ups.battery.remaining_runtime_minutes)),
    ("BATTV", Field::Number(|r| &mut r.ups.battery.voltage)),
    ("BATTDATE", Field::Date(false, |r| &mut r.ups.battery.replaced_at)),
    ("DLOWBATT", Field::Number(|r| &mut r.ups.battery.low_threshold_minutes)),
    ("EXTBATTS", Field::Count(|r| &mut r.ups.battery.external_count)),
    // Nominal ratings
    ("NOMINV", Field::Number(|r| &mut r.ups.nominal.input_voltage)),
    ("NOMBATTV", Field::Number(|r| &mut r.ups.nominal.battery_voltage)),
    ("NOMPOWER", Field::Number(|r| &mut r.ups.nominal.power_watts)),
    // Daemon
    ("HOSTNAME", Field::Text(|r| &mut r.daemon.host_name)),
    ("VERSION", Field::Text(|r| &mut r.daemon.version)),
    ("STARTTIME", Field::Time(false, |r| &mut r.daemon.started_at)),
    ("DRIVER", Field::Text(|r| &mut r.daemon.driver)),
    ("CABLE", Field::Text(|r| &mut r.daemon.config.cable)),
    ("UPSMODE", Field::Text(|r| &mut r.daemon.config.operating_mode)),
    ("MBATTCHG", Field::Number(|r| &mut r.daemon.config.min_battery_charge_percent)),
    ("MINTIMEL", Field::Number(|r| &mut r.daemon.config.min_runtime_minutes)),
    ("MAXTIME", Field::Number(|r| &mut r.daemon.config.max_time_on_battery_seconds)),
    // Transfers
    ("NUMXFERS", Field::Count(|r| &mut r.daemon.transfers.count)),
    ("LASTXFER", Field::Text(|r| &mut r.daemon.transfers.last_reason)),
    ("XONBATT", Field::Time(true, |r| &mut r.daemon.transfers.last_on_battery_at)),
    ("XOFFBATT", Field::Time(true, |r| &mut r.daemon.transfers.last_off_battery_at)),
    ("LOTRANS", Field::Number(|r| &mut r.daemon.transfers.low_voltage)),
    ("HITRANS", Field::Number(|r| &mut r.daemon.transfers.high_voltage)),
    ("TONBATT", Field::Number(|r| &mut r.daemon.time_on_battery.current_seconds)),
    ("CUMONBATT", Field::Number(|r| &mut r.daemon.time_on_battery.cumulative_seconds)),
];

fn lookup(key: &str) -> Option<&'static Field> {
    FIELDS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, field)| field)
}

/// Decode a complete status report.
///
/// Any malformed value for a known key fails the whole report; a partially
/// filled record is never returned.
pub fn decode(text: &str) -> Result<StatusRecord, DecodeError> {
    let mut record = StatusRecord::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (key, value) = split_line(line).ok_or_else(|| DecodeError::MissingSeparator {
            line_number: index + 1,
            line: line.to_string(),
        })?;
        let value = strip_unit(value);

        match lookup(key) {
            Some(field) => apply(&mut record, field, key, value)?,
            None => tracing::trace!(key, "ignoring unrecognised status key"),
        }
    }

    Ok(record)
}

/// Split a line on its first `:` and trim both halves.
pub fn split_line(line: &str) -> Option<(&str, &str)> {
    line.split_once(':')
        .map(|(key, value)| (key.trim(), value.trim()))
}

/// Remove one trailing unit label, if present.
pub fn strip_unit(value: &str) -> &str {
    UNIT_SUFFIXES
        .iter()
        .find_map(|suffix| value.strip_suffix(suffix))
        .unwrap_or(value)
}

fn apply(record: &mut StatusRecord, field: &Field, key: &str, value: &str) -> Result<(), DecodeError> {
    match field {
        Field::Text(target) => *target(record) = Some(value.to_string()),
        Field::Number(target) => *target(record) = parse_number(key, value)?,
        Field::Count(target) => *target(record) = parse_count(key, value)?,
        Field::Time(allow_na, target) => {
            *target(record) = Some(parse_timestamp(key, value, *allow_na)?)
        }
        Field::Date(allow_na, target) => *target(record) = Some(parse_date(key, value, *allow_na)?),
        Field::Status => record.ups.status = Some(UpsStatus::from(value)),
        Field::Flags => record.ups.status_flags = Some(parse_flags(key, value)?),
        Field::Alarm => {
            record.ups.alarm_interval = if value == NO_ALARM {
                Some(AlarmInterval::Disabled)
            } else {
                parse_number(key, value)?.map(AlarmInterval::Seconds)
            }
        }
    }
    Ok(())
}

/// Reduce a value to the characters of a decimal number.
///
/// Everything except digits and `.` is dropped, runs of `.` collapse to one,
/// and leading or trailing points are trimmed.
pub fn numeric_text(value: &str) -> String {
    let mut digits = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '0'..='9' => digits.push(c),
            '.' if !digits.ends_with('.') => digits.push(c),
            _ => {}
        }
    }
    digits.trim_matches('.').trim().to_string()
}

/// Lenient float parse. `Ok(None)` when nothing numeric is left.
fn parse_number(key: &str, value: &str) -> Result<Option<f64>, DecodeError> {
    let digits = numeric_text(value);
    if digits.is_empty() {
        return Ok(None);
    }

    digits
        .parse::<f64>()
        .map(Some)
        .map_err(|_| DecodeError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// Lenient integer parse for counters; `3.0` is accepted, `3.5` is not.
fn parse_count(key: &str, value: &str) -> Result<Option<i64>, DecodeError> {
    let invalid = || DecodeError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    };

    let digits = numeric_text(value);
    if digits.is_empty() {
        return Ok(None);
    }
    if let Ok(count) = digits.parse::<i64>() {
        return Ok(Some(count));
    }

    match digits.parse::<f64>() {
        Ok(n) if n.fract() == 0.0 && n <= i64::MAX as f64 => Ok(Some(n as i64)),
        _ => Err(invalid()),
    }
}

/// Base-16 parse of the first token, with an optional `0x` prefix.
fn parse_flags(key: &str, value: &str) -> Result<StatusFlags, DecodeError> {
    let token = value.split_whitespace().next().unwrap_or("");
    let hex = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);

    i64::from_str_radix(hex, 16)
        .map(StatusFlags)
        .map_err(|_| DecodeError::InvalidFlags {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn parse_timestamp(key: &str, value: &str, allow_na: bool) -> Result<Timestamp, DecodeError> {
    if allow_na && value == NOT_AVAILABLE {
        return Ok(Timestamp::Unknown);
    }

    DateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|at| Timestamp::At(at.with_timezone(&Utc)))
        .map_err(|_| DecodeError::InvalidDate {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn parse_date(key: &str, value: &str, allow_na: bool) -> Result<Timestamp, DecodeError> {
    if allow_na && value == NOT_AVAILABLE {
        return Ok(Timestamp::Unknown);
    }

    DATE_FORMATS
        .iter()
        .filter(|(_, len)| value.len() == *len)
        .find_map(|(format, _)| NaiveDate::parse_from_str(value, format).ok())
        .map(Timestamp::from_date)
        .ok_or_else(|| DecodeError::InvalidDate {
            key: key.to_string(),
            value: value.to_string(),
        })
}
