//! The gauges published for every status record.
//!
//! Each [`Gauge`] names a metric and extracts its value from a
//! [`StatusRecord`]. Full names are `<namespace>_<subsystem>_<name>`, or
//! `<namespace>_<name>` for gauges outside a subsystem.

use upswatch_types::{AlarmInterval, StatusRecord, Timestamp};

use crate::{GaugeRegistry, GaugeSink};

/// One published gauge.
#[derive(Debug, Clone, Copy)]
pub struct Gauge {
    pub subsystem: Option<&'static str>,
    pub name: &'static str,
    pub help: &'static str,
    /// `None` clears the gauge.
    pub value: fn(&StatusRecord) -> Option<f64>,
}

impl Gauge {
    /// Full metric name under `namespace`.
    pub fn full_name(&self, namespace: &str) -> String {
        let mut parts = Vec::with_capacity(3);
        if !namespace.is_empty() {
            parts.push(namespace);
        }
        if let Some(subsystem) = self.subsystem {
            parts.push(subsystem);
        }
        parts.push(self.name);
        parts.join("_")
    }
}

/// Reports whether the last collection succeeded. Not derived from the record.
pub const UP: Gauge = Gauge {
    subsystem: None,
    name: "up",
    help: "Whether the last status fetch succeeded (1) or failed (0).",
    value: |_| Some(1.0),
};

fn seconds(timestamp: &Option<Timestamp>) -> Option<f64> {
    timestamp
        .as_ref()
        .and_then(Timestamp::unix_seconds)
        .map(|s| s as f64)
}

fn count(count: Option<i64>) -> Option<f64> {
    count.map(|c| c as f64)
}

/// Every gauge derived from a [`StatusRecord`].
pub static GAUGES: &[Gauge] = &[
    Gauge {
        subsystem: None,
        name: "status",
        help: "The current status: 1 online, 2 on battery, -1 anything else.",
        value: |r| r.ups.status.as_ref().map(|s| s.metric_value()),
    },
    Gauge {
        subsystem: None,
        name: "status_flags",
        help: "The status bitmask reported by the UPS.",
        value: |r| r.ups.status_flags.map(|f| f.bits() as f64),
    },
    Gauge {
        subsystem: None,
        name: "observed_timestamp_seconds",
        help: "When the daemon last obtained data from the UPS, as a Unix timestamp.",
        value: |r| seconds(&r.observed_at),
    },
    Gauge {
        subsystem: None,
        name: "temperature_celsius",
        help: "The internal temperature of the UPS.",
        value: |r| r.ups.internal_temperature,
    },
    Gauge {
        subsystem: None,
        name: "alarm_interval_seconds",
        help: "Delay before the UPS sounds its alarm on power loss; -1 when the alarm is disabled.",
        value: |r| {
            r.ups.alarm_interval.map(|alarm| match alarm {
                AlarmInterval::Seconds(s) => s,
                AlarmInterval::Disabled => -1.0,
            })
        },
    },
    Gauge {
        subsystem: None,
        name: "self_test_interval_hours",
        help: "Hours between automatic self tests.",
        value: |r| r.ups.self_test_interval_hours,
    },
    Gauge {
        subsystem: None,
        name: "manufactured_timestamp_seconds",
        help: "When the UPS was manufactured, as a Unix timestamp.",
        value: |r| seconds(&r.ups.manufactured_at),
    },
    // Power
    Gauge {
        subsystem: Some("power"),
        name: "input_expect_voltage",
        help: "The expected input voltage.",
        value: |r| r.ups.nominal.input_voltage,
    },
    Gauge {
        subsystem: Some("power"),
        name: "output_maximum_wattage",
        help: "The maximum power the UPS can output.",
        value: |r| r.ups.nominal.power_watts,
    },
    Gauge {
        subsystem: Some("power"),
        name: "line_voltage",
        help: "The current line voltage.",
        value: |r| r.ups.line_voltage,
    },
    Gauge {
        subsystem: Some("power"),
        name: "line_maximum_voltage",
        help: "The highest line voltage seen since the last poll.",
        value: |r| r.ups.max_line_voltage,
    },
    Gauge {
        subsystem: Some("power"),
        name: "line_minimum_voltage",
        help: "The lowest line voltage seen since the last poll.",
        value: |r| r.ups.min_line_voltage,
    },
    Gauge {
        subsystem: Some("power"),
        name: "line_frequency_hertz",
        help: "The current line frequency.",
        value: |r| r.ups.line_frequency,
    },
    Gauge {
        subsystem: Some("power"),
        name: "output_voltage",
        help: "The voltage the UPS is supplying to its load.",
        value: |r| r.ups.output_voltage,
    },
    Gauge {
        subsystem: Some("power"),
        name: "load_percent",
        help: "The load as estimated by the UPS, as a percentage of capacity.",
        value: |r| r.ups.load_percent,
    },
    Gauge {
        subsystem: Some("power"),
        name: "transfer_low_voltage",
        help: "Line voltage below which the UPS switches to battery.",
        value: |r| r.daemon.transfers.low_voltage,
    },
    Gauge {
        subsystem: Some("power"),
        name: "transfer_high_voltage",
        help: "Line voltage above which the UPS switches to battery.",
        value: |r| r.daemon.transfers.high_voltage,
    },
    // Battery
    Gauge {
        subsystem: Some("battery"),
        name: "output_expect_voltage",
        help: "The expected output voltage of the battery.",
        value: |r| r.ups.nominal.battery_voltage,
    },
    Gauge {
        subsystem: Some("battery"),
        name: "output_actual_voltage",
        help: "The actual output voltage of the battery.",
        value: |r| r.ups.battery.voltage,
    },
    Gauge {
        subsystem: Some("battery"),
        name: "time_spent_latest_seconds",
        help: "Time spent on battery during the current transfer; zero on line power.",
        value: |r| r.daemon.time_on_battery.current_seconds,
    },
    Gauge {
        subsystem: Some("battery"),
        name: "time_spent_total_seconds",
        help: "Total time spent on battery since the daemon started.",
        value: |r| r.daemon.time_on_battery.cumulative_seconds,
    },
    Gauge {
        subsystem: Some("battery"),
        name: "remaining_charge_percent",
        help: "The remaining battery charge, as a percentage.",
        value: |r| r.ups.battery.charge_percent,
    },
    Gauge {
        subsystem: Some("battery"),
        name: "remaining_time_minutes",
        help: "The remaining runtime on battery at the current load.",
        value: |r| r.ups.battery.remaining_runtime_minutes,
    },
    Gauge {
        subsystem: Some("battery"),
        name: "low_threshold_minutes",
        help: "Remaining runtime below which the UPS signals a low battery.",
        value: |r| r.ups.battery.low_threshold_minutes,
    },
    Gauge {
        subsystem: Some("battery"),
        name: "external_count",
        help: "The number of external battery packs.",
        value: |r| count(r.ups.battery.external_count),
    },
    Gauge {
        subsystem: Some("battery"),
        name: "replaced_timestamp_seconds",
        help: "When the battery was last replaced, as a Unix timestamp.",
        value: |r| seconds(&r.ups.battery.replaced_at),
    },
    // Daemon
    Gauge {
        subsystem: Some("daemon"),
        name: "remaining_charge_percent",
        help: "The daemon shuts the system down when the battery charge drops below this percentage.",
        value: |r| r.daemon.config.min_battery_charge_percent,
    },
    Gauge {
        subsystem: Some("daemon"),
        name: "remaining_time_minutes",
        help: "The daemon shuts the system down when the remaining runtime drops to this.",
        value: |r| r.daemon.config.min_runtime_minutes,
    },
    Gauge {
        subsystem: Some("daemon"),
        name: "timeout_seconds",
        help: "The daemon shuts the system down after this long on battery; zero disables.",
        value: |r| r.daemon.config.max_time_on_battery_seconds,
    },
    Gauge {
        subsystem: Some("daemon"),
        name: "transfer_count",
        help: "Transfers to battery since the daemon started.",
        value: |r| count(r.daemon.transfers.count),
    },
    Gauge {
        subsystem: Some("daemon"),
        name: "start_timestamp_seconds",
        help: "When the daemon started, as a Unix timestamp.",
        value: |r| seconds(&r.daemon.started_at),
    },
    Gauge {
        subsystem: Some("daemon"),
        name: "last_transfer_timestamp_seconds",
        help: "When the UPS last returned from battery, as a Unix timestamp.",
        value: |r| seconds(&r.daemon.transfers.last_off_battery_at),
    },
];

/// Maps records onto a [`GaugeSink`] under one namespace.
///
/// Full gauge names are computed once, not per publish.
#[derive(Debug, Clone)]
pub struct Publisher {
    up: String,
    gauges: Vec<(String, &'static Gauge)>,
}

impl Publisher {
    pub fn new(namespace: &str) -> Self {
        Self {
            up: UP.full_name(namespace),
            gauges: GAUGES
                .iter()
                .map(|gauge| (gauge.full_name(namespace), gauge))
                .collect(),
        }
    }

    /// Full names of every gauge this publisher writes, `up` first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.up.as_str()).chain(self.gauges.iter().map(|(name, _)| name.as_str()))
    }

    /// Register help text for every gauge.
    pub fn describe(&self, registry: &GaugeRegistry) {
        registry.describe(&self.up, UP.help);
        for (name, gauge) in &self.gauges {
            registry.describe(name, gauge.help);
        }
    }

    /// Forward every field of `record`. Absent fields clear their gauge.
    pub fn publish(&self, record: &StatusRecord, sink: &impl GaugeSink) {
        for (name, gauge) in &self.gauges {
            match (gauge.value)(record) {
                Some(value) => sink.set_gauge(name, value),
                None => sink.clear_gauge(name),
            }
        }
        sink.set_gauge(&self.up, 1.0);
    }

    /// Record a failed collection: `up` drops to 0 and every record gauge is
    /// cleared so stale values are not scraped.
    pub fn publish_failure(&self, sink: &impl GaugeSink) {
        for (name, _) in &self.gauges {
            sink.clear_gauge(name);
        }
        sink.set_gauge(&self.up, 0.0);
    }
}

/// Publish `record` into `sink` under the given namespace.
pub fn publish(record: &StatusRecord, namespace: &str, sink: &impl GaugeSink) {
    Publisher::new(namespace).publish(record, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};
    use upswatch_types::{StatusFlags, UpsStatus};

    fn published(record: &StatusRecord) -> GaugeRegistry {
        let registry = GaugeRegistry::new();
        let publisher = Publisher::new("ups");
        publisher.describe(&registry);
        publisher.publish(record, &registry);
        registry
    }

    #[test]
    fn test_full_names() {
        assert_eq!(UP.full_name("ups"), "ups_up");
        assert_eq!(GAUGES[0].full_name("ups"), "ups_status");

        let battery = GAUGES
            .iter()
            .find(|g| g.name == "remaining_charge_percent" && g.subsystem == Some("battery"))
            .unwrap();
        assert_eq!(battery.full_name("ups"), "ups_battery_remaining_charge_percent");
        assert_eq!(battery.full_name("rack"), "rack_battery_remaining_charge_percent");
        assert_eq!(battery.full_name(""), "battery_remaining_charge_percent");
    }

    #[test]
    fn test_names_are_unique() {
        let publisher = Publisher::new("ups");
        let names: Vec<&str> = publisher.names().collect();
        let unique: BTreeSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
        assert_eq!(names.len(), GAUGES.len() + 1);
    }

    #[test]
    fn test_publish_sets_values() {
        let mut record = StatusRecord::new();
        record.ups.status = Some(UpsStatus::Online);
        record.ups.status_flags = Some(StatusFlags(0x0500_0008));
        record.ups.line_voltage = Some(230.5);
        record.ups.battery.charge_percent = Some(100.0);
        record.ups.battery.external_count = Some(2);
        record.daemon.transfers.count = Some(3);

        let registry = published(&record);

        assert_eq!(registry.get("ups_up"), Some(1.0));
        assert_eq!(registry.get("ups_status"), Some(1.0));
        assert_eq!(registry.get("ups_status_flags"), Some(0x0500_0008 as f64));
        assert_eq!(registry.get("ups_power_line_voltage"), Some(230.5));
        assert_eq!(registry.get("ups_battery_remaining_charge_percent"), Some(100.0));
        assert_eq!(registry.get("ups_battery_external_count"), Some(2.0));
        assert_eq!(registry.get("ups_daemon_transfer_count"), Some(3.0));
    }

    #[test]
    fn test_status_encoding() {
        let mut record = StatusRecord::new();

        record.ups.status = Some(UpsStatus::OnBattery);
        assert_eq!(published(&record).get("ups_status"), Some(2.0));

        record.ups.status = Some(UpsStatus::from("COMMLOST"));
        assert_eq!(published(&record).get("ups_status"), Some(-1.0));
    }

    #[test]
    fn test_absent_fields_clear_gauges() {
        let registry = GaugeRegistry::new();
        let publisher = Publisher::new("ups");

        let mut record = StatusRecord::new();
        record.ups.load_percent = Some(27.3);
        publisher.publish(&record, &registry);
        assert_eq!(registry.get("ups_power_load_percent"), Some(27.3));

        record.ups.load_percent = None;
        publisher.publish(&record, &registry);
        assert_eq!(registry.get("ups_power_load_percent"), None);
        assert!(!registry.render().contains("ups_power_load_percent"));
    }

    #[test]
    fn test_reported_zero_is_not_absent() {
        let mut record = StatusRecord::new();
        record.daemon.time_on_battery.current_seconds = Some(0.0);

        let registry = published(&record);
        assert_eq!(registry.get("ups_battery_time_spent_latest_seconds"), Some(0.0));
        assert_eq!(registry.get("ups_battery_time_spent_total_seconds"), None);
    }

    #[test]
    fn test_alarm_interval() {
        let mut record = StatusRecord::new();

        record.ups.alarm_interval = Some(AlarmInterval::Seconds(30.0));
        assert_eq!(published(&record).get("ups_alarm_interval_seconds"), Some(30.0));

        record.ups.alarm_interval = Some(AlarmInterval::Disabled);
        assert_eq!(published(&record).get("ups_alarm_interval_seconds"), Some(-1.0));
    }

    #[test]
    fn test_timestamps_are_unix_seconds() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 9, 20, 3).unwrap();

        let mut record = StatusRecord::new();
        record.observed_at = Some(Timestamp::At(at));
        record.daemon.started_at = Some(Timestamp::At(at));
        record.daemon.transfers.last_off_battery_at = Some(Timestamp::Unknown);

        let registry = published(&record);
        assert_eq!(registry.get("ups_observed_timestamp_seconds"), Some(1710494403.0));
        assert_eq!(registry.get("ups_daemon_start_timestamp_seconds"), Some(1710494403.0));
        // Unknown is not zero
        assert_eq!(registry.get("ups_daemon_last_transfer_timestamp_seconds"), None);
    }

    #[test]
    fn test_publish_failure_clears_record_gauges() {
        let registry = GaugeRegistry::new();
        let publisher = Publisher::new("ups");

        let mut record = StatusRecord::new();
        record.ups.status = Some(UpsStatus::Online);
        record.ups.battery.charge_percent = Some(100.0);
        publisher.publish(&record, &registry);

        publisher.publish_failure(&registry);

        assert_eq!(registry.get("ups_up"), Some(0.0));
        assert_eq!(registry.get("ups_status"), None);
        assert_eq!(registry.get("ups_battery_remaining_charge_percent"), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_publish_free_function_uses_namespace() {
        let registry = GaugeRegistry::new();
        let mut record = StatusRecord::new();
        record.ups.internal_temperature = Some(29.2);

        publish(&record, "rack", &registry);

        assert_eq!(registry.get("rack_temperature_celsius"), Some(29.2));
        assert_eq!(registry.get("rack_up"), Some(1.0));
        assert_eq!(registry.get("ups_temperature_celsius"), None);
    }

    #[test]
    fn test_rendered_record() {
        let mut record = StatusRecord::new();
        record.ups.status = Some(UpsStatus::Online);

        let output = published(&record).render();
        assert!(output.contains("# HELP ups_status The current status"));
        assert!(output.contains("# TYPE ups_status gauge\nups_status 1\n"));
        assert!(output.contains("ups_up 1\n"));
        assert!(!output.contains("ups_power_line_voltage"));
    }
}
