//! In-memory gauge registry and Prometheus text rendering.

use std::collections::BTreeMap;
use std::fmt::Write;

use parking_lot::RwLock;

use crate::GaugeSink;

#[derive(Debug, Default, Clone)]
struct GaugeEntry {
    help: String,
    value: Option<f64>,
}

/// Thread-safe store of the latest value of every gauge.
///
/// Gauges keep their help text after being cleared, so a gauge that comes
/// back is rendered with the same description.
#[derive(Debug, Default)]
pub struct GaugeRegistry {
    gauges: RwLock<BTreeMap<String, GaugeEntry>>,
}

impl GaugeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with its help text without giving it a value.
    pub fn describe(&self, name: &str, help: &str) {
        let mut gauges = self.gauges.write();
        gauges.entry(name.to_string()).or_default().help = help.to_string();
    }

    /// Current value of `name`, if it holds one.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.gauges.read().get(name).and_then(|entry| entry.value)
    }

    /// Number of gauges currently holding a value.
    pub fn len(&self) -> usize {
        self.gauges
            .read()
            .values()
            .filter(|entry| entry.value.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render every gauge that holds a value in the Prometheus text format.
    pub fn render(&self) -> String {
        let gauges = self.gauges.read();
        let mut output = String::new();

        for (name, entry) in gauges.iter() {
            let Some(value) = entry.value else {
                continue;
            };

            if !entry.help.is_empty() {
                let _ = writeln!(output, "# HELP {} {}", name, escape_help(&entry.help));
            }
            let _ = writeln!(output, "# TYPE {} gauge", name);
            let _ = writeln!(output, "{} {}", name, format_value(value));
        }

        output
    }
}

impl GaugeSink for GaugeRegistry {
    fn set_gauge(&self, name: &str, value: f64) {
        let mut gauges = self.gauges.write();
        match gauges.get_mut(name) {
            Some(entry) => entry.value = Some(value),
            // Only allocate the key on first use
            None => {
                gauges.insert(
                    name.to_string(),
                    GaugeEntry {
                        help: String::new(),
                        value: Some(value),
                    },
                );
            }
        }
    }

    fn clear_gauge(&self, name: &str) {
        if let Some(entry) = self.gauges.write().get_mut(name) {
            entry.value = None;
        }
    }
}

/// Format a sample value the way the exposition format spells them.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

/// Escape help text. Backslash and newline must be escaped.
fn escape_help(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let registry = GaugeRegistry::new();
        assert!(registry.is_empty());

        registry.set_gauge("ups_status", 1.0);
        assert_eq!(registry.get("ups_status"), Some(1.0));
        assert_eq!(registry.len(), 1);

        registry.set_gauge("ups_status", 2.0);
        assert_eq!(registry.get("ups_status"), Some(2.0));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clear_keeps_help() {
        let registry = GaugeRegistry::new();
        registry.describe("ups_status", "The current status.");
        registry.set_gauge("ups_status", 1.0);
        registry.clear_gauge("ups_status");

        assert_eq!(registry.get("ups_status"), None);
        assert!(registry.is_empty());

        registry.set_gauge("ups_status", 2.0);
        assert!(registry.render().contains("# HELP ups_status The current status."));
    }

    #[test]
    fn test_clear_unknown_gauge_is_noop() {
        let registry = GaugeRegistry::new();
        registry.clear_gauge("never_set");
        assert!(registry.is_empty());
        assert_eq!(registry.render(), "");
    }

    #[test]
    fn test_render_includes_help_and_type() {
        let registry = GaugeRegistry::new();
        registry.describe("ups_power_line_voltage", "The current line voltage.");
        registry.set_gauge("ups_power_line_voltage", 230.5);

        let output = registry.render();
        assert_eq!(
            output,
            "# HELP ups_power_line_voltage The current line voltage.\n\
             # TYPE ups_power_line_voltage gauge\n\
             ups_power_line_voltage 230.5\n"
        );
    }

    #[test]
    fn test_render_omits_cleared_and_undescribed_values() {
        let registry = GaugeRegistry::new();
        registry.describe("ups_status", "The current status.");
        registry.describe("ups_temperature_celsius", "Internal temperature.");
        registry.set_gauge("ups_status", -1.0);

        let output = registry.render();
        assert!(output.contains("ups_status -1\n"));
        assert!(!output.contains("ups_temperature_celsius"));
    }

    #[test]
    fn test_render_without_help() {
        let registry = GaugeRegistry::new();
        registry.set_gauge("ups_up", 1.0);

        let output = registry.render();
        assert!(!output.contains("# HELP"));
        assert!(output.contains("# TYPE ups_up gauge\nups_up 1\n"));
    }

    #[test]
    fn test_render_is_sorted_by_name() {
        let registry = GaugeRegistry::new();
        registry.set_gauge("ups_b", 1.0);
        registry.set_gauge("ups_a", 1.0);

        let output = registry.render();
        let a = output.find("ups_a 1").unwrap();
        let b = output.find("ups_b 1").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1.0), "1");
        assert_eq!(format_value(0.5), "0.5");
        assert_eq!(format_value(1710494403.0), "1710494403");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn test_escape_help() {
        assert_eq!(escape_help("simple"), "simple");
        assert_eq!(escape_help("with\\backslash"), "with\\\\backslash");
        assert_eq!(escape_help("with\nnewline"), "with\\nnewline");
    }
}
