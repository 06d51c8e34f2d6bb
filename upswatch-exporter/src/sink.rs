//! The named-gauge sink records are published into.

use std::sync::Arc;

/// Destination for named gauge values.
///
/// Implementations must tolerate concurrent readers; writers are expected to
/// be a single collector.
pub trait GaugeSink: Send + Sync {
    /// Set `name` to `value`, creating the gauge on first use.
    fn set_gauge(&self, name: &str, value: f64);

    /// Forget the current value of `name` so it is no longer reported.
    fn clear_gauge(&self, name: &str);
}

impl<S: GaugeSink + ?Sized> GaugeSink for Arc<S> {
    fn set_gauge(&self, name: &str, value: f64) {
        (**self).set_gauge(name, value)
    }

    fn clear_gauge(&self, name: &str) {
        (**self).clear_gauge(name)
    }
}

impl<S: GaugeSink + ?Sized> GaugeSink for &S {
    fn set_gauge(&self, name: &str, value: f64) {
        (**self).set_gauge(name, value)
    }

    fn clear_gauge(&self, name: &str) {
        (**self).clear_gauge(name)
    }
}
