use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use upswatch_exporter::{GaugeRegistry, Publisher};
use upswatch_types::{AlarmInterval, StatusFlags, StatusRecord, Timestamp, UpsStatus};

fn create_test_record() -> StatusRecord {
    let mut record = StatusRecord::new();
    record.observed_at = Some(Timestamp::Unknown);
    record.ups.status = Some(UpsStatus::Online);
    record.ups.status_flags = Some(StatusFlags(0x0500_0008));
    record.ups.line_voltage = Some(230.5);
    record.ups.load_percent = Some(27.3);
    record.ups.alarm_interval = Some(AlarmInterval::Seconds(30.0));
    record.ups.battery.charge_percent = Some(100.0);
    record.ups.battery.remaining_runtime_minutes = Some(45.3);
    record.ups.nominal.power_watts = Some(2700.0);
    record.daemon.transfers.count = Some(3);
    record.daemon.time_on_battery.cumulative_seconds = Some(141.0);
    record
}

/// Benchmark publishing a record into the registry (once per poll)
fn bench_publish(c: &mut Criterion) {
    let registry = GaugeRegistry::new();
    let publisher = Publisher::new("ups");
    publisher.describe(&registry);
    let record = create_test_record();

    c.bench_function("publish_record", |b| {
        b.iter(|| publisher.publish(black_box(&record), &registry));
    });
}

/// Benchmark rendering the exposition (once per scrape)
fn bench_render(c: &mut Criterion) {
    let registry = Arc::new(GaugeRegistry::new());
    let publisher = Publisher::new("ups");
    publisher.describe(&registry);
    publisher.publish(&create_test_record(), &registry);

    c.bench_function("render_registry", |b| {
        b.iter(|| black_box(registry.render()));
    });
}

criterion_group!(benches, bench_publish, bench_render);
criterion_main!(benches);
