use chrono::{FixedOffset, NaiveDate};
use criterion::{criterion_group, criterion_main, Criterion};
use miqat_astronomy::calculate_prayer_times;
use miqat_types::{AsrMethod, CalculationMethod, GeoCoordinate};
use std::hint::black_box;

fn bench_single_day(c: &mut Criterion) {
    let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let makkah = GeoCoordinate::new(21.4225, 39.8262).unwrap();
    let ast = FixedOffset::east_opt(3 * 3600).unwrap();

    c.bench_function("calculate_prayer_times/makkah", |b| {
        b.iter(|| {
            calculate_prayer_times(
                black_box(date),
                black_box(makkah),
                CalculationMethod::UmmAlQura,
                AsrMethod::Standard,
                ast,
            )
        })
    });
}

fn bench_ramadan_month(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let jakarta = GeoCoordinate::new(-6.2088, 106.8456).unwrap();
    let wib = FixedOffset::east_opt(7 * 3600).unwrap();

    c.bench_function("calculate_prayer_times/30_days", |b| {
        b.iter(|| {
            for date in start.iter_days().take(30) {
                let _ = calculate_prayer_times(
                    date,
                    jakarta,
                    CalculationMethod::Singapore,
                    AsrMethod::Standard,
                    wib,
                );
            }
        })
    });
}

criterion_group!(benches, bench_single_day, bench_ramadan_month);
criterion_main!(benches);
