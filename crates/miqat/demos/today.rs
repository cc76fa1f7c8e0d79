//! Today's prayer times, the next prayer and a glimpse of the Imsakiya.
//!
//! Usage: `cargo run -p miqat --example today [-- <lat> <lng> [method-id]]`
//! Set `RUST_LOG=miqat_core=debug` to watch the cache and the scheduler.

use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, Utc};
use miqat::prelude::*;
use miqat::{AlarmHandle, AlarmRequest, AlarmScheduler, SchedulingError, StaticLocationService, LOCATION_NOT_SET};
use tracing_subscriber::EnvFilter;

/// Prints alarms instead of registering them with an OS.
#[derive(Default)]
struct PrintAlarms {
    next: std::sync::atomic::AtomicU64,
}

impl AlarmScheduler for PrintAlarms {
    fn schedule_at(&self, request: AlarmRequest) -> Result<AlarmHandle, SchedulingError> {
        let handle = self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        println!("  ⏰ alarm #{handle} {} ({:?}) slot {}", request.prayer, request.mode, request.slot_id);
        Ok(AlarmHandle(handle))
    }

    fn cancel(&self, handle: AlarmHandle) {
        println!("  ✖ cancel alarm #{}", handle.0);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let location = match args.as_slice() {
        [lat, lng, ..] => {
            let coords = GeoCoordinate::new(
                lat.parse().context("latitude must be a number")?,
                lng.parse().context("longitude must be a number")?,
            )?;
            Location::new(coords, None, false)
        }
        _ => Location::makkah(),
    };
    let method = args
        .get(2)
        .map(|id| id.parse::<u8>().context("method id must be 0-13"))
        .transpose()?
        .map(CalculationMethod::from_id)
        .transpose()?
        .unwrap_or_default();

    let settings = PrayerSettings::new().method(method);
    let provider = Arc::new(PrayerTimesProvider::new(settings, Arc::new(Local)));
    let service = PrayerService::new(
        provider,
        Arc::new(StaticLocationService::new(location)),
        Arc::new(PrintAlarms::default()),
    );

    #[cfg(feature = "network")]
    let service = service.with_place_names(Arc::new(miqat::NominatimClient::new("en")?));

    let now = Utc::now();
    let outcome = service.current_prayer_times(now).await?;
    let times = &outcome.times;

    println!("=====================================");
    println!("  🕌 {}", times.location_name.as_deref().unwrap_or(LOCATION_NOT_SET));
    println!("  {} / {}", times.date, times.hijri.map_or("-".to_string(), |h| h.to_string()));
    println!("  {} · Asr {}", times.method, times.asr_method);
    println!("=====================================");
    for prayer in Prayer::ALL {
        println!("  {:<8} {}", prayer.to_string(), times.display_time(prayer));
    }
    for warning in &outcome.warnings {
        println!("  ⚠ {warning}");
    }

    let next = service.next_prayer(now).await?;
    println!("-------------------------------------");
    println!(
        "  Next: {} at {} (in {}){}",
        next.prayer,
        next.at.format("%H:%M"),
        next.remaining,
        if next.is_tomorrow { " tomorrow" } else { "" }
    );

    println!("-------------------------------------");
    let report = service.reschedule_all(RescheduleTrigger::AppOpen, now).await;
    println!(
        "  scheduled {} · cancelled {} · failed {}",
        report.scheduled.len(),
        report.cancelled,
        report.failed.len()
    );

    match service.ramadan_calendar(now).await {
        Ok(calendar) => {
            println!("-------------------------------------");
            println!("  Ramadan {} AH from {}", calendar.hijri_year, calendar.start);
            for day in calendar.days.iter().take(3) {
                println!(
                    "  {:>2}. {}  Imsak {}  Maghrib {}",
                    day.day,
                    day.date,
                    day.imsak.map_or("Unknown".to_string(), |t| t.format("%H:%M").to_string()),
                    day.times.display_time(Prayer::Maghrib)
                );
            }
        }
        Err(e) => eprintln!("  Ramadan calendar unavailable: {e}"),
    }

    Ok(())
}
