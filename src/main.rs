use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::Path;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use safety_tracker_rs::backend::{SosDispatcher, ZoneFetcher};
use safety_tracker_rs::config::TrackerConfig;
use safety_tracker_rs::detectors::SafetyDetector;
use safety_tracker_rs::geo::Position;
use safety_tracker_rs::location::{
    location_loop, LocationSource, LocationUpdate, SimulatedSource,
};
use safety_tracker_rs::monitor::ZoneMonitor;
use safety_tracker_rs::notifier::{AlertSounder, HapticSink, MessageSink, TransitionNotifier};
use safety_tracker_rs::session::SessionContext;
use safety_tracker_rs::sos::SosCountdown;
use safety_tracker_rs::status::{current_timestamp, epoch_ms, LiveStatus};

#[derive(Parser, Debug)]
#[command(name = "safety_tracker")]
#[command(about = "Danger-zone and emergency tracker", long_about = None)]
struct Args {
    /// Duration in seconds (0 = continuous)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// Backend base URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    backend_url: String,

    /// Account identifier used for SOS and ledger calls
    #[arg(long, default_value = "MAT-0000")]
    matricule: String,

    /// Display name for the session
    #[arg(long, default_value = "Field Test")]
    name: String,

    /// Optional JSON config file; CLI flags override it
    #[arg(long)]
    config: Option<String>,

    /// Output directory for status snapshots
    #[arg(long, default_value = "safety_tracker_sessions")]
    output_dir: String,

    /// Starting latitude for the simulated walk
    #[arg(long, default_value = "5.3364")]
    start_lat: f64,

    /// Starting longitude for the simulated walk
    #[arg(long, default_value = "-4.0267")]
    start_lon: f64,
}

// Console stand-ins for the device feedback channels. The real app wires
// the platform vibration, audio, and dialog services here.
struct ConsoleHaptics;

impl HapticSink for ConsoleHaptics {
    fn pulse(&mut self, pattern: &[u64]) -> std::result::Result<(), String> {
        eprintln!("[haptic] pulse {:?}", pattern);
        Ok(())
    }
}

struct ConsoleSounder;

impl AlertSounder for ConsoleSounder {
    fn play(&mut self) -> std::result::Result<(), String> {
        eprintln!("[sound] alert tone");
        Ok(())
    }
}

struct ConsoleMessages;

impl MessageSink for ConsoleMessages {
    fn show(&mut self, title: &str, body: &str) -> std::result::Result<(), String> {
        println!("[ALERT] {}: {}", title, body);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("[{}] Safety Tracker Starting", ts_now());
    println!("  Duration: {} seconds (0=continuous)", args.duration);
    println!("  Backend: {}", args.backend_url);
    println!("  Matricule: {}", args.matricule);
    println!("  Output Dir: {}", args.output_dir);

    std::fs::create_dir_all(&args.output_dir)?;

    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(Path::new(path))?,
        None => TrackerConfig::default(),
    };
    config.backend_url = args.backend_url.clone();

    let session = SessionContext::new(&args.matricule, &args.name);

    // Zone registry fetch: one round-trip at startup, no retry. A failure
    // is a user-visible notice, not a fatal error; the tracker keeps
    // running without zone alerts.
    let fetcher = ZoneFetcher::new(&config.backend_url);
    let (zones, zone_records_rejected) = match fetcher.fetch_zones().await {
        Ok(batch) => {
            println!(
                "[{}] Loaded {} danger zones ({} rejected)",
                ts_now(),
                batch.zones.len(),
                batch.rejected
            );
            (batch.zones, batch.rejected)
        }
        Err(e) => {
            println!(
                "[{}] NOTICE: could not load danger zones ({}); continuing without zone alerts",
                ts_now(),
                e
            );
            (Vec::new(), 0)
        }
    };
    let zones_loaded = zones.len();

    // Permission is checked once, before the subscription starts. Denial
    // blocks the feature entirely.
    let mut source = SimulatedSource::new(args.start_lat, args.start_lon);
    if let Err(e) = source.ensure_permission() {
        println!("[{}] {}", ts_now(), e);
        return Ok(());
    }

    let (loc_tx, mut loc_rx) = mpsc::channel::<LocationUpdate>(config.channel_capacity);
    let loc_handle = tokio::spawn(location_loop(
        source,
        loc_tx,
        Duration::from_secs(config.location_interval_secs),
    ));

    let notifier = TransitionNotifier::new(
        Box::new(ConsoleHaptics),
        Box::new(ConsoleSounder),
        Box::new(ConsoleMessages),
        config.debounce_window_ms,
    );
    let mut monitor = ZoneMonitor::new(zones, notifier);
    let mut detector = SafetyDetector::new(
        config.overspeed_threshold_ms,
        config.magnetic_threshold_ut,
        config.debounce_window_ms,
    );
    let mut countdown = SosCountdown::new(
        config.sos_countdown_secs * 1_000,
        config.debounce_window_ms,
    );
    let dispatcher = SosDispatcher::new(
        &config.backend_url,
        config.sos_max_attempts,
        config.sos_retry_delay_secs,
    );

    let mut detector_events = 0u64;
    let mut sos_triggered = 0u64;

    let start = Utc::now();
    let mut last_status_update = Utc::now();

    println!("[{}] Monitoring started...", ts_now());

    loop {
        if args.duration > 0 {
            let elapsed = Utc::now().signed_duration_since(start);
            if elapsed.num_seconds() as u64 >= args.duration {
                println!("[{}] Duration reached, stopping...", ts_now());
                break;
            }
        }

        while let Ok(update) = loc_rx.try_recv() {
            let now_ms = epoch_ms();
            monitor.process_update(&update, now_ms);

            if let Some(event) =
                detector.detect(Some(update.speed), None, now_ms, Some(update.position()))
            {
                detector_events += 1;
                eprintln!(
                    "[detector] {} magnitude {:.1} at ({:.4}, {:.4})",
                    event.kind,
                    event.magnitude,
                    event.latitude.unwrap_or(0.0),
                    event.longitude.unwrap_or(0.0)
                );
                if !countdown.is_armed() {
                    countdown.arm(now_ms);
                    println!(
                        "[{}] SOS countdown armed ({}s to cancel)",
                        ts_now(),
                        config.sos_countdown_secs
                    );
                }
            }
        }

        let now_ms = epoch_ms();
        if countdown.poll(now_ms) {
            sos_triggered += 1;
            let position = monitor
                .stats()
                .last_fix
                .map(|fix| fix.position())
                .unwrap_or_else(|| Position::new(args.start_lat, args.start_lon));
            let dispatcher = dispatcher.clone();
            let session = session.clone();
            tokio::spawn(async move {
                match dispatcher
                    .dispatch(&session, position, "Automatic emergency alert", now_ms)
                    .await
                {
                    Ok(()) => eprintln!("[sos] alert delivered"),
                    Err(e) => eprintln!("[sos] alert failed: {}", e),
                }
            });
        }

        // Status snapshot every 2 seconds
        let now = Utc::now();
        if (now.signed_duration_since(last_status_update).num_seconds() as u64) >= 2 {
            let status = build_status(
                &monitor,
                zones_loaded,
                zone_records_rejected,
                detector_events,
                sos_triggered,
                now.signed_duration_since(start).num_seconds().max(0) as u64,
            );
            let status_path = format!("{}/live_status.json", args.output_dir);
            let _ = status.save(&status_path);
            last_status_update = now;
        }

        sleep(Duration::from_millis(50)).await;
    }

    // Final snapshot and stats
    let uptime = Utc::now().signed_duration_since(start).num_seconds().max(0) as u64;
    let status = build_status(
        &monitor,
        zones_loaded,
        zone_records_rejected,
        detector_events,
        sos_triggered,
        uptime,
    );
    let status_path = format!("{}/live_status_final.json", args.output_dir);
    let _ = status.save(&status_path);

    drop(loc_rx);
    let _ = loc_handle.await;

    println!("\n=== Final Stats ===");
    println!("Updates processed: {}", monitor.stats().updates_processed);
    println!("Zone alerts fired: {}", monitor.stats().alerts_fired);
    println!("Detector events: {}", detector_events);
    println!("SOS triggered: {}", sos_triggered);

    Ok(())
}

fn build_status(
    monitor: &ZoneMonitor,
    zones_loaded: usize,
    zone_records_rejected: usize,
    detector_events: u64,
    sos_triggered: u64,
    uptime_seconds: u64,
) -> LiveStatus {
    let mut status = LiveStatus::new();
    status.uptime_seconds = uptime_seconds;
    status.zones_loaded = zones_loaded;
    status.zone_records_rejected = zone_records_rejected;
    status.updates_processed = monitor.stats().updates_processed;
    status.current_zone_code = monitor.stats().current_zone.clone();
    status.zone_alerts_fired = monitor.stats().alerts_fired;
    status.detector_events = detector_events;
    status.sos_triggered = sos_triggered;
    if let Some(fix) = monitor.stats().last_fix {
        status.last_latitude = fix.latitude;
        status.last_longitude = fix.longitude;
    }
    status.last_fix_age_secs = monitor
        .last_fix_age_secs(current_timestamp())
        .unwrap_or(0.0);
    status
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
