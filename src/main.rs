use std::sync::{Arc, Mutex};

use metrobeat::ui::app::MetronomeApp;
use metrobeat::{
    AudioBeatSink, AudioEngine, BeatScheduler, MonotonicClock, Notification, NotificationCategory,
    Preferences, StatsStore, create_command_channel, create_notification_channel,
};

// Ringbuffer capacity constants
// Clicks arrive one per beat (≤ ~4/s at 250 BPM) and are drained every
// audio callback; notifications are drained every UI frame. These sizes
// only matter when a consumer stalls.
const CLICK_RINGBUFFER_CAPACITY: usize = 64;
const CONTROL_RINGBUFFER_CAPACITY: usize = 64;
const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 256;

fn main() {
    println!("=== Metrobeat ===");

    // Communication channels: scheduler → audio (clicks), UI → audio
    // (sound changes), everyone → UI (notifications)
    let (click_tx, click_rx) = create_command_channel(CLICK_RINGBUFFER_CAPACITY);
    let (control_tx, control_rx) = create_command_channel(CONTROL_RINGBUFFER_CAPACITY);
    let (notification_tx, notification_rx) =
        create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
    let notification_tx = Arc::new(Mutex::new(notification_tx));

    // Persisted state; both loaders fall back to defaults on any error
    let prefs_path = Preferences::default_path().ok();
    let prefs = prefs_path
        .as_deref()
        .map(Preferences::load)
        .unwrap_or_default();

    let (stats, stats_recovery) = match StatsStore::default_path() {
        Ok(path) => StatsStore::load(path),
        Err(_) => (StatsStore::in_memory(), None),
    };
    if let Some(err) = stats_recovery {
        eprintln!("WARNING: discarding unreadable practice stats: {err}");
        metrobeat::messaging::channels::notify(
            &notification_tx,
            Notification::warning(
                NotificationCategory::Stats,
                "Stored practice stats were unreadable; starting with an empty history"
                    .to_string(),
            ),
        );
    }

    let clock = MonotonicClock::new();
    let mut scheduler = BeatScheduler::new(
        clock.clone(),
        prefs.initial_tempo(),
        notification_tx.clone(),
    );

    println!("Audio engine initialisation...");
    let audio_engine = match AudioEngine::new(
        click_rx,
        control_rx,
        notification_tx.clone(),
        prefs.volume,
        prefs.sound_type,
    ) {
        Ok(engine) => {
            println!("Audio ready at {} Hz", engine.sample_rate());
            scheduler.set_sink(Box::new(AudioBeatSink::new(click_tx)));
            Some(engine)
        }
        Err(e) => {
            // Not fatal: the metronome runs silently and the UI says why
            eprintln!("ERROR: audio unavailable: {e}");
            metrobeat::messaging::channels::notify(
                &notification_tx,
                Notification::error(
                    NotificationCategory::Audio,
                    format!("Audio output unavailable ({e}); running silently"),
                ),
            );
            None
        }
    };
    let volume = audio_engine.as_ref().map(|engine| engine.volume.clone());

    let app = MetronomeApp::new(
        scheduler,
        clock,
        prefs,
        prefs_path,
        stats,
        control_tx,
        volume,
        notification_tx,
        notification_rx,
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 400.0])
            .with_title("Metrobeat"),
        ..Default::default()
    };

    // `audio_engine` stays alive in this scope for as long as the window
    // runs; dropping it would tear the output stream down
    let _ = eframe::run_native(
        "Metrobeat",
        native_options,
        Box::new(|_cc| Ok(Box::new(app))),
    );
}
