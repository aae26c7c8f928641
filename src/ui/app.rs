// Main application shell - egui plumbing around the metronome core
//
// Everything with timing or validation semantics lives in the engine,
// stats, and prefs modules; this file only forwards widget events to
// them and drives the scheduler poll loop from the frame loop.

use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::Local;
use eframe::egui;

use crate::audio::click::SoundType;
use crate::audio::engine::AtomicF32;
use crate::clock::{Clock, MonotonicClock};
use crate::engine::scheduler::{BEATS_PER_MEASURE, BeatScheduler, POLL_INTERVAL};
use crate::engine::tap::TapTempo;
use crate::engine::tempo::{Tempo, TempoController};
use crate::messaging::channels::{
    CommandProducer, NotificationConsumer, SharedNotificationProducer, notify,
};
use crate::messaging::command::Command;
use crate::messaging::notification::{Notification, NotificationCategory, NotificationLevel};
use crate::prefs::Preferences;
use crate::stats::session::format_duration;
use crate::stats::store::StatsStore;

/// Notifications kept in the on-screen queue
const MAX_NOTIFICATIONS: usize = 10;

/// How long a notification stays visible
const NOTIFICATION_TTL_MS: u64 = 5000;

pub struct MetronomeApp {
    // Core components (all driven from this thread)
    scheduler: BeatScheduler<MonotonicClock>,
    controller: TempoController,
    tap: TapTempo,
    clock: MonotonicClock,

    // Persistence
    stats: StatsStore,
    prefs: Preferences,
    prefs_path: Option<PathBuf>,

    // Audio plumbing; `volume` is None when the engine failed to start
    control_tx: CommandProducer,
    volume: Option<AtomicF32>,
    muted: bool,

    // Notification system
    notification_tx: SharedNotificationProducer,
    notification_rx: NotificationConsumer,
    notification_queue: VecDeque<Notification>,

    // Stats window state
    show_stats: bool,
    export_text: String,
    import_text: String,
}

impl MetronomeApp {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scheduler: BeatScheduler<MonotonicClock>,
        clock: MonotonicClock,
        prefs: Preferences,
        prefs_path: Option<PathBuf>,
        stats: StatsStore,
        control_tx: CommandProducer,
        volume: Option<AtomicF32>,
        notification_tx: SharedNotificationProducer,
        notification_rx: NotificationConsumer,
    ) -> Self {
        let controller = TempoController::new(prefs.initial_tempo(), notification_tx.clone());

        Self {
            scheduler,
            controller,
            tap: TapTempo::new(),
            clock,
            stats,
            prefs,
            prefs_path,
            control_tx,
            volume,
            muted: false,
            notification_tx,
            notification_rx,
            notification_queue: VecDeque::new(),
            show_stats: false,
            export_text: String::new(),
            import_text: String::new(),
        }
    }

    /// Pull new notifications from the ringbuffer into the display queue
    fn update_notifications(&mut self) {
        while let Some(notification) =
            ringbuf::traits::Consumer::try_pop(&mut self.notification_rx)
        {
            self.notification_queue.push_back(notification);
            if self.notification_queue.len() > MAX_NOTIFICATIONS {
                self.notification_queue.pop_front();
            }
        }
    }

    fn recent_notifications(&self) -> Vec<&Notification> {
        self.notification_queue
            .iter()
            .rev()
            .filter(|n| n.is_recent(NOTIFICATION_TTL_MS))
            .take(3)
            .collect()
    }

    /// A tempo accepted by the controller: retime the scheduler if
    /// running and persist the new preference
    fn apply_tempo(&mut self, tempo: Tempo) {
        if self.scheduler.state().is_running() {
            self.scheduler.set_tempo(tempo);
        }
        self.prefs.tempo = tempo.bpm();
        self.save_prefs();
    }

    fn toggle_playback(&mut self) {
        if self.scheduler.state().is_running() {
            self.scheduler.stop();
            self.stats.end_session(Local::now());
            if let Err(err) = self.stats.save() {
                notify(
                    &self.notification_tx,
                    Notification::warning(
                        NotificationCategory::Stats,
                        format!("Could not save practice stats: {err}"),
                    ),
                );
            }
        } else {
            self.stats.start_session(Local::now());
            self.scheduler.start(self.controller.tempo());
        }
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.prefs.volume }
    }

    fn push_volume(&self) {
        if let Some(volume) = &self.volume {
            volume.set(self.effective_volume());
        }
    }

    fn set_sound(&mut self, sound: SoundType) {
        self.prefs.sound_type = sound;
        let _ = ringbuf::traits::Producer::try_push(
            &mut self.control_tx,
            Command::SetSound(sound),
        );
        notify(
            &self.notification_tx,
            Notification::info(
                NotificationCategory::Audio,
                format!("Click sound set to {sound}"),
            ),
        );
        self.save_prefs();
    }

    fn save_prefs(&self) {
        if let Some(path) = &self.prefs_path {
            let _ = self.prefs.save(path);
        }
    }

    fn draw_transport(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let running = self.scheduler.state().is_running();
            let label = if running { "Stop" } else { "Start" };
            if ui.button(label).clicked() {
                self.toggle_playback();
            }

            // The scheduler owns the position; beat 0 is accented. Show
            // the beat that fired most recently while running.
            let lit = (self.scheduler.position() + BEATS_PER_MEASURE - 1) % BEATS_PER_MEASURE;
            for beat in 0..BEATS_PER_MEASURE {
                let color = if running && beat == lit {
                    if beat == 0 {
                        egui::Color32::from_rgb(255, 140, 0)
                    } else {
                        egui::Color32::from_rgb(100, 200, 100)
                    }
                } else {
                    egui::Color32::GRAY
                };
                ui.colored_label(color, "●");
            }
        });
    }

    fn draw_tempo_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut bpm = self.controller.tempo().bpm();
            if ui
                .add(egui::Slider::new(&mut bpm, Tempo::MIN..=Tempo::MAX).text("BPM"))
                .changed()
            {
                if let Some(tempo) = self.controller.set_from_slider(bpm) {
                    self.apply_tempo(tempo);
                }
            }
        });

        ui.horizontal(|ui| {
            ui.label("Tempo:");
            let response = ui.add(
                egui::TextEdit::singleline(self.controller.input_mut()).desired_width(48.0),
            );
            if response.changed() {
                if let Some(tempo) = self.controller.preview_input() {
                    self.apply_tempo(tempo);
                }
            }
            if response.lost_focus() {
                if let Some(tempo) = self.controller.commit_input() {
                    self.apply_tempo(tempo);
                }
            }

            if ui.button("TAP").clicked() {
                if let Some(estimate) = self.tap.tap(self.clock.now()) {
                    if let Some(tempo) = self.controller.set_from_tap(estimate) {
                        self.apply_tempo(tempo);
                    }
                }
            }
            if self.tap.is_collecting() {
                ui.weak(format!("{} taps", self.tap.tap_count()));
            }
        });
    }

    fn draw_sound_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut volume = self.prefs.volume;
            if ui
                .add(egui::Slider::new(&mut volume, 0.0..=1.0).text("Volume"))
                .changed()
            {
                self.prefs.volume = volume;
                if self.muted && volume > 0.0 {
                    self.muted = false;
                }
                self.push_volume();
                self.save_prefs();
            }

            let mute_label = if self.muted { "Unmute" } else { "Mute" };
            if ui.button(mute_label).clicked() {
                self.muted = !self.muted;
                self.push_volume();
            }
        });

        ui.horizontal(|ui| {
            ui.label("Sound:");
            let previous = self.prefs.sound_type;
            let mut selected = previous;
            egui::ComboBox::from_id_salt("sound_type_selector")
                .selected_text(selected.label())
                .show_ui(ui, |ui| {
                    for sound in SoundType::ALL {
                        ui.selectable_value(&mut selected, sound, sound.label());
                    }
                });
            if selected != previous {
                self.set_sound(selected);
            }

            if self.volume.is_none() {
                ui.colored_label(egui::Color32::RED, "silent: no audio output");
            }
        });
    }

    fn draw_stats_window(&mut self, ctx: &egui::Context) {
        let mut show_stats = self.show_stats;
        egui::Window::new("Practice statistics")
            .open(&mut show_stats)
            .resizable(true)
            .show(ctx, |ui| {
                if self.stats.data().is_empty() {
                    ui.label("No practice recorded yet.");
                } else {
                    egui::Grid::new("stats_grid").striped(true).show(ui, |ui| {
                        ui.strong("Date");
                        ui.strong("Time practiced");
                        ui.strong("Sessions");
                        ui.end_row();

                        for day in self.stats.data().values() {
                            ui.label(&day.date);
                            ui.label(format_duration(day.total_duration_ms));
                            ui.label(day.sessions.len().to_string());
                            ui.end_row();
                        }
                    });
                }

                ui.separator();

                if ui.button("Export").clicked() {
                    match self.stats.export() {
                        Ok(text) => self.export_text = text,
                        Err(err) => notify(
                            &self.notification_tx,
                            Notification::error(
                                NotificationCategory::Stats,
                                format!("Could not export practice stats: {err}"),
                            ),
                        ),
                    }
                }
                if !self.export_text.is_empty() {
                    ui.add(
                        egui::TextEdit::multiline(&mut self.export_text)
                            .desired_rows(2)
                            .desired_width(f32::INFINITY),
                    );
                }

                ui.separator();

                ui.label("Paste an export to merge it into your history:");
                ui.add(
                    egui::TextEdit::multiline(&mut self.import_text)
                        .desired_rows(2)
                        .desired_width(f32::INFINITY),
                );
                if ui.button("Import & merge").clicked() {
                    match self.stats.import_merge(&self.import_text) {
                        Ok(()) => {
                            self.import_text.clear();
                            let _ = self.stats.save();
                            notify(
                                &self.notification_tx,
                                Notification::info(
                                    NotificationCategory::Stats,
                                    "Practice stats imported and merged".to_string(),
                                ),
                            );
                        }
                        Err(err) => notify(
                            &self.notification_tx,
                            Notification::error(
                                NotificationCategory::Stats,
                                format!("Could not import practice stats: {err}"),
                            ),
                        ),
                    }
                }
            });
        self.show_stats = show_stats;
    }

    fn draw_notifications(&self, ui: &mut egui::Ui) {
        for notification in self.recent_notifications() {
            let color = match notification.level {
                NotificationLevel::Info => egui::Color32::LIGHT_BLUE,
                NotificationLevel::Warning => egui::Color32::YELLOW,
                NotificationLevel::Error => egui::Color32::RED,
            };
            ui.colored_label(color, &notification.message);
        }
    }
}

impl eframe::App for MetronomeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_notifications();

        // Drive the core: expire stale tap history, fire due beats
        self.tap.poll(self.clock.now());
        self.scheduler.poll();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Metrobeat");
            ui.separator();

            self.draw_transport(ui);
            ui.add_space(10.0);
            self.draw_tempo_controls(ui);
            ui.add_space(10.0);
            self.draw_sound_controls(ui);

            ui.add_space(10.0);
            if ui.button("Practice statistics…").clicked() {
                self.show_stats = !self.show_stats;
            }

            ui.add_space(10.0);
            self.draw_notifications(ui);
        });

        self.draw_stats_window(ctx);

        // Keep polling between input events; while idle the tap timeout
        // is the only thing that needs a wakeup
        if self.scheduler.state().is_running() || self.tap.is_collecting() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}

impl Drop for MetronomeApp {
    fn drop(&mut self) {
        // Close the session and flush state on shutdown; best-effort,
        // the window is already going away
        if self.scheduler.state().is_running() {
            self.scheduler.stop();
            self.stats.end_session(Local::now());
        }
        let _ = self.stats.save();
        self.save_prefs();
    }
}
