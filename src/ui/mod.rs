// UI module - egui shell around the metronome core

pub mod app;

pub use app::MetronomeApp;
