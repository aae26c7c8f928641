use std::sync::{Arc, Mutex};
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use metrobeat::{
    BeatScheduler, ClickBank, ManualClock, SoundType, Tempo, create_notification_channel,
};

/// Benchmark the poll loop (runs on the UI thread every ~25 ms)
fn bench_scheduler_poll(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_poll");

    // Idle poll: nothing due, the common case
    group.bench_function("idle", |b| {
        let clock = ManualClock::new();
        let (tx, _rx) = create_notification_channel(16);
        let mut scheduler = BeatScheduler::new(
            clock.clone(),
            Tempo::new(120).unwrap(),
            Arc::new(Mutex::new(tx)),
        );
        scheduler.start(Tempo::new(120).unwrap());

        b.iter(|| black_box(scheduler.poll()));
    });

    // Catch-up poll: a stall left many beats owed
    for stall_secs in [1u64, 10, 60] {
        group.bench_with_input(
            BenchmarkId::new("catch_up", stall_secs),
            &stall_secs,
            |b, &stall_secs| {
                b.iter(|| {
                    let clock = ManualClock::new();
                    let (tx, _rx) = create_notification_channel(16);
                    let mut scheduler = BeatScheduler::new(
                        clock.clone(),
                        Tempo::new(250).unwrap(),
                        Arc::new(Mutex::new(tx)),
                    );
                    scheduler.start(Tempo::new(250).unwrap());
                    clock.advance(Duration::from_secs(stall_secs));
                    black_box(scheduler.poll())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark click rendering (done once per sound type at startup and
/// on device changes)
fn bench_click_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("click_bank");
    let sample_rate = 48000.0;

    for sound in SoundType::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(sound.label()),
            &sound,
            |b, &sound| {
                b.iter(|| black_box(ClickBank::new(sound, sample_rate)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_scheduler_poll, bench_click_rendering);
criterion_main!(benches);
