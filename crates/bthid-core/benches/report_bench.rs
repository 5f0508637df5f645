//! Criterion benchmarks for report encoding and motion draining.
//!
//! A tick runs every millisecond by default, so draining plus encoding has to
//! be a small fraction of that even for a fast flick.
//!
//! Run with:
//! ```bash
//! cargo bench --package bthid-core --bench report_bench
//! ```

use bthid_core::{
    Axis, ButtonFlags, HidState, InputEventDispatcher, KeyState, ModifierFlags, RawInputEvent,
    ReportEncoder, ReportScheduler,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ── Benchmarks: encoder ───────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_encode");

    group.bench_function("keyboard_8_keys", |b| {
        let keys = [4u8, 5, 6, 7, 8, 9, 10, 11];
        b.iter(|| {
            ReportEncoder::encode_keyboard(
                black_box(ModifierFlags(ModifierFlags::LEFT_SHIFT)),
                black_box(&keys),
            )
        })
    });

    group.bench_function("mouse", |b| {
        b.iter(|| {
            ReportEncoder::encode_mouse(
                black_box(ButtonFlags(ButtonFlags::LEFT)),
                black_box(12),
                black_box(-7),
                black_box(0),
            )
        })
    });

    group.finish();
}

// ── Benchmarks: scheduler tick ────────────────────────────────────────────────

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_drain");
    let scheduler = ReportScheduler::default();

    for total in [0.4f64, 50.0, 300.0, 5000.0] {
        group.bench_with_input(BenchmarkId::new("drain_x", total), &total, |b, &total| {
            b.iter(|| {
                let mut state = HidState::new();
                state.accumulate_motion(Axis::X, total);
                state.accumulate_motion(Axis::Y, -total / 2.0);
                scheduler.drain(black_box(&mut state)).count()
            })
        });
    }

    group.finish();
}

// ── Benchmarks: dispatch ──────────────────────────────────────────────────────

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let dispatcher = InputEventDispatcher::default();

    group.bench_function("key_press_release", |b| {
        let mut state = HidState::new();
        b.iter(|| {
            dispatcher.dispatch(
                &mut state,
                black_box(RawInputEvent::Key {
                    code: 30,
                    state: KeyState::Pressed,
                }),
            );
            dispatcher.dispatch(
                &mut state,
                black_box(RawInputEvent::Key {
                    code: 30,
                    state: KeyState::Released,
                }),
            )
        })
    });

    group.bench_function("relative_motion", |b| {
        let mut state = HidState::new();
        b.iter(|| {
            dispatcher.dispatch(
                &mut state,
                black_box(RawInputEvent::Relative {
                    axis: Axis::X,
                    delta: 3,
                }),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_drain, bench_dispatch);
criterion_main!(benches);
