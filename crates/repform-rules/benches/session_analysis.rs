//! Benchmarks for the batch analysis pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use repform_core::synthetic::{pose_with_angles, PoseAngles};
use repform_core::{aggregate, extract_angles, AngleVector, Bilateral, LandmarkSet};
use repform_rules::{score, RecordedSession, SessionAnalyzer, Standards};

fn create_test_frames(n: usize) -> Vec<LandmarkSet> {
    (0..n)
        .map(|i| {
            let phase = (i as f64 * 0.1).cos();
            let knee = 90.0 + 40.0 * (phase + 1.0);
            pose_with_angles(PoseAngles {
                left_knee: knee,
                right_knee: knee + 4.0,
                left_hip: 150.0 + 10.0 * phase,
                right_hip: 152.0 + 10.0 * phase,
            })
        })
        .collect()
}

fn benchmark_extraction(c: &mut Criterion) {
    let frame = create_test_frames(1).remove(0);

    c.bench_function("extract_bilateral", |b| {
        b.iter(|| extract_angles::<Bilateral>(black_box(Some(&frame))))
    });
}

fn benchmark_scoring(c: &mut Criterion) {
    let standards = Standards::default();
    let angles: Vec<AngleVector<Bilateral>> = create_test_frames(300)
        .iter()
        .filter_map(|f| extract_angles(Some(f)))
        .collect();

    c.bench_function("aggregate_300", |b| b.iter(|| aggregate(black_box(&angles))));

    let metrics = aggregate(&angles).unwrap();
    c.bench_function("score_squat", |b| {
        b.iter(|| score(black_box(&metrics), "squat", &standards))
    });
}

fn benchmark_sessions(c: &mut Criterion) {
    let analyzer = SessionAnalyzer::new(Standards::default()).unwrap();
    let session = RecordedSession::new("squat", create_test_frames(300).into_iter().map(Some).collect());
    let batch: Vec<RecordedSession> = (0..16).map(|_| session.clone()).collect();

    c.bench_function("analyze_session_300", |b| {
        b.iter(|| analyzer.analyze(black_box(&session)))
    });

    c.bench_function("analyze_sessions_16x300", |b| {
        b.iter(|| analyzer.analyze_sessions(black_box(&batch)))
    });
}

criterion_group!(
    benches,
    benchmark_extraction,
    benchmark_scoring,
    benchmark_sessions
);
criterion_main!(benches);
