//! Subcommand implementations.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use repform_core::synthetic::{pose_with_angles, PoseAngles};
use repform_live::{
    FrameScorer, LiveLoop, LoggingSpeechSink, LoopSummary, PassthroughEstimator, PolicyScorer,
    RangeScorer, ReplaySource, SpeechDispatcher, StopSignal,
};
use repform_rules::{AnalysisOutcome, JsonFileSink, RecordedSession, ReportSink, SessionAnalyzer};
use tracing::{info, warn};

use crate::settings::{AppConfig, ScorerKind};

fn load_session(path: &Path) -> Result<RecordedSession> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse session {}", path.display()))
}

pub fn analyze(config: &AppConfig, paths: &[PathBuf], exercise: Option<&str>) -> Result<()> {
    let mut sessions = Vec::with_capacity(paths.len());
    for path in paths {
        let mut session = load_session(path)?;
        if let Some(exercise) = exercise {
            session.exercise = exercise.to_string();
        }
        sessions.push(session);
    }

    let analyzer = SessionAnalyzer::new(config.standards.clone())?
        .with_extractor(config.extractor.clone())
        .with_min_frames(config.aggregation.min_frames);
    let sink = config
        .output
        .report_dir
        .as_ref()
        .map(JsonFileSink::new)
        .transpose()?;

    let outcomes = analyzer.analyze_sessions(&sessions);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0;
    for outcome in &outcomes {
        match outcome {
            AnalysisOutcome::Success(report) => {
                if let Some(sink) = &sink {
                    sink.persist(report)?;
                }
            }
            AnalysisOutcome::Error(_) => failures += 1,
        }
        serde_json::to_writer(&mut out, outcome)?;
        writeln!(out)?;
    }

    info!(
        sessions = outcomes.len(),
        failures, "Batch analysis finished"
    );
    Ok(())
}

pub fn live(config: &AppConfig, replay: &Path, exercise: Option<&str>) -> Result<()> {
    let source = ReplaySource::from_path(replay)
        .with_context(|| format!("cannot load replay {}", replay.display()))?
        .with_frame_rate(config.live.frame_rate)?;

    let summary = match config.live.scorer {
        ScorerKind::Range => run_live(config, source, RangeScorer::new(config.standards.posture.clone()))?,
        ScorerKind::Policy => {
            let exercise = match exercise {
                Some(exercise) => exercise.to_string(),
                None => load_session(replay)?.exercise,
            };
            run_live(config, source, PolicyScorer::new(exercise, config.standards.clone()))?
        }
    };

    serde_json::to_writer_pretty(io::stdout().lock(), &summary)?;
    println!();
    Ok(())
}

fn run_live<Sc: FrameScorer>(
    config: &AppConfig,
    source: ReplaySource,
    scorer: Sc,
) -> Result<LoopSummary> {
    let mut live = LiveLoop::new(source, || Ok(PassthroughEstimator), scorer, &config.live_config())?;
    if config.live.speech_enabled {
        match SpeechDispatcher::spawn(LoggingSpeechSink) {
            Ok(speech) => live = live.with_speech(speech),
            Err(e) => warn!(error = %e, "Continuing without speech"),
        }
    }
    Ok(live.run(&StopSignal::new())?)
}

pub fn standards(config: &AppConfig) -> Result<()> {
    serde_json::to_writer_pretty(io::stdout().lock(), &config.standards)?;
    println!();
    Ok(())
}

/// One rep per 30 frames, standing at 170° and bottoming out at `bottom_knee`
pub fn synth(exercise: &str, frames: usize, bottom_knee: f64, hip: f64, asymmetry: f64) -> Result<()> {
    let deepest = bottom_knee.min(bottom_knee + asymmetry);
    let straightest = 170.0_f64.max(170.0 + asymmetry);
    if deepest < 0.0 || straightest > 180.0 || !(0.0..=180.0).contains(&hip) {
        bail!("synthetic angles must stay within 0-180 degrees");
    }

    let poses = (0..frames)
        .map(|i| {
            let phase = (i as f64 / 30.0 * std::f64::consts::TAU).cos();
            let knee = bottom_knee + (170.0 - bottom_knee) * (phase + 1.0) / 2.0;
            Some(pose_with_angles(PoseAngles {
                left_knee: knee,
                right_knee: knee + asymmetry,
                left_hip: hip,
                right_hip: hip,
            }))
        })
        .collect();

    let session = RecordedSession::new(exercise, poses);
    serde_json::to_writer(io::stdout().lock(), &session)?;
    println!();
    Ok(())
}
