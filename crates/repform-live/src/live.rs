//! Single-stream live feedback loop.
//!
//! ```text
//! AwaitingFrame -> Scoring -> FeedbackGated -> AwaitingFrame
//!       |                                          |
//!       +--> Stopped (stop signal / end of stream) |
//!       +--> Failed  (capture failure) <-----------+
//! ```
//!
//! Frames are processed strictly in arrival order on the calling thread.
//! The capture device and the pose model are closed on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use repform_core::{
    AggregateMetrics, AngleExtractor, Error, ExtractorConfig, LandmarkSet, Result, SmoothedState,
    DEFAULT_ALPHA,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::feedback::{
    CooldownGate, FeedbackTier, TierThresholds, DEFAULT_COOLDOWN_TICKS, PERFECT_FORM_CUE,
};
use crate::scorer::FrameScorer;
use crate::source::{FrameSource, PoseEstimator};
use crate::speech::SpeechDispatcher;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// EMA weight of the newest frame, in (0, 1]
    pub alpha: f64,
    pub cooldown_ticks: u32,
    pub tiers: TierThresholds,
    pub extractor: ExtractorConfig,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            cooldown_ticks: DEFAULT_COOLDOWN_TICKS,
            tiers: TierThresholds::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl LiveConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.tiers.is_ordered() {
            return Err(Error::Config(
                "live tier thresholds must satisfy excellent >= good >= okay >= 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingFrame,
    Scoring,
    FeedbackGated,
    Stopped,
    Failed,
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Stopped | LoopState::Failed)
    }
}

/// Shared flag checked once per loop iteration
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of processing one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeedback {
    pub tier: FeedbackTier,
    /// 0-100, `None` when no body was detected
    pub score: Option<f64>,
    /// Display text: tier label, followed by the cues below the excellent tier
    pub display: String,
    /// Speech text, if the gate let it through
    pub spoken: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoopSummary {
    pub frames: usize,
    pub scored_frames: usize,
    pub no_body_frames: usize,
    /// Messages that passed the cooldown gate
    pub emitted: usize,
    /// Messages the speech worker accepted
    pub spoken: usize,
    /// Mean of frame scores; `None` when nothing was scored
    pub mean_score: Option<f64>,
}

/// Live trainer over one capture stream
pub struct LiveLoop<S, E, Sc>
where
    S: FrameSource,
    E: PoseEstimator<Frame = S::Frame>,
    Sc: FrameScorer,
{
    source: S,
    estimator: E,
    scorer: Sc,
    extractor: AngleExtractor,
    smoothed: SmoothedState<Sc::Layout>,
    gate: CooldownGate,
    tiers: TierThresholds,
    speech: Option<SpeechDispatcher>,
    state: LoopState,
    summary: LoopSummary,
    score_total: f64,
}

impl<S, E, Sc> LiveLoop<S, E, Sc>
where
    S: FrameSource,
    E: PoseEstimator<Frame = S::Frame>,
    Sc: FrameScorer,
{
    /// Initialize the pose model and build the loop.
    ///
    /// Any failure from `init_model` surfaces as [`Error::ModelInit`] before
    /// a single frame is read.
    pub fn new<F>(source: S, init_model: F, scorer: Sc, config: &LiveConfig) -> Result<Self>
    where
        F: FnOnce() -> Result<E>,
    {
        config.validate()?;
        let smoothed = SmoothedState::new(config.alpha)?;
        let estimator = init_model().map_err(|e| match e {
            Error::ModelInit(_) => e,
            other => Error::ModelInit(other.to_string()),
        })?;

        Ok(Self {
            source,
            estimator,
            scorer,
            extractor: AngleExtractor::new(config.extractor.clone()),
            smoothed,
            gate: CooldownGate::new(config.cooldown_ticks),
            tiers: config.tiers.clone(),
            speech: None,
            state: LoopState::AwaitingFrame,
            summary: LoopSummary::default(),
            score_total: 0.0,
        })
    }

    pub fn with_speech(mut self, speech: SpeechDispatcher) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn summary(&self) -> &LoopSummary {
        &self.summary
    }

    /// Score one frame's landmarks and run the feedback gate
    pub fn process_frame(&mut self, landmarks: Option<&LandmarkSet>) -> FrameFeedback {
        self.state = LoopState::Scoring;
        self.summary.frames += 1;

        let feedback = match self.extractor.extract::<Sc::Layout>(landmarks) {
            None => {
                self.summary.no_body_frames += 1;
                FrameFeedback {
                    tier: FeedbackTier::NoBody,
                    score: None,
                    display: FeedbackTier::NoBody.label().to_string(),
                    spoken: None,
                }
            }
            Some(angles) => {
                let smoothed = self.smoothed.update(angles);
                let assessment = self.scorer.assess(&AggregateMetrics::from_single(&smoothed));
                let score = assessment.score;
                let tier = self.tiers.classify(score);

                self.summary.scored_frames += 1;
                self.score_total += score;

                let cues = assessment.message(self.scorer.good_form_cue());
                let (display, speech_text) = if tier == FeedbackTier::Excellent {
                    (tier.label().to_string(), PERFECT_FORM_CUE.to_string())
                } else {
                    (format!("{}\n{}", tier.label(), cues), cues)
                };

                self.state = LoopState::FeedbackGated;
                let spoken = self.gate.admit(&display).then_some(speech_text);
                if let Some(text) = &spoken {
                    self.summary.emitted += 1;
                    if self.speech.as_ref().is_some_and(|speech| speech.say(text)) {
                        self.summary.spoken += 1;
                    }
                }

                debug!(score, tier = %tier, "Scored frame");
                FrameFeedback {
                    tier,
                    score: Some(score),
                    display,
                    spoken,
                }
            }
        };

        self.gate.tick();
        self.state = LoopState::AwaitingFrame;
        feedback
    }

    /// Pull, estimate and score one frame. `Ok(None)` at end of stream.
    pub fn step(&mut self) -> Result<Option<FrameFeedback>> {
        if self.state.is_terminal() {
            return Ok(None);
        }

        match self.source.next_frame() {
            Ok(Some(frame)) => {
                let landmarks = self.estimator.process(&frame);
                Ok(Some(self.process_frame(landmarks.as_ref())))
            }
            Ok(None) => {
                self.state = LoopState::Stopped;
                Ok(None)
            }
            Err(e) => {
                self.state = LoopState::Failed;
                error!(error = %e, "Capture failed");
                Err(match e {
                    Error::CaptureFailure(_) => e,
                    other => Error::CaptureFailure(other.to_string()),
                })
            }
        }
    }

    /// Run until the stream ends, `stop` is raised, or capture fails.
    ///
    /// Consumes the loop; the capture device, model and speech worker are
    /// released before returning on every path.
    pub fn run(mut self, stop: &StopSignal) -> Result<LoopSummary> {
        info!("Live feedback started");
        let outcome = loop {
            if stop.is_stopped() {
                self.state = LoopState::Stopped;
                break Ok(());
            }
            match self.step() {
                Ok(Some(_)) => {}
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.source.close();
        self.estimator.close();
        if let Some(mut speech) = self.speech.take() {
            speech.shutdown();
        }

        let mut summary = std::mem::take(&mut self.summary);
        if summary.scored_frames > 0 {
            summary.mean_score = Some(self.score_total / summary.scored_frames as f64);
        }
        info!(
            frames = summary.frames,
            scored = summary.scored_frames,
            emitted = summary.emitted,
            spoken = summary.spoken,
            "Live feedback stopped"
        );
        outcome.map(|()| summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::{PolicyScorer, RangeScorer};
    use crate::source::{PassthroughEstimator, ReplaySource};
    use repform_core::synthetic::{pose_with_angles, PoseAngles};
    use repform_rules::Standards;

    fn good_pose() -> LandmarkSet {
        pose_with_angles(PoseAngles::symmetric(100.0, 110.0))
    }

    fn live(frames: Vec<Option<LandmarkSet>>) -> LiveLoop<ReplaySource, PassthroughEstimator, RangeScorer> {
        LiveLoop::new(
            ReplaySource::new(frames),
            || Ok(PassthroughEstimator),
            RangeScorer::default(),
            &LiveConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_no_body_frame() {
        let mut lp = live(Vec::new());
        let fb = lp.process_frame(None);
        assert_eq!(fb.tier, FeedbackTier::NoBody);
        assert_eq!(fb.score, None);
        assert_eq!(fb.display, "NO BODY DETECTED");
        assert_eq!(lp.state(), LoopState::AwaitingFrame);
    }

    #[test]
    fn test_excellent_frame_speaks_perfect_form() {
        let mut lp = live(Vec::new());
        let pose = good_pose();
        let fb = lp.process_frame(Some(&pose));
        assert_eq!(fb.tier, FeedbackTier::Excellent);
        assert_eq!(fb.spoken.as_deref(), Some(PERFECT_FORM_CUE));

        // Same message inside the cooldown stays quiet
        let fb = lp.process_frame(Some(&pose));
        assert_eq!(fb.spoken, None);
    }

    #[test]
    fn test_poor_frame_speaks_cues() {
        let mut lp = live(Vec::new());
        // Straight legs and closed hips: knee and hip out of range
        let pose = pose_with_angles(PoseAngles::symmetric(178.0, 60.0));
        let fb = lp.process_frame(Some(&pose));
        assert_eq!(fb.tier, FeedbackTier::FixForm);
        let spoken = fb.spoken.unwrap();
        assert!(spoken.contains("Hips too high"));
        assert!(spoken.contains("Need to bend knees more"));
        assert!(fb.display.starts_with("FIX FORM\n"));
    }

    #[test]
    fn test_model_init_failure_is_fatal() {
        let result = LiveLoop::<ReplaySource, PassthroughEstimator, RangeScorer>::new(
            ReplaySource::default(),
            || Err(Error::Io("weights missing".into())),
            RangeScorer::default(),
            &LiveConfig::default(),
        );
        assert!(matches!(result, Err(Error::ModelInit(_))));
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let config = LiveConfig {
            alpha: 0.0,
            ..Default::default()
        };
        let result = LiveLoop::new(
            ReplaySource::default(),
            || Ok(PassthroughEstimator),
            RangeScorer::default(),
            &config,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_run_to_end_of_stream() {
        let frames = vec![Some(good_pose()), None, Some(good_pose())];
        let summary = live(frames).run(&StopSignal::new()).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.scored_frames, 2);
        assert_eq!(summary.no_body_frames, 1);
        assert_eq!(summary.emitted, 1);
        // No speech worker attached
        assert_eq!(summary.spoken, 0);
        assert!(summary.mean_score.unwrap() > 90.0);
    }

    #[test]
    fn test_stop_signal_checked_before_each_frame() {
        let stop = StopSignal::new();
        stop.stop();
        let summary = live(vec![Some(good_pose()); 5]).run(&stop).unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.mean_score, None);
    }

    #[test]
    fn test_policy_scorer_in_loop() {
        let mut lp = LiveLoop::new(
            ReplaySource::default(),
            || Ok(PassthroughEstimator),
            PolicyScorer::new("squat", Standards::default()),
            &LiveConfig::default(),
        )
        .unwrap();
        let pose = pose_with_angles(PoseAngles::symmetric(90.0, 160.0));
        let fb = lp.process_frame(Some(&pose));
        assert_eq!(fb.tier, FeedbackTier::Excellent);
    }
}
