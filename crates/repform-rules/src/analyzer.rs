//! Batch session analysis.

use chrono::Utc;
use rayon::prelude::*;
use repform_core::{
    aggregate_with_minimum, AggregateMetrics, AngleExtractor, AngleVector, Bilateral, Error,
    ExtractorConfig, LandmarkSet, Result, SessionId, DEFAULT_MIN_FRAMES,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::policy::ScoringPolicy;
use crate::report::{compare_metrics, recommendations, strengths, SessionReport};
use crate::standards::Standards;

/// Recorded landmark stream for one exercise set. `None` marks frames where
/// the pose model found no body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSession {
    #[serde(default)]
    pub session_id: SessionId,
    pub exercise: String,
    pub frames: Vec<Option<LandmarkSet>>,
}

impl RecordedSession {
    pub fn new(exercise: impl Into<String>, frames: Vec<Option<LandmarkSet>>) -> Self {
        Self {
            session_id: SessionId::new(),
            exercise: exercise.into(),
            frames,
        }
    }
}

/// Structured error payload returned in place of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub session_id: SessionId,
    pub error_type: String,
    pub message: String,
}

impl AnalysisFailure {
    pub fn new(session_id: SessionId, error: &Error) -> Self {
        Self {
            session_id,
            error_type: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisOutcome {
    Success(SessionReport),
    Error(AnalysisFailure),
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success(_))
    }

    pub fn report(&self) -> Option<&SessionReport> {
        match self {
            AnalysisOutcome::Success(report) => Some(report),
            AnalysisOutcome::Error(_) => None,
        }
    }
}

/// Turns recorded sessions into reports.
///
/// Holds only read-only configuration, so one analyzer can serve many
/// sessions concurrently.
#[derive(Debug, Clone)]
pub struct SessionAnalyzer {
    standards: Standards,
    extractor: AngleExtractor,
    min_frames: usize,
}

impl SessionAnalyzer {
    /// Validates `standards`; extraction defaults to planar (x, y) geometry
    pub fn new(standards: Standards) -> Result<Self> {
        standards.validate()?;
        Ok(Self {
            standards,
            extractor: AngleExtractor::new(ExtractorConfig::planar()),
            min_frames: DEFAULT_MIN_FRAMES,
        })
    }

    pub fn with_extractor(mut self, config: ExtractorConfig) -> Self {
        self.extractor = AngleExtractor::new(config);
        self
    }

    pub fn with_min_frames(mut self, min_frames: usize) -> Self {
        self.min_frames = min_frames.max(1);
        self
    }

    pub fn standards(&self) -> &Standards {
        &self.standards
    }

    /// Analyze one session. Unusable frames are skipped; the session fails
    /// only when too few valid frames remain.
    pub fn analyze(&self, session: &RecordedSession) -> Result<SessionReport> {
        info!(
            session = %session.session_id,
            exercise = %session.exercise,
            frames = session.frames.len(),
            "Starting form analysis"
        );

        let angles: Vec<AngleVector<Bilateral>> = session
            .frames
            .iter()
            .filter_map(|frame| self.extractor.extract(frame.as_ref()))
            .collect();

        let skipped = session.frames.len() - angles.len();
        if skipped > 0 {
            warn!(
                session = %session.session_id,
                skipped,
                "Skipped frames without a valid pose"
            );
        }

        let metrics = aggregate_with_minimum(&angles, self.min_frames)?;
        let report = self.report(
            session.session_id,
            &session.exercise,
            &metrics,
            angles.len(),
            skipped,
        );

        info!(
            session = %report.session_id,
            score = report.overall_score,
            issues = report.issues.len(),
            strengths = report.strengths.len(),
            "Form analysis complete"
        );
        Ok(report)
    }

    /// Build a report from already aggregated metrics
    pub fn report(
        &self,
        session_id: SessionId,
        exercise: &str,
        metrics: &AggregateMetrics,
        total_frames: usize,
        skipped_frames: usize,
    ) -> SessionReport {
        let policy = ScoringPolicy::for_exercise(exercise);
        let score = policy.score(metrics, &self.standards);
        let issues = policy.identify_issues(metrics, exercise, total_frames, &self.standards);

        SessionReport {
            session_id,
            exercise: exercise.to_string(),
            policy,
            overall_score: score.overall_score,
            total_frames,
            skipped_frames,
            metrics: compare_metrics(policy, metrics, &self.standards),
            strengths: strengths(policy, metrics, &issues, exercise, &self.standards),
            recommendations: recommendations(
                policy,
                &issues,
                score.overall_score,
                exercise,
                &self.standards,
            ),
            issues,
            analyzed_at: Utc::now(),
        }
    }

    /// Analyze one session, folding errors into a structured failure
    pub fn analyze_outcome(&self, session: &RecordedSession) -> AnalysisOutcome {
        match self.analyze(session) {
            Ok(report) => AnalysisOutcome::Success(report),
            Err(e) => {
                warn!(session = %session.session_id, error = %e, "Analysis failed");
                AnalysisOutcome::Error(AnalysisFailure::new(session.session_id, &e))
            }
        }
    }

    /// Analyze independent sessions in parallel; output order matches input
    pub fn analyze_sessions(&self, sessions: &[RecordedSession]) -> Vec<AnalysisOutcome> {
        sessions
            .par_iter()
            .map(|session| self.analyze_outcome(session))
            .collect()
    }
}
