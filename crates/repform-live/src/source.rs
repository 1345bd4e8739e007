//! Capture and pose-estimation collaborators.

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::thread;
use std::time::Duration;

use repform_core::{Error, LandmarkSet, Result};
use repform_rules::RecordedSession;
use tracing::debug;

/// Frame-by-frame capture device
pub trait FrameSource {
    type Frame;

    /// Next frame, `Ok(None)` at end of stream, `Err` on hardware failure
    fn next_frame(&mut self) -> Result<Option<Self::Frame>>;

    /// Release the device; called once when the loop exits
    fn close(&mut self) {}
}

/// Pose model turning a captured frame into landmarks
pub trait PoseEstimator {
    type Frame;

    /// `None` when no body is detected
    fn process(&mut self, frame: &Self::Frame) -> Option<LandmarkSet>;

    fn close(&mut self) {}
}

/// Replays a recorded landmark stream in place of a camera
#[derive(Debug, Default)]
pub struct ReplaySource {
    frames: VecDeque<Option<LandmarkSet>>,
    interval: Option<Duration>,
}

impl ReplaySource {
    pub fn new(frames: impl IntoIterator<Item = Option<LandmarkSet>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            interval: None,
        }
    }

    pub fn from_session(session: RecordedSession) -> Self {
        Self::new(session.frames)
    }

    /// Load a recorded session (JSON)
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let session: RecordedSession = serde_json::from_reader(BufReader::new(file))?;
        debug!(
            path = %path.as_ref().display(),
            frames = session.frames.len(),
            "Loaded replay"
        );
        Ok(Self::from_session(session))
    }

    /// Pace frames at `fps` instead of replaying as fast as possible.
    /// Zero disables pacing.
    pub fn with_frame_rate(mut self, fps: f64) -> Result<Self> {
        self.interval = frame_interval(fps)?;
        Ok(self)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    type Frame = Option<LandmarkSet>;

    fn next_frame(&mut self) -> Result<Option<Self::Frame>> {
        let frame = self.frames.pop_front();
        if frame.is_some() {
            if let Some(interval) = self.interval {
                thread::sleep(interval);
            }
        }
        Ok(frame)
    }

    fn close(&mut self) {
        self.frames.clear();
    }
}

/// Delay between frames at `fps`; `None` for zero (unpaced)
pub fn frame_interval(fps: f64) -> Result<Option<Duration>> {
    if fps == 0.0 {
        return Ok(None);
    }
    if !fps.is_finite() || fps < 0.0 {
        return Err(Error::Config(format!("frame rate must be a positive number, got {fps}")));
    }
    Duration::try_from_secs_f64(1.0 / fps)
        .map(Some)
        .map_err(|_| Error::Config(format!("frame rate {fps} is too low to pace")))
}

/// Estimator for sources that already carry landmarks
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughEstimator;

impl PoseEstimator for PassthroughEstimator {
    type Frame = Option<LandmarkSet>;

    fn process(&mut self, frame: &Self::Frame) -> Option<LandmarkSet> {
        frame.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repform_core::synthetic::{pose_with_angles, PoseAngles};
    use std::io::Write;

    #[test]
    fn test_replay_order_and_end_of_stream() {
        let pose = pose_with_angles(PoseAngles::symmetric(100.0, 160.0));
        let mut source = ReplaySource::new(vec![Some(pose.clone()), None]);

        assert_eq!(source.next_frame().unwrap(), Some(Some(pose)));
        assert_eq!(source.next_frame().unwrap(), Some(None));
        assert_eq!(source.next_frame().unwrap(), None);
    }

    #[test]
    fn test_replay_from_file() {
        let session = RecordedSession::new(
            "squat",
            vec![Some(pose_with_angles(PoseAngles::symmetric(90.0, 150.0))); 3],
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&session).unwrap().as_bytes())
            .unwrap();

        let source = ReplaySource::from_path(file.path()).unwrap();
        assert_eq!(source.remaining(), 3);
    }

    #[test]
    fn test_frame_interval_bounds() {
        assert_eq!(frame_interval(0.0).unwrap(), None);
        assert_eq!(frame_interval(4.0).unwrap(), Some(Duration::from_millis(250)));
        assert!(frame_interval(-1.0).is_err());
        assert!(frame_interval(f64::NAN).is_err());
        assert!(frame_interval(1e-20).is_err());
        assert!(ReplaySource::default().with_frame_rate(1e-20).is_err());
    }

    #[test]
    fn test_replay_missing_file() {
        assert!(ReplaySource::from_path("/nonexistent/replay.json").is_err());
    }
}
