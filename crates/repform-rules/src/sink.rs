//! Report persistence.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use repform_core::{Result, SessionId};
use tracing::debug;

use crate::report::SessionReport;

/// Destination for finished session reports
pub trait ReportSink: Send + Sync {
    fn persist(&self, report: &SessionReport) -> Result<()>;
}

/// Writes each report to `<dir>/<session_id>.json`
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    /// Creates `dir` if it does not exist
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, session_id: SessionId) -> PathBuf {
        self.dir.join(format!("{}.json", session_id))
    }

    pub fn load(&self, session_id: SessionId) -> Result<SessionReport> {
        let file = File::open(self.path_for(session_id))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl ReportSink for JsonFileSink {
    fn persist(&self, report: &SessionReport) -> Result<()> {
        let path = self.path_for(report.session_id);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer.flush()?;
        debug!(path = %path.display(), "Persisted session report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{RecordedSession, SessionAnalyzer};
    use crate::standards::Standards;
    use repform_core::synthetic::{pose_with_angles, PoseAngles};

    #[test]
    fn test_persist_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("reports")).unwrap();

        let frames = (0..25)
            .map(|i| Some(pose_with_angles(PoseAngles::symmetric(90.0 + i as f64, 160.0))))
            .collect();
        let session = RecordedSession::new("lunge", frames);
        let report = SessionAnalyzer::new(Standards::default())
            .unwrap()
            .analyze(&session)
            .unwrap();

        sink.persist(&report).unwrap();
        assert!(sink.path_for(session.session_id).exists());

        let loaded = sink.load(session.session_id).unwrap();
        assert_eq!(loaded.session_id, report.session_id);
        assert_eq!(loaded.issues, report.issues);
        assert_eq!(loaded.recommendations, report.recommendations);
        assert_eq!(loaded.overall_score, report.overall_score);
    }

    #[test]
    fn test_load_missing_report() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path()).unwrap();
        assert!(sink.load(SessionId::new()).is_err());
    }
}
