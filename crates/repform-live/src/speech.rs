//! Spoken feedback.
//!
//! Speech runs on its own worker thread behind a single-slot channel so a
//! slow audio device never delays scoring of the next frame. Utterances
//! offered while the worker is busy are dropped.

use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use repform_core::{Error, Result};
use tracing::{info, warn};

/// Best-effort audio output
pub trait SpeechSink: Send {
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// Writes utterances to the log instead of an audio device
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSpeechSink;

impl SpeechSink for LoggingSpeechSink {
    fn speak(&mut self, text: &str) -> Result<()> {
        info!(target: "repform::speech", "{}", text);
        Ok(())
    }
}

/// Owns the speech worker thread
pub struct SpeechDispatcher {
    tx: Option<SyncSender<String>>,
    worker: Option<JoinHandle<()>>,
}

impl SpeechDispatcher {
    pub fn spawn<S: SpeechSink + 'static>(mut sink: S) -> Result<Self> {
        let (tx, rx) = mpsc::sync_channel::<String>(1);

        let worker = thread::Builder::new()
            .name("repform-speech".into())
            .spawn(move || {
                while let Ok(text) = rx.recv() {
                    if let Err(e) = sink.speak(&text) {
                        warn!(error = %e, "Speech failed");
                    }
                }
            })
            .map_err(|e| Error::Io(format!("failed to start speech worker: {}", e)))?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Queue `text` without blocking; false when it was dropped
    pub fn say(&self, text: &str) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        match tx.try_send(text.to_string()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                warn!("Speech worker has stopped");
                false
            }
        }
    }

    /// Close the channel and wait for the worker to drain
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Speech worker panicked");
            }
        }
    }
}

impl Drop for SpeechDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl SpeechSink for Recorder {
        fn speak(&mut self, text: &str) -> Result<()> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Broken;

    impl SpeechSink for Broken {
        fn speak(&mut self, _text: &str) -> Result<()> {
            Err(Error::Io("no audio device".into()))
        }
    }

    #[test]
    fn test_dispatch_reaches_sink() {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = SpeechDispatcher::spawn(Recorder(spoken.clone())).unwrap();

        assert!(dispatcher.say("Perfect form"));
        dispatcher.shutdown();

        assert_eq!(spoken.lock().unwrap().as_slice(), ["Perfect form"]);
        assert!(!dispatcher.say("after shutdown"));
    }

    #[test]
    fn test_sink_failures_are_swallowed() {
        let mut dispatcher = SpeechDispatcher::spawn(Broken).unwrap();
        dispatcher.say("Hips too high");
        dispatcher.shutdown();
    }
}
