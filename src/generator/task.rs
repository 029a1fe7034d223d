//! Playback task — completion handle for a run started in the background.

use std::thread::JoinHandle;

use super::PlaybackError;

/// Handle to a run spawned by [`Generator::start`](super::Generator::start).
///
/// Dropping the task detaches the run; the generator still finishes it.
#[derive(Debug)]
pub struct PlaybackTask {
    handle: JoinHandle<Result<(), PlaybackError>>,
}

impl PlaybackTask {
    pub(crate) fn new(handle: JoinHandle<Result<(), PlaybackError>>) -> Self {
        Self { handle }
    }

    /// Block until the run ends and return its outcome.
    pub fn wait(self) -> Result<(), PlaybackError> {
        self.handle.join().unwrap_or(Err(PlaybackError::Panicked))
    }

    /// Whether the run has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
