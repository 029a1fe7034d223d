//! In-memory output — records everything written, for tests and offline use.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{ChannelError, OutputChannel};

/// Everything a [`MemoryChannel`] has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recording {
    pub opened: bool,
    pub started: bool,
    pub drained: bool,
    pub stopped: bool,
    /// One entry per `write` call, in order.
    pub writes: Vec<Vec<i8>>,
}

/// Output channel that keeps written buffers in memory.
///
/// Clones share one recording, so a test can hand a clone to a generator and
/// inspect its own handle afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    recording: Arc<Mutex<Recording>>,
    unavailable: bool,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose `open` fails as if no device were present.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.recording.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the recording so far.
    pub fn recording(&self) -> Recording {
        self.lock().clone()
    }

    /// All written samples, concatenated.
    pub fn samples(&self) -> Vec<i8> {
        self.lock().writes.concat()
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }
}

impl OutputChannel for MemoryChannel {
    fn open(&self) -> Result<(), ChannelError> {
        if self.unavailable {
            return Err(ChannelError::NoOutputDevice);
        }
        self.lock().opened = true;
        Ok(())
    }

    fn start(&self) -> Result<(), ChannelError> {
        let mut rec = self.lock();
        if !rec.opened {
            return Err(ChannelError::NotOpen);
        }
        rec.started = true;
        Ok(())
    }

    fn write(&self, samples: &[i8]) -> Result<(), ChannelError> {
        let mut rec = self.lock();
        if !rec.opened {
            return Err(ChannelError::NotOpen);
        }
        rec.writes.push(samples.to_vec());
        Ok(())
    }

    fn drain(&self) -> Result<(), ChannelError> {
        self.lock().drained = true;
        Ok(())
    }

    fn stop(&self) -> Result<(), ChannelError> {
        self.lock().stopped = true;
        Ok(())
    }
}
