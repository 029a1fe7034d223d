//! Generator error types.

use std::fmt;

use crate::audio::ChannelError;
use crate::script::ScriptError;

/// A generator could not be constructed.
#[derive(Debug)]
pub enum GeneratorError {
    /// The script source was unreadable.
    Script(ScriptError),
    /// The output channel could not be opened.
    Channel(ChannelError),
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::Script(e) => write!(f, "script error: {e}"),
            GeneratorError::Channel(e) => write!(f, "output channel unavailable: {e}"),
        }
    }
}

impl std::error::Error for GeneratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeneratorError::Script(e) => Some(e),
            GeneratorError::Channel(e) => Some(e),
        }
    }
}

impl From<ScriptError> for GeneratorError {
    fn from(e: ScriptError) -> Self {
        GeneratorError::Script(e)
    }
}

impl From<ChannelError> for GeneratorError {
    fn from(e: ChannelError) -> Self {
        GeneratorError::Channel(e)
    }
}

/// A run ended abnormally.
#[derive(Debug)]
pub enum PlaybackError {
    /// The generator was already running.
    AlreadyRunning,
    /// A command could not be decoded. The run stops at that line.
    Script(ScriptError),
    /// A tone selected a waveform slot that holds no waveform.
    EmptyWaveformSlot { slot: u8, line: usize },
    /// The output channel failed.
    Channel(ChannelError),
    /// The playback thread could not be spawned.
    Spawn(std::io::Error),
    /// The playback thread panicked.
    Panicked,
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::AlreadyRunning => write!(f, "generator is already running"),
            PlaybackError::Script(e) => write!(f, "{e}"),
            PlaybackError::EmptyWaveformSlot { slot, line } => {
                write!(f, "[line {line}] waveform slot {slot:x} is empty")
            }
            PlaybackError::Channel(e) => write!(f, "output channel error: {e}"),
            PlaybackError::Spawn(e) => write!(f, "cannot spawn playback thread: {e}"),
            PlaybackError::Panicked => write!(f, "playback thread panicked"),
        }
    }
}

impl std::error::Error for PlaybackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlaybackError::Script(e) => Some(e),
            PlaybackError::Channel(e) => Some(e),
            PlaybackError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ScriptError> for PlaybackError {
    fn from(e: ScriptError) -> Self {
        PlaybackError::Script(e)
    }
}

impl From<ChannelError> for PlaybackError {
    fn from(e: ChannelError) -> Self {
        PlaybackError::Channel(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_error_display() {
        assert_eq!(
            PlaybackError::AlreadyRunning.to_string(),
            "generator is already running"
        );
        assert_eq!(
            PlaybackError::EmptyWaveformSlot { slot: 11, line: 4 }.to_string(),
            "[line 4] waveform slot b is empty"
        );
        assert_eq!(
            PlaybackError::from(ScriptError::invalid_number("x", 2)).to_string(),
            "[line 2] not a number: 'x'"
        );
    }

    #[test]
    fn test_generator_error_wraps_channel() {
        let err = GeneratorError::from(ChannelError::NoOutputDevice);
        assert_eq!(
            err.to_string(),
            "output channel unavailable: no audio output device found"
        );
    }
}
