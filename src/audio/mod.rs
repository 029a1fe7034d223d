//! Audio output — the channel a generator writes rendered PCM into.
//!
//! Every backend accepts signed 8-bit mono samples at 44.1 kHz through the
//! [`OutputChannel`] trait. [`CpalChannel`] plays through the default device
//! via a lock-free ring buffer, [`WavChannel`] writes a WAV file, and
//! [`MemoryChannel`] records writes for inspection.

pub mod callback;
pub mod cpal_channel;
pub mod memory;
pub mod wav;

pub use cpal_channel::CpalChannel;
pub use memory::{MemoryChannel, Recording};
pub use wav::WavChannel;

/// Output channel errors.
#[derive(Debug)]
pub enum ChannelError {
    /// No audio output device found.
    NoOutputDevice,
    /// Failed to query device configuration.
    DeviceConfig(String),
    /// Failed to build the audio stream.
    StreamBuild(String),
    /// Failed to start the audio stream.
    StreamPlay(String),
    /// The channel was used before `open` succeeded.
    NotOpen,
    /// WAV encoding failed.
    Wav(hound::Error),
    /// Filesystem error.
    Io(std::io::Error),
}

impl std::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelError::NoOutputDevice => write!(f, "no audio output device found"),
            ChannelError::DeviceConfig(e) => write!(f, "device config error: {e}"),
            ChannelError::StreamBuild(e) => write!(f, "stream build error: {e}"),
            ChannelError::StreamPlay(e) => write!(f, "stream play error: {e}"),
            ChannelError::NotOpen => write!(f, "output channel is not open"),
            ChannelError::Wav(e) => write!(f, "wav error: {e}"),
            ChannelError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChannelError::Wav(e) => Some(e),
            ChannelError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<hound::Error> for ChannelError {
    fn from(e: hound::Error) -> Self {
        ChannelError::Wav(e)
    }
}

impl From<std::io::Error> for ChannelError {
    fn from(e: std::io::Error) -> Self {
        ChannelError::Io(e)
    }
}

/// A sink for signed 8-bit, mono, 44.1 kHz PCM.
///
/// Methods take `&self` so one generator thread can write while another
/// thread calls [`stop`](OutputChannel::stop).
pub trait OutputChannel: Send + Sync {
    /// Acquire the underlying device or file. Called once, at generator creation.
    fn open(&self) -> Result<(), ChannelError>;

    /// Begin accepting and emitting samples.
    fn start(&self) -> Result<(), ChannelError>;

    /// Queue samples for output, blocking while the sink is full.
    fn write(&self, samples: &[i8]) -> Result<(), ChannelError>;

    /// Block until everything written so far has been emitted.
    fn drain(&self) -> Result<(), ChannelError>;

    /// Stop emitting. Samples still queued may be discarded.
    fn stop(&self) -> Result<(), ChannelError>;
}

impl<T: OutputChannel + ?Sized> OutputChannel for Box<T> {
    fn open(&self) -> Result<(), ChannelError> {
        (**self).open()
    }

    fn start(&self) -> Result<(), ChannelError> {
        (**self).start()
    }

    fn write(&self, samples: &[i8]) -> Result<(), ChannelError> {
        (**self).write(samples)
    }

    fn drain(&self) -> Result<(), ChannelError> {
        (**self).drain()
    }

    fn stop(&self) -> Result<(), ChannelError> {
        (**self).stop()
    }
}
