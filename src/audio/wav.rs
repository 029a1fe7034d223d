//! WAV file output — renders a generator to disk instead of a device.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use hound::{SampleFormat, WavSpec, WavWriter};

use super::{ChannelError, OutputChannel};
use crate::synth::SAMPLE_RATE;

/// The on-disk format: mono, signed 8-bit, 44.1 kHz.
pub const WAV_SPEC: WavSpec = WavSpec {
    channels: 1,
    sample_rate: SAMPLE_RATE,
    bits_per_sample: 8,
    sample_format: SampleFormat::Int,
};

type Writer = WavWriter<BufWriter<File>>;

/// Output channel that appends every written sample to a WAV file.
///
/// The file is created by `open` and finalized on drop (or by
/// [`WavChannel::finalize`]). Writes never block.
pub struct WavChannel {
    path: PathBuf,
    writer: Mutex<Option<Writer>>,
}

impl WavChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&self) -> MutexGuard<'_, Option<Writer>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the WAV header lengths and close the file. Later writes fail
    /// with [`ChannelError::NotOpen`].
    pub fn finalize(&self) -> Result<(), ChannelError> {
        match self.writer().take() {
            Some(writer) => Ok(writer.finalize()?),
            None => Ok(()),
        }
    }
}

impl OutputChannel for WavChannel {
    fn open(&self) -> Result<(), ChannelError> {
        let mut writer = self.writer();
        if writer.is_none() {
            *writer = Some(WavWriter::create(&self.path, WAV_SPEC)?);
        }
        Ok(())
    }

    fn start(&self) -> Result<(), ChannelError> {
        if self.writer().is_none() {
            return Err(ChannelError::NotOpen);
        }
        Ok(())
    }

    fn write(&self, samples: &[i8]) -> Result<(), ChannelError> {
        let mut guard = self.writer();
        let writer = guard.as_mut().ok_or(ChannelError::NotOpen)?;
        for &s in samples {
            writer.write_sample(s)?;
        }
        Ok(())
    }

    fn drain(&self) -> Result<(), ChannelError> {
        let mut guard = self.writer();
        let writer = guard.as_mut().ok_or(ChannelError::NotOpen)?;
        writer.flush()?;
        Ok(())
    }

    fn stop(&self) -> Result<(), ChannelError> {
        match self.writer().as_mut() {
            Some(writer) => Ok(writer.flush()?),
            None => Ok(()),
        }
    }
}

impl Drop for WavChannel {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            eprintln!("psg: failed to finalize {}: {e}", self.path.display());
        }
    }
}
