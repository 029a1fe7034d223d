//! Sample synthesizer — renders tones and white noise into 8-bit PCM buffers.
//!
//! Output format is fixed: mono, signed 8-bit, 44.1 kHz. Durations are scaled
//! by the generator's playback speed and amplitudes by its loudness before
//! rendering.

pub mod noise;
pub mod tone;

use std::sync::Arc;

pub use noise::gen_white_noise;
pub use tone::gen_tone;

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Samples per millisecond of audio.
pub const SAMPLES_PER_MS: f64 = 44.1;

/// A rendered, immutable PCM buffer. Cloning shares the allocation.
pub type SampleBuffer = Arc<[i8]>;

/// Per-generator scaling applied while rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Master volume, nominally `0..=1`.
    pub loudness: f64,
    /// Duration divisor; `2.0` renders everything twice as short.
    pub playback_speed: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            loudness: 1.0,
            playback_speed: 1.0,
        }
    }
}

impl RenderSettings {
    /// `min(1, |amp · loudness|)`.
    pub fn effective_amp(&self, amp: f64) -> f64 {
        (amp * self.loudness).abs().min(1.0)
    }

    /// Duration after playback-speed scaling.
    pub fn effective_ms(&self, ms: f64) -> f64 {
        ms / self.playback_speed
    }
}

/// Number of samples for a duration: `floor(ms · 44.1)`, never negative.
pub fn buffer_len(effective_ms: f64) -> usize {
    let len = (effective_ms * SAMPLES_PER_MS).floor();
    if len.is_finite() && len > 0.0 {
        len as usize
    } else {
        0
    }
}

/// Scale, clamp to `[-1, 1]`, and quantize to a signed 8-bit sample.
pub fn quantize(raw: f64, amp: f64) -> i8 {
    (127.0 * (raw * amp).clamp(-1.0, 1.0)).round() as i8
}
