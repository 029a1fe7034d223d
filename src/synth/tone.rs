//! Tone rendering with optional attenuation and vibrato.

use std::f64::consts::TAU;

use rand::Rng;

use super::{buffer_len, quantize, RenderSettings, SampleBuffer, SAMPLE_RATE};
use crate::script::Tone;
use crate::waveform::Waveform;

/// Vibrato sweep rate, applied to `progress · duration_ms`.
const VIBRATO_RATE: f64 = 0.03;
/// Vibrato phase deviation.
const VIBRATO_DEPTH: f64 = 1.75;
/// Shortest attenuation time constant, in phase units.
const MIN_DECAY: f64 = 1000.0;

/// Render a tone.
///
/// For each sample `i` the phase is `x = 2π·freq/44100 · i` and the render
/// progress is `n = i / len`. Vibrato shifts the phase by
/// `sin(n·ms·0.03)·1.75`; attenuation divides by `exp(x / max(1000, 1.5·ms))`,
/// so longer notes decay more slowly. Time-varying waveforms receive `n`.
pub fn gen_tone<R: Rng + ?Sized>(
    waveform: &Waveform,
    tone: &Tone,
    settings: &RenderSettings,
    rng: &mut R,
) -> SampleBuffer {
    let amp = settings.effective_amp(tone.amp);
    let ms = settings.effective_ms(tone.ms);
    let len = buffer_len(ms);

    let period = f64::from(SAMPLE_RATE) / tone.freq;
    let step = TAU / period;
    let decay = MIN_DECAY.max(1.5 * ms);

    (0..len)
        .map(|i| {
            let n = i as f64 / len as f64;
            let mut x = step * i as f64;
            if tone.vibrato {
                x += (n * ms * VIBRATO_RATE).sin() * VIBRATO_DEPTH;
            }
            let mut raw = waveform.sample(x, n, &mut *rng);
            if tone.attenuate {
                raw /= (x / decay).exp();
            }
            quantize(raw, amp)
        })
        .collect()
}
