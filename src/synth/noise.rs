//! White-noise rendering by sample-and-hold.

use rand::Rng;

use super::{buffer_len, quantize, RenderSettings, SampleBuffer};
use crate::script::Noise;

/// Render white noise.
///
/// A fresh uniform draw in `[0, 1)` is taken every `step_down` samples and held
/// in between, so larger steps sound lower. With attenuation the held value is
/// divided by `exp(2·i/len)` on every sample; unlike the tone envelope this
/// rate does not depend on duration.
pub fn gen_white_noise<R: Rng + ?Sized>(
    noise: &Noise,
    settings: &RenderSettings,
    rng: &mut R,
) -> SampleBuffer {
    let amp = settings.effective_amp(noise.amp);
    let step_down = noise.step_down.unsigned_abs().max(1);
    let len = buffer_len(settings.effective_ms(noise.ms));

    let mut held = 0.0;
    (0..len)
        .map(|i| {
            if i as u64 % step_down == 0 {
                held = rng.gen::<f64>();
            }
            if noise.attenuate {
                held /= (2.0 * (i as f64 / len as f64)).exp();
            }
            quantize(held, amp)
        })
        .collect()
}
