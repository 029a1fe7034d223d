//! Waveform library — phase → amplitude functions used by the tone synthesizer.
//!
//! Fixed shapes take a phase `x` in radians. Composite waveforms average their
//! members at the same phase, and `Dissolve` blends two waveforms by a progress
//! value supplied per sample by the synthesizer.

pub mod parse;

use std::f64::consts::FRAC_2_PI;

use rand::Rng;

pub use parse::ParseWaveformError;

/// Decay constant shared by the percussion shapes.
const PERCUSSION_DECAY: f64 = 175.0;

/// Waveforms selected by percussion mode, indexed by the command's first hex digit.
pub const PERCUSSION: [Waveform; 2] = [Waveform::Kick, Waveform::Snare];

/// A phase → amplitude function.
///
/// Waveforms are compared and hashed by value, so two structurally identical
/// waveforms share one sample cache bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Waveform {
    /// 50% pulse: `sign(sin x)`.
    Square,
    /// `(2/π)·asin(sin x)`.
    Triangle,
    /// `(2/π)·atan(tan(x/2))`.
    Sawtooth,
    /// Plain `sin x`.
    Sine,
    /// Log-swept sine thump with exponential decay.
    Kick,
    /// Kick-like body plus four uniform noise draws. Non-deterministic.
    Snare,
    /// Arithmetic mean of the member waveforms.
    Combine(Vec<Waveform>),
    /// Linear blend from one waveform to another over the rendered buffer.
    Dissolve {
        from: Box<Waveform>,
        to: Box<Waveform>,
    },
}

impl Waveform {
    /// Average several waveforms into one.
    pub fn combine(members: impl IntoIterator<Item = Waveform>) -> Self {
        Waveform::Combine(members.into_iter().collect())
    }

    /// A waveform that starts as `from` and ends as `to`.
    pub fn dissolve(from: Waveform, to: Waveform) -> Self {
        Waveform::Dissolve {
            from: Box::new(from),
            to: Box::new(to),
        }
    }

    /// The percussion waveform for a command's hex index (wraps around the set).
    pub fn percussion(index: u8) -> Self {
        PERCUSSION[usize::from(index) % PERCUSSION.len()].clone()
    }

    /// Evaluate the waveform at phase `x`.
    ///
    /// `progress` is the render position in `[0, 1]`; only time-varying
    /// waveforms read it. `rng` feeds the noise component of [`Waveform::Snare`].
    pub fn sample<R: Rng + ?Sized>(&self, x: f64, progress: f64, rng: &mut R) -> f64 {
        match self {
            Waveform::Square => signum(x.sin()),
            Waveform::Triangle => FRAC_2_PI * x.sin().asin(),
            Waveform::Sawtooth => FRAC_2_PI * (x / 2.0).tan().atan(),
            Waveform::Sine => x.sin(),
            Waveform::Kick => (25.0 * x.ln()).sin() / (x / PERCUSSION_DECAY).exp(),
            Waveform::Snare => {
                let body = (3.5 * x.ln().powi(2)).cos();
                let noise: f64 = (0..4).map(|_| rng.gen::<f64>()).sum();
                (body + noise) / (x / PERCUSSION_DECAY).exp()
            }
            Waveform::Combine(members) => {
                if members.is_empty() {
                    return 0.0;
                }
                let sum: f64 = members.iter().map(|w| w.sample(x, progress, &mut *rng)).sum();
                sum / members.len() as f64
            }
            Waveform::Dissolve { from, to } => {
                let n = progress.clamp(0.0, 1.0);
                (1.0 - n) * from.sample(x, progress, rng) + n * to.sample(x, progress, rng)
            }
        }
    }

    /// Evaluate with the thread-local RNG.
    pub fn evaluate(&self, x: f64, progress: f64) -> f64 {
        self.sample(x, progress, &mut rand::thread_rng())
    }
}

/// `sign` with `sign(0) == 0`, unlike [`f64::signum`].
fn signum(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn square_follows_sine_sign() {
        assert_approx_eq!(Waveform::Square.evaluate(FRAC_PI_2, 0.0), 1.0);
        assert_approx_eq!(Waveform::Square.evaluate(3.0 * FRAC_PI_2, 0.0), -1.0);
        assert_eq!(Waveform::Square.evaluate(0.0, 0.0), 0.0);
    }

    #[test]
    fn triangle_peaks_at_quarter_cycle() {
        assert_approx_eq!(Waveform::Triangle.evaluate(FRAC_PI_2, 0.0), 1.0);
        assert_approx_eq!(Waveform::Triangle.evaluate(FRAC_PI_4, 0.0), 0.5);
        assert_approx_eq!(Waveform::Triangle.evaluate(PI, 0.0), 0.0);
    }

    #[test]
    fn sawtooth_ramps_through_cycle() {
        assert_approx_eq!(Waveform::Sawtooth.evaluate(0.0, 0.0), 0.0);
        assert_approx_eq!(Waveform::Sawtooth.evaluate(FRAC_PI_2, 0.0), 0.5);
        assert_approx_eq!(Waveform::Sawtooth.evaluate(-FRAC_PI_2, 0.0), -0.5);
    }

    #[test]
    fn kick_is_silent_at_unit_phase() {
        assert_approx_eq!(Waveform::Kick.evaluate(1.0, 0.0), 0.0);
    }

    #[test]
    fn kick_decays() {
        let early = (1..200)
            .map(|i| Waveform::Kick.evaluate(i as f64 * 0.1, 0.0).abs())
            .fold(0.0, f64::max);
        let late = (1..200)
            .map(|i| Waveform::Kick.evaluate(2000.0 + i as f64 * 0.1, 0.0).abs())
            .fold(0.0, f64::max);
        assert!(late < early * 0.01, "early {early}, late {late}");
    }

    #[test]
    fn snare_draws_noise() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let values: Vec<f64> = (0..256)
            .map(|_| Waveform::Snare.sample(1.0, 0.0, &mut rng))
            .collect();

        // cos(0) = 1 plus four draws in [0, 1), scaled by exp(-1/175).
        let scale = (1.0f64 / 175.0).exp();
        for &v in &values {
            assert!(v >= 1.0 / scale - 1e-9 && v < 5.0 / scale, "{v}");
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert!((mean - 3.0 / scale).abs() < 0.2, "mean {mean}");
        assert!(values.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn combine_averages_members() {
        let wf = Waveform::combine([Waveform::Square, Waveform::Triangle]);
        assert_approx_eq!(wf.evaluate(FRAC_PI_2, 0.0), 1.0);
        assert_approx_eq!(wf.evaluate(FRAC_PI_4, 0.0), 0.75);
    }

    #[test]
    fn empty_combine_is_silent() {
        assert_eq!(Waveform::Combine(Vec::new()).evaluate(1.0, 0.0), 0.0);
    }

    #[test]
    fn dissolve_blends_by_progress() {
        let wf = Waveform::dissolve(Waveform::Square, Waveform::Triangle);
        let x = FRAC_PI_4;
        assert_approx_eq!(wf.evaluate(x, 0.0), 1.0);
        assert_approx_eq!(wf.evaluate(x, 1.0), 0.5);
        assert_approx_eq!(wf.evaluate(x, 0.5), 0.75);
    }

    #[test]
    fn dissolve_progress_is_clamped() {
        let wf = Waveform::dissolve(Waveform::Square, Waveform::Triangle);
        assert_approx_eq!(wf.evaluate(FRAC_PI_4, 7.0), 0.5);
        assert_approx_eq!(wf.evaluate(FRAC_PI_4, -1.0), 1.0);
    }

    #[test]
    fn fixed_shapes_bounded() {
        for wf in [
            Waveform::Square,
            Waveform::Triangle,
            Waveform::Sawtooth,
            Waveform::Sine,
            Waveform::Kick,
        ] {
            for i in 1..2000 {
                let x = i as f64 * 0.05;
                let v = wf.evaluate(x, 0.0);
                assert!((-1.0..=1.0).contains(&v), "{wf:?} at {x}: {v}");
            }
        }
    }

    #[test]
    fn percussion_index_wraps() {
        assert_eq!(Waveform::percussion(0), Waveform::Kick);
        assert_eq!(Waveform::percussion(1), Waveform::Snare);
        assert_eq!(Waveform::percussion(5), Waveform::Snare);
        assert_eq!(Waveform::percussion(14), Waveform::Kick);
    }

    #[test]
    fn structurally_equal_waveforms_are_equal() {
        let a = Waveform::dissolve(Waveform::Square, Waveform::Sine);
        let b = Waveform::dissolve(Waveform::Square, Waveform::Sine);
        assert_eq!(a, b);
        assert_ne!(a, Waveform::dissolve(Waveform::Sine, Waveform::Square));
    }
}
