//! Ensemble — plays several generators together, loop by loop.
//!
//! Each loop starts every generator on its own thread and waits for all of
//! them to finish before the next loop begins. Voices are not mixed; each
//! keeps its own output channel.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{Generator, PlaybackError, PlaybackTask};

/// A group of generators played in lockstep.
#[derive(Debug)]
pub struct Ensemble {
    generators: Vec<Generator>,
    halted: AtomicBool,
}

impl Ensemble {
    pub fn new(generators: Vec<Generator>) -> Self {
        Self {
            generators,
            halted: AtomicBool::new(false),
        }
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Multiply every generator's playback speed by `factor`.
    pub fn scale_playback_speed(&self, factor: f64) {
        for gen in &self.generators {
            gen.set_playback_speed(gen.playback_speed() * factor);
        }
    }

    /// Play every generator `loops` times, then stop them all.
    ///
    /// A loop ends when every generator's run has ended. Playback stops after
    /// the first loop in which any run fails, and the first failure is
    /// returned.
    pub fn play(&self, loops: usize) -> Result<(), PlaybackError> {
        self.halted.store(false, Ordering::Release);
        let mut first_error = None;

        for _ in 0..loops {
            if self.is_halted() {
                break;
            }
            let tasks: Vec<Result<PlaybackTask, PlaybackError>> =
                self.generators.iter().map(Generator::start).collect();
            for outcome in tasks {
                if let Err(e) = outcome.and_then(PlaybackTask::wait) {
                    first_error.get_or_insert(e);
                }
            }
            if first_error.is_some() {
                break;
            }
        }

        for gen in &self.generators {
            if let Err(e) = gen.stop() {
                first_error.get_or_insert(e.into());
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// End playback early. Voices are stopped in order, each after its
    /// current command, and no further loops start. Safe to call from
    /// another thread.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::Release);
        for gen in &self.generators {
            if let Err(e) = gen.stop() {
                eprintln!("psg: failed to stop {}: {e}", gen.name());
            }
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }
}
