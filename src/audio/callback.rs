//! Audio callback — runs on the cpal audio thread.
//!
//! Pops 8-bit samples from the ring buffer and spreads each one across every
//! output channel as an `f32` frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ringbuf::traits::Consumer;
use ringbuf::HeapCons;

/// State that lives on the audio thread. Accessed only from the cpal callback.
pub struct ChannelCallback {
    consumer: HeapCons<i8>,
    playing: Arc<AtomicBool>,
    channels: u16,
}

impl ChannelCallback {
    /// Create a callback reading from `consumer`. Output stays silent while
    /// `playing` is false.
    pub fn new(consumer: HeapCons<i8>, playing: Arc<AtomicBool>, channels: u16) -> Self {
        Self {
            consumer,
            playing,
            channels: channels.max(1),
        }
    }

    /// Called by cpal for each audio block. Fills `output` with interleaved frames.
    pub fn process(&mut self, output: &mut [f32]) {
        if !self.playing.load(Ordering::Acquire) {
            output.fill(0.0);
            return;
        }

        for frame in output.chunks_mut(usize::from(self.channels)) {
            // Underrun plays silence.
            let value = self
                .consumer
                .try_pop()
                .map_or(0.0, |s| f32::from(s) / 127.0);
            frame.fill(value);
        }
    }

    /// Returns the channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}
