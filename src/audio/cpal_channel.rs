//! Device output — plays samples through the default cpal output device.
//!
//! The cpal stream lives on its own thread (streams are not `Send` on every
//! host) and pulls from a lock-free ring buffer. Writers push into the ring and
//! spin briefly when it is full, which paces a generator at real time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    traits::{Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};

use super::callback::ChannelCallback;
use super::{ChannelError, OutputChannel};
use crate::synth::SAMPLE_RATE;

/// Ring buffer capacity in samples (100 ms of audio).
const RING_CAPACITY: usize = 4410;

/// How long a blocked writer or drain sleeps between polls.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

struct DeviceThread {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Output channel backed by the default audio device.
pub struct CpalChannel {
    producer: Mutex<Option<HeapProd<i8>>>,
    playing: Arc<AtomicBool>,
    device: Mutex<Option<DeviceThread>>,
}

impl CpalChannel {
    /// Create an unopened channel. No device is touched until [`OutputChannel::open`].
    pub fn new() -> Self {
        Self {
            producer: Mutex::new(None),
            playing: Arc::new(AtomicBool::new(false)),
            device: Mutex::new(None),
        }
    }

    /// Whether `open` has succeeded.
    pub fn is_open(&self) -> bool {
        self.producer().is_some()
    }

    /// Whether the stream is currently emitting queued samples.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    fn producer(&self) -> MutexGuard<'_, Option<HeapProd<i8>>> {
        self.producer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn shutdown(&self) {
        self.playing.store(false, Ordering::Release);
        let device = self
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(device) = device {
            device.shutdown.store(true, Ordering::Release);
            device.handle.thread().unpark();
            if device.handle.join().is_err() {
                eprintln!("psg: audio device thread panicked");
            }
        }
    }
}

impl Default for CpalChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputChannel for CpalChannel {
    fn open(&self) -> Result<(), ChannelError> {
        let mut producer = self.producer();
        if producer.is_some() {
            return Ok(());
        }

        let rb = HeapRb::<i8>::new(RING_CAPACITY);
        let (prod, cons) = rb.split();
        let playing = Arc::clone(&self.playing);
        let shutdown = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_shutdown = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("psg-device".to_string())
            .spawn(move || run_device(cons, playing, thread_shutdown, ready_tx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(ChannelError::StreamBuild(
                    "audio device thread exited".to_string(),
                ));
            }
        }

        *producer = Some(prod);
        *self.device.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(DeviceThread { shutdown, handle });
        Ok(())
    }

    fn start(&self) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::NotOpen);
        }
        self.playing.store(true, Ordering::Release);
        Ok(())
    }

    /// Blocks until every sample is queued. A direct `stop` drops the
    /// remainder. `drain` waits for this lock, so a drain-then-stop
    /// sequence lets the write finish first.
    fn write(&self, samples: &[i8]) -> Result<(), ChannelError> {
        let mut guard = self.producer();
        let producer = guard.as_mut().ok_or(ChannelError::NotOpen)?;

        let mut rest = samples;
        while !rest.is_empty() {
            if !self.playing.load(Ordering::Acquire) {
                return Ok(());
            }
            let pushed = producer.push_slice(rest);
            rest = &rest[pushed..];
            if pushed == 0 {
                thread::sleep(POLL_INTERVAL);
            }
        }
        Ok(())
    }

    fn drain(&self) -> Result<(), ChannelError> {
        let guard = self.producer();
        let producer = guard.as_ref().ok_or(ChannelError::NotOpen)?;
        while self.playing.load(Ordering::Acquire) && !producer.is_empty() {
            thread::sleep(POLL_INTERVAL);
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), ChannelError> {
        self.playing.store(false, Ordering::Release);
        Ok(())
    }
}

impl Drop for CpalChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Body of the device thread: build the stream, report, then hold it open
/// until shutdown.
fn run_device(
    consumer: HeapCons<i8>,
    playing: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<(), ChannelError>>,
) {
    let stream = match build_stream(consumer, playing) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    while !shutdown.load(Ordering::Acquire) {
        thread::park_timeout(Duration::from_millis(50));
    }
    drop(stream);
}

fn build_stream(
    consumer: HeapCons<i8>,
    playing: Arc<AtomicBool>,
) -> Result<cpal::Stream, ChannelError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(ChannelError::NoOutputDevice)?;

    let config = device
        .default_output_config()
        .map_err(|e| ChannelError::DeviceConfig(e.to_string()))?;
    let channels = config.channels();

    let stream_config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    let mut callback = ChannelCallback::new(consumer, playing, channels);
    let err_fn = |err: cpal::StreamError| {
        eprintln!("psg: audio stream error: {err}");
    };

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                callback.process(data);
            },
            err_fn,
            None,
        )
        .map_err(|e| ChannelError::StreamBuild(e.to_string()))?;

    stream
        .play()
        .map_err(|e| ChannelError::StreamPlay(e.to_string()))?;

    Ok(stream)
}
