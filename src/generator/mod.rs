//! Playback engine — runs a script against an output channel.
//!
//! A [`Generator`] owns a parsed [`Script`], a waveform slot table, playback
//! settings and one output channel. Each run plays the script's intro (first
//! run only) and then its loop segment, rendering every command through the
//! shared [`SampleCache`] and writing the buffer to the channel. The channel
//! write blocks in real time, which keeps a run paced to the audio clock.

pub mod ensemble;
pub mod error;
pub mod log;
pub mod task;

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::audio::{ChannelError, OutputChannel};
use crate::cache::SampleCache;
use crate::script::{hex_nibble, Command, Instruction, Script, ScriptError};
use crate::synth::{gen_tone, gen_white_noise, RenderSettings};
use crate::waveform::Waveform;

pub use ensemble::Ensemble;
pub use error::{GeneratorError, PlaybackError};
pub use log::{ErrorEntry, ErrorLog};
pub use task::PlaybackTask;

/// Lock-free playback flags and scalars, readable while a run is in progress.
struct Controls {
    /// Playback requested. Cleared by `stop` and when a run ends.
    running: AtomicBool,
    /// A run is executing. Guards against overlapping runs.
    active: AtomicBool,
    percussion: AtomicBool,
    loudness: AtomicU64,
    playback_speed: AtomicU64,
}

impl Controls {
    fn new() -> Self {
        let defaults = RenderSettings::default();
        Self {
            running: AtomicBool::new(false),
            active: AtomicBool::new(false),
            percussion: AtomicBool::new(false),
            loudness: AtomicU64::new(defaults.loudness.to_bits()),
            playback_speed: AtomicU64::new(defaults.playback_speed.to_bits()),
        }
    }

    fn loudness(&self) -> f64 {
        f64::from_bits(self.loudness.load(Ordering::Acquire))
    }

    fn playback_speed(&self) -> f64 {
        f64::from_bits(self.playback_speed.load(Ordering::Acquire))
    }

    fn settings(&self) -> RenderSettings {
        RenderSettings {
            loudness: self.loudness(),
            playback_speed: self.playback_speed(),
        }
    }
}

struct Shared {
    name: String,
    script: Script,
    intro_played: AtomicBool,
    pointer: AtomicU8,
    waveforms: Mutex<Vec<Option<Waveform>>>,
    rng: Mutex<ChaCha8Rng>,
    controls: Controls,
    channel: Box<dyn OutputChannel>,
    cache: Arc<SampleCache>,
    errors: Mutex<ErrorLog>,
}

/// One voice: a script, its waveforms, and a dedicated output channel.
///
/// Cloning a generator yields another handle to the same voice.
#[derive(Clone)]
pub struct Generator {
    shared: Arc<Shared>,
}

impl Generator {
    /// Load a script and open `channel`.
    ///
    /// `waveforms` fill slots `0..`; an empty list gives a single square slot.
    /// Fails if the script cannot be read or the channel cannot be opened.
    pub fn new<R, C>(
        source: R,
        name: impl Into<String>,
        waveforms: Vec<Waveform>,
        channel: C,
        cache: Arc<SampleCache>,
    ) -> Result<Self, GeneratorError>
    where
        R: Read,
        C: OutputChannel + 'static,
    {
        let script = Script::from_reader(source)?;
        channel.open()?;

        let waveforms = if waveforms.is_empty() {
            vec![Waveform::Square]
        } else {
            waveforms
        };
        for wf in &waveforms {
            cache.register(Some(wf));
        }

        Ok(Self {
            shared: Arc::new(Shared {
                name: name.into(),
                script,
                intro_played: AtomicBool::new(false),
                pointer: AtomicU8::new(0),
                waveforms: Mutex::new(waveforms.into_iter().map(Some).collect()),
                rng: Mutex::new(ChaCha8Rng::from_entropy()),
                controls: Controls::new(),
                channel: Box::new(channel),
                cache,
                errors: Mutex::new(ErrorLog::default()),
            }),
        })
    }

    /// Load a script file. The generator is named after the file stem.
    pub fn from_path<C>(
        path: &Path,
        waveforms: Vec<Waveform>,
        channel: C,
        cache: Arc<SampleCache>,
    ) -> Result<Self, GeneratorError>
    where
        C: OutputChannel + 'static,
    {
        let file = File::open(path)
            .map_err(|e| ScriptError::io(format!("{}: {e}", path.display()), 0))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(file, name, waveforms, channel, cache)
    }

    /// Play once on the calling thread, blocking until the run ends.
    pub fn run(&self) -> Result<(), PlaybackError> {
        self.shared.claim()?;
        self.shared.finish(self.shared.play())
    }

    /// Play once on a new thread. The returned task signals completion.
    pub fn start(&self) -> Result<PlaybackTask, PlaybackError> {
        self.shared.claim()?;
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("psg-{}", self.shared.name))
            .spawn(move || shared.finish(shared.play()));
        match spawned {
            Ok(handle) => Ok(PlaybackTask::new(handle)),
            Err(e) => {
                self.shared.release();
                Err(PlaybackError::Spawn(e))
            }
        }
    }

    /// Request the current run to end, then drain and stop the channel.
    ///
    /// The run ends after its in-flight command. Idempotent.
    pub fn stop(&self) -> Result<(), ChannelError> {
        self.shared.controls.running.store(false, Ordering::Release);
        self.shared.channel.drain()?;
        self.shared.channel.stop()
    }

    /// Whether a run is in progress and has not been asked to stop.
    pub fn is_running(&self) -> bool {
        self.shared.controls.running.load(Ordering::Acquire)
    }

    /// Route tones to kick and snare instead of the waveform table.
    pub fn set_percussion(&self, percussion: bool) -> &Self {
        self.shared
            .controls
            .percussion
            .store(percussion, Ordering::Release);
        self
    }

    /// Whether percussion routing is on.
    pub fn is_percussion(&self) -> bool {
        self.shared.controls.percussion.load(Ordering::Acquire)
    }

    /// Set the master volume. Stored as `|loudness|`.
    pub fn set_loudness(&self, loudness: f64) -> &Self {
        self.shared
            .controls
            .loudness
            .store(loudness.abs().to_bits(), Ordering::Release);
        self
    }

    /// Current master volume.
    pub fn loudness(&self) -> f64 {
        self.shared.controls.loudness()
    }

    /// Set the playback speed. Zero is ignored.
    pub fn set_playback_speed(&self, speed: f64) -> &Self {
        if speed != 0.0 {
            self.shared
                .controls
                .playback_speed
                .store(speed.to_bits(), Ordering::Release);
        }
        self
    }

    /// Current playback speed.
    pub fn playback_speed(&self) -> f64 {
        self.shared.controls.playback_speed()
    }

    /// The waveform in `slot`, if any.
    pub fn waveform(&self, slot: usize) -> Option<Waveform> {
        self.shared.waveforms().get(slot).cloned().flatten()
    }

    /// Put `waveform` in `slot`, growing the table with empty slots as needed.
    pub fn set_waveform(&self, slot: usize, waveform: Waveform) -> &Self {
        self.shared.cache.register(Some(&waveform));
        let mut table = self.shared.waveforms();
        if slot >= table.len() {
            table.resize(slot + 1, None);
        }
        table[slot] = Some(waveform);
        drop(table);
        self
    }

    /// Number of waveform slots, empty ones included.
    pub fn slot_count(&self) -> usize {
        self.shared.waveforms().len()
    }

    /// Reseed the random source behind snare and white-noise renders.
    pub fn set_seed(&self, seed: u64) -> &Self {
        *self.shared.rng() = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Display name, usually the script's file stem.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Number of commands a run will still visit. Before the first run this
    /// counts the intro and its `end` marker; afterwards only the loop segment.
    pub fn len(&self) -> usize {
        if self.shared.intro_played.load(Ordering::Acquire) {
            self.shared.script.body().len()
        } else {
            self.shared.script.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The pending command list, as counted by [`len`](Self::len).
    pub fn commands(&self) -> Vec<Command> {
        if self.shared.intro_played.load(Ordering::Acquire) {
            self.shared.script.body().to_vec()
        } else {
            self.shared.script.commands()
        }
    }

    /// The most recent run failures, newest last.
    pub fn recent_errors(&self, n: usize) -> Vec<ErrorEntry> {
        self.shared
            .errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recent(n)
    }

    /// The cache this generator renders into.
    pub fn cache(&self) -> &Arc<SampleCache> {
        &self.shared.cache
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("name", &self.shared.name)
            .field("commands", &self.len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Shared {
    fn waveforms(&self) -> MutexGuard<'_, Vec<Option<Waveform>>> {
        self.waveforms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rng(&self) -> MutexGuard<'_, ChaCha8Rng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enter the running state, or fail if a run is already executing.
    fn claim(&self) -> Result<(), PlaybackError> {
        self.controls
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PlaybackError::AlreadyRunning)?;
        self.controls.running.store(true, Ordering::Release);
        Ok(())
    }

    fn release(&self) {
        self.controls.running.store(false, Ordering::Release);
        self.controls.active.store(false, Ordering::Release);
    }

    fn finish(&self, result: Result<(), PlaybackError>) -> Result<(), PlaybackError> {
        if let Err(e) = &result {
            self.errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(format!("{}: {e}", self.name));
        }
        self.release();
        result
    }

    fn play(&self) -> Result<(), PlaybackError> {
        self.channel.start()?;
        if !self.intro_played.swap(true, Ordering::AcqRel) {
            self.play_segment(self.script.intro())?;
        }
        self.play_segment(self.script.body())
    }

    fn play_segment(&self, commands: &[Command]) -> Result<(), PlaybackError> {
        for command in commands {
            if !self.controls.running.load(Ordering::Acquire) {
                break;
            }
            self.process(command)?;
        }
        Ok(())
    }

    fn process(&self, command: &Command) -> Result<(), PlaybackError> {
        let percussion = self.controls.percussion.load(Ordering::Acquire);
        let settings = self.controls.settings();

        let buffer = match Instruction::decode(command, percussion)? {
            Instruction::End => return Ok(()),
            Instruction::SelectWaveform(slot) => {
                self.pointer.store(slot, Ordering::Release);
                return Ok(());
            }
            Instruction::Tone(tone) => {
                let waveform = if percussion {
                    percussion_waveform(command)
                } else {
                    self.active_waveform(command.line())?
                };
                self.cache.get_or_create(Some(&waveform), command, || {
                    gen_tone(&waveform, &tone, &settings, &mut *self.rng())
                })
            }
            Instruction::Noise(noise) => {
                let key = percussion.then(|| percussion_waveform(command));
                self.cache.get_or_create(key.as_ref(), command, || {
                    gen_white_noise(&noise, &settings, &mut *self.rng())
                })
            }
        };

        self.channel.write(&buffer)?;
        Ok(())
    }

    fn active_waveform(&self, line: usize) -> Result<Waveform, PlaybackError> {
        let slot = self.pointer.load(Ordering::Acquire);
        self.waveforms()
            .get(usize::from(slot))
            .cloned()
            .flatten()
            .ok_or(PlaybackError::EmptyWaveformSlot { slot, line })
    }
}

/// Percussion voice for a command: the hex value of its first character
/// (non-hex counts as 0), wrapped over the percussion set.
fn percussion_waveform(command: &Command) -> Waveform {
    let index = command
        .head()
        .chars()
        .next()
        .and_then(hex_nibble)
        .unwrap_or(0);
    Waveform::percussion(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryChannel;
    use crate::synth::SAMPLES_PER_MS;

    fn generator(script: &str) -> (Generator, MemoryChannel) {
        let channel = MemoryChannel::new();
        let gen = Generator::new(
            script.as_bytes(),
            "test",
            Vec::new(),
            channel.clone(),
            Arc::new(SampleCache::new()),
        )
        .unwrap();
        (gen, channel)
    }

    fn samples_for(ms: f64) -> usize {
        (ms * SAMPLES_PER_MS).floor() as usize
    }

    #[test]
    fn new_opens_channel_and_defaults_to_square() {
        let (gen, channel) = generator("440 1 10");
        assert!(channel.recording().opened);
        assert_eq!(gen.waveform(0), Some(Waveform::Square));
        assert_eq!(gen.slot_count(), 1);
        assert_eq!(gen.name(), "test");
        assert!(!gen.is_running());
    }

    #[test]
    fn unavailable_channel_is_fatal() {
        let result = Generator::new(
            "440 1 10".as_bytes(),
            "x",
            Vec::new(),
            MemoryChannel::unavailable(),
            Arc::new(SampleCache::new()),
        );
        assert!(matches!(
            result,
            Err(GeneratorError::Channel(ChannelError::NoOutputDevice))
        ));
    }

    #[test]
    fn missing_file_is_fatal() {
        let result = Generator::from_path(
            Path::new("/definitely/not/here.psg"),
            Vec::new(),
            MemoryChannel::new(),
            Arc::new(SampleCache::new()),
        );
        assert!(matches!(result, Err(GeneratorError::Script(_))));
    }

    #[test]
    fn run_writes_one_buffer_per_sound() {
        let (gen, channel) = generator("440 1 10\nc 0\nw 1 20\n// comment\n220 0.5 5");
        gen.run().unwrap();

        let rec = channel.recording();
        assert!(rec.started);
        let lens: Vec<usize> = rec.writes.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![samples_for(10.0), samples_for(20.0), samples_for(5.0)]);
        assert!(!gen.is_running());
    }

    #[test]
    fn intro_plays_only_on_first_run() {
        let (gen, channel) = generator("100 1 10\nend\n200 1 20");
        assert_eq!(gen.len(), 3);

        gen.run().unwrap();
        assert_eq!(channel.write_count(), 2);
        assert_eq!(gen.len(), 1);
        assert_eq!(gen.commands(), vec![Command::from_text("200 1 20")]);

        gen.run().unwrap();
        let writes = channel.recording().writes;
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[2].len(), samples_for(20.0));
    }

    #[test]
    fn malformed_number_fails_fast_with_line() {
        let (gen, channel) = generator("440 1 10\n440 loud 10\n440 1 10");
        let err = gen.run().unwrap_err();
        match err {
            PlaybackError::Script(e) => assert_eq!(e.line, 2),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(channel.write_count(), 1);
        assert!(!gen.is_running());

        let errors = gen.recent_errors(5);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("[line 2]"));
    }

    #[test]
    fn empty_slot_is_reported() {
        let (gen, _channel) = generator("c 3\n440 1 10");
        assert!(matches!(
            gen.run(),
            Err(PlaybackError::EmptyWaveformSlot { slot: 3, line: 2 })
        ));
    }

    #[test]
    fn select_waveform_switches_bucket() {
        let (gen, _channel) = generator("440 1 10\nc 1\n440 1 10");
        gen.set_waveform(1, Waveform::Triangle);
        gen.run().unwrap();

        let cmd = Command::from_text("440 1 10");
        assert!(gen.cache().get(Some(&Waveform::Square), &cmd).is_some());
        assert!(gen.cache().get(Some(&Waveform::Triangle), &cmd).is_some());
    }

    #[test]
    fn noise_uses_noise_bucket() {
        let (gen, _channel) = generator("w4 1 10");
        gen.run().unwrap();
        assert!(gen.cache().get(None, &Command::from_text("w4 1 10")).is_some());
    }

    #[test]
    fn percussion_routes_by_first_hex_digit() {
        let (gen, _channel) = generator("5 1 10\n4 1 10");
        gen.set_percussion(true).set_waveform(0, Waveform::Sine);
        gen.run().unwrap();

        let cache = gen.cache();
        assert!(cache
            .get(Some(&Waveform::percussion(5)), &Command::from_text("5 1 10"))
            .is_some());
        assert!(cache
            .get(Some(&Waveform::Kick), &Command::from_text("4 1 10"))
            .is_some());
        assert!(cache
            .get(Some(&Waveform::Sine), &Command::from_text("5 1 10"))
            .is_none());
    }

    #[test]
    fn repeated_command_hits_cache() {
        let (gen, channel) = generator("440 1 10\n440 1 10\n440 1 10");
        gen.run().unwrap();
        assert_eq!(gen.cache().misses(), 1);
        assert_eq!(gen.cache().hits(), 2);
        let writes = channel.recording().writes;
        assert_eq!(writes[0], writes[1]);
        assert_eq!(writes[1], writes[2]);
    }

    #[test]
    fn double_space_fails_with_format_error() {
        let (gen, channel) = generator("440 1 10\n440  1  10");
        let err = gen.run().unwrap_err();
        assert_eq!(err.to_string(), "[line 2] not a number: ''");
        assert_eq!(channel.write_count(), 1);
        assert_eq!(gen.cache().misses(), 1);
    }

    #[test]
    fn settings_mutators() {
        let (gen, _channel) = generator("");
        gen.set_loudness(-0.5).set_playback_speed(2.0);
        assert_eq!(gen.loudness(), 0.5);
        assert_eq!(gen.playback_speed(), 2.0);

        gen.set_playback_speed(0.0);
        assert_eq!(gen.playback_speed(), 2.0);

        assert!(!gen.is_percussion());
        gen.set_percussion(true);
        assert!(gen.is_percussion());
    }

    #[test]
    fn set_waveform_grows_table() {
        let (gen, _channel) = generator("");
        gen.set_waveform(4, Waveform::Sawtooth);
        assert_eq!(gen.slot_count(), 5);
        assert_eq!(gen.waveform(4), Some(Waveform::Sawtooth));
        assert_eq!(gen.waveform(2), None);
        assert_eq!(gen.waveform(99), None);
    }

    #[test]
    fn playback_speed_shortens_buffers() {
        let (gen, channel) = generator("440 1 100");
        gen.set_playback_speed(4.0);
        gen.run().unwrap();
        assert_eq!(channel.recording().writes[0].len(), samples_for(25.0));
    }

    #[test]
    fn start_runs_in_background() {
        let (gen, channel) = generator("440 1 10\n880 1 10");
        let task = gen.start().unwrap();
        task.wait().unwrap();
        assert_eq!(channel.write_count(), 2);
        assert!(!gen.is_running());
    }

    #[test]
    fn stop_is_idempotent_and_drains() {
        let (gen, channel) = generator("440 1 10");
        gen.stop().unwrap();
        gen.stop().unwrap();
        let rec = channel.recording();
        assert!(rec.drained && rec.stopped);
        assert!(!gen.is_running());
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let render = || {
            let (gen, channel) = generator("w 1 10");
            gen.set_seed(9);
            gen.run().unwrap();
            channel.samples()
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn debug_shows_name() {
        let (gen, _channel) = generator("440 1 10");
        assert!(format!("{gen:?}").contains("test"));
    }
}
