//! psg — a programmable sound generator that renders cached PCM from text scripts.
//!
//! Scripts are parsed into commands ([`script`]), rendered with waveforms
//! ([`waveform`]) by the synthesizer ([`synth`]), memoized in a shared sample
//! cache ([`cache`]) and played by generators ([`generator`]) through an
//! output channel ([`audio`]).

pub mod audio;
pub mod cache;
pub mod config;
pub mod generator;
pub mod script;
pub mod synth;
pub mod waveform;

pub use audio::{ChannelError, OutputChannel};
pub use cache::SampleCache;
pub use generator::{Ensemble, Generator, GeneratorError, PlaybackError, PlaybackTask};
pub use script::{Command, Script, ScriptError};
pub use waveform::Waveform;
