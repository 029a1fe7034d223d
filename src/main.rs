//! psg — command-line script player.
//!
//! Plays one or more scripts together on the default audio device, or renders
//! each one to a WAV file with `--wav-dir`. Defaults come from
//! ~/.psg/config.yaml when present.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use psg::audio::{CpalChannel, OutputChannel, WavChannel};
use psg::config::PsgConfig;
use psg::{Ensemble, Generator, SampleCache, Waveform};

#[derive(clap::Parser)]
#[command(version, about)]
struct Args {
    /// Script files to play together
    #[arg(required = true)]
    scripts: Vec<PathBuf>,
    /// Waveform for the next slot, e.g. `square` or `dissolve(sine,saw)` (repeatable)
    #[arg(short = 'w', long = "waveform")]
    waveforms: Vec<Waveform>,
    /// Play every script with the percussion voices
    #[arg(long)]
    percussion: bool,
    /// Master volume, 0 to 1
    #[arg(short = 'l', long)]
    loudness: Option<f64>,
    /// Playback speed multiplier
    #[arg(short = 's', long)]
    speed: Option<f64>,
    /// Number of times to play the loop segment
    #[arg(short = 'n', long, default_value = "1")]
    loops: usize,
    /// Render to `<dir>/<script>.wav` instead of the audio device
    #[arg(long)]
    wav_dir: Option<PathBuf>,
    /// Seed for snare and noise randomness
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("psg: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = PsgConfig::load().unwrap_or_default();
    let waveforms = if args.waveforms.is_empty() {
        config.waveforms()?
    } else {
        args.waveforms.clone()
    };
    let loudness = args.loudness.unwrap_or(config.loudness);
    let speed = args.speed.unwrap_or(config.playback_speed);
    let seed = args.seed.or(config.seed);

    let cache = Arc::new(SampleCache::with_capacity(config.cache_capacity));
    let mut generators = Vec::with_capacity(args.scripts.len());
    for path in &args.scripts {
        let channel = open_channel(path, args.wav_dir.as_deref());
        let gen = Generator::from_path(path, waveforms.clone(), channel, Arc::clone(&cache))?;
        gen.set_percussion(args.percussion)
            .set_loudness(loudness)
            .set_playback_speed(speed);
        if let Some(seed) = seed {
            gen.set_seed(seed);
        }
        eprintln!("loaded {} ({} commands)", gen.name(), gen.len());
        generators.push(gen);
    }

    let ensemble = Arc::new(Ensemble::new(generators));
    let handler = Arc::clone(&ensemble);
    ctrlc::set_handler(move || handler.halt())?;

    ensemble.play(args.loops)?;

    eprintln!(
        "cache: {} buffers, {} bytes, {} hits, {} misses",
        cache.len(),
        cache.bytes(),
        cache.hits(),
        cache.misses()
    );
    Ok(())
}

fn open_channel(script: &Path, wav_dir: Option<&Path>) -> Box<dyn OutputChannel> {
    match wav_dir {
        Some(dir) => {
            let stem = script
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "out".to_string());
            Box::new(WavChannel::new(dir.join(format!("{stem}.wav"))))
        }
        None => Box::new(CpalChannel::new()),
    }
}
