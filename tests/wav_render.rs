//! WAV render integration tests — scripts rendered to disk through `WavChannel`.

use std::sync::Arc;

use hound::WavReader;
use psg::audio::wav::WAV_SPEC;
use psg::audio::WavChannel;
use psg::synth::SAMPLES_PER_MS;
use psg::{Generator, GeneratorError, SampleCache, Waveform};
use tempfile::TempDir;

fn read_samples(path: &std::path::Path) -> Vec<i8> {
    let mut reader = WavReader::open(path).expect("wav should open");
    assert_eq!(reader.spec(), WAV_SPEC);
    reader.samples::<i8>().map(Result::unwrap).collect()
}

#[test]
fn script_file_renders_to_wav() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("tune.psg");
    std::fs::write(&script, "c 0\n441 1 100\nc 1\n441 0.5 100\nw 1 50 a\n").unwrap();
    let out = dir.path().join("tune.wav");

    let gen = Generator::from_path(
        &script,
        vec![Waveform::Square, Waveform::Triangle],
        WavChannel::new(&out),
        Arc::new(SampleCache::new()),
    )
    .unwrap();
    assert_eq!(gen.name(), "tune");
    gen.set_seed(1);
    gen.run().unwrap();
    gen.stop().unwrap();
    drop(gen);

    let samples = read_samples(&out);
    let tone = (100.0 * SAMPLES_PER_MS).floor() as usize;
    let noise = (50.0 * SAMPLES_PER_MS).floor() as usize;
    assert_eq!(samples.len(), 2 * tone + noise);

    // Square at full scale, then a half-amplitude triangle.
    assert_eq!(samples[10], 127);
    let triangle_peak = samples[tone..2 * tone]
        .iter()
        .map(|s| s.unsigned_abs())
        .max()
        .unwrap();
    assert!((63..=64).contains(&triangle_peak), "peak {triangle_peak}");
    // Noise is never negative.
    assert!(samples[2 * tone..].iter().all(|&s| s >= 0));
}

#[test]
fn unwritable_output_fails_construction() {
    let dir = TempDir::new().unwrap();
    let result = Generator::new(
        "440 1 10".as_bytes(),
        "nowhere",
        Vec::new(),
        WavChannel::new(dir.path().join("missing").join("out.wav")),
        Arc::new(SampleCache::new()),
    );
    assert!(matches!(result, Err(GeneratorError::Channel(_))));
}

#[test]
fn playback_speed_shortens_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("fast.wav");
    let gen = Generator::new(
        "440 1 200\n".as_bytes(),
        "fast",
        Vec::new(),
        WavChannel::new(&out),
        Arc::new(SampleCache::new()),
    )
    .unwrap();
    gen.set_playback_speed(2.0);
    gen.run().unwrap();
    drop(gen);

    assert_eq!(read_samples(&out).len(), (100.0 * SAMPLES_PER_MS).floor() as usize);
}
