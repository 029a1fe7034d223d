//! Configuration — loads optional ~/.psg/config.yaml for player defaults.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CAPACITY;
use crate::waveform::{ParseWaveformError, Waveform};

/// Player defaults loaded from ~/.psg/config.yaml. Missing keys keep their
/// default values.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PsgConfig {
    /// Sample cache budget in bytes of PCM.
    pub cache_capacity: usize,
    /// Initial generator loudness.
    pub loudness: f64,
    /// Initial generator playback speed.
    pub playback_speed: f64,
    /// Waveform slot names, slot 0 first.
    pub waveforms: Vec<String>,
    /// Seed for snare and noise randomness. Unset means a fresh seed per run.
    pub seed: Option<u64>,
}

impl Default for PsgConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
            loudness: 1.0,
            playback_speed: 1.0,
            waveforms: vec!["square".to_string()],
            seed: None,
        }
    }
}

impl PsgConfig {
    /// Default config file path.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".psg").join("config.yaml"))
    }

    /// Load from the default path. Returns None if the file is missing or invalid.
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`. Returns None if the file is missing or invalid.
    pub fn load_from(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(io::Error::other)?;
        std::fs::write(path, yaml)
    }

    /// Parse the configured waveform names.
    pub fn waveforms(&self) -> Result<Vec<Waveform>, ParseWaveformError> {
        self.waveforms.iter().map(|name| name.parse()).collect()
    }
}
