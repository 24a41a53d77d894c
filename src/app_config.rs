use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::io::{DuplicateNamesMode, LoadOptions, SaveOptions, TextgridFormat};
use crate::praat::{FormantParams, PitchParams, PraatRunner};
use crate::timing::MIN_INTERVAL_LENGTH;

/// Application configuration module
/// This module handles loading, validating and saving the settings the
/// command line tool applies to every document it reads, writes or analyzes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// How documents are read
    #[serde(default)]
    pub load: LoadConfig,

    /// How documents are written
    #[serde(default)]
    pub save: SaveConfig,

    /// External analysis settings
    #[serde(default)]
    pub praat: PraatConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Reading settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct LoadConfig {
    // @field: Keep blank-labelled intervals
    #[serde(default)]
    pub include_empty_intervals: bool,

    // @field: error, rename or merge
    #[serde(default)]
    pub duplicate_names: DuplicateNamesMode,

    // @field: Repair malformed tiers instead of rejecting them
    #[serde(default)]
    pub lenient: bool,
}

/// Writing settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SaveConfig {
    // @field: Output dialect
    #[serde(default)]
    pub format: TextgridFormat,

    // @field: Fill gaps with blank intervals
    #[serde(default = "default_true")]
    pub include_blank_spaces: bool,

    // @field: Ultrashort interval threshold in seconds, null disables removal
    #[serde(default = "default_minimum_interval_length")]
    pub minimum_interval_length: Option<f64>,
}

/// Praat analysis settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PraatConfig {
    // @field: Praat binary, looked up on PATH when not absolute
    #[serde(default = "default_executable")]
    pub executable: String,

    // @field: Seconds between measurements
    #[serde(default = "default_sample_step")]
    pub sample_step: f64,

    #[serde(default = "default_min_pitch")]
    pub min_pitch: f64,

    #[serde(default = "default_max_pitch")]
    pub max_pitch: f64,

    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f64,

    // @field: Formant ceiling in Hz
    #[serde(default = "default_max_formant")]
    pub max_formant: f64,
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("Invalid log level: {}", s)),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_minimum_interval_length() -> Option<f64> {
    Some(MIN_INTERVAL_LENGTH)
}

fn default_executable() -> String {
    "praat".to_string()
}

fn default_sample_step() -> f64 {
    PitchParams::default().sample_step
}

fn default_min_pitch() -> f64 {
    PitchParams::default().min_pitch
}

fn default_max_pitch() -> f64 {
    PitchParams::default().max_pitch
}

fn default_silence_threshold() -> f64 {
    PitchParams::default().silence_threshold
}

fn default_max_formant() -> f64 {
    FormantParams::default().max_formant
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            format: TextgridFormat::default(),
            include_blank_spaces: default_true(),
            minimum_interval_length: default_minimum_interval_length(),
        }
    }
}

impl Default for PraatConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            sample_step: default_sample_step(),
            min_pitch: default_min_pitch(),
            max_pitch: default_max_pitch(),
            silence_threshold: default_silence_threshold(),
            max_formant: default_max_formant(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            load: LoadConfig::default(),
            save: SaveConfig::default(),
            praat: PraatConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if let Some(length) = self.save.minimum_interval_length {
            if length < 0.0 {
                return Err(anyhow!("minimum_interval_length must not be negative, got {}", length));
            }
        }

        let praat = &self.praat;
        if praat.executable.trim().is_empty() {
            return Err(anyhow!("Praat executable must not be empty"));
        }
        if praat.sample_step <= 0.0 {
            return Err(anyhow!("sample_step must be positive, got {}", praat.sample_step));
        }
        if praat.min_pitch <= 0.0 || praat.max_pitch <= praat.min_pitch {
            return Err(anyhow!(
                "Pitch range must satisfy 0 < min_pitch < max_pitch, got {} to {}",
                praat.min_pitch,
                praat.max_pitch
            ));
        }
        if praat.max_formant <= 0.0 {
            return Err(anyhow!("max_formant must be positive, got {}", praat.max_formant));
        }

        Ok(())
    }

    /// Reads the configuration, writing a default one first when the file is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            include_empty_intervals: self.load.include_empty_intervals,
            duplicate_names: self.load.duplicate_names,
            lenient: self.load.lenient,
        }
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            format: self.save.format,
            include_blank_spaces: self.save.include_blank_spaces,
            minimum_interval_length: self.save.minimum_interval_length,
            ..SaveOptions::default()
        }
    }

    pub fn pitch_params(&self) -> PitchParams {
        PitchParams {
            sample_step: self.praat.sample_step,
            min_pitch: self.praat.min_pitch,
            max_pitch: self.praat.max_pitch,
            silence_threshold: self.praat.silence_threshold,
        }
    }

    pub fn formant_params(&self) -> FormantParams {
        FormantParams { step_size: self.praat.sample_step, max_formant: self.praat.max_formant, ..FormantParams::default() }
    }

    pub fn praat_runner(&self) -> PraatRunner {
        PraatRunner::new(PathBuf::from(&self.praat.executable))
    }
}
