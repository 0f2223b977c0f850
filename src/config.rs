// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Engine configuration.
//!
//! The configuration is a YAML file. Any key can be overridden from the
//! environment with a `DRUMSTREAM__` prefix and `__` between nested keys, e.g.
//! `DRUMSTREAM__STREAM__CAPACITY=2048`.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use duration_string::DurationString;
use serde::Deserialize;
use tracing::info;

use crate::controller::{keyboard, Controller};
use crate::samples::{ClipLoader, EngineSettings, SampleEngine, VOICE_COUNT};
use crate::storage::FileStorage;

mod audio;
mod error;
mod samples;

pub use audio::Output;
pub use error::ConfigError;
pub use samples::{Loader, Stream, VoiceSlot};

const DEFAULT_SAMPLE_RATE: u32 = 48000;
const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_millis(200);
const ENV_PREFIX: &str = "DRUMSTREAM";
const ENV_SEPARATOR: &str = "__";

/// A YAML representation of the engine configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    sample_rate: Option<u32>,

    /// Directory holding persisted clips. Relative paths are resolved against the
    /// directory containing the config file.
    store: PathBuf,

    #[serde(default)]
    output: Output,

    #[serde(default)]
    stream: Stream,

    #[serde(default)]
    loader: Loader,

    /// How often the engine publishes status, e.g. "200ms".
    status_interval: Option<String>,

    /// Clips assigned to voices at startup, in voice order.
    #[serde(default)]
    voices: Vec<VoiceSlot>,

    #[serde(skip)]
    base_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Loads the configuration from a file, applying environment overrides.
    pub fn load(path: &Path) -> Result<EngineConfig, ConfigError> {
        let mut config = EngineConfig::build(File::from(path), environment())?;
        config.base_path = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    fn build<S>(source: S, env: Environment) -> Result<EngineConfig, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(source)
            .add_source(env)
            .build()?
            .try_deserialize::<EngineConfig>()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.voices.len() > VOICE_COUNT {
            return Err(ConfigError::Invalid(format!(
                "{} voices configured, at most {} are available",
                self.voices.len(),
                VOICE_COUNT
            )));
        }
        if self.sample_rate() == 0 {
            return Err(ConfigError::Invalid("sample rate must be non-zero".to_string()));
        }
        self.engine_settings()?
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// Returns the output sample rate (default: 48000).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Returns the clip store directory.
    pub fn store(&self) -> PathBuf {
        match &self.base_path {
            Some(base) if self.store.is_relative() => base.join(&self.store),
            _ => self.store.clone(),
        }
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn voices(&self) -> &[VoiceSlot] {
        &self.voices
    }

    /// Returns the status publishing interval (default: 200ms).
    pub fn status_interval(&self) -> Result<Duration, ConfigError> {
        match &self.status_interval {
            Some(interval) => Ok(DurationString::from_string(interval.clone())
                .map_err(|e| ConfigError::Invalid(format!("status_interval: {}", e)))?
                .into()),
            None => Ok(DEFAULT_STATUS_INTERVAL),
        }
    }

    /// Builds the engine settings described by this configuration.
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let stream = &self.stream;
        Ok(EngineSettings {
            capacity: stream.capacity(),
            low_water: stream.low_water(),
            refill_chunk: stream.refill_chunk(),
            refill_budget: stream.refill_budget(),
            frames_per_quantum: stream.frames_per_quantum(),
            max_empty_reads: stream.max_empty_reads(),
            status_interval: self.status_interval()?,
            realtime: true,
        })
    }
}

/// Builds the engine described by the configuration and assigns the configured
/// clips to their voices.
pub fn init_engine(config: &EngineConfig) -> Result<SampleEngine, Box<dyn Error>> {
    let storage = Arc::new(FileStorage::new(config.store()));
    let mut engine = SampleEngine::new(storage, config.engine_settings()?)?;
    for (voice, slot) in config.voices().iter().enumerate() {
        let clip = engine.assign_clip(voice, slot.clip())?;
        info!(voice, clip = %clip, "Voice assigned");
    }
    Ok(engine)
}

/// Builds a clip loader that writes into the configured store, using the
/// configured engine rate and clip size limit.
pub fn init_loader(config: &EngineConfig) -> ClipLoader {
    ClipLoader::new(
        Arc::new(FileStorage::new(config.store())),
        config.sample_rate(),
        config.loader().max_clip_bytes(),
    )
}

/// Starts the engine thread on the configured output and attaches the keyboard
/// controller. The controller can be joined until the user quits.
pub fn init_engine_and_controller(path: &Path) -> Result<Controller, Box<dyn Error>> {
    let config = EngineConfig::load(path)?;
    let engine = init_engine(&config)?;
    let sink = crate::audio::get_sink(
        config.output(),
        config.sample_rate(),
        engine.frames_per_quantum(),
    )?;
    let handle = engine.spawn(sink)?;
    Ok(Controller::new(
        handle,
        Arc::new(keyboard::Driver::new()),
    )?)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}
