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
use std::path::PathBuf;

use crate::audio::sample_source::ClipError;
use crate::storage::StorageError;

/// Errors returned by voice control operations.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("Voice {0} has no clip assigned")]
    NoClip(usize),

    #[error("Voice {0} is playing")]
    Busy(usize),

    #[error("Clip not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid voice index {0}")]
    InvalidVoice(usize),

    #[error("Clip error: {0}")]
    Clip(ClipError),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for VoiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(path) => VoiceError::NotFound(path),
            e => VoiceError::Storage(e),
        }
    }
}

impl From<ClipError> for VoiceError {
    fn from(e: ClipError) -> Self {
        match e {
            ClipError::Storage(e) => e.into(),
            e => VoiceError::Clip(e),
        }
    }
}

/// Errors raised while building or running the sample engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid stream settings: {0}")]
    InvalidSettings(String),

    #[error("Unable to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Engine thread panicked")]
    Panicked,
}

/// Errors raised while converting a source clip into the store.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Clip error: {0}")]
    Clip(#[from] ClipError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
