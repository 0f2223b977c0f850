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

//! Converts source clips into the persisted format.
//!
//! Loading is done once, ahead of playback, and may block on file I/O.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::error::LoadError;
use crate::audio::sample_source::{
    encode_pcm16, ClipDescriptor, ClipError, ClipHeader, WavSource, CLIP_HEADER_LEN,
};
use crate::storage::Storage;

/// Default payload limit for a persisted clip: about 5.5 seconds at 48kHz.
pub const DEFAULT_MAX_CLIP_BYTES: usize = 512 * 1024;

/// A clip converted into the persisted format, ready to be written.
pub struct ConvertedClip {
    pub header: ClipHeader,
    pub bytes: Vec<u8>,
    /// Whether source frames were dropped to fit the payload limit.
    pub truncated: bool,
}

/// Writes canonical clips into a store.
pub struct ClipLoader {
    storage: Arc<dyn Storage>,
    sample_rate: u32,
    max_clip_bytes: usize,
}

impl ClipLoader {
    /// Creates a loader for an engine running at `sample_rate`.
    pub fn new(storage: Arc<dyn Storage>, sample_rate: u32, max_clip_bytes: usize) -> ClipLoader {
        ClipLoader {
            storage,
            sample_rate,
            max_clip_bytes,
        }
    }

    /// Decodes a RIFF/WAVE container into a persisted clip. Frames beyond the payload
    /// limit are dropped.
    pub fn convert(&self, source: &[u8]) -> Result<ConvertedClip, ClipError> {
        let wav = WavSource::parse(source)?;
        if wav.sample_rate() != self.sample_rate {
            warn!(
                source_rate = wav.sample_rate(),
                engine_rate = self.sample_rate,
                "Clip sample rate differs from the engine rate, it will play back pitch-shifted"
            );
        }

        let max_samples = (self.max_clip_bytes / 2).min(u32::MAX as usize);
        let total = wav.frame_count().min(max_samples);
        let truncated = total < wav.frame_count();
        if truncated {
            warn!(
                frames = wav.frame_count(),
                kept = total,
                max_clip_bytes = self.max_clip_bytes,
                "Clip exceeds the size limit, truncating"
            );
        }

        let header = ClipHeader::new(total as u32, wav.sample_rate());
        let mut bytes = Vec::with_capacity(CLIP_HEADER_LEN + total * 2);
        bytes.extend_from_slice(&header.encode());
        encode_pcm16(wav.samples().take(total), &mut bytes);

        Ok(ConvertedClip {
            header,
            bytes,
            truncated,
        })
    }

    /// Converts source bytes and writes the clip to `dest` in the store.
    pub fn load_bytes(&self, source: &[u8], dest: &Path) -> Result<ClipDescriptor, LoadError> {
        let converted = self.convert(source)?;
        self.storage.write(dest, &converted.bytes)?;

        info!(
            clip = ?dest,
            samples = converted.header.total_samples(),
            sample_rate = converted.header.sample_rate(),
            truncated = converted.truncated,
            "Clip loaded"
        );
        Ok(ClipDescriptor::new(dest.to_path_buf(), converted.header))
    }

    /// Reads a WAV file from disk and loads it into the store at `dest`.
    pub fn load(&self, source: &Path, dest: &Path) -> Result<ClipDescriptor, LoadError> {
        let bytes = std::fs::read(source).map_err(|e| LoadError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        self.load_bytes(&bytes, dest)
    }
}
