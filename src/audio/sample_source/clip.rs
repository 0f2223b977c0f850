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

//! The persisted clip format.
//!
//! A clip is a 12 byte header followed by `total_samples` little-endian i16 values:
//!
//! ```text
//! 0..4   magic "DRMC"
//! 4..8   total samples (u32 LE)
//! 8..12  sample rate (u32 LE, informational)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use super::error::ClipError;
use crate::storage::Storage;

/// Magic bytes at the start of every persisted clip.
pub const CLIP_MAGIC: [u8; 4] = *b"DRMC";

/// Length of the persisted clip header in bytes.
pub const CLIP_HEADER_LEN: usize = 12;

/// The fixed header of a persisted clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipHeader {
    total_samples: u32,
    sample_rate: u32,
}

impl ClipHeader {
    pub fn new(total_samples: u32, sample_rate: u32) -> ClipHeader {
        ClipHeader {
            total_samples,
            sample_rate,
        }
    }

    /// Parses a header from the first [`CLIP_HEADER_LEN`] bytes of a clip.
    pub fn parse(bytes: &[u8]) -> Result<ClipHeader, ClipError> {
        if bytes.len() < CLIP_HEADER_LEN {
            return Err(ClipError::Format(format!(
                "clip header truncated: {} of {} bytes",
                bytes.len(),
                CLIP_HEADER_LEN
            )));
        }
        if bytes[0..4] != CLIP_MAGIC {
            return Err(ClipError::Format("bad clip magic".to_string()));
        }

        Ok(ClipHeader {
            total_samples: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            sample_rate: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }

    pub fn encode(&self) -> [u8; CLIP_HEADER_LEN] {
        let mut header = [0u8; CLIP_HEADER_LEN];
        header[0..4].copy_from_slice(&CLIP_MAGIC);
        header[4..8].copy_from_slice(&self.total_samples.to_le_bytes());
        header[8..12].copy_from_slice(&self.sample_rate.to_le_bytes());
        header
    }

    pub fn total_samples(&self) -> u32 {
        self.total_samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// A clip in the store along with its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipDescriptor {
    path: PathBuf,
    header: ClipHeader,
}

impl ClipDescriptor {
    pub fn new(path: PathBuf, header: ClipHeader) -> ClipDescriptor {
        ClipDescriptor { path, header }
    }

    /// Reads the header of a stored clip.
    pub fn read(storage: &dyn Storage, path: &Path) -> Result<ClipDescriptor, ClipError> {
        let mut handle = storage.open(path, 0)?;
        let mut header = [0u8; CLIP_HEADER_LEN];
        let mut filled = 0;
        while filled < CLIP_HEADER_LEN {
            let read = handle.read(&mut header[filled..]);
            if read == 0 {
                break;
            }
            filled += read;
        }
        handle.close();

        Ok(ClipDescriptor {
            path: path.to_path_buf(),
            header: ClipHeader::parse(&header[..filled])?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_samples(&self) -> u32 {
        self.header.total_samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }
}

impl fmt::Display for ClipDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} samples @ {}Hz)",
            self.path.display(),
            self.header.total_samples,
            self.header.sample_rate
        )
    }
}

/// Decodes little-endian i16 pairs into `output`. Returns the number of samples
/// written; a trailing odd byte is ignored.
pub fn decode_pcm16(bytes: &[u8], output: &mut [i16]) -> usize {
    let mut count = 0;
    for (pair, out) in bytes.chunks_exact(2).zip(output.iter_mut()) {
        *out = i16::from_le_bytes([pair[0], pair[1]]);
        count += 1;
    }
    count
}

/// Appends samples to `output` as little-endian i16 pairs.
pub fn encode_pcm16<I: IntoIterator<Item = i16>>(samples: I, output: &mut Vec<u8>) {
    for sample in samples {
        output.extend_from_slice(&sample.to_le_bytes());
    }
}
