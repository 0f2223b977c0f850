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
use crate::storage::StorageError;

/// Error types for clip decoding.
#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    /// The container is unrecognized or malformed.
    #[error("Malformed clip container: {0}")]
    Format(String),

    /// The container is valid but holds a payload we can't play.
    #[error(
        "Unsupported clip format: {sample_format:?} samples, {channels} channel(s), {bits_per_sample} bits"
    )]
    UnsupportedFormat {
        sample_format: hound::SampleFormat,
        channels: u16,
        bits_per_sample: u16,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
