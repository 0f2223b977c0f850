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

//! Persistent clip storage.
//!
//! The playback path only ever sees a [`StorageHandle`], a sequential reader that
//! never raises: failures show up as short or zero-length reads and the streaming
//! layer treats them as "nothing available yet".

use std::path::{Path, PathBuf};

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Errors raised while opening or writing clips.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Clip not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A sequential read handle into a stored clip.
pub trait StorageHandle: Send {
    /// Reads up to `buf.len()` bytes and returns how many were read. A failed read
    /// returns 0.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Releases the handle. Reads after close return 0.
    fn close(&mut self);
}

/// A store of persisted clips.
pub trait Storage: Send + Sync {
    /// Opens a sequential reader positioned `offset` bytes into the clip.
    fn open(&self, path: &Path, offset: u64) -> Result<Box<dyn StorageHandle>, StorageError>;

    /// Writes a complete clip, replacing any existing clip at the same path.
    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;
}
