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
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Storage, StorageError, StorageHandle};

/// Counters and fault switches shared between the store and its handles.
#[derive(Default)]
struct Shared {
    /// Largest single read a handle will return (0 = unlimited).
    max_read: AtomicUsize,
    /// When set, every read returns 0.
    failing: AtomicBool,
    /// Handles opened and not yet closed.
    open_handles: AtomicUsize,
    /// Total handles ever opened.
    opened: AtomicUsize,
}

/// An in-memory clip store.
///
/// Besides backing tests, it can simulate slow or failing media: reads can be
/// capped to a number of bytes, and can be made to fail outright.
#[derive(Default)]
pub struct MemoryStorage {
    clips: RwLock<HashMap<PathBuf, Arc<Vec<u8>>>>,
    shared: Arc<Shared>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    /// Stores a clip directly.
    pub fn insert<P: Into<PathBuf>>(&self, path: P, data: Vec<u8>) {
        self.clips.write().insert(path.into(), Arc::new(data));
    }

    /// Returns the stored bytes of a clip.
    pub fn get(&self, path: &Path) -> Option<Arc<Vec<u8>>> {
        self.clips.read().get(path).cloned()
    }

    /// Caps how many bytes a single read may return. Zero removes the cap.
    pub fn set_max_read(&self, bytes: usize) {
        self.shared.max_read.store(bytes, Ordering::Relaxed);
    }

    /// Makes every read fail (return 0) until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.shared.failing.store(failing, Ordering::Relaxed);
    }

    /// Number of handles currently open.
    pub fn open_handles(&self) -> usize {
        self.shared.open_handles.load(Ordering::Relaxed)
    }

    /// Number of handles opened over the store's lifetime.
    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::Relaxed)
    }
}

impl Storage for MemoryStorage {
    fn open(&self, path: &Path, offset: u64) -> Result<Box<dyn StorageHandle>, StorageError> {
        let data = self
            .get(path)
            .ok_or_else(|| StorageError::NotFound(path.to_path_buf()))?;

        self.shared.open_handles.fetch_add(1, Ordering::Relaxed);
        self.shared.opened.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MemoryHandle {
            position: usize::try_from(offset).unwrap_or(usize::MAX).min(data.len()),
            data,
            shared: self.shared.clone(),
            open: true,
        }))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        self.insert(path, data.to_vec());
        Ok(())
    }
}

struct MemoryHandle {
    data: Arc<Vec<u8>>,
    position: usize,
    shared: Arc<Shared>,
    open: bool,
}

impl StorageHandle for MemoryHandle {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        if !self.open || self.shared.failing.load(Ordering::Relaxed) {
            return 0;
        }

        let mut len = buf.len().min(self.data.len() - self.position);
        let max_read = self.shared.max_read.load(Ordering::Relaxed);
        if max_read > 0 {
            len = len.min(max_read);
        }

        buf[..len].copy_from_slice(&self.data[self.position..self.position + len]);
        self.position += len;
        len
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.shared.open_handles.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

impl Drop for MemoryHandle {
    fn drop(&mut self) {
        self.close();
    }
}
