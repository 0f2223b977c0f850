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
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Storage, StorageError, StorageHandle};

/// Clip storage rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates a store rooted at the given directory.
    pub fn new<P: Into<PathBuf>>(root: P) -> FileStorage {
        FileStorage { root: root.into() }
    }

    /// Resolves a clip path against the store root. Absolute paths are used as is.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl Storage for FileStorage {
    fn open(&self, path: &Path, offset: u64) -> Result<Box<dyn StorageHandle>, StorageError> {
        let full_path = self.resolve(path);
        let mut file = match File::open(&full_path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(full_path))
            }
            Err(e) => return Err(e.into()),
        };
        file.seek(SeekFrom::Start(offset))?;

        Ok(Box::new(FileHandle {
            file: Some(file),
            path: full_path,
        }))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let full_path = self.resolve(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write beside the destination and rename so readers never see a partial clip.
        let mut partial = full_path.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);
        fs::write(&partial, data)?;
        fs::rename(&partial, &full_path)?;

        debug!(path = ?full_path, bytes = data.len(), "Clip written");
        Ok(())
    }
}

/// A sequential reader over a clip file.
struct FileHandle {
    file: Option<File>,
    path: PathBuf,
}

impl StorageHandle for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let Some(file) = self.file.as_mut() else {
            return 0;
        };

        match file.read(buf) {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => 0,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Clip read failed");
                0
            }
        }
    }

    fn close(&mut self) {
        self.file = None;
    }
}
