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
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::samples::DEFAULT_MAX_CLIP_BYTES;

const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_REFILL_CHUNK: usize = 256;
const DEFAULT_REFILL_BUDGET: usize = 1024;
const DEFAULT_FRAMES_PER_QUANTUM: usize = 32;
const DEFAULT_MAX_EMPTY_READS: u32 = 8;

/// A YAML representation of the voice stream tuning.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Stream {
    /// Ring buffer size per voice, in samples.
    capacity: Option<usize>,

    /// Refill threshold in samples (default: a quarter of the capacity).
    low_water: Option<usize>,

    /// Largest single storage read, in samples.
    refill_chunk: Option<usize>,

    /// Most samples refilled per quantum across all voices.
    refill_budget: Option<usize>,

    /// Frames produced between refill passes.
    frames_per_quantum: Option<usize>,

    /// Consecutive empty storage reads before a stream gives up.
    max_empty_reads: Option<u32>,
}

impl Stream {
    pub fn capacity(&self) -> usize {
        self.capacity.unwrap_or(DEFAULT_CAPACITY)
    }

    pub fn low_water(&self) -> usize {
        self.low_water.unwrap_or((self.capacity() / 4).max(1))
    }

    pub fn refill_chunk(&self) -> usize {
        self.refill_chunk.unwrap_or(DEFAULT_REFILL_CHUNK)
    }

    pub fn refill_budget(&self) -> usize {
        self.refill_budget.unwrap_or(DEFAULT_REFILL_BUDGET)
    }

    pub fn frames_per_quantum(&self) -> usize {
        self.frames_per_quantum.unwrap_or(DEFAULT_FRAMES_PER_QUANTUM)
    }

    pub fn max_empty_reads(&self) -> u32 {
        self.max_empty_reads.unwrap_or(DEFAULT_MAX_EMPTY_READS)
    }
}

/// A YAML representation of the clip loader settings.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Loader {
    /// Largest clip payload in bytes. Longer sources are truncated.
    max_clip_bytes: Option<usize>,
}

impl Loader {
    pub fn max_clip_bytes(&self) -> usize {
        self.max_clip_bytes.unwrap_or(DEFAULT_MAX_CLIP_BYTES)
    }
}

/// The clip assigned to a voice at startup.
#[derive(Deserialize, Clone, Debug)]
pub struct VoiceSlot {
    /// Clip path within the store.
    clip: PathBuf,
}

impl VoiceSlot {
    pub fn clip(&self) -> &Path {
        &self.clip
    }
}
