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

//! A single playback slot.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::error::VoiceError;
use super::stream::StreamBuffer;
use crate::audio::sample_source::{ClipDescriptor, CLIP_HEADER_LEN};
use crate::storage::Storage;

/// The playback state of a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Idle,
    Playing,
    /// The clip ran out. The voice is silent and its handle is released on the
    /// next refill pass, off the real-time path.
    Finished,
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlayState::Idle => "idle",
            PlayState::Playing => "playing",
            PlayState::Finished => "finished",
        })
    }
}

/// A point-in-time view of one voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceStatus {
    pub index: usize,
    pub clip: Option<PathBuf>,
    pub state: PlayState,
    pub samples_emitted: u32,
    pub total_samples: u32,
    pub buffered: usize,
    pub underruns: u64,
}

impl VoiceStatus {
    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }
}

impl fmt::Display for VoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clip = self
            .clip
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "voice {}: {} [{}] {}/{} buffered={} underruns={}",
            self.index + 1,
            clip,
            self.state,
            self.samples_emitted,
            self.total_samples,
            self.buffered,
            self.underruns
        )
    }
}

/// One of the fixed playback slots. A voice owns its stream and storage handle.
pub struct Voice {
    index: usize,
    clip: Option<ClipDescriptor>,
    stream: StreamBuffer,
    state: PlayState,
    /// Samples delivered since the last trigger.
    samples_emitted: u32,
    /// Ticks that found the stream empty since the last trigger.
    underruns: u64,
}

impl Voice {
    pub fn new(index: usize, stream: StreamBuffer) -> Voice {
        Voice {
            index,
            clip: None,
            stream,
            state: PlayState::Idle,
            samples_emitted: 0,
            underruns: 0,
        }
    }

    /// Assigns a clip. Fails if the voice is playing.
    pub fn assign(&mut self, clip: ClipDescriptor) -> Result<(), VoiceError> {
        if self.state == PlayState::Playing {
            return Err(VoiceError::Busy(self.index));
        }

        // Anything left over belongs to the old clip.
        self.release();
        debug!(voice = self.index, clip = %clip, "Clip assigned");
        self.clip = Some(clip);
        Ok(())
    }

    /// Starts the assigned clip from the beginning, restarting it if it's already
    /// playing.
    pub fn trigger(&mut self, storage: &dyn Storage) -> Result<(), VoiceError> {
        let Some(clip) = self.clip.clone() else {
            warn!(voice = self.index, "Trigger on voice with no clip");
            return Err(VoiceError::NoClip(self.index));
        };

        self.release();
        self.samples_emitted = 0;
        self.underruns = 0;

        let handle = match storage.open(clip.path(), CLIP_HEADER_LEN as u64) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(voice = self.index, clip = ?clip.path(), error = %e, "Unable to open clip");
                return Err(e.into());
            }
        };
        self.stream.start(handle, clip.total_samples());
        let capacity = self.stream.capacity();
        self.stream.refill(capacity);
        self.state = PlayState::Playing;

        info!(voice = self.index, clip = ?clip.path(), "Voice triggered");
        Ok(())
    }

    /// Stops playback immediately and discards buffered samples. A no-op on an
    /// idle voice.
    pub fn stop(&mut self) {
        if self.state == PlayState::Idle {
            return;
        }

        self.release();
        debug!(voice = self.index, emitted = self.samples_emitted, "Voice stopped");
    }

    /// Produces the next sample. Idle voices and underruns yield silence, and an
    /// underrun does not advance the voice.
    pub fn tick(&mut self) -> i16 {
        if self.state != PlayState::Playing {
            return 0;
        }

        match self.stream.try_pop() {
            Some(sample) => {
                self.samples_emitted += 1;
                if self.samples_emitted >= self.total_samples() {
                    self.state = PlayState::Finished;
                }
                sample
            }
            None => {
                if self.stream.is_end_of_data() {
                    // Storage gave up before the clip was complete.
                    self.state = PlayState::Finished;
                } else {
                    self.underruns += 1;
                }
                0
            }
        }
    }

    /// Releases the handle of a finished voice and returns it to idle. Returns true
    /// if the voice was finished.
    pub fn reap(&mut self) -> bool {
        if self.state != PlayState::Finished {
            return false;
        }

        let total = self.total_samples();
        if self.samples_emitted < total {
            warn!(
                voice = self.index,
                emitted = self.samples_emitted,
                total,
                "Voice ended before the clip was complete"
            );
        } else {
            debug!(voice = self.index, total, "Voice finished");
        }
        self.release();
        true
    }

    /// Tops up the stream by at most `max` samples if it is below its low-water mark.
    pub fn refill(&mut self, max: usize) -> usize {
        if self.state != PlayState::Playing || !self.stream.needs_refill() {
            return 0;
        }
        self.stream.refill(max)
    }

    pub fn needs_refill(&self) -> bool {
        self.state == PlayState::Playing && self.stream.needs_refill()
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn clip(&self) -> Option<&ClipDescriptor> {
        self.clip.as_ref()
    }

    pub fn samples_emitted(&self) -> u32 {
        self.samples_emitted
    }

    pub fn underruns(&self) -> u64 {
        self.underruns
    }

    pub fn status(&self) -> VoiceStatus {
        VoiceStatus {
            index: self.index,
            clip: self.clip.as_ref().map(|c| c.path().to_path_buf()),
            state: self.state,
            samples_emitted: self.samples_emitted,
            total_samples: self.total_samples(),
            buffered: self.stream.buffered(),
            underruns: self.underruns,
        }
    }

    fn total_samples(&self) -> u32 {
        self.clip.as_ref().map_or(0, |c| c.total_samples())
    }

    fn release(&mut self) {
        self.stream.release();
        self.stream.reset();
        self.state = PlayState::Idle;
    }
}
