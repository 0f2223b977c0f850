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

//! The fixed set of voices and their refill scheduling.

use std::path::Path;
use std::sync::Arc;

use super::engine::EngineSettings;
use super::error::VoiceError;
use super::stream::StreamBuffer;
use super::voice::{Voice, VoiceStatus};
use crate::audio::sample_source::ClipDescriptor;
use crate::storage::Storage;

/// Number of voices in the bank.
pub const VOICE_COUNT: usize = 4;

/// Owns the four voices and the store they stream from.
pub struct VoiceBank {
    storage: Arc<dyn Storage>,
    voices: [Voice; VOICE_COUNT],
    /// The voice that gets first claim on the next refill pass.
    next_refill: usize,
}

impl VoiceBank {
    pub fn new(storage: Arc<dyn Storage>, settings: &EngineSettings) -> VoiceBank {
        VoiceBank {
            storage,
            voices: std::array::from_fn(|index| {
                Voice::new(
                    index,
                    StreamBuffer::new(
                        settings.capacity,
                        settings.low_water,
                        settings.refill_chunk,
                        settings.max_empty_reads,
                    ),
                )
            }),
            next_refill: 0,
        }
    }

    /// Reads the clip header from storage and assigns it to the voice.
    pub fn assign_clip(&mut self, voice: usize, path: &Path) -> Result<ClipDescriptor, VoiceError> {
        if self.voice(voice)?.is_playing() {
            return Err(VoiceError::Busy(voice));
        }

        let descriptor = ClipDescriptor::read(self.storage.as_ref(), path)?;
        self.voice_mut(voice)?.assign(descriptor.clone())?;
        Ok(descriptor)
    }

    pub fn trigger(&mut self, voice: usize) -> Result<(), VoiceError> {
        let slot = self
            .voices
            .get_mut(voice)
            .ok_or(VoiceError::InvalidVoice(voice))?;
        slot.trigger(self.storage.as_ref())
    }

    pub fn stop(&mut self, voice: usize) -> Result<(), VoiceError> {
        self.voice_mut(voice)?.stop();
        Ok(())
    }

    pub fn stop_all(&mut self) {
        self.voices.iter_mut().for_each(Voice::stop);
    }

    /// Advances one voice by one sample. Out-of-range voices are silent.
    pub fn tick(&mut self, voice: usize) -> i16 {
        self.voices.get_mut(voice).map_or(0, Voice::tick)
    }

    pub fn is_playing(&self, voice: usize) -> bool {
        self.voices.get(voice).is_some_and(Voice::is_playing)
    }

    pub fn status(&self) -> [VoiceStatus; VOICE_COUNT] {
        std::array::from_fn(|index| self.voices[index].status())
    }

    /// Releases finished voices and tops up streams below their low-water mark,
    /// moving at most `budget` samples in total. Voices are served round-robin,
    /// starting after the voice served first on the previous pass.
    pub fn service_refills(&mut self, budget: usize) -> usize {
        let start = self.next_refill;
        let mut moved = 0;
        let mut first_served = None;
        for offset in 0..VOICE_COUNT {
            let index = (start + offset) % VOICE_COUNT;
            let voice = &mut self.voices[index];
            voice.reap();

            if moved < budget && voice.needs_refill() {
                first_served.get_or_insert(index);
                moved += voice.refill(budget - moved);
            }
        }

        if let Some(index) = first_served {
            self.next_refill = (index + 1) % VOICE_COUNT;
        }
        moved
    }

    fn voice(&self, voice: usize) -> Result<&Voice, VoiceError> {
        self.voices.get(voice).ok_or(VoiceError::InvalidVoice(voice))
    }

    fn voice_mut(&mut self, voice: usize) -> Result<&mut Voice, VoiceError> {
        self.voices
            .get_mut(voice)
            .ok_or(VoiceError::InvalidVoice(voice))
    }
}
