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

//! Streaming sample playback.
//!
//! Four fixed voices each stream a persisted clip through a small ring buffer. The
//! engine mixes them in quanta and keeps the buffers topped up between quanta.

mod bank;
mod engine;
mod error;
mod loader;
mod stream;
mod voice;

pub use bank::{VoiceBank, VOICE_COUNT};
pub use engine::{ControlEvent, EngineHandle, EngineSettings, SampleEngine};
pub use error::{EngineError, LoadError, VoiceError};
pub use loader::{ClipLoader, ConvertedClip, DEFAULT_MAX_CLIP_BYTES};
pub use stream::StreamBuffer;
pub use voice::{PlayState, Voice, VoiceStatus};
