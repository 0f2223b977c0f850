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

//! Clip decoding: the RIFF/WAVE source container and the persisted clip format.

pub mod clip;
pub mod error;
pub mod wav;

pub use clip::{
    decode_pcm16, encode_pcm16, ClipDescriptor, ClipHeader, CLIP_HEADER_LEN, CLIP_MAGIC,
};
pub use error::ClipError;
pub use wav::WavSource;
