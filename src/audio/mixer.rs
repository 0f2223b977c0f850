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

//! Sums the voices into output frames.

use crate::samples::{VoiceBank, VOICE_COUNT};

/// The largest magnitude an output frame may have.
pub const OUTPUT_LIMIT: i32 = i16::MAX as i32;

/// Ticks every voice once, in index order, and returns the clamped sum.
pub fn produce_frame(bank: &mut VoiceBank) -> i16 {
    let mut sum: i32 = 0;
    for voice in 0..VOICE_COUNT {
        sum += i32::from(bank.tick(voice));
    }
    sum.clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT) as i16
}

/// Fills `output` with consecutive frames.
pub fn process_into(bank: &mut VoiceBank, output: &mut [i16]) {
    for frame in output.iter_mut() {
        *frame = produce_frame(bank);
    }
}
