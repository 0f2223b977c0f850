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
use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use tracing::warn;

use super::error::ClipError;

/// A linear PCM source clip read from a RIFF/WAVE container, converted into the
/// canonical 16-bit mono format:
/// - 24-bit samples are shifted right by 8 (truncation, no dither).
/// - Stereo frames are downmixed by the integer mean of left and right, taken at
///   the source bit depth before any narrowing.
///
/// The source sample rate is reported but never validated or resampled.
#[derive(Debug, Clone)]
pub struct WavSource {
    samples: Vec<i16>,
    channels: u16,
    bits_per_sample: u16,
    sample_rate: u32,
}

impl WavSource {
    /// Reads the container and decodes every whole frame. A data chunk that claims
    /// more bytes than the container holds is cut at the last complete frame.
    pub fn parse(bytes: &[u8]) -> Result<Self, ClipError> {
        let mut reader =
            WavReader::new(Cursor::new(bytes)).map_err(|e| ClipError::Format(e.to_string()))?;
        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int
            || !matches!(spec.bits_per_sample, 16 | 24)
            || !matches!(spec.channels, 1 | 2)
        {
            return Err(ClipError::UnsupportedFormat {
                sample_format: spec.sample_format,
                channels: spec.channels,
                bits_per_sample: spec.bits_per_sample,
            });
        }

        let channels = usize::from(spec.channels);
        let shift = spec.bits_per_sample - 16;
        let frame_bytes = channels * usize::from(spec.bits_per_sample / 8);
        let declared = reader.duration() as usize;
        let mut samples = Vec::with_capacity(declared.min(bytes.len() / frame_bytes));

        let mut frame = [0i32; 2];
        let mut filled = 0;
        for sample in reader.samples::<i32>() {
            match sample {
                Ok(sample) => frame[filled] = sample,
                Err(e) => {
                    warn!(
                        declared,
                        decoded = samples.len(),
                        error = %e,
                        "WAV data ends early"
                    );
                    break;
                }
            }

            filled += 1;
            if filled == channels {
                // Integer division rounds toward zero.
                let value = frame[..channels].iter().sum::<i32>() / channels as i32;
                samples.push((value >> shift) as i16);
                filled = 0;
            }
        }

        Ok(Self {
            samples,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            sample_rate: spec.sample_rate,
        })
    }

    /// The canonical sample for the given frame.
    pub fn sample(&self, frame: usize) -> Option<i16> {
        self.samples.get(frame).copied()
    }

    /// Iterates over every frame as canonical samples.
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.samples.iter().copied()
    }

    pub fn channel_count(&self) -> u16 {
        self.channels
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }
}
