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

#[cfg(test)]
use std::{
    error::Error,
    io::Cursor,
    path::Path,
    thread,
    time::{Duration, SystemTime},
};

#[cfg(test)]
use hound::{SampleFormat, WavSpec, WavWriter};

#[cfg(test)]
use crate::audio::sample_source::{encode_pcm16, ClipHeader};

/// Builds a WAV container in memory from interleaved integer samples.
#[cfg(test)]
pub fn wav_bytes(
    channels: u16,
    bits_per_sample: u16,
    sample_rate: u32,
    samples: &[i32],
) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(
            &mut cursor,
            WavSpec {
                channels,
                sample_rate,
                bits_per_sample,
                sample_format: SampleFormat::Int,
            },
        )
        .expect("unable to create wav writer");
        for sample in samples {
            writer
                .write_sample(*sample)
                .expect("unable to write sample");
        }
        writer.finalize().expect("unable to finalize wav");
    }
    cursor.into_inner()
}

/// Writes a WAV file to disk from interleaved integer samples.
#[cfg(test)]
pub fn write_wav(
    path: &Path,
    channels: u16,
    bits_per_sample: u16,
    sample_rate: u32,
    samples: &[i32],
) -> Result<(), Box<dyn Error>> {
    std::fs::write(path, wav_bytes(channels, bits_per_sample, sample_rate, samples))?;
    Ok(())
}

/// Builds a canonical 44-byte WAV header by hand. Useful for formats hound refuses
/// to write.
#[cfg(test)]
pub fn canonical_wav_header(
    format_tag: u16,
    channels: u16,
    bits_per_sample: u16,
    sample_rate: u32,
    data_len: u32,
) -> Vec<u8> {
    let block_align = channels * bits_per_sample.div_ceil(8);
    let mut header = Vec::with_capacity(44);
    header.extend_from_slice(b"RIFF");
    header.extend_from_slice(&(36 + data_len).to_le_bytes());
    header.extend_from_slice(b"WAVE");
    header.extend_from_slice(b"fmt ");
    header.extend_from_slice(&16u32.to_le_bytes());
    header.extend_from_slice(&format_tag.to_le_bytes());
    header.extend_from_slice(&channels.to_le_bytes());
    header.extend_from_slice(&sample_rate.to_le_bytes());
    header.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    header.extend_from_slice(&block_align.to_le_bytes());
    header.extend_from_slice(&bits_per_sample.to_le_bytes());
    header.extend_from_slice(b"data");
    header.extend_from_slice(&data_len.to_le_bytes());
    header
}

/// Builds a persisted clip from canonical samples.
#[cfg(test)]
pub fn clip_bytes(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let header = ClipHeader::new(samples.len() as u32, sample_rate);
    let mut bytes = header.encode().to_vec();
    encode_pcm16(samples.iter().copied(), &mut bytes);
    bytes
}

/// A ramp that never produces a zero sample, so silence is easy to tell apart.
#[cfg(test)]
pub fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| (i % 1000) as i16 + 1).collect()
}

/// Wait for the given predicate to return true or fail.
#[inline]
#[cfg(test)]
pub fn eventually<F>(predicate: F, error_msg: &str)
where
    F: Fn() -> bool,
{
    let start = SystemTime::now();
    let tick = Duration::from_millis(10);
    let timeout = Duration::from_secs(3);

    loop {
        let elapsed = start.elapsed();
        if elapsed.is_err() {
            panic!("System time error");
        }
        let elapsed = elapsed.unwrap();

        if elapsed > timeout {
            panic!("{}", error_msg);
        }
        if predicate() {
            return;
        }
        thread::sleep(tick);
    }
}
