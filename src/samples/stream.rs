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

//! The per-voice streaming ring buffer.
//!
//! Each voice plays from a fixed-size window of decoded samples that is topped up
//! from a [`StorageHandle`] ahead of consumption. The window is allocated once; a
//! trigger only rewinds the cursors.

use tracing::warn;

use crate::audio::sample_source::decode_pcm16;
use crate::storage::StorageHandle;

/// A fixed-capacity circular queue of decoded samples fed from storage.
pub struct StreamBuffer {
    ring: Box<[i16]>,
    /// Scratch space for one raw chunk read from storage.
    scratch: Box<[u8]>,
    read: usize,
    write: usize,
    buffered: usize,
    low_water: usize,
    handle: Option<Box<dyn StorageHandle>>,
    /// Samples of the clip not yet pulled from storage.
    remaining: u32,
    /// The odd trailing byte of a short read, completed by the next read.
    carry: Option<u8>,
    end_of_data: bool,
    empty_reads: u32,
    max_empty_reads: u32,
}

impl StreamBuffer {
    /// Creates a stream holding `capacity` samples that reads at most `refill_chunk`
    /// samples from storage at a time.
    pub fn new(
        capacity: usize,
        low_water: usize,
        refill_chunk: usize,
        max_empty_reads: u32,
    ) -> StreamBuffer {
        StreamBuffer {
            ring: vec![0; capacity].into_boxed_slice(),
            scratch: vec![0; refill_chunk * 2].into_boxed_slice(),
            read: 0,
            write: 0,
            buffered: 0,
            low_water,
            handle: None,
            remaining: 0,
            carry: None,
            end_of_data: true,
            empty_reads: 0,
            max_empty_reads,
        }
    }

    /// Rewinds the stream and starts reading `total_samples` samples from the handle.
    /// Any previous handle is closed first.
    pub fn start(&mut self, handle: Box<dyn StorageHandle>, total_samples: u32) {
        self.release();
        self.reset();
        self.handle = Some(handle);
        self.remaining = total_samples;
        self.end_of_data = total_samples == 0;
    }

    /// Discards buffered samples and rewinds the cursors.
    pub fn reset(&mut self) {
        self.read = 0;
        self.write = 0;
        self.buffered = 0;
        self.remaining = 0;
        self.carry = None;
        self.end_of_data = true;
        self.empty_reads = 0;
    }

    /// Closes the storage handle. Returns true if a handle was open.
    pub fn release(&mut self) -> bool {
        match self.handle.take() {
            Some(mut handle) => {
                handle.close();
                true
            }
            None => false,
        }
    }

    /// Pulls data from storage until the ring is full, the clip is exhausted, `max`
    /// samples have moved, or storage comes up short. Returns the number of samples
    /// added.
    pub fn refill(&mut self, max: usize) -> usize {
        let Some(handle) = self.handle.as_mut() else {
            return 0;
        };

        let capacity = self.ring.len();
        let chunk = self.scratch.len() / 2;
        let mut moved = 0;
        while self.buffered < capacity && !self.end_of_data && moved < max {
            let want = (capacity - self.buffered)
                .min(max - moved)
                .min(chunk)
                .min(self.remaining as usize);
            let want_bytes = want * 2;

            let carried = match self.carry.take() {
                Some(byte) => {
                    self.scratch[0] = byte;
                    1
                }
                None => 0,
            };
            let read = handle.read(&mut self.scratch[carried..want_bytes]);
            if read == 0 {
                self.carry = (carried == 1).then_some(self.scratch[0]);
                self.empty_reads += 1;
                if self.empty_reads >= self.max_empty_reads {
                    warn!(
                        empty_reads = self.empty_reads,
                        remaining = self.remaining,
                        "Storage stopped returning data, ending stream early"
                    );
                    self.end_of_data = true;
                }
                break;
            }
            self.empty_reads = 0;

            let filled = carried + read;
            let samples = filled / 2;
            if filled % 2 == 1 {
                self.carry = Some(self.scratch[filled - 1]);
            }

            // Decode straight into the ring, wrapping once at the end.
            let first = samples.min(capacity - self.write);
            decode_pcm16(
                &self.scratch[..first * 2],
                &mut self.ring[self.write..self.write + first],
            );
            decode_pcm16(
                &self.scratch[first * 2..samples * 2],
                &mut self.ring[..samples - first],
            );
            self.write = (self.write + samples) % capacity;
            self.buffered += samples;
            self.remaining -= samples as u32;
            moved += samples;

            if self.remaining == 0 {
                self.end_of_data = true;
            }
            if filled < want_bytes {
                // Storage has nothing more right now.
                break;
            }
        }

        moved
    }

    /// Takes the next sample, or `None` on underrun.
    pub fn try_pop(&mut self) -> Option<i16> {
        if self.buffered == 0 {
            return None;
        }

        let sample = self.ring[self.read];
        self.read = (self.read + 1) % self.ring.len();
        self.buffered -= 1;
        Some(sample)
    }

    /// Takes the next sample. An empty buffer yields silence.
    pub fn pop(&mut self) -> i16 {
        self.try_pop().unwrap_or(0)
    }

    /// Whether the stream is open, has more to read, and is below its low-water mark.
    pub fn needs_refill(&self) -> bool {
        self.handle.is_some() && !self.end_of_data && self.buffered < self.low_water
    }

    pub fn buffered(&self) -> usize {
        self.buffered
    }

    pub fn capacity(&self) -> usize {
        self.ring.len()
    }

    pub fn is_end_of_data(&self) -> bool {
        self.end_of_data
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::storage::{MemoryStorage, Storage};

    fn pcm(samples: &[i16]) -> Vec<u8> {
        let mut bytes = Vec::new();
        crate::audio::sample_source::encode_pcm16(samples.iter().copied(), &mut bytes);
        bytes
    }

    fn open(storage: &MemoryStorage) -> Box<dyn StorageHandle> {
        storage.open(Path::new("clip"), 0).unwrap()
    }

    #[test]
    fn test_refill_and_pop_wraps() {
        let samples: Vec<i16> = (1..=10).collect();
        let storage = MemoryStorage::new();
        storage.insert("clip", pcm(&samples));

        let mut stream = StreamBuffer::new(4, 1, 4, 8);
        stream.start(open(&storage), 10);

        let mut out = Vec::new();
        while out.len() < 10 {
            stream.refill(usize::MAX);
            assert!(stream.buffered() <= stream.capacity());
            while let Some(sample) = stream.try_pop() {
                out.push(sample);
                if out.len() % 3 == 0 {
                    break;
                }
            }
        }

        assert_eq!(out, samples);
        assert!(stream.is_end_of_data());
        assert_eq!(stream.pop(), 0);
    }

    #[test]
    fn test_refill_respects_max_and_chunk() {
        let storage = MemoryStorage::new();
        storage.insert("clip", pcm(&[7; 100]));

        let mut stream = StreamBuffer::new(64, 16, 8, 8);
        stream.start(open(&storage), 100);

        assert_eq!(stream.refill(5), 5);
        assert_eq!(stream.refill(20), 20);
        assert_eq!(stream.refill(usize::MAX), 39);
        assert_eq!(stream.buffered(), 64);
        assert_eq!(stream.refill(usize::MAX), 0);
    }

    #[test]
    fn test_never_reads_past_total() {
        let storage = MemoryStorage::new();
        // Trailing junk after the clip's samples.
        storage.insert("clip", pcm(&[1, 2, 3, 99, 99]));

        let mut stream = StreamBuffer::new(16, 4, 16, 8);
        stream.start(open(&storage), 3);

        assert_eq!(stream.refill(usize::MAX), 3);
        assert!(stream.is_end_of_data());
        assert!(!stream.needs_refill());
        assert_eq!(
            [stream.pop(), stream.pop(), stream.pop(), stream.pop()],
            [1, 2, 3, 0]
        );
    }

    #[test]
    fn test_odd_short_reads_carry_a_byte() {
        let samples: Vec<i16> = vec![0x0102, -2, 0x7F00, -32768];
        let storage = MemoryStorage::new();
        storage.insert("clip", pcm(&samples));
        storage.set_max_read(3);

        let mut stream = StreamBuffer::new(16, 4, 16, 8);
        stream.start(open(&storage), 4);

        let mut out = Vec::new();
        for _ in 0..8 {
            stream.refill(usize::MAX);
            while let Some(sample) = stream.try_pop() {
                out.push(sample);
            }
        }
        assert_eq!(out, samples);
    }

    #[test]
    fn test_empty_reads_end_the_stream() {
        let storage = MemoryStorage::new();
        storage.insert("clip", pcm(&[5; 10]));
        storage.set_failing(true);

        let mut stream = StreamBuffer::new(16, 4, 16, 3);
        stream.start(open(&storage), 10);

        assert_eq!(stream.refill(usize::MAX), 0);
        assert_eq!(stream.refill(usize::MAX), 0);
        assert!(!stream.is_end_of_data());

        // A successful read resets the count.
        storage.set_failing(false);
        storage.set_max_read(2);
        assert_eq!(stream.refill(usize::MAX), 1);
        storage.set_failing(true);
        stream.refill(usize::MAX);
        stream.refill(usize::MAX);
        assert!(!stream.is_end_of_data());
        stream.refill(usize::MAX);
        assert!(stream.is_end_of_data());
    }

    #[test]
    fn test_release_closes_once() {
        let storage = MemoryStorage::new();
        storage.insert("clip", pcm(&[1; 4]));

        let mut stream = StreamBuffer::new(4, 1, 4, 8);
        stream.start(open(&storage), 4);
        assert_eq!(storage.open_handles(), 1);

        // Starting again closes the previous handle.
        stream.start(open(&storage), 4);
        assert_eq!(storage.open_handles(), 1);

        assert!(stream.release());
        assert!(!stream.release());
        assert_eq!(storage.open_handles(), 0);
        assert_eq!(stream.refill(usize::MAX), 0);
    }

    #[test]
    fn test_zero_length_clip_is_at_end() {
        let storage = MemoryStorage::new();
        storage.insert("clip", Vec::new());

        let mut stream = StreamBuffer::new(4, 1, 4, 8);
        stream.start(open(&storage), 0);
        assert!(stream.is_end_of_data());
        assert_eq!(stream.refill(usize::MAX), 0);
    }
}
