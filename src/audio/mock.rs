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
use std::time::{Duration, Instant};

use super::{OutputSink, SinkError};

/// How many frames pass between pacing checks.
const PACE_INTERVAL: u64 = 64;

/// A sink with no device behind it. Samples are discarded, but pushes are paced to
/// the sample rate so the engine runs in real time.
pub struct MockSink {
    sample_rate: u32,
    started: Option<Instant>,
    frames: u64,
}

impl MockSink {
    pub fn new(sample_rate: u32) -> MockSink {
        MockSink {
            sample_rate,
            started: None,
            frames: 0,
        }
    }
}

impl OutputSink for MockSink {
    fn push(&mut self, _sample: i16) -> Result<(), SinkError> {
        let started = *self.started.get_or_insert_with(Instant::now);
        self.frames += 1;

        if self.sample_rate > 0 && self.frames % PACE_INTERVAL == 0 {
            let due = started
                + Duration::from_secs_f64(self.frames as f64 / f64::from(self.sample_rate));
            let now = Instant::now();
            if due > now {
                spin_sleep::sleep(due - now);
            }
        }
        Ok(())
    }
}

/// Captures every pushed sample. Never blocks.
#[derive(Default)]
pub struct MemorySink {
    samples: Vec<i16>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    pub fn with_capacity(capacity: usize) -> MemorySink {
        MemorySink {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

impl OutputSink for MemorySink {
    fn push(&mut self, sample: i16) -> Result<(), SinkError> {
        self.samples.push(sample);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_sink_is_paced() {
        let mut sink = MockSink::new(8000);
        let start = Instant::now();
        for _ in 0..800 {
            sink.push(1).unwrap();
        }

        // 800 frames at 8kHz is 100ms.
        assert!(start.elapsed() >= Duration::from_millis(90));
        assert_eq!(sink.frames, 800);
    }

    #[test]
    fn test_memory_sink_captures() {
        let mut sink = MemorySink::new();
        for sample in [3, -3, 0] {
            sink.push(sample).unwrap();
        }
        assert_eq!(sink.samples(), &[3, -3, 0]);
        assert_eq!(sink.into_samples(), vec![3, -3, 0]);
    }
}
