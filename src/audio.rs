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
use tracing::info;

use crate::config;

pub mod cpal;
pub mod mixer;
pub mod mock;
pub mod sample_source;
pub mod thread_priority;

/// Errors raised by output sinks.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("No output device found with name {0}")]
    NoDevice(String),

    #[error("Output device error: {0}")]
    Device(String),

    #[error("Unsupported device sample format {0}")]
    UnsupportedFormat(String),

    #[error("Output stream closed")]
    Closed,
}

/// The destination for mixed output frames.
///
/// A push may block: the sink's clock paces the engine.
pub trait OutputSink: Send {
    /// Pushes one mono output frame.
    fn push(&mut self, sample: i16) -> Result<(), SinkError>;
}

/// How many engine quanta a device sink may queue ahead of playback.
pub const OUTPUT_QUANTA: usize = 4;

/// Opens the output sink for the given configuration. Devices whose names start
/// with "mock" get a paced mock sink. Device sinks queue at most
/// [`OUTPUT_QUANTA`] quanta, which bounds trigger latency.
pub fn get_sink(
    output: &config::Output,
    sample_rate: u32,
    frames_per_quantum: usize,
) -> Result<Box<dyn OutputSink>, SinkError> {
    let device = output.device();
    info!(device, sample_rate, "Opening output");
    if device.starts_with("mock") {
        return Ok(Box::new(mock::MockSink::new(sample_rate)));
    }

    Ok(Box::new(cpal::CpalSink::open(
        device,
        sample_rate,
        frames_per_quantum * OUTPUT_QUANTA,
    )?))
}
