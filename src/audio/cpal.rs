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
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{error, info, span, warn, Level};

use super::{OutputSink, SinkError};

/// A sink that feeds the engine's frames to a cpal output stream.
///
/// Frames travel over a small bounded channel, so a push blocks once the engine is
/// that far ahead of the device. The stream callback copies each frame to every
/// device channel and plays silence when the channel runs dry.
pub struct CpalSink {
    sender: Sender<i16>,
    underruns: Arc<AtomicU64>,
    /// Dropping this ends the stream thread, which owns the stream.
    _stop: Sender<()>,
}

impl CpalSink {
    /// Opens the named output device, or the host default for "default". At most
    /// `buffer_frames` frames are queued ahead of the device, and the device period
    /// is requested at that size where the device allows it.
    pub fn open(
        name: &str,
        sample_rate: u32,
        buffer_frames: usize,
    ) -> Result<CpalSink, SinkError> {
        let host = cpal::default_host();
        let device = if name == "default" {
            host.default_output_device()
                .ok_or_else(|| SinkError::NoDevice(name.to_string()))?
        } else {
            host.output_devices()
                .map_err(|e| SinkError::Device(e.to_string()))?
                .find(|device| device.name().is_ok_and(|n| n.trim() == name))
                .ok_or_else(|| SinkError::NoDevice(name.to_string()))?
        };

        let supported = device
            .default_output_config()
            .map_err(|e| SinkError::Device(e.to_string()))?;
        let sample_format = supported.sample_format();
        let mut config: cpal::StreamConfig = supported.config();
        config.sample_rate = sample_rate as cpal::SampleRate;
        config.buffer_size = stream_buffer_size(supported.buffer_size(), buffer_frames);
        let channels = config.channels;

        let (sender, receiver) = bounded::<i16>(buffer_frames.max(1));
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let (ready_tx, ready_rx) = bounded::<Result<(), SinkError>>(1);
        let underruns = Arc::new(AtomicU64::new(0));

        {
            let underruns = underruns.clone();
            thread::Builder::new()
                .name("drumstream-cpal".to_string())
                .spawn(move || {
                    let span = span!(Level::INFO, "cpal output");
                    let _enter = span.enter();

                    let stream = match sample_format {
                        cpal::SampleFormat::F32 => {
                            build_stream::<f32>(&device, &config, receiver, underruns)
                        }
                        cpal::SampleFormat::I16 => {
                            build_stream::<i16>(&device, &config, receiver, underruns)
                        }
                        other => Err(SinkError::UnsupportedFormat(format!("{:?}", other))),
                    }
                    .and_then(|stream| {
                        stream
                            .play()
                            .map_err(|e| SinkError::Device(e.to_string()))?;
                        Ok(stream)
                    });

                    match stream {
                        Ok(stream) => {
                            let _ = ready_tx.send(Ok(()));
                            // Keep the stream alive until the sink is dropped.
                            let _ = stop_rx.recv();
                            drop(stream);
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                        }
                    }
                })
                .map_err(|e| SinkError::Device(e.to_string()))?;
        }

        ready_rx.recv().map_err(|_| SinkError::Closed)??;
        info!(
            device = name,
            sample_rate,
            channels,
            buffer_frames,
            format = ?sample_format,
            "CPAL output stream started"
        );

        Ok(CpalSink {
            sender,
            underruns,
            _stop: stop_tx,
        })
    }

    /// Device frames that were filled with silence because the engine fell behind.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        let underruns = self.underruns();
        if underruns > 0 {
            warn!(underruns, "CPAL output played silence while waiting for frames");
        }
    }
}

impl OutputSink for CpalSink {
    fn push(&mut self, sample: i16) -> Result<(), SinkError> {
        self.sender.send(sample).map_err(|_| SinkError::Closed)
    }
}

/// Picks the device period: `frames`, clamped to what the device supports.
fn stream_buffer_size(supported: &cpal::SupportedBufferSize, frames: usize) -> cpal::BufferSize {
    let frames = u32::try_from(frames).unwrap_or(u32::MAX);
    match supported {
        cpal::SupportedBufferSize::Range { min, max } => {
            cpal::BufferSize::Fixed(frames.clamp(*min, (*max).max(*min)))
        }
        cpal::SupportedBufferSize::Unknown => cpal::BufferSize::Default,
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    receiver: Receiver<i16>,
    underruns: Arc<AtomicU64>,
) -> Result<cpal::Stream, SinkError>
where
    T: cpal::SizedSample + cpal::FromSample<i16>,
{
    let channels = usize::from(config.channels).max(1);
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = match receiver.try_recv() {
                        Ok(sample) => sample,
                        Err(_) => {
                            underruns.fetch_add(1, Ordering::Relaxed);
                            0
                        }
                    };
                    frame.fill(T::from_sample(sample));
                }
            },
            |err| error!("CPAL output stream error: {}", err),
            None,
        )
        .map_err(|e| SinkError::Device(e.to_string()))
}
