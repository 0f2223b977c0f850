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

//! The engine that drives the voice bank in fixed quanta.
//!
//! Each quantum produces a batch of frames, pushes them to the output sink, and then
//! spends a bounded amount of work refilling voice streams. Control events are only
//! applied between quanta, so the bank has a single thread of control.

use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use tracing::{debug, error, info, span, warn, Level};

use super::bank::{VoiceBank, VOICE_COUNT};
use super::error::{EngineError, VoiceError};
use super::voice::VoiceStatus;
use crate::audio::mixer;
use crate::audio::sample_source::ClipDescriptor;
use crate::audio::thread_priority::{
    engine_thread_priority, promote_current_thread, rt_audio_enabled,
};
use crate::audio::{OutputSink, SinkError};
use crate::storage::Storage;

/// Tuning for the voice streams and the engine loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Ring buffer size per voice, in samples.
    pub capacity: usize,
    /// Streams below this many buffered samples are refilled.
    pub low_water: usize,
    /// Largest single storage read, in samples.
    pub refill_chunk: usize,
    /// Most samples moved by refills in one quantum, across all voices.
    pub refill_budget: usize,
    pub frames_per_quantum: usize,
    /// Consecutive empty storage reads before a stream is treated as ended.
    pub max_empty_reads: u32,
    /// How often the engine thread publishes its status snapshot.
    pub status_interval: Duration,
    /// Whether the engine thread should raise its scheduling priority.
    pub realtime: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            capacity: 1024,
            low_water: 256,
            refill_chunk: 256,
            refill_budget: 1024,
            frames_per_quantum: 32,
            max_empty_reads: 8,
            status_interval: Duration::from_millis(200),
            realtime: false,
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: String| Err(EngineError::InvalidSettings(msg));
        if self.capacity == 0 {
            return invalid("capacity must be greater than zero".to_string());
        }
        if self.low_water == 0 {
            return invalid("low water mark must be greater than zero".to_string());
        }
        if self.low_water > self.capacity {
            return invalid(format!(
                "low water mark {} exceeds capacity {}",
                self.low_water, self.capacity
            ));
        }
        if self.refill_chunk == 0 {
            return invalid("refill chunk must be greater than zero".to_string());
        }
        if self.refill_budget == 0 {
            return invalid("refill budget must be greater than zero".to_string());
        }
        if self.frames_per_quantum == 0 {
            return invalid("frames per quantum must be greater than zero".to_string());
        }
        if self.max_empty_reads == 0 {
            return invalid("max empty reads must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// A control request applied by the engine between quanta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Trigger(usize),
    Stop(usize),
    StopAll,
}

/// Owns the voice bank and produces output frames.
pub struct SampleEngine {
    bank: VoiceBank,
    settings: EngineSettings,
    /// One quantum of frames, allocated once.
    frames: Box<[i16]>,
    frames_rendered: u64,
}

impl SampleEngine {
    /// Builds the engine and allocates every voice's ring buffer.
    pub fn new(storage: Arc<dyn Storage>, settings: EngineSettings) -> Result<Self, EngineError> {
        settings.validate()?;

        Ok(SampleEngine {
            bank: VoiceBank::new(storage, &settings),
            frames: vec![0; settings.frames_per_quantum].into_boxed_slice(),
            settings,
            frames_rendered: 0,
        })
    }

    pub fn assign_clip(&mut self, voice: usize, path: &Path) -> Result<ClipDescriptor, VoiceError> {
        self.bank.assign_clip(voice, path)
    }

    pub fn trigger(&mut self, voice: usize) -> Result<(), VoiceError> {
        self.bank.trigger(voice)
    }

    pub fn stop(&mut self, voice: usize) -> Result<(), VoiceError> {
        self.bank.stop(voice)
    }

    pub fn stop_all(&mut self) {
        self.bank.stop_all();
    }

    pub fn is_playing(&self, voice: usize) -> bool {
        self.bank.is_playing(voice)
    }

    /// Produces a single mixed frame.
    pub fn tick(&mut self) -> i16 {
        self.frames_rendered += 1;
        mixer::produce_frame(&mut self.bank)
    }

    /// Refills voice streams within the configured budget.
    pub fn service_refills(&mut self) -> usize {
        self.bank.service_refills(self.settings.refill_budget)
    }

    pub fn status(&self) -> [VoiceStatus; VOICE_COUNT] {
        self.bank.status()
    }

    pub fn frames_per_quantum(&self) -> usize {
        self.settings.frames_per_quantum
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Applies a control event. Errors are logged, not returned.
    pub fn apply(&mut self, event: ControlEvent) {
        let result = match event {
            ControlEvent::Trigger(voice) => self.trigger(voice),
            ControlEvent::Stop(voice) => self.stop(voice),
            ControlEvent::StopAll => {
                self.stop_all();
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(event = ?event, err = %e, "Control event failed");
        }
    }

    /// Produces one quantum of frames into the sink, then services refills.
    pub fn run_quantum(&mut self, sink: &mut dyn OutputSink) -> Result<(), SinkError> {
        mixer::process_into(&mut self.bank, &mut self.frames);
        self.frames_rendered += self.frames.len() as u64;
        for frame in self.frames.iter() {
            sink.push(*frame)?;
        }

        self.service_refills();
        Ok(())
    }

    /// Runs whole quanta until at least `frames` frames have been produced.
    pub fn render(&mut self, frames: usize, sink: &mut dyn OutputSink) -> Result<(), SinkError> {
        let quanta = frames.div_ceil(self.settings.frames_per_quantum);
        for _ in 0..quanta {
            self.run_quantum(sink)?;
        }
        Ok(())
    }

    /// Moves the engine onto its own thread, feeding the given sink until shut down.
    pub fn spawn(self, sink: Box<dyn OutputSink>) -> Result<EngineHandle, EngineError> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let status = Arc::new(Mutex::new(self.status()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let join = {
            let status = status.clone();
            let shutdown = shutdown.clone();
            thread::Builder::new()
                .name("drumstream-engine".to_string())
                .spawn(move || self.run(sink, receiver, status, shutdown))?
        };

        Ok(EngineHandle {
            sender,
            status,
            shutdown,
            join: Some(join),
        })
    }

    fn run(
        mut self,
        mut sink: Box<dyn OutputSink>,
        events: Receiver<ControlEvent>,
        status: Arc<Mutex<[VoiceStatus; VOICE_COUNT]>>,
        shutdown: Arc<AtomicBool>,
    ) -> SampleEngine {
        let span = span!(Level::INFO, "sample engine");
        let _enter = span.enter();

        if self.settings.realtime {
            promote_current_thread(engine_thread_priority(), rt_audio_enabled());
        }
        info!(
            frames_per_quantum = self.settings.frames_per_quantum,
            refill_budget = self.settings.refill_budget,
            "Sample engine started"
        );

        let mut last_status = Instant::now();
        while !shutdown.load(Ordering::Relaxed) {
            loop {
                match events.try_recv() {
                    Ok(event) => self.apply(event),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }

            if let Err(e) = self.run_quantum(sink.as_mut()) {
                error!(err = %e, "Output failed, stopping engine");
                break;
            }

            if last_status.elapsed() >= self.settings.status_interval {
                let snapshot = self.status();
                debug!(
                    playing = snapshot.iter().filter(|s| s.is_playing()).count(),
                    underruns = snapshot.iter().map(|s| s.underruns).sum::<u64>(),
                    frames = self.frames_rendered,
                    "Engine status"
                );
                *status.lock() = snapshot;
                last_status = Instant::now();
            }
        }

        self.stop_all();
        *status.lock() = self.status();
        info!(frames = self.frames_rendered, "Sample engine stopped");
        self
    }
}

/// A running engine thread.
pub struct EngineHandle {
    sender: Sender<ControlEvent>,
    status: Arc<Mutex<[VoiceStatus; VOICE_COUNT]>>,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<SampleEngine>>,
}

impl EngineHandle {
    /// Queues a control event. Events are applied before the next quantum, in the
    /// order they arrive.
    pub fn send(&self, event: ControlEvent) {
        // The receiver lives as long as the engine thread.
        let _ = self.sender.send(event);
    }

    /// The most recently published status snapshot.
    pub fn status(&self) -> [VoiceStatus; VOICE_COUNT] {
        self.status.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }

    /// Asks the engine thread to stop after the current quantum.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Stops the engine thread and hands the engine back.
    pub fn join(mut self) -> Result<SampleEngine, EngineError> {
        self.shutdown();
        match self.join.take() {
            Some(join) => join.join().map_err(|_| EngineError::Panicked),
            None => Err(EngineError::Panicked),
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
