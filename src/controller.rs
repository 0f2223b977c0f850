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
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info, span, Level};

use crate::samples::{ControlEvent, EngineError, EngineHandle, SampleEngine};

pub mod keyboard;

/// Controller events that drive the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A control event forwarded to the engine.
    Control(ControlEvent),

    /// Prints the status of every voice.
    Status,

    /// Stops the engine and exits.
    Quit,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Connects a driver to a running engine.
pub struct Controller {
    handle: JoinHandle<Result<SampleEngine, EngineError>>,
}

impl Controller {
    /// Starts forwarding the driver's events to the engine.
    pub fn new(engine: EngineHandle, driver: Arc<dyn Driver>) -> Result<Controller, io::Error> {
        let handle = thread::Builder::new()
            .name("drumstream-controller".to_string())
            .spawn(move || {
                let span = span!(Level::INFO, "controller");
                let _enter = span.enter();

                let (events_tx, events_rx) = crossbeam_channel::unbounded();
                let monitor = driver.monitor_events(events_tx);
                let result = Controller::trigger_events(engine, &events_rx, io::stdout());
                drop(events_rx);
                if let Ok(Err(e)) = monitor.join() {
                    error!(err = %e, "Driver stopped with an error");
                }
                result
            })?;

        Ok(Controller { handle })
    }

    /// Blocks until the controller quits and returns the stopped engine.
    pub fn join(self) -> Result<SampleEngine, EngineError> {
        self.handle.join().map_err(|_| EngineError::Panicked)?
    }

    /// Forwards events until a quit arrives or the driver goes away.
    fn trigger_events<W: Write>(
        engine: EngineHandle,
        events_rx: &Receiver<Event>,
        mut writer: W,
    ) -> Result<SampleEngine, EngineError> {
        info!("Controller started.");

        while let Ok(event) = events_rx.recv() {
            info!(event = ?event, "Received event.");
            match event {
                Event::Control(event) => engine.send(event),
                Event::Status => {
                    for status in engine.status() {
                        if let Err(e) = writeln!(writer, "{}", status) {
                            error!(err = %e, "Unable to write status");
                        }
                    }
                }
                Event::Quit => break,
            }
        }

        info!("Controller closing.");
        engine.join()
    }
}
