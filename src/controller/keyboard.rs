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
use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{info, span, warn, Level};

use super::Event;
use crate::samples::{ControlEvent, VOICE_COUNT};

const STOP: &str = "stop";
const STATUS: &str = "status";
const QUIT: &str = "quit";

/// A controller that drives the engine from typed commands.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Reads and dispatches one command. Returns false after a quit or once the input
    /// is exhausted.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command (1-{n} trigger, s1-s{n} stop, {}, {}, {}): ",
            STOP,
            STATUS,
            QUIT,
            n = VOICE_COUNT,
        )?;
        writer.flush()?;
        let mut input = String::default();
        if reader.read_line(&mut input)? == 0 {
            events_tx.send(Event::Quit).map_err(io::Error::other)?;
            return Ok(false);
        }

        match parse_command(&input) {
            Some(event) => {
                events_tx.send(event).map_err(io::Error::other)?;
                Ok(event != Event::Quit)
            }
            None => {
                warn!(input = input.trim(), "Unrecognized input");
                Ok(true)
            }
        }
    }
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new()
    }
}

/// Parses a keyboard command. Voices are numbered from 1.
fn parse_command(input: &str) -> Option<Event> {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        STOP => return Some(Event::Control(ControlEvent::StopAll)),
        STATUS => return Some(Event::Status),
        QUIT => return Some(Event::Quit),
        _ => {}
    }

    let (stop, number) = match input.strip_prefix('s') {
        Some(rest) => (true, rest),
        None => (false, input.as_str()),
    };
    let voice = number.parse::<usize>().ok()?.checked_sub(1)?;
    if voice >= VOICE_COUNT {
        return None;
    }

    Some(Event::Control(if stop {
        ControlEvent::Stop(voice)
    } else {
        ControlEvent::Trigger(voice)
    }))
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        thread::spawn(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader};

    use super::*;

    fn get_event(input: &str) -> Result<(bool, Option<Event>), io::Error> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Event>();
        let reader = BufReader::new(input.as_bytes());
        let mut writer: Vec<u8> = Vec::new();
        let more = Driver::monitor_io(&sender, reader, &mut writer)?;
        assert!(String::from_utf8(writer).unwrap().starts_with("Command"));

        drop(sender);
        Ok((more, receiver.recv().ok()))
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        let control = |event| Some(Event::Control(event));

        assert_eq!((true, control(ControlEvent::Trigger(0))), get_event("1\n")?);
        assert_eq!((true, control(ControlEvent::Trigger(3))), get_event(" 4 \n")?);
        assert_eq!((true, control(ControlEvent::Stop(1))), get_event("s2\n")?);
        assert_eq!((true, control(ControlEvent::Stop(3))), get_event("S4")?);
        assert_eq!((true, control(ControlEvent::StopAll)), get_event(STOP)?);
        assert_eq!((true, Some(Event::Status)), get_event(STATUS)?);
        assert_eq!((false, Some(Event::Quit)), get_event(QUIT)?);
        Ok(())
    }

    #[test]
    fn test_unrecognized_input() -> Result<(), io::Error> {
        for input in ["0", "5", "s0", "s5", "s", "-1", "play", ""] {
            let (more, event) = get_event(&format!("{}\n", input))?;
            assert!(more);
            assert_eq!(None, event, "input {:?}", input);
        }
        Ok(())
    }

    #[test]
    fn test_end_of_input_quits() -> Result<(), io::Error> {
        assert_eq!((false, Some(Event::Quit)), get_event("")?);
        Ok(())
    }
}
