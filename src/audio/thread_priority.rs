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

use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, warn};

/// Default priority for the engine thread when DRUMSTREAM_THREAD_PRIORITY is unset.
const DEFAULT_ENGINE_THREAD_PRIORITY: u8 = 70;

/// Reads DRUMSTREAM_THREAD_PRIORITY (0-99), falling back to the default.
pub fn engine_thread_priority() -> ThreadPriorityValue {
    parse_priority(std::env::var("DRUMSTREAM_THREAD_PRIORITY").ok().as_deref())
}

fn parse_priority(value: Option<&str>) -> ThreadPriorityValue {
    value
        .and_then(|v| v.trim().parse::<u8>().ok())
        .filter(|n| *n < 100)
        .and_then(|n| ThreadPriorityValue::try_from(n).ok())
        .unwrap_or_else(|| ThreadPriorityValue::try_from(DEFAULT_ENGINE_THREAD_PRIORITY).unwrap())
}

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    value == "1"
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("on")
}

/// Whether to attempt SCHED_FIFO for the engine thread. Opt out with
/// DRUMSTREAM_DISABLE_RT_AUDIO=1.
pub fn rt_audio_enabled() -> bool {
    !env_flag("DRUMSTREAM_DISABLE_RT_AUDIO")
}

/// Raises the priority of the calling thread. Failures are logged and otherwise
/// ignored; the engine still runs at normal priority.
pub fn promote_current_thread(priority: ThreadPriorityValue, rt_audio: bool) {
    let tp = ThreadPriority::Crossplatform(priority);
    if let Err(e) = set_current_thread_priority(tp) {
        warn!(error = ?e, "Unable to raise engine thread priority");
    }

    #[cfg(unix)]
    if rt_audio {
        use thread_priority::unix::{
            set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
            ThreadSchedulePolicy,
        };
        match set_thread_priority_and_policy(
            thread_native_id(),
            tp,
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            Ok(()) => info!("Enabled RT SCHED_FIFO for engine thread"),
            Err(e) => warn!(error = %e, "Failed to set RT SCHED_FIFO for engine thread"),
        }
    }

    #[cfg(not(unix))]
    let _ = rt_audio;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_priority() {
        let default = ThreadPriorityValue::try_from(DEFAULT_ENGINE_THREAD_PRIORITY).unwrap();
        assert_eq!(parse_priority(None), default);
        assert_eq!(parse_priority(Some("nope")), default);
        assert_eq!(parse_priority(Some("150")), default);
        assert_eq!(
            parse_priority(Some(" 42 ")),
            ThreadPriorityValue::try_from(42u8).unwrap()
        );
    }

    #[test]
    fn test_truthy() {
        for value in ["1", "true", "YES", "On"] {
            assert!(is_truthy(value));
        }
        for value in ["0", "false", "", "maybe"] {
            assert!(!is_truthy(value));
        }
    }
}
