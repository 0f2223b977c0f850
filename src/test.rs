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

//! End-to-end playback scenarios.

use std::path::Path;
use std::sync::Arc;

use crate::audio::mock::MemorySink;
use crate::audio::sample_source::{ClipHeader, CLIP_HEADER_LEN};
use crate::config::{init_engine, EngineConfig};
use crate::samples::{ClipLoader, EngineSettings, SampleEngine, DEFAULT_MAX_CLIP_BYTES};
use crate::storage::{FileStorage, MemoryStorage};
use crate::testutil::{clip_bytes, ramp, wav_bytes, write_wav};

fn engine_with(storage: &Arc<MemoryStorage>, settings: EngineSettings) -> SampleEngine {
    SampleEngine::new(storage.clone(), settings).unwrap()
}

#[test]
fn test_clip_plays_then_falls_silent() {
    let storage = Arc::new(MemoryStorage::new());
    let clip = ramp(100);
    storage.insert("a.clip", clip_bytes(&clip, 48000));
    let mut engine = engine_with(&storage, EngineSettings::default());
    engine.assign_clip(0, Path::new("a.clip")).unwrap();
    engine.trigger(0).unwrap();

    let played: Vec<i16> = (0..100).map(|_| engine.tick()).collect();
    assert_eq!(played, clip);
    assert!(played.iter().all(|s| *s != 0));
    assert!(!engine.is_playing(0));

    for _ in 0..10 {
        assert_eq!(engine.tick(), 0);
    }
    assert_eq!(engine.status()[0].samples_emitted, 100);

    engine.service_refills();
    assert_eq!(storage.open_handles(), 0);
}

#[test]
fn test_mix_is_clamped_sum_of_voices() {
    let storage = Arc::new(MemoryStorage::new());
    let a: Vec<i16> = (0..300).map(|i| (i * 97 % 30000) as i16).collect();
    let b: Vec<i16> = (0..200).map(|i| 20000 - (i * 13) as i16).collect();
    storage.insert("a.clip", clip_bytes(&a, 48000));
    storage.insert("b.clip", clip_bytes(&b, 48000));

    let settings = EngineSettings {
        capacity: 64,
        low_water: 16,
        refill_chunk: 16,
        frames_per_quantum: 8,
        ..Default::default()
    };
    let mut engine = engine_with(&storage, settings);
    engine.assign_clip(0, Path::new("a.clip")).unwrap();
    engine.assign_clip(1, Path::new("b.clip")).unwrap();
    engine.trigger(0).unwrap();
    engine.trigger(1).unwrap();

    let mut sink = MemorySink::new();
    engine.render(320, &mut sink).unwrap();

    for (i, frame) in sink.samples().iter().enumerate() {
        let left = a.get(i).copied().map_or(0, i32::from);
        let right = b.get(i).copied().map_or(0, i32::from);
        let expected = (left + right).clamp(-32767, 32767) as i16;
        assert_eq!(*frame, expected, "frame {}", i);
    }
    assert!(engine.status().iter().all(|s| s.underruns == 0));
}

#[test]
fn test_retrigger_restarts_from_zero() {
    let storage = Arc::new(MemoryStorage::new());
    let clip = ramp(100);
    storage.insert("a.clip", clip_bytes(&clip, 48000));
    let mut engine = engine_with(&storage, EngineSettings::default());
    engine.assign_clip(0, Path::new("a.clip")).unwrap();

    engine.trigger(0).unwrap();
    for _ in 0..40 {
        engine.tick();
    }
    engine.trigger(0).unwrap();

    let mut played = Vec::new();
    while engine.is_playing(0) {
        played.push(engine.tick());
        assert!(engine.status()[0].samples_emitted <= 100);
    }
    assert_eq!(played, clip);
}

#[test]
fn test_24_bit_stereo_source_plays_as_mean() {
    let storage = Arc::new(MemoryStorage::new());
    let loader = ClipLoader::new(storage.clone(), 48000, DEFAULT_MAX_CLIP_BYTES);
    loader
        .load_bytes(&wav_bytes(2, 24, 48000, &[1000, 2000]), Path::new("d.clip"))
        .unwrap();

    let mut engine = engine_with(&storage, EngineSettings::default());
    engine.assign_clip(3, Path::new("d.clip")).unwrap();
    engine.trigger(3).unwrap();
    assert_eq!(engine.tick(), 5);
    assert!(!engine.is_playing(3));
}

#[test]
fn test_four_full_scale_voices_clamp() {
    let storage = Arc::new(MemoryStorage::new());
    storage.insert("max.clip", clip_bytes(&[i16::MAX; 4], 48000));
    storage.insert("min.clip", clip_bytes(&[i16::MIN; 4], 48000));
    let mut engine = engine_with(&storage, EngineSettings::default());

    for voice in 0..4 {
        engine.assign_clip(voice, Path::new("max.clip")).unwrap();
        engine.trigger(voice).unwrap();
    }
    assert_eq!(engine.tick(), 32767);

    engine.stop_all();
    for voice in 0..4 {
        engine.assign_clip(voice, Path::new("min.clip")).unwrap();
        engine.trigger(voice).unwrap();
    }
    assert_eq!(engine.tick(), -32767);
}

#[test]
fn test_file_store_round_trip_through_small_ring() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("long.wav");
    let input: Vec<i32> = (0..5000).map(|i| ((i * 7919) % 65536) - 32768).collect();
    write_wav(&source, 1, 16, 48000, &input).unwrap();

    let storage = Arc::new(FileStorage::new(dir.path().join("store")));
    let loader = ClipLoader::new(storage.clone(), 48000, DEFAULT_MAX_CLIP_BYTES);
    loader.load(&source, Path::new("long.clip")).unwrap();

    let settings = EngineSettings {
        capacity: 100,
        low_water: 60,
        refill_chunk: 33,
        refill_budget: 50,
        frames_per_quantum: 16,
        ..Default::default()
    };
    let mut engine = SampleEngine::new(storage, settings).unwrap();
    engine.assign_clip(0, Path::new("long.clip")).unwrap();
    engine.trigger(0).unwrap();

    let mut sink = MemorySink::new();
    while engine.is_playing(0) {
        engine.run_quantum(&mut sink).unwrap();
    }

    assert_eq!(engine.status()[0].underruns, 0);
    let expected: Vec<i16> = input.iter().map(|s| *s as i16).collect();
    assert_eq!(&sink.samples()[..expected.len()], &expected[..]);
    assert!(sink.samples()[expected.len()..].iter().all(|s| *s == 0));
}

#[test]
fn test_storage_failure_degrades_to_silence_and_recovers() {
    let storage = Arc::new(MemoryStorage::new());
    let clip = ramp(600);
    storage.insert("a.clip", clip_bytes(&clip, 48000));
    let settings = EngineSettings {
        capacity: 64,
        low_water: 32,
        refill_chunk: 32,
        frames_per_quantum: 16,
        max_empty_reads: 1000,
        ..Default::default()
    };
    let mut engine = engine_with(&storage, settings);
    engine.assign_clip(0, Path::new("a.clip")).unwrap();
    engine.trigger(0).unwrap();

    let mut sink = MemorySink::new();
    engine.render(64, &mut sink).unwrap();
    storage.set_failing(true);
    engine.render(160, &mut sink).unwrap();
    assert!(engine.status()[0].underruns > 0);
    assert!(engine.is_playing(0));

    storage.set_failing(false);
    while engine.is_playing(0) {
        engine.run_quantum(&mut sink).unwrap();
    }

    // Silence was inserted, but every sample of the clip still came out in order.
    let audible: Vec<i16> = sink.samples().iter().copied().filter(|s| *s != 0).collect();
    assert_eq!(audible, clip);
    assert_eq!(engine.status()[0].samples_emitted, 600);
}

#[test]
fn test_truncated_store_finishes_voice() {
    let storage = Arc::new(MemoryStorage::new());
    // The header promises 100 samples, only 50 are stored.
    let mut bytes = ClipHeader::new(100, 48000).encode().to_vec();
    crate::audio::sample_source::encode_pcm16(ramp(50), &mut bytes);
    assert_eq!(bytes.len(), CLIP_HEADER_LEN + 100);
    storage.insert("short.clip", bytes);

    let settings = EngineSettings {
        capacity: 32,
        low_water: 16,
        refill_chunk: 16,
        frames_per_quantum: 8,
        max_empty_reads: 3,
        ..Default::default()
    };
    let mut engine = engine_with(&storage, settings);
    engine.assign_clip(1, Path::new("short.clip")).unwrap();
    engine.trigger(1).unwrap();

    let mut sink = MemorySink::new();
    for _ in 0..100 {
        if !engine.is_playing(1) {
            break;
        }
        engine.run_quantum(&mut sink).unwrap();
    }

    assert!(!engine.is_playing(1));
    assert_eq!(engine.status()[1].samples_emitted, 50);
    assert_eq!(&sink.samples()[..50], &ramp(50)[..]);
    engine.service_refills();
    assert_eq!(storage.open_handles(), 0);
}

#[test]
fn test_handles_released_exactly_once() {
    let storage = Arc::new(MemoryStorage::new());
    storage.insert("a.clip", clip_bytes(&ramp(10), 48000));
    let mut engine = engine_with(&storage, EngineSettings::default());
    engine.assign_clip(0, Path::new("a.clip")).unwrap();

    // Stop mid-clip, stop again, retrigger, finish, stop after finishing.
    engine.trigger(0).unwrap();
    engine.tick();
    engine.stop(0).unwrap();
    engine.stop(0).unwrap();
    assert_eq!(storage.open_handles(), 0);

    engine.trigger(0).unwrap();
    engine.trigger(0).unwrap();
    assert_eq!(storage.open_handles(), 1);
    for _ in 0..10 {
        engine.tick();
    }
    engine.service_refills();
    engine.service_refills();
    engine.stop(0).unwrap();
    assert_eq!(storage.open_handles(), 0);

    // Header read plus three triggers.
    assert_eq!(storage.opened(), 4);
}

#[test]
fn test_stop_on_idle_voice_is_a_no_op() {
    let storage = Arc::new(MemoryStorage::new());
    let mut engine = engine_with(&storage, EngineSettings::default());
    let before = engine.status();
    engine.stop(2).unwrap();
    engine.stop_all();
    assert_eq!(engine.status(), before);
}

#[test]
fn test_engine_from_config_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("clips");
    let storage = Arc::new(FileStorage::new(&store));
    let loader = ClipLoader::new(storage, 48000, DEFAULT_MAX_CLIP_BYTES);
    loader
        .load_bytes(&wav_bytes(1, 16, 48000, &[100, 200, 300]), Path::new("kick.clip"))
        .unwrap();
    loader
        .load_bytes(&wav_bytes(1, 16, 48000, &[1, 2]), Path::new("snare.clip"))
        .unwrap();

    let config_path = dir.path().join("engine.yaml");
    std::fs::write(
        &config_path,
        r#"
store: clips
output:
  device: mock
voices:
  - clip: kick.clip
  - clip: snare.clip
"#,
    )
    .unwrap();

    let config = EngineConfig::load(&config_path).unwrap();
    let mut engine = init_engine(&config).unwrap();
    engine.trigger(0).unwrap();
    engine.trigger(1).unwrap();

    let mut sink = MemorySink::new();
    engine.render(4, &mut sink).unwrap();
    assert_eq!(&sink.samples()[..4], &[101, 202, 300, 0]);
    assert!(engine.trigger(2).is_err());
}
