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
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing_subscriber::EnvFilter;

use drumstream::audio::mock::MemorySink;
use drumstream::audio::sample_source::ClipDescriptor;
use drumstream::config::{init_engine, init_engine_and_controller, init_loader, EngineConfig};
use drumstream::samples::{ClipLoader, DEFAULT_MAX_CLIP_BYTES};
use drumstream::storage::FileStorage;

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=drumstream sample player

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/drumstream
ExecStart=/usr/local/bin/drumstream start "$DRUMSTREAM_CONFIG"

[Install]
WantedBy=multi-user.target
Alias=drumstream.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A four-voice streaming sample player."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converts a WAV file into a clip in the store.
    Load {
        /// The WAV file to convert.
        source: PathBuf,
        /// The clip path within the store.
        dest: PathBuf,
        /// Takes the store, sample rate, and clip size limit from an engine config.
        #[arg(short, long, conflicts_with_all = ["store", "max_clip_bytes", "sample_rate"])]
        config: Option<PathBuf>,
        /// The clip store directory.
        #[arg(short, long, default_value = ".")]
        store: PathBuf,
        /// Source data beyond this many payload bytes is dropped.
        #[arg(long, default_value_t = DEFAULT_MAX_CLIP_BYTES)]
        max_clip_bytes: usize,
        /// The engine sample rate. Clips at other rates are loaded with a warning.
        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,
    },
    /// Prints the header of a stored clip.
    Info {
        /// The clip path within the store.
        clip: PathBuf,
        /// The clip store directory.
        #[arg(short, long, default_value = ".")]
        store: PathBuf,
    },
    /// Renders triggered voices offline into a stereo WAV file.
    Render {
        /// The path to the engine config.
        config_path: PathBuf,
        /// The WAV file to write.
        output: PathBuf,
        /// Voice indices (0-3) to trigger before rendering, e.g. 0,2.
        #[arg(short, long, value_delimiter = ',')]
        trigger: Vec<usize>,
        /// Number of frames to render.
        #[arg(short, long, default_value_t = 48000)]
        frames: usize,
    },
    /// Starts the engine with the keyboard controller.
    Start {
        /// The path to the engine config.
        config_path: PathBuf,
    },
    /// Prints a systemd service definition to stdout.
    Systemd {},
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Load {
            source,
            dest,
            config,
            store,
            max_clip_bytes,
            sample_rate,
        } => {
            let loader = match config {
                Some(config_path) => init_loader(&EngineConfig::load(&config_path)?),
                None => ClipLoader::new(
                    Arc::new(FileStorage::new(store)),
                    sample_rate,
                    max_clip_bytes,
                ),
            };
            let clip = loader.load(&source, &dest)?;
            println!("Loaded {}", clip);
        }
        Commands::Info { clip, store } => {
            let storage = FileStorage::new(store);
            let clip = ClipDescriptor::read(&storage, &clip)?;
            println!("{}", clip);
        }
        Commands::Render {
            config_path,
            output,
            trigger,
            frames,
        } => {
            let config = EngineConfig::load(&config_path)?;
            let mut engine = init_engine(&config)?;
            for voice in trigger {
                engine.trigger(voice)?;
            }

            let mut sink = MemorySink::with_capacity(frames);
            engine.render(frames, &mut sink)?;

            let mut writer = WavWriter::create(
                &output,
                WavSpec {
                    channels: 2,
                    sample_rate: config.sample_rate(),
                    bits_per_sample: 16,
                    sample_format: SampleFormat::Int,
                },
            )?;
            for sample in sink.samples().iter().take(frames) {
                writer.write_sample(*sample)?;
                writer.write_sample(*sample)?;
            }
            writer.finalize()?;
            println!("Rendered {} frames to {}", frames, output.display());
        }
        Commands::Start { config_path } => {
            let engine = init_engine_and_controller(&config_path)?.join()?;
            println!("Stopped after {} frames.", engine.frames_rendered());
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE)
        }
    }

    Ok(())
}
