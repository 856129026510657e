//! Offline rendering command.

use super::common::{LevelMeter, parse_key_val, parse_notes};
use anyhow::Context;
use clap::Args;
use polydyn_config::{DynamicsConfig, PolydynConfig};
use polydyn_core::linear_to_db;
use polydyn_track::AudioTrack;
use std::path::PathBuf;

/// Render a chord through a track and report levels.
#[derive(Args)]
pub struct RenderArgs {
    /// Session configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// MIDI notes (comma-separated, e.g., "60,64,67" for C major)
    #[arg(long, default_value = "60,64,67")]
    notes: String,

    /// Note velocity (1-127)
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u8).range(1..=127))]
    velocity: u8,

    /// Seconds the notes are held
    #[arg(long, default_value = "1.0")]
    duration: f32,

    /// Seconds rendered after the notes are released
    #[arg(long, default_value = "0.5")]
    tail: f32,

    /// Override the configured sample rate
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Override the dynamics topology (e.g. "limiter", "multiband")
    #[arg(long, value_name = "TYPE")]
    dynamics: Option<String>,

    /// Synthesizer parameter override (e.g., -p filter_cutoff=1200)
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    params: Vec<(String, f32)>,

    /// Track volume (0-1)
    #[arg(long, default_value = "1.0")]
    volume: f32,

    /// Track pan (-1 to 1)
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pan: f32,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let notes = parse_notes(&args.notes).map_err(anyhow::Error::msg)?;

    let mut config = match &args.config {
        Some(path) => PolydynConfig::load_validated(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PolydynConfig::default(),
    };
    if let Some(sample_rate) = args.sample_rate {
        config.sample_rate = sample_rate;
    }
    if let Some(name) = &args.dynamics {
        let dynamics = config.dynamics.get_or_insert_with(DynamicsConfig::default);
        dynamics.compressor_type.clone_from(name);
    }
    config.validate()?;

    let sample_rate = config.sample_rate_hz();
    let block_size = config.block_size;
    let (mut track, controller) = AudioTrack::new(sample_rate, block_size);
    controller.set_midi_enabled(true);
    controller.set_volume(args.volume);
    controller.set_pan(args.pan);

    // Remembered values are re-applied to the configured engine on the swap
    for (param, value) in config.synth.parameter_values()? {
        controller.set_parameter(param, value)?;
    }
    for (name, value) in &args.params {
        controller.set_synthesizer_parameter(name, *value)?;
    }
    controller.set_synthesizer(config.synth.build(sample_rate)?)?;

    if let Some(dynamics) = &config.dynamics {
        let processor = dynamics.build(sample_rate, block_size)?;
        tracing::info!(topology = %processor.compressor_type(), "dynamics insert");
        controller.set_dynamics(Some(processor))?;
    }

    for &note in &notes {
        controller.note_on(note, args.velocity, 0)?;
    }

    let hold_frames = (args.duration.max(0.0) * sample_rate) as usize;
    let tail_frames = (args.tail.max(0.0) * sample_rate) as usize;
    let total_frames = hold_frames + tail_frames;

    println!("Rendering...");
    println!("  Notes:       {:?}", notes);
    println!("  Sample rate: {} Hz", config.sample_rate);
    println!("  Block size:  {} frames", block_size);
    println!(
        "  Duration:    {:.2}s held + {:.2}s tail",
        args.duration.max(0.0),
        args.tail.max(0.0)
    );

    let mut block = vec![0.0f32; block_size * 2];
    let mut meter = LevelMeter::default();
    let mut rendered = 0;
    let mut released = false;
    while rendered < total_frames {
        if !released && rendered >= hold_frames {
            for &note in &notes {
                controller.note_off(note, 0, 0)?;
            }
            released = true;
        }
        let frames = block_size.min(total_frames - rendered);
        let out = &mut block[..frames * 2];
        track.process_block(out);
        meter.add(out);
        rendered += frames;
        controller.collect_garbage();
    }

    tracing::debug!(frames = rendered, "render finished");

    println!();
    println!("Levels:");
    println!("  Peak:    {:.2} dBFS", linear_to_db(meter.peak()));
    println!("  RMS:     {:.2} dBFS", linear_to_db(meter.rms()));
    println!("  Clipped: {} samples", meter.clipped());
    println!(
        "  Voices:  {} held at end",
        track.synthesizer().active_voice_count()
    );

    Ok(())
}
