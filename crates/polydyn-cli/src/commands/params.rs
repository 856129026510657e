//! Parameter and topology listing command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use polydyn_dynamics::CompressorType;
use polydyn_synth::SynthParam;

#[derive(Args)]
pub struct ParamsArgs {
    /// Show a single parameter
    #[arg(value_name = "PARAM")]
    param: Option<String>,
}

fn format_range((min, max): (f32, f32)) -> String {
    if max == f32::MAX {
        format!("{min} and up")
    } else {
        format!("{min} - {max}")
    }
}

pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    if let Some(name) = &args.param {
        let param: SynthParam = name
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown parameter: {}", name))?;
        println!("{}", param.name());
        println!("{}", "=".repeat(param.name().len()));
        println!("  Default: {}", param.default_value());
        println!("  Range:   {}", format_range(param.range()));
        if param.is_type_specific() {
            println!("  Engines: subtractive");
        }
        return Ok(());
    }

    println!("Synthesizer Parameters");
    println!("======================");
    println!();
    println!("  {:24}  {:10}  {}", "Name", "Default", "Range");
    println!("  {:24}  {:10}  {}", "----", "-------", "-----");
    for param in SynthParam::ALL {
        println!(
            "  {:24}  {:10}  {}",
            param.name(),
            param.default_value(),
            format_range(param.range())
        );
    }

    println!();
    println!("Dynamics Topologies");
    println!("===================");
    println!();
    for topology in CompressorType::ALL {
        println!("  {}", topology.name());
    }

    println!();
    println!("Example usage:");
    println!("  polydyn render --notes 48,55,60 -p filter_cutoff=1800 --dynamics limiter");

    Ok(())
}
