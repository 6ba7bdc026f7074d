// Thin command layer: read -> decode -> transform -> encode -> write

use std::path::{Path, PathBuf};

use crate::codec;
use crate::compress::compress_columns;
use crate::config::PipelineConfig;
use crate::midi_file;
use crate::pipeline::{self, ProcessedMatrix};
use crate::volume::binarize_volume;

const USAGE: &str = "\
usage:
  pianola roundtrip <input.mid|dir> <output.mid> [--config <pipeline.toml>]
  pianola export <input.mid|dir> <output.json> [--config <pipeline.toml>]
  pianola import <input.json> <output.mid>
  pianola inspect <input.mid|dir>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RoundTrip { input: PathBuf, output: PathBuf, config: Option<PathBuf> },
    Export { input: PathBuf, output: PathBuf, config: Option<PathBuf> },
    Import { input: PathBuf, output: PathBuf },
    Inspect { input: PathBuf },
}

/// Parse command-line arguments (without the program name).
pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut config = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter
                .next()
                .ok_or_else(|| anyhow::anyhow!("--config needs a path\n{}", USAGE))?;
            config = Some(PathBuf::from(path));
        } else {
            positional.push(arg.as_str());
        }
    }

    let command = match positional.as_slice() {
        ["roundtrip", input, output] => Command::RoundTrip {
            input: PathBuf::from(*input),
            output: PathBuf::from(*output),
            config,
        },
        ["export", input, output] => Command::Export {
            input: PathBuf::from(*input),
            output: PathBuf::from(*output),
            config,
        },
        ["import", input, output] => Command::Import {
            input: PathBuf::from(*input),
            output: PathBuf::from(*output),
        },
        ["inspect", input] => Command::Inspect { input: PathBuf::from(*input) },
        _ => anyhow::bail!("unrecognized arguments\n{}", USAGE),
    };

    Ok(command)
}

/// Execute a parsed command.
pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::RoundTrip { input, output, config } => {
            let config = PipelineConfig::load_or_default(config.as_deref());
            let (matrix, meta) = midi_file::load_matrix(&input)?;
            let events = pipeline::round_trip(matrix, meta, &config)?;
            midi_file::write_sequence(&output, &events, &meta)
        }
        Command::Export { input, output, config } => {
            let config = PipelineConfig::load_or_default(config.as_deref());
            let (matrix, meta) = midi_file::load_matrix(&input)?;
            let processed = pipeline::process(matrix, meta, &config)?;
            processed.save_json(&output)?;
            log::info!("Exported {} rows to {}", processed.body.values().nrows(), output.display());
            Ok(())
        }
        Command::Import { input, output } => {
            let processed = ProcessedMatrix::load_json(&input)?;
            let events = processed.to_events()?;
            midi_file::write_sequence(&output, &events, &processed.meta)
        }
        Command::Inspect { input } => inspect(&input),
    }
}

fn inspect(input: &Path) -> anyhow::Result<()> {
    let (mut matrix, meta) = midi_file::load_matrix(input)?;
    let events = codec::encode(&matrix)?;
    let compressed = compress_columns(&matrix);

    println!("{}: {} ticks at {} ticks per quarter", input.display(), matrix.len(), meta.resolution);
    println!("minimal encoding: {} events", events.len());
    println!(
        "active pitches ({}): {:?}",
        compressed.columns_present.len(),
        compressed.columns_present
    );

    match binarize_volume(&mut matrix) {
        Ok(average) => println!("average velocity: {}", average.get()),
        Err(e) => log::warn!("{}", e),
    }

    if let Some(tempo) = meta.tempo {
        println!("tempo: {} microseconds per quarter", tempo.microseconds_per_beat);
    }

    Ok(())
}
