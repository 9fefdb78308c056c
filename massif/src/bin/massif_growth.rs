//! Report where memory grew the most during a Massif run.
//!
//! Compares each snapshot with the one before it and writes the largest
//! growth steps as NDJSON.
//!
//! # Usage
//!
//! ```bash
//! massif_growth massif.out.1234 -o growth.ndjson
//! massif_growth massif.out.1234.zst -n 5
//! ```

use clap::Parser;
use massif::growth::Growth;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "massif_growth")]
#[command(about = "Find the largest memory growth steps in Massif output")]
#[command(version)]
struct Args {
    /// Massif output file (optionally .gz or .zst compressed)
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of growth steps to report
    #[arg(short = 'n', long, default_value = "10")]
    top: usize,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Loading: {}", args.input.display());
    let massif = massif::load(&args.input)?;

    eprintln!("Computing growth...");
    let growth = Growth::compute(
        &massif,
        args.input.to_str().unwrap_or("input"),
        args.top,
    );

    eprintln!(
        "Found {} growth steps across {} snapshots",
        growth.steps.len(),
        growth.snapshot_count
    );

    match args.output {
        Some(path) => {
            let file = File::create(&path)?;
            let mut writer = BufWriter::new(file);
            growth.write_ndjson(&mut writer)?;
            writer.flush()?;
            eprintln!("Wrote growth to {}", path.display());
        }
        None => {
            growth.write_ndjson(std::io::stdout())?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
