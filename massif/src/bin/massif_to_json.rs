//! Convert a Massif output file to JSON.
//!
//! # Usage
//!
//! ```bash
//! massif_to_json massif.out.1234 -o profile.json
//! massif_to_json massif.out.1234.gz --pretty
//! massif_to_json massif.out.1234 --summary
//! ```

use clap::Parser;
use massif::export::{self, Summary};
use massif::massif_parse::Massif;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "massif_to_json")]
#[command(about = "Convert Valgrind Massif output to JSON")]
#[command(version)]
struct Args {
    /// Massif output file (optionally .gz or .zst compressed)
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// Only write a summary of the run instead of every snapshot
    #[arg(long)]
    summary: bool,
}

fn write_output<W: Write>(args: &Args, massif: &Massif, writer: W) -> massif::Result<()> {
    if args.summary {
        let summary = Summary::compute(massif);
        if let Some(message) = summary.peak_message() {
            eprintln!("{}", message);
        }
        export::write_summary(&summary, writer, args.pretty)
    } else {
        export::write_json(massif, writer, args.pretty)
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Loading: {}", args.input.display());
    let massif = massif::load(&args.input)?;
    eprintln!("  {} snapshots", massif.snapshots.len());

    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                format!("Failed to create output file '{}': {}", path.display(), e)
            })?;
            let mut writer = BufWriter::new(file);
            write_output(&args, &massif, &mut writer)?;
            writer.flush()?;
            eprintln!("Wrote JSON to {}", path.display());
        }
        None => {
            write_output(&args, &massif, std::io::stdout().lock())?;
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
