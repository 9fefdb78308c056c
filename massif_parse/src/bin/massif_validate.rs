use massif_parse::Massif;
use std::env;
use std::fs::File;
use std::process::ExitCode;

fn usage(args: &[String]) -> String {
    let program = args.first().map_or("massif_validate", String::as_str);
    format!("Usage: {} <massif.out.PID>", program)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("{}", usage(&args));
        return ExitCode::from(2);
    }

    let path = &args[1];

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening '{}': {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    match Massif::parse(file) {
        Ok(massif) => {
            println!("Valid Massif file: {}", path);
            if let Some(description) = &massif.description {
                println!("  Description: {}", description);
            }
            if let Some(command) = massif.command_line() {
                println!("  Command: {}", command);
            }
            if let Some(time_unit) = &massif.time_unit {
                println!("  Time unit: {}", time_unit);
            }
            println!("  Snapshots: {}", massif.snapshots.len());
            println!("  Detailed: {}", massif.detailed_snapshots().count());
            if let Some(peak) = massif.peak_snapshot() {
                println!("  Peak heap: {} B (snapshot {})", peak.memory_heap, peak.index);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Invalid Massif file '{}': {}", path, e);
            ExitCode::FAILURE
        }
    }
}
