//! CLI for the GDSL stream verifier
//!
//! Reads a binary command stream and prints the verification report.
//!
//! # Usage
//!
//! ```bash
//! gdsl-verify stream.bin
//! gdsl-verify --level phase stream.bin
//! ```

use std::{env, fs, process};

use verifier::{verify, Level};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let (level, path) = match args.as_slice() {
        [_, path] => (Level::Domain, path),
        [_, flag, name, path] if flag == "--level" => {
            let level = Level::from_name(name).unwrap_or_else(|| {
                eprintln!("Unknown level '{}'; expected syntax, phase, or domain", name);
                process::exit(2);
            });
            (level, path)
        }
        _ => {
            eprintln!("Usage: gdsl-verify [--level syntax|phase|domain] <stream-file>");
            process::exit(2);
        }
    };

    let stream = fs::read(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path, e);
        process::exit(2);
    });

    let report = verify(&stream, level);

    println!(
        "{}: success={} instructions={} errors={} warnings={} infos={}",
        path,
        report.success,
        report.instruction_count,
        report.error_count,
        report.warning_count,
        report.info_count
    );
    for diagnostic in report.diagnostics() {
        println!(
            "  [{}] {}: {}",
            diagnostic.instruction_index, diagnostic.severity, diagnostic.message
        );
    }

    if !report.success {
        process::exit(1);
    }
}
