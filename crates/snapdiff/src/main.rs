//! CLI for the snapshot diff engine
//!
//! # Usage
//!
//! ```bash
//! gdsl-snapdiff diff <base> <target> <out.diff>
//! gdsl-snapdiff patch <base> <in.diff> <out>
//! gdsl-snapdiff pages <in.diff>
//! ```

use std::{env, fs, process};

use snapdiff::Diff;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    match args.as_slice() {
        [_, cmd, base, target, out] if cmd == "diff" => {
            let base = read(base);
            let target = read(target);
            let diff = Diff::compute(&base, &target);
            write(out, &diff.to_bytes());
            println!(
                "{}: pages={} payload={} target_length={}",
                out,
                diff.chunk_count(),
                diff.payload().len(),
                diff.header().target_length
            );
        }
        [_, cmd, base, diff_path, out] if cmd == "patch" => {
            let base = read(base);
            let diff = parse_diff(diff_path);
            let patched = diff.apply(&base).unwrap_or_else(|e| {
                eprintln!("Failed to apply {}: {}", diff_path, e);
                process::exit(1);
            });
            write(out, &patched);
            println!("{}: {} bytes", out, patched.len());
        }
        [_, cmd, diff_path] if cmd == "pages" => {
            let diff = parse_diff(diff_path);
            for page in diff.changed_pages() {
                println!("{}", page);
            }
        }
        _ => {
            eprintln!(
                "Usage: gdsl-snapdiff diff <base> <target> <out>\n       \
                 gdsl-snapdiff patch <base> <diff> <out>\n       \
                 gdsl-snapdiff pages <diff>"
            );
            process::exit(2);
        }
    }
}

fn read(path: &str) -> Vec<u8> {
    fs::read(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path, e);
        process::exit(2);
    })
}

fn write(path: &str, bytes: &[u8]) {
    fs::write(path, bytes).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {}", path, e);
        process::exit(2);
    })
}

fn parse_diff(path: &str) -> Diff {
    Diff::from_bytes(&read(path)).unwrap_or_else(|e| {
        eprintln!("Invalid diff {}: {}", path, e);
        process::exit(1);
    })
}
