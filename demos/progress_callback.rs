//! Monitor a redaction run using a custom progress reporter.
//!
//! This example shows how to:
//! - Implement the `ProgressReporter` trait
//! - Print stage transitions and per-file progress
//! - Surface skipped entries reported as warnings
//!
//! # Usage
//!
//! ```bash
//! cargo run --example progress_callback -- logs.zip 10.0.0.1 HOST anon
//! ```

use std::env;
use std::path::Path;

use arcanon::pipeline::run_with_progress;
use arcanon::progress::ProgressReporter;
use arcanon::{EntryFailurePolicy, Error, PipelineOptions, RedactConfig, Result, Stage};

/// Prints one line per event.
struct PrintingReporter {
    last_percent: Option<u8>,
}

impl ProgressReporter for PrintingReporter {
    fn on_stage(&mut self, stage: Stage) {
        println!("== {stage}");
    }

    fn on_total(&mut self, total_files: u64) {
        println!("   {total_files} files to scan");
    }

    fn on_file_complete(&mut self, path: &Path, files_done: u64, total_files: u64) {
        println!("   [{files_done}/{total_files}] {}", path.display());
    }

    fn on_percent(&mut self, percent: u8) {
        // Several small files can share a percentage.
        if self.last_percent != Some(percent) {
            println!("   {percent}%");
            self.last_percent = Some(percent);
        }
    }

    fn on_warning(&mut self, message: &str) {
        eprintln!("   warning: {message}");
    }

    fn on_finish(&mut self, outcome: std::result::Result<&Path, &Error>) {
        match outcome {
            Ok(path) => println!("Finished: {}", path.display()),
            Err(e) => eprintln!("Failed: {e}"),
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        eprintln!("Usage: {} <archive> <ip> <computer-name> <user-name>", args[0]);
        std::process::exit(1);
    }

    let config = RedactConfig::new(&*args[2], &*args[3], &*args[4], &args[1]);
    let options = PipelineOptions::new().failure_policy(EntryFailurePolicy::SkipAndLog);

    let mut reporter = PrintingReporter { last_percent: None };
    let report = run_with_progress(&config, &options, &mut reporter)?;

    println!(
        "{} of {} files changed, {} replacements",
        report.rewrite.files_changed,
        report.rewrite.files_scanned,
        report.rewrite.matches.total()
    );
    Ok(())
}
