//! Command implementations for the CLI tool.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use arcanon::pipeline::run_with_progress;
use arcanon::{EntryFailurePolicy, PipelineOptions, RedactConfig, safety::PathSafety};

use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;
use crate::progress::CliProgress;
use crate::{Mode, OutputFormat};

/// Arguments for the redact command.
pub struct RedactArgs {
    pub archive_path: PathBuf,
    pub ip: String,
    pub computer_name: String,
    pub user_name: String,
    pub output_dir: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub keep_work_dir: bool,
    pub mode: Mode,
    pub unsafe_paths: bool,
    pub skip_failed_entries: bool,
    pub atomic: bool,
    pub force: bool,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl RedactArgs {
    fn options(&self) -> PipelineOptions {
        let mut options = PipelineOptions::new()
            .match_mode(self.mode.into())
            .atomic_writes(self.atomic)
            .overwrite(self.force)
            .keep_work_dir(self.keep_work_dir);

        if let Some(dir) = &self.output_dir {
            options = options.output_dir(dir);
        }
        if let Some(dir) = &self.work_dir {
            options = options.work_dir(dir);
        }
        if self.unsafe_paths {
            options = options.path_safety(PathSafety::Disabled);
        }
        if self.skip_failed_entries {
            options = options.failure_policy(EntryFailurePolicy::SkipAndLog);
        }
        options
    }
}

/// Redact command implementation
///
/// Setting `interrupted` stops the run at its next checkpoint.
pub fn redact(args: &RedactArgs, interrupted: Arc<AtomicBool>) -> ExitCode {
    let formatter = create_formatter(args.format);

    let config = RedactConfig::new(
        args.ip.as_str(),
        args.computer_name.as_str(),
        args.user_name.as_str(),
        args.archive_path.clone(),
    );
    let options = args.options();

    let quiet = args.quiet || args.format == OutputFormat::Json;
    let mut progress = CliProgress::new(quiet, interrupted);

    match run_with_progress(&config, &options, &mut progress) {
        Ok(report) => {
            print!("{}", formatter.format_report(&report));
            if args.format == OutputFormat::Json {
                println!();
            }
            if report.repack.is_complete() {
                ExitCode::Success
            } else {
                ExitCode::Warning
            }
        }
        Err(e) => {
            match args.format {
                OutputFormat::Human => eprint!("{}", formatter.format_error(&e)),
                OutputFormat::Json => println!("{}", formatter.format_error(&e)),
            }
            error_to_exit_code(&e)
        }
    }
}
