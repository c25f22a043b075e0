//! CLI tool for arcanon archive redaction.

mod commands;
mod exit_codes;
mod output;
mod progress;

use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arcanon::MatchMode;
use exit_codes::ExitCode;

/// Anonymize IP addresses, computer names and user names inside archives
#[derive(Parser)]
#[command(name = "arcanon")]
#[command(author, version, about = "Anonymize IP addresses, computer names and user names inside ZIP and RAR archives", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact an archive into new_<name> (alias: r)
    #[command(alias = "r")]
    Redact {
        /// Archive to redact (.zip or .rar)
        archive: PathBuf,

        /// Replacement for IPv4 addresses
        #[arg(long, env = "ARCANON_IP")]
        ip: String,

        /// Replacement for computer names
        #[arg(long, env = "ARCANON_COMPUTER_NAME")]
        computer_name: String,

        /// Replacement for user names
        #[arg(long, env = "ARCANON_USER_NAME")]
        user_name: String,

        /// Directory for the output archive
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,

        /// Working directory (must be empty or absent)
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Keep the working directory after the run
        #[arg(long, requires = "work_dir")]
        keep_work_dir: bool,

        /// Name matching mode
        #[arg(long, value_enum, default_value = "labeled")]
        mode: Mode,

        /// Extract entry names without traversal checks
        #[arg(long)]
        unsafe_paths: bool,

        /// Skip files that cannot be repacked instead of failing
        #[arg(long)]
        skip_failed_entries: bool,

        /// Rewrite files in place instead of through a temporary file
        #[arg(long)]
        no_atomic: bool,

        /// Overwrite an existing output archive
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Labeled,
    Bare,
}

impl From<Mode> for MatchMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Labeled => MatchMode::Labeled,
            Mode::Bare => MatchMode::Bare,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    // First Ctrl+C stops at the next checkpoint so temporary files are
    // removed; a second one exits immediately.
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            eprintln!("\nInterrupted");
            std::process::exit(exit_codes::USER_INTERRUPT);
        }
        eprintln!("\nInterrupted, cleaning up (press Ctrl+C again to force)");
    })
    .ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::BAD_ARGS
            } else {
                exit_codes::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Redact {
            archive,
            ip,
            computer_name,
            user_name,
            output_dir,
            work_dir,
            keep_work_dir,
            mode,
            unsafe_paths,
            skip_failed_entries,
            no_atomic,
            force,
        } => commands::redact(
            &commands::RedactArgs {
                archive_path: archive,
                ip,
                computer_name,
                user_name,
                output_dir,
                work_dir,
                keep_work_dir,
                mode,
                unsafe_paths,
                skip_failed_entries,
                atomic: !no_atomic,
                force,
                format: cli.format,
                quiet: cli.quiet,
            },
            interrupted,
        ),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
