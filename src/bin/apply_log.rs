use anyhow::Result;
use clap::Parser;
use log::error;
use speller_core::config::{InputFormat, PatternMode, SpellerConfig};
use speller_core::corpus::DirectoryCorpus;
use speller_core::error::SpellerError;
use speller_core::replay::{apply_log, ReplayOptions};
use std::path::PathBuf;
use std::process::ExitCode;

/// Apply the changes logged during a speller session to copies of the corpus.
#[derive(Parser)]
#[command(name = "apply_log", version)]
struct Cli {
    /// Session log file to replay.
    log_file: PathBuf,

    /// Root of the original corpus.
    #[arg(long, default_value = ".")]
    corpus_root: PathBuf,

    /// Format of the annotation files.
    #[arg(long, value_enum)]
    input_text_format: Option<InputFormat>,

    /// Output root for single-occurrence changes.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output root for corpus-wide changes.
    #[arg(long)]
    global_output_dir: Option<PathBuf>,

    /// How the search word of a global change is matched.
    #[arg(long, value_enum)]
    global_pattern: Option<PatternMode>,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose diagnostics on stderr.
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let default = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(env_logger::Target::Stderr)
        .init();

    let mut config = SpellerConfig::load(cli.config.as_deref())?;
    if let Some(format) = cli.input_text_format {
        config.input_format = format;
    }
    let mut options = ReplayOptions::from(&config.replay);
    if let Some(dir) = cli.output_dir {
        options.changed_root = dir;
    }
    if let Some(dir) = cli.global_output_dir {
        options.global_root = dir;
    }
    if let Some(mode) = cli.global_pattern {
        options.pattern = mode;
    }

    let corpus = DirectoryCorpus::new(&cli.corpus_root, config.input_format).with_encoding(config.encoding);
    let summary = match apply_log(&cli.log_file, &corpus, &options) {
        Ok(summary) => summary,
        Err(e @ SpellerError::NotFound { what: "log file", .. }) => {
            error!("{e}. Nothing was replayed.");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e.into()),
    };

    println!("{} changes applied, {} skipped.", summary.applied, summary.skipped.len());
    for skipped in &summary.skipped {
        println!("  line {}: {}", skipped.line, skipped.reason);
    }
    for file in &summary.files_written {
        println!("  wrote {}", file.display());
    }
    Ok(if summary.skipped.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(2) })
}
