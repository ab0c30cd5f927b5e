use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use speller_core::config::{read_word_list, InputFormat, SpellerConfig};
use speller_core::corpus::DirectoryCorpus;
use speller_core::decision_log::{DecisionLog, LogSink};
use speller_core::interactive::{Console, Speller};
use std::io::{self, IsTerminal};
use std::path::PathBuf;

/// Find closely matching spellings in transcriptions and review them one
/// occurrence at a time. Decisions are written to a log for later replay.
#[derive(Parser)]
#[command(name = "speller", version)]
struct Cli {
    /// Directory where the input text or TextGrid files reside.
    #[arg(long, default_value = "workingdir/textgrids")]
    input_text_dir: PathBuf,

    /// Format of the input text files.
    #[arg(long, value_enum)]
    input_text_format: Option<InputFormat>,

    /// Text file listing words that must be reviewed first, one per line.
    #[arg(long)]
    mandatory_wordlist_fn: Option<PathBuf>,

    /// Directory where the session log files are stored.
    #[arg(long)]
    logdir: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable colouring of the reviewed word.
    #[arg(long)]
    no_color: bool,

    /// Verbose diagnostics on stderr.
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut config = SpellerConfig::load(cli.config.as_deref())?;
    if let Some(format) = cli.input_text_format {
        config.input_format = format;
    }
    if let Some(dir) = cli.logdir {
        config.log_dir = dir;
    }

    let mut log = DecisionLog::create_in(&config.log_dir)?;
    info!("Logging decisions to {}", log.path().display());
    log.event("Starting the speller.")?;

    let mandatory = match &cli.mandatory_wordlist_fn {
        Some(path) => read_word_list(path).with_context(|| "could not load the mandatory word list")?,
        None => Vec::new(),
    };

    info!("Finding and parsing all annotation files in {}", cli.input_text_dir.display());
    let corpus = DirectoryCorpus::new(&cli.input_text_dir, config.input_format)
        .with_encoding(config.encoding)
        .excluding(&config.replay.changed_dir)
        .excluding(&config.replay.global_dir);
    let analysis = speller_core::analyze(&corpus, &config, &mandatory)
        .with_context(|| format!("could not analyse {}", cli.input_text_dir.display()))?;
    for word in analysis.queue.ignored_mandatory() {
        println!("The mandatory word, {word}, does not occur in the corpus. Ignoring it.");
    }

    let color = !cli.no_color && io::stdout().is_terminal();
    let mut console = Console::new(io::stdin().lock(), io::stdout().lock(), color);
    Speller::new(&corpus, &config, &analysis).run_menu(&mut console, &mut log)?;
    log.event("Session ended.")?;
    Ok(())
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(env_logger::Target::Stderr)
        .init();
}
