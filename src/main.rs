use benchlog::config::{self, DisplayFormat};
use benchlog::parsers::atomic_sum::AtomicSum;
use benchlog::parsers::iter_delay::IterDelay;
use benchlog::parsers::ParserKind;
use benchlog::pipeline::{self, PipelineError, RunOptions, RunReport};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Summarize concurrency benchmark logs: extract report lines, compute
/// per-metric statistics, print them, and append them to a CSV table.
#[derive(Parser, Debug)]
#[command(name = "benchlog", version, about)]
pub struct Cli {
    /// Path to the log file
    #[arg(value_name = "LOG_FILE")]
    log_file: PathBuf,

    /// Parser to parse the log file with (default: from config)
    #[arg(long, value_enum)]
    parser: Option<ParserKind>,

    /// CSV output file path (default: from config, else output.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, default_value = "benchlog.toml")]
    config: PathBuf,

    /// Print the summary as JSON lines instead of text blocks
    #[arg(long)]
    json: bool,

    /// Don't print the summary, only append to the CSV table
    #[arg(long)]
    no_display: bool,

    /// Extra logging (per-file counters, output details)
    #[arg(short, long)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);
    tracing::debug!(?cli, "parsed CLI arguments");

    let cfg = config::load_config(&cli.config);

    let Some(kind) = cli.parser.or(cfg.parse.parser) else {
        eprintln!("Error: no parser selected; pass --parser <iter-delay|atomic-sum> or set [parse] parser in config");
        std::process::exit(2);
    };

    let display = if cli.no_display || !cfg.display.enabled {
        None
    } else if cli.json {
        Some(DisplayFormat::Json)
    } else {
        Some(cfg.display.format)
    };

    let opts = RunOptions {
        log_path: cli.log_file,
        output_path: cli.output.unwrap_or(cfg.output.path),
        display,
    };

    tracing::info!(parser = %kind, log = %opts.log_path.display(), "benchlog starting");

    match run_with(kind, &opts) {
        Ok(report) => {
            tracing::debug!(?report, "run complete");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn run_with(kind: ParserKind, opts: &RunOptions) -> Result<RunReport, PipelineError> {
    let mut stdout = std::io::stdout().lock();
    match kind {
        ParserKind::IterDelay => pipeline::run(&IterDelay::new(), opts, &mut stdout),
        ParserKind::AtomicSum => pipeline::run(&AtomicSum::new(), opts, &mut stdout),
    }
}
