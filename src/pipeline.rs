//! One run: read the log, extract every line, summarize, print, append.
//!
//! Nothing is written to the table unless summarization succeeded.

use crate::aggregate::AggregateError;
use crate::config::DisplayFormat;
use crate::output::{self, AppendOutcome, OutputError};
use crate::parsers::{LogParser, Timestamp};
use chrono::SubsecRound;
use crate::store::AccumulatorStore;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Inputs of a run, resolved from CLI flags and config.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub log_path: PathBuf,
    pub output_path: PathBuf,
    /// `None` skips the summary display.
    pub display: Option<DisplayFormat>,
}

/// Counters from reading the input.
#[derive(Debug, Default)]
pub struct ParsedLog {
    pub store: AccumulatorStore,
    pub lines: usize,
    pub matched: usize,
}

/// What a successful run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub lines: usize,
    pub matched: usize,
    pub rows: usize,
    pub header_written: bool,
}

/// Feed every line of `reader` through `parser`.
pub fn parse_lines<P: LogParser, R: BufRead>(
    parser: &P,
    reader: R,
) -> std::io::Result<ParsedLog> {
    let mut parsed = ParsedLog::default();
    for line in reader.lines() {
        let line = line?;
        parsed.lines += 1;
        if parser.parse_line(&line, &mut parsed.store) {
            parsed.matched += 1;
        }
    }
    Ok(parsed)
}

/// Open and parse the log file at `path`.
pub fn parse_log_file<P: LogParser>(parser: &P, path: &Path) -> Result<ParsedLog, PipelineError> {
    let input_err = |e: std::io::Error| PipelineError::Input {
        path: path.to_path_buf(),
        source: e,
    };
    let file = std::fs::File::open(path).map_err(input_err)?;
    let parsed = parse_lines(parser, std::io::BufReader::new(file)).map_err(input_err)?;
    tracing::debug!(
        path = %path.display(),
        lines = parsed.lines,
        matched = parsed.matched,
        records = parsed.store.len(),
        "parsed log file"
    );
    Ok(parsed)
}

/// Print the human-readable summary of `rows` to `out`.
pub fn write_summary<P: LogParser, W: Write>(
    parser: &P,
    rows: &[P::Row],
    format: DisplayFormat,
    out: &mut W,
) -> Result<(), PipelineError> {
    let display_err = |e: std::io::Error| PipelineError::Display { source: e };
    if rows.is_empty() {
        writeln!(out, "No data to display.").map_err(display_err)?;
        return Ok(());
    }
    for row in rows {
        match format {
            DisplayFormat::Text => {
                writeln!(out, "{}", parser.format_summary(row)).map_err(display_err)?
            }
            DisplayFormat::Json => {
                let json = serde_json::to_string(row)
                    .map_err(|e| display_err(std::io::Error::other(e)))?;
                writeln!(out, "{json}").map_err(display_err)?;
            }
        }
    }
    Ok(())
}

/// Local wall-clock time at microsecond precision, the resolution of
/// existing tables.
fn run_timestamp() -> Timestamp {
    chrono::Local::now().naive_local().trunc_subsecs(6)
}

/// Run the whole pipeline, printing the summary to `out`.
pub fn run<P: LogParser, W: Write>(
    parser: &P,
    opts: &RunOptions,
    out: &mut W,
) -> Result<RunReport, PipelineError> {
    let parsed = parse_log_file(parser, &opts.log_path)?;

    let timestamp = run_timestamp();
    let rows = parser
        .aggregate_rows(&parsed.store, timestamp)
        .map_err(|e| match e {
            AggregateError::NoData => PipelineError::NoData {
                path: opts.log_path.clone(),
            },
        })?;

    if let Some(format) = opts.display {
        write_summary(parser, &rows, format, out)?;
    }

    let AppendOutcome {
        header_written,
        rows_written,
    } = output::append_rows(&opts.output_path, parser.column_headers(), &rows)
        .map_err(PipelineError::Output)?;

    tracing::info!(
        parser = parser.name(),
        lines = parsed.lines,
        matched = parsed.matched,
        rows = rows_written,
        output = %opts.output_path.display(),
        "summary written"
    );

    Ok(RunReport {
        lines: parsed.lines,
        matched: parsed.matched,
        rows: rows_written,
        header_written,
    })
}

/// Errors that terminate a run.
#[derive(Debug)]
pub enum PipelineError {
    /// The log file could not be opened or read.
    Input {
        path: PathBuf,
        source: std::io::Error,
    },
    /// No line of the log matched any pattern.
    NoData { path: PathBuf },
    /// The summary could not be printed.
    Display { source: std::io::Error },
    /// The CSV table could not be written.
    Output(OutputError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Input { path, source } => {
                write!(f, "failed to read log file '{}': {source}", path.display())
            }
            PipelineError::NoData { path } => write!(
                f,
                "no matching log entries found in '{}'",
                path.display()
            ),
            PipelineError::Display { source } => write!(f, "failed to print summary: {source}"),
            PipelineError::Output(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Input { source, .. } | PipelineError::Display { source } => {
                Some(source)
            }
            PipelineError::NoData { .. } => None,
            PipelineError::Output(e) => Some(e),
        }
    }
}
