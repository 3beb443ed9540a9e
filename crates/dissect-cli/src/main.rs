use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dissect_core::schema::Layout;
use dissect_core::{
    AnalysisError, ByteSource, ExtractError, ExtractParts, FileSource, ReaderSource, SelectError,
    Selection,
};

mod render;

use render::{LayoutTable, ReportTree};

const STDIO_PATH: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "dissect")]
#[command(version)]
#[command(
    about = "Inspect, validate and extract concatenated binary packet streams.",
    long_about = None,
    after_help = "Examples:\n  dissect analyze capture.bin\n  dissect analyze capture.bin --id 0 --id 3 --json --pretty\n  cat capture.bin | dissect extract --payload -o payload.bin\n  dissect layout header.json"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse the packet(s) into a human readable tree.
    #[command(alias = "analyse")]
    Analyze {
        /// Input file, or '-' for standard input
        #[arg(default_value = STDIO_PATH)]
        input: PathBuf,

        /// Packet index to operate on (repeat for many packets, in order)
        #[arg(long = "id", value_name = "INDEX")]
        ids: Vec<usize>,

        /// Write the JSON report instead of the tree
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(long, requires = "json")]
        pretty: bool,

        /// Exit with a non-zero code if any packet fails validation
        #[arg(long)]
        strict: bool,
    },
    /// Extract the header(s) and/or payload(s) of the packet(s).
    Extract {
        /// Input file, or '-' for standard input
        #[arg(default_value = STDIO_PATH)]
        input: PathBuf,

        /// Packet index to operate on (repeat for many packets, in order)
        #[arg(long = "id", value_name = "INDEX")]
        ids: Vec<usize>,

        /// Extract the header(s)
        #[arg(long)]
        header: bool,

        /// Extract the payload(s)
        #[arg(long)]
        payload: bool,

        /// Output file, or '-' for standard output
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Print a header field layout and its fingerprint.
    Layout {
        /// JSON schema file (defaults to the built-in packet header)
        schema: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Analyze {
            input,
            ids,
            json,
            pretty,
            strict,
        } => cmd_analyze(&input, ids, json, pretty, strict),
        Commands::Extract {
            input,
            ids,
            header,
            payload,
            output,
            quiet,
        } => cmd_extract(
            &input,
            ids,
            ExtractParts { header, payload },
            &output,
            quiet,
        ),
        Commands::Layout { schema } => cmd_layout(schema.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

impl From<AnalysisError> for CliError {
    fn from(err: AnalysisError) -> Self {
        let hint = match &err {
            AnalysisError::Source(_) => "check that the input is readable".to_string(),
            AnalysisError::Framing(_) => framing_hint(),
            AnalysisError::Select(SelectError::IndexOutOfRange { len, .. }) => index_hint(*len),
        };
        CliError::new(err.to_string(), Some(hint))
    }
}

impl From<ExtractError> for CliError {
    fn from(err: ExtractError) -> Self {
        let hint = match &err {
            ExtractError::Framing(_) => Some(framing_hint()),
            ExtractError::Select(SelectError::IndexOutOfRange { len, .. }) => Some(index_hint(*len)),
            ExtractError::Io(_) => None,
        };
        CliError::new(err.to_string(), hint)
    }
}

fn framing_hint() -> String {
    "the input is not a well-formed packet stream; nothing was written".to_string()
}

fn index_hint(len: usize) -> String {
    if len == 0 {
        "the input contains no packets".to_string()
    } else {
        format!("valid indices are 0 to {}", len - 1)
    }
}

fn cmd_analyze(
    input: &Path,
    ids: Vec<usize>,
    json: bool,
    pretty: bool,
    strict: bool,
) -> Result<(), CliError> {
    let input = read_input(input)?;
    let selection = Selection::from_indices(ids);
    let report = dissect_core::analyze_bytes(&input.label, &input.bytes, &selection)?;

    let rendered = if json {
        let serialized = if pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };
        let mut json = serialized.context("JSON serialization failed")?;
        json.push('\n');
        json
    } else {
        ReportTree::new(&report).to_string()
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .and_then(|()| stdout.flush())
        .context("Failed to write report to stdout")?;

    if strict && report.has_mismatches() {
        return Err(CliError::new(
            "packet validation failed",
            Some("inspect the packets flagged invalid in the report".to_string()),
        ));
    }
    Ok(())
}

fn cmd_extract(
    input: &Path,
    ids: Vec<usize>,
    parts: ExtractParts,
    output: &Path,
    quiet: bool,
) -> Result<(), CliError> {
    let input = read_input(input)?;
    if let Some(path) = input.path.as_deref() {
        if !is_stdio(output) {
            ensure_distinct_output(path, output)?;
        }
    }
    if parts.is_empty() {
        warn!("neither --header nor --payload given; no bytes will be extracted");
    }

    let selection = Selection::from_indices(ids);
    match &selection {
        Selection::All => info!("extracting all packets"),
        Selection::Indices(indices) => info!(?indices, "extracting selected packets"),
    }

    // Framing and selection finish before the destination is opened.
    let mut extracted = Vec::new();
    let written = dissect_core::extract_bytes(&input.bytes, &selection, parts, &mut extracted)?;

    if is_stdio(output) {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(&extracted)
            .and_then(|()| stdout.flush())
            .context("Failed to write extracted bytes to stdout")?;
    } else {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
        }
        fs::write(output, &extracted)
            .with_context(|| format!("Failed to write output: {}", output.display()))?;
    }

    if !quiet {
        eprintln!("OK: {} bytes written -> {}", written, output.display());
    }
    Ok(())
}

fn cmd_layout(schema: Option<&Path>) -> Result<(), CliError> {
    let layout = match schema {
        None => Layout::header(),
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read schema: {}", path.display()))?;
            Layout::from_json(&json).map_err(|err| {
                CliError::new(
                    format!("invalid schema {}: {}", path.display(), err),
                    Some("expected a JSON array of {name, type, get?, set?} fields".to_string()),
                )
            })?
        }
    };

    print!("{}", LayoutTable::new(&layout));
    Ok(())
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_PATH
}

struct Input {
    /// Name shown in reports.
    label: String,
    /// Resolved file path; `None` for standard input.
    path: Option<PathBuf>,
    bytes: Vec<u8>,
}

fn read_input(input: &Path) -> Result<Input, CliError> {
    if is_stdio(input) {
        let bytes = ReaderSource::new(io::stdin().lock())
            .read_all()
            .context("Failed to read standard input")?;
        return Ok(Input {
            label: STDIO_PATH.to_string(),
            path: None,
            bytes,
        });
    }

    validate_input_file(input)?;
    let bytes = FileSource::open(input)
        .and_then(|mut source| source.read_all())
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    Ok(Input {
        label: input.display().to_string(),
        path: Some(input.to_path_buf()),
        bytes,
    })
}

fn ensure_distinct_output(input: &Path, output: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let output_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::canonicalize(parent).ok(),
        _ => fs::canonicalize(".").ok(),
    };
    let Some(output_dir) = output_dir else {
        return Ok(());
    };
    let file_name = output
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid output path: {}", output.display()))?;
    if output_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a packet capture file, or '-' to read standard input".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a packet capture file, or '-' to read standard input".to_string()),
        ));
    }
    Ok(())
}
