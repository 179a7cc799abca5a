use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{debug, LevelFilter};
use serde::Serialize;

use unblackedges::config::CleanConfig;
use unblackedges::pbm::PbmFormat;
use unblackedges::pipeline::{clean, Report};

/// Clear black regions touching the border of a PBM bitmap.
///
/// Reads a P1 or P4 image from INPUT (or standard input) and writes the
/// cleaned image to standard output.
#[derive(Parser)]
#[command(name = "unblackedges", version)]
struct Args {
    /// Input PBM file; standard input when omitted
    input: Option<PathBuf>,

    /// Write raw (P4) output instead of plain (P1)
    #[arg(long)]
    raw: bool,

    /// Reject images with more pixels than this
    #[arg(long)]
    max_pixels: Option<u64>,

    /// TOML config file; flags given on the command line take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print run statistics as JSON on stderr
    #[arg(long)]
    stats: bool,

    /// Suppress the summary line on stderr
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct OutputStats {
    file: String,
    width: usize,
    height: usize,
    input_format: &'static str,
    output_format: &'static str,
    black_before: usize,
    black_after: usize,
    seeded: usize,
    pushed: usize,
    cleared: usize,
    peak_worklist: usize,
}

impl OutputStats {
    fn new(file: String, report: &Report, output_format: PbmFormat) -> Self {
        Self {
            file,
            width: report.width,
            height: report.height,
            input_format: report.input_format.magic(),
            output_format: output_format.magic(),
            black_before: report.black_before,
            black_after: report.black_after,
            seeded: report.fill.seeded,
            pushed: report.fill.pushed,
            cleared: report.fill.cleared,
            peak_worklist: report.fill.peak_worklist,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(path: &Path) -> Result<CleanConfig> {
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config = CleanConfig::from_toml_str(&toml_str)
        .with_context(|| format!("parsing {}", path.display()))?;
    debug!("loaded config from {}: {config:?}", path.display());
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => CleanConfig::default(),
    };
    if args.raw {
        config.output_format = PbmFormat::Raw;
    }
    if args.max_pixels.is_some() {
        config.max_pixels = args.max_pixels;
    }

    let source = args
        .input
        .as_ref()
        .map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string());
    let stdout = io::stdout().lock();

    let report = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            clean(BufReader::new(file), stdout, &config)
        }
        None => clean(io::stdin().lock(), stdout, &config),
    }
    .with_context(|| format!("failed to clean {source}"))?;

    if !args.quiet {
        eprintln!(
            "cleaned {} ({}x{}): {} black pixels removed, {} kept",
            source, report.width, report.height, report.fill.cleared, report.black_after
        );
    }

    if args.stats {
        let stats = OutputStats::new(source, &report, config.output_format);
        eprintln!("{}", serde_json::to_string(&stats)?);
    }

    Ok(())
}
