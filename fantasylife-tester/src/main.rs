mod probe;
mod reports;
mod sweep;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use fantasylife_logic::{Catalog, GameData, ItemCounts, Options, PlayerId, build_catalog};
use regex::Regex;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use probe::{list_keys, probe_keys};
use reports::{RunReport, generate_console_report, generate_json_report, generate_markdown_report};
use sweep::run_sweep;
use util::{read_json, split_keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "fantasylife-tester", version)]
#[command(about = "QA harness for Fantasy Life randomizer access rules")]
struct Args {
    /// Options JSON file; omitted options take their defaults
    #[arg(long)]
    options: Option<PathBuf>,

    /// Game data JSON file (defaults to the bundled data)
    #[arg(long)]
    game_data: Option<PathBuf>,

    /// Seed for the starting-life pick and property sweeps
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Item counts JSON file to probe against (empty state when omitted)
    #[arg(long)]
    state: Option<PathBuf>,

    /// Rule keys to probe (comma-separated)
    #[arg(long, default_value = "goal")]
    keys: String,

    /// List every built rule key and exit
    #[arg(long)]
    list_keys: bool,

    /// Regex restricting --list-keys output
    #[arg(long)]
    filter: Option<String>,

    /// Run a monotonicity/determinism sweep with this many state pairs
    #[arg(long)]
    sweep: Option<usize>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Show the probe trace for each key
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let catalog = load_catalog(&args)?;

    if maybe_list_keys(&args, &catalog)? {
        return Ok(());
    }

    if args.report == ReportFormat::Console {
        announce_banner();
    }

    let state = load_state(&args)?;
    let keys = split_keys(&args.keys);
    let probes = probe_keys(&catalog, &state, &keys);
    let sweep = args
        .sweep
        .map(|iterations| run_sweep(&catalog, args.seed, iterations));
    let report = RunReport::new(&catalog, args.seed, probes, sweep);

    write_report(&args, &report)?;

    if report.failed() {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🌟 Fantasy Life Logic Tester".bright_cyan().bold());
    println!("{}", "============================".cyan());
}

fn load_catalog(args: &Args) -> Result<Catalog> {
    let options: Options = match &args.options {
        Some(path) => read_json(path)?,
        None => Options::default(),
    };
    let data = match &args.game_data {
        Some(path) => {
            let data: GameData = read_json(path)?;
            data.validate()
                .with_context(|| format!("validating {}", path.display()))?;
            data
        }
        None => GameData::bundled().context("loading bundled game data")?,
    };
    let snapshot = options
        .into_snapshot(args.seed)
        .context("validating options")?;
    build_catalog(&snapshot, &data).context("building rule catalog")
}

fn load_state(args: &Args) -> Result<ItemCounts> {
    match &args.state {
        Some(path) => read_json(path),
        None => Ok(ItemCounts::new(PlayerId(1))),
    }
}

fn maybe_list_keys(args: &Args, catalog: &Catalog) -> Result<bool> {
    if !args.list_keys {
        return Ok(false);
    }
    let filter = args
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("compiling --filter")?;
    let mut output_target = OutputTarget::open(args.output.as_deref())?;
    for key in list_keys(catalog, filter.as_ref()) {
        writeln!(output_target, "{key}")?;
    }
    output_target.finish()?;
    Ok(true)
}

fn write_report(args: &Args, report: &RunReport) -> Result<()> {
    let mut output_target = OutputTarget::open(args.output.as_deref())?;
    match args.report {
        ReportFormat::Json => generate_json_report(&mut output_target, report)?,
        ReportFormat::Markdown => generate_markdown_report(&mut output_target, report)?,
        ReportFormat::Console => generate_console_report(&mut output_target, report, args.verbose)?,
    }
    output_target.finish()
}

/// Buffered report sink: the `--output` file, or stdout when none is given.
struct OutputTarget {
    destination: String,
    sink: BufWriter<Box<dyn Write>>,
}

impl OutputTarget {
    fn open(path: Option<&Path>) -> Result<Self> {
        let (destination, sink): (String, Box<dyn Write>) = match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                (path.display().to_string(), Box::new(file))
            }
            None => ("stdout".to_string(), Box::new(stdout())),
        };
        Ok(Self {
            destination,
            sink: BufWriter::new(sink),
        })
    }

    fn finish(mut self) -> Result<()> {
        self.sink
            .flush()
            .with_context(|| format!("flushing report to {}", self.destination))
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.sink.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.sink.flush()
    }
}
