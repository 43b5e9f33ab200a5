use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use cachesweep::config::SweepConfig;
use cachesweep::result::write_records;
use cachesweep::sweep::{Sweep, SweepReport};
use cachesweep::trace::load_trace;
use cachesweep::util::{discover_traces, TracePaths};

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Sweeps single level cache configurations over a memory access trace"))]
struct Args {
    /// Trace file to replay
    #[arg(long, default_value = "test.trace")]
    trace: PathBuf,

    /// Where the result records are written
    #[arg(long, default_value = "test.result")]
    result: PathBuf,

    /// Replay every *.trace file in a directory instead, writing <name>.result beside each
    #[arg(long)]
    trace_dir: Option<PathBuf>,

    /// JSON sweep configuration, replacing the default 128 configurations
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of threads to run configurations on
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Write the results as JSON rather than record lines
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn main() -> Result<()> {
    let start = Instant::now();
    let args = Args::parse();
    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let sweep_config = match &args.config {
        Some(path) => load_sweep_config(path)?,
        None => SweepConfig::default(),
    };
    let sweep = Sweep::new(sweep_config);

    let runs = match &args.trace_dir {
        Some(dir) => discover_traces(dir).map_err(anyhow::Error::msg)?,
        None => vec![TracePaths {
            trace: args.trace.clone(),
            result: args.result.clone(),
        }],
    };
    if runs.is_empty() {
        bail!("No trace files were found in {}", args.trace_dir.as_deref().unwrap_or(Path::new(".")).display());
    }
    for paths in &runs {
        run_trace(&sweep, paths, &args)?;
    }

    if args.performance {
        let total_time = start.elapsed();
        println!("Total execution time (includes parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9);
    }
    Ok(())
}

fn load_sweep_config(path: &Path) -> Result<SweepConfig> {
    let config_file = File::open(path).with_context(|| format!("Couldn't open the config file at path {}", path.display()))?;
    let config: SweepConfig = serde_json::from_reader(BufReader::new(config_file)).context("Couldn't parse the config file")?;
    info!("Sweeping {} configurations from {}", config.len(), path.display());
    Ok(config)
}

fn run_trace(sweep: &Sweep, paths: &TracePaths, args: &Args) -> Result<()> {
    info!("Running simulation with trace file {}...", paths.trace.display());
    let trace = load_trace(&paths.trace).map_err(anyhow::Error::msg)?;
    info!("Loaded {} operations ({} lines skipped)", trace.len(), trace.skipped_lines);

    let report = sweep.run_parallel(&trace.operations, args.jobs);
    write_report(&report, &paths.result, args.json)?;
    info!("Simulation complete. Results saved to {}", paths.result.display());

    if args.performance {
        println!("Simulation time for {}: {}s", paths.trace.display(), report.simulation_time.as_nanos() as f64 / 1e9);
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        let formatted = report.records
            .iter()
            .zip(report.uninitialised_lines.iter())
            .map(|(record, count)| format!("{} {} {} {}: {count}", record.cache_size, record.block_size, record.placement.code(), record.write_policy.code()))
            .reduce(|a, b| format!("{a}, {b}"))
            .unwrap_or_default();
        println!("Uninitialised cache lines by configuration: ({formatted})");
        println!("Total uninitialised cache lines: {}", report.uninitialised_lines.iter().sum::<usize>());
    }
    Ok(())
}

fn write_report(report: &SweepReport, path: &Path, json: bool) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Couldn't create the result file at path {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    if json {
        serde_json::to_writer_pretty(&mut writer, report).context("Couldn't serialise the results")?;
        writeln!(writer)?;
        writer.flush()?;
    } else {
        write_records(&report.records, writer).context("Couldn't write the results")?;
    }
    Ok(())
}
