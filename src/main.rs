use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufWriter, Write};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taxiq::aggregate::{self, AggregatorConfig, DateWindow};
use taxiq::reader;
use taxiq::record::DecodeMode;
use taxiq::report::{self, Query, ReportConfig, ReportFormat};
use taxiq::source;

#[derive(Parser)]
#[command(
    name = "taxiq",
    about = "Aggregate reports over newline-delimited taxi trip records",
    version
)]
struct Cli {
    /// Report to print
    #[arg(value_enum)]
    query: Query,

    /// Input file (`-` for stdin); .gz and .zst files are decompressed
    file: String,

    /// Reject records with missing, null or malformed fields
    #[arg(long)]
    strict: bool,

    /// Read block size in bytes, at most 16 MiB (default: 64 KiB, or TAXIQ_CHUNK_SIZE KiB)
    #[arg(
        long,
        value_name = "BYTES",
        value_parser = clap::value_parser!(u64).range(1..=reader::MAX_CHUNK_SIZE as u64)
    )]
    chunk_size: Option<u64>,

    /// First pickup date included in query3/query4
    #[arg(long, value_name = "DATE", default_value = "2024-01-01")]
    from: String,

    /// First pickup date excluded from query3/query4
    #[arg(long, value_name = "DATE", default_value = "2024-02-01")]
    until: String,

    /// Fractional digits for averages and totals (text output)
    #[arg(long, default_value_t = 15)]
    precision: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Print only the report, without line counters and timing
    #[arg(long)]
    no_stats: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let window = DateWindow::new(&cli.from, &cli.until)?;
    let config = AggregatorConfig {
        mode: if cli.strict {
            DecodeMode::Strict
        } else {
            DecodeMode::Lenient
        },
        window,
    };
    let chunk_size = match cli.chunk_size {
        Some(n) => usize::try_from(n).context("chunk size does not fit in memory")?,
        None => reader::default_chunk_size(),
    };

    let input = source::open(&cli.file)?;
    info!(file = %cli.file, query = %cli.query, chunk_size, "starting run");

    let start = Instant::now();
    let aggregates = aggregate::run_reader(input, chunk_size, config)
        .with_context(|| format!("failed to process file: {}", cli.file))?;
    let elapsed = start.elapsed();

    let report_config = ReportConfig {
        format: cli.format,
        precision: cli.precision,
        show_stats: !cli.no_stats,
    };
    let stdout = io::stdout().lock();
    let mut out = BufWriter::with_capacity(128 * 1024, stdout);
    report::write_report(
        &mut out,
        cli.query,
        &aggregates,
        Some(elapsed),
        &report_config,
    )?;
    out.flush()?;

    Ok(())
}
