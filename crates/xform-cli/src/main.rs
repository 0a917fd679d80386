//! Xform CLI
//!
//! Evaluates transform expressions over series loaded from a JSON file and
//! renders schema discovery records as a bulk index request.
//!
//! ## Usage
//!
//! ```bash
//! # Evaluate an expression over the last hour of data in series.json
//! xform eval 'EXCLUDE(host1:*, "cpu\..*")' --series series.json --last 3600
//!
//! # Evaluate over an explicit window (epoch milliseconds)
//! xform eval 'SUM(*:cpu.load{dc=sfo})' -s series.json --start 0 --end 1700000000000
//!
//! # Print bulk index NDJSON for the series' schema records
//! xform index --series series.json --hash xxhash64
//!
//! # Write a default xform.yml
//! xform --generate-config
//! ```

mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use config::{XformConfig, DEFAULT_CONFIG_PATH};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use xform_core::{now_millis, Metric, TimeRange, Timestamp};
use xform_query::{Evaluator, InMemoryBackend};
use xform_schema::{HashAlgorithm, MetricSchemaRecord, SchemaRecordBatch};
use xform_transform::TransformCatalog;

#[derive(Parser)]
#[command(name = "xform")]
#[command(author, version, about = "Evaluate metric transform expressions")]
struct Cli {
    /// Path to xform.yml config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Write a default config file and exit
    #[arg(long)]
    generate_config: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against series from a JSON file
    Eval {
        /// Expression text, e.g. 'EXCLUDE(host1:*, "cpu\..*")'
        expr: String,

        /// JSON file holding an array of series
        #[arg(short, long)]
        series: PathBuf,

        /// Window start in epoch milliseconds (inclusive)
        #[arg(long, requires = "end", conflicts_with = "last")]
        start: Option<Timestamp>,

        /// Window end in epoch milliseconds (exclusive)
        #[arg(long, requires = "start")]
        end: Option<Timestamp>,

        /// Window covering the last N seconds
        #[arg(long)]
        last: Option<u64>,

        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },

    /// Print bulk index NDJSON for the schema records of a JSON series file
    Index {
        /// JSON file holding an array of series
        #[arg(short, long)]
        series: PathBuf,

        /// Hash algorithm for document ids (overrides config)
        #[arg(long)]
        hash: Option<HashAlgorithm>,

        /// Timestamp to stamp documents with (defaults to now)
        #[arg(long)]
        now: Option<Timestamp>,
    },
}

fn load_config(path: &Path) -> XformConfig {
    if !path.exists() {
        return XformConfig::default();
    }
    match XformConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Failed to load {}: {}", path.display(), e);
            eprintln!("Using default configuration");
            XformConfig::default()
        }
    }
}

fn init_logging(config: &XformConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level())),
        )
        .with_target(config.logging.show_target)
        .with_thread_ids(config.logging.show_thread_ids)
        .with_file(config.logging.show_location)
        .with_line_number(config.logging.show_location)
        .with_writer(std::io::stderr)
        .init();
}

fn load_series(path: &Path) -> Result<Vec<Metric>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let series: Vec<Metric> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse series from {}", path.display()))?;
    debug!(path = %path.display(), series = series.len(), "Loaded series");
    Ok(series)
}

fn time_range(start: Option<Timestamp>, end: Option<Timestamp>, last: Option<u64>) -> Result<TimeRange> {
    match (start, end, last) {
        (Some(start), Some(end), None) => Ok(TimeRange::new(start, end)),
        (None, None, Some(secs)) => {
            let millis = i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX);
            Ok(TimeRange::last_millis(millis))
        }
        (None, None, None) => Ok(TimeRange::default()),
        _ => bail!("use either --start/--end or --last"),
    }
}

async fn run_eval(
    config: &XformConfig,
    expr: &str,
    series: &Path,
    range: TimeRange,
    pretty: bool,
) -> Result<()> {
    let backend = InMemoryBackend::from_metrics(load_series(series)?);
    let evaluator = Evaluator::with_config(
        Arc::new(TransformCatalog::standard()),
        Arc::new(backend),
        config.to_evaluator_config(),
    );

    let expr = evaluator.parse(expr)?;
    info!(expr = %expr, start = range.start, end = range.end, "Evaluating");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling evaluation");
            on_interrupt.cancel();
        }
    });

    let output = evaluator
        .evaluate_with_cancellation(&expr, range, cancel)
        .await?;

    let rendered: Vec<&Metric> = output.iter().map(|m| m.as_ref()).collect();
    let json = if pretty {
        serde_json::to_string_pretty(&rendered)?
    } else {
        serde_json::to_string(&rendered)?
    };
    println!("{}", json);
    Ok(())
}

fn run_index(
    config: &XformConfig,
    series: &Path,
    hash: Option<HashAlgorithm>,
    now: Option<Timestamp>,
) -> Result<()> {
    let algorithm = hash.unwrap_or(config.schema.hash_algorithm);
    let mut batch = SchemaRecordBatch::new(algorithm)
        .with_default_retention(config.schema.default_retention_days);

    for metric in load_series(series)? {
        batch.extend(MetricSchemaRecord::from_metric(&metric));
    }
    info!(records = batch.len(), algorithm = %algorithm, "Indexing schema records");

    print!("{}", batch.to_bulk_index(now.unwrap_or_else(now_millis))?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.generate_config {
        XformConfig::write_default(&cli.config)?;
        println!("Generated default configuration: {}", cli.config.display());
        return Ok(());
    }

    let config = load_config(&cli.config);
    init_logging(&config);

    match cli.command {
        Some(Commands::Eval {
            expr,
            series,
            start,
            end,
            last,
            pretty,
        }) => {
            let range = time_range(start, end, last)?;
            run_eval(&config, &expr, &series, range, pretty).await
        }
        Some(Commands::Index { series, hash, now }) => run_index(&config, &series, hash, now),
        None => bail!("no command given; see --help"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_eval_args() {
        let cli = Cli::try_parse_from([
            "xform",
            "eval",
            "SUM(h:cpu)",
            "--series",
            "s.json",
            "--start",
            "0",
            "--end",
            "1000",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Eval { expr, start, end, .. }) => {
                assert_eq!(expr, "SUM(h:cpu)");
                assert_eq!((start, end), (Some(0), Some(1000)));
            }
            _ => panic!("expected eval"),
        }
    }

    #[test]
    fn test_parse_index_hash() {
        let cli = Cli::try_parse_from(["xform", "index", "-s", "s.json", "--hash", "XXHASH64"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Index { hash: Some(HashAlgorithm::XxHash64), .. })
        ));
    }

    #[test]
    fn test_time_range_options() {
        assert_eq!(time_range(Some(1), Some(2), None).unwrap(), TimeRange::new(1, 2));
        assert_eq!(time_range(None, None, None).unwrap(), TimeRange::default());
        assert!(time_range(Some(1), None, Some(5)).is_err());
    }

    #[test]
    fn test_load_series_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.json");
        std::fs::write(
            &path,
            r#"[{"scope": "host1", "metric": "cpu.load", "datapoints": {"1000": 0.5}}]"#,
        )
        .unwrap();

        let series = load_series(&path).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].metric(), "cpu.load");

        assert!(load_series(&dir.path().join("missing.json")).is_err());
    }
}
