//! SegForge: weekly customer analytics batch
//!
//! Loads the sales history, runs RFM scoring, market basket mining and the
//! weekly summary, then replaces the result tables in the output directory.

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use segforge::{
    load_purchases, load_transactions, report, run_pipeline, AnalyticsError, Args,
    CsvDirectorySink, ResultTables,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    info!("===== weekly pipeline started =====");
    if let Err(err) = run(&args) {
        let transient = err
            .downcast_ref::<AnalyticsError>()
            .is_some_and(AnalyticsError::is_transient);
        error!(error = ?err, transient, "pipeline execution failed");
        return Err(err);
    }
    info!("===== weekly pipeline completed successfully =====");

    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {path}"))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let config = args.to_config()?;

    info!(path = %args.transactions, "loading sales data");
    let transactions = load_transactions(&args.transactions)
        .with_context(|| format!("loading transactions from {}", args.transactions))?;
    info!(records = transactions.len(), "loaded sales records");

    info!(path = %args.purchases, "loading purchase data");
    let purchases = load_purchases(&args.purchases)
        .with_context(|| format!("loading purchases from {}", args.purchases))?;
    info!(records = purchases.len(), "loaded purchase records");

    let analytics = run_pipeline(&transactions, &purchases, &config)?;

    // every table is built before any is written
    let tables = ResultTables::from_report(&analytics)?;
    let mut sink = CsvDirectorySink::new(&args.output_dir);
    tables
        .write_to(&mut sink)
        .with_context(|| format!("writing result tables to {}", args.output_dir))?;

    report::print_run_summary(&analytics, if args.verbose { 20 } else { 5 });

    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    println!("Tables written to: {}", sink.dir().display());

    Ok(())
}
