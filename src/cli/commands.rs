use crate::cli::args::{Cli, Commands};
use crate::config::EtlConfig;
use crate::error::{ProcessingError, Result};
use crate::processors::{CatalogChecker, CatalogProcessor, CatalogRun};
use crate::utils::progress::ProgressReporter;
use crate::writers::{CatalogSink, LoadSummary, ParquetCatalogWriter};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What `--report` writes.
#[derive(Serialize)]
struct RunReport<'a> {
    #[serde(flatten)]
    run: &'a CatalogRun,
    load: Option<&'a LoadSummary>,
}

/// Set up structured logging on stderr
pub fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let log_level = cli.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rsqa_processor={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

pub async fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;

    match cli.command {
        Commands::Process {
            registry,
            measurements,
            output_dir,
            compression,
            config,
            validate_only,
            report,
            max_workers,
        } => {
            let config = EtlConfig::load(config.as_deref())?
                .with_registry_path(registry)
                .with_measurement_path(measurements)
                .with_output_dir(output_dir)
                .with_compression(compression);
            config.validate()?;

            process(config, validate_only, report, max_workers, quiet).await
        }

        Commands::Info { output_dir } => info_tables(&output_dir),
    }
}

async fn process(
    config: EtlConfig,
    validate_only: bool,
    report: Option<PathBuf>,
    max_workers: usize,
    quiet: bool,
) -> Result<()> {
    config.log_config();

    let progress = ProgressReporter::new_spinner("Processing sources...", quiet);
    let processor = CatalogProcessor::new(config);
    let run = processor.process(Some(&progress)).await?;
    if run.bundle.is_empty() {
        warn!("No stations or measurements were extracted");
    }

    let checker = CatalogChecker::new(
        &processor.config().default_municipality,
        &processor.config().default_environment_type,
    );
    progress.println(&checker.generate_summary(&run.integrity));

    if !run.integrity.is_consistent() {
        if let Some(path) = &report {
            write_report(path, &run, None)?;
        }
        return Err(ProcessingError::Integrity(format!(
            "{} blocking violations, no tables written",
            run.integrity.fatal_violations().count()
        )));
    }

    if validate_only {
        info!("Validation complete - no tables written");
        if let Some(path) = &report {
            write_report(path, &run, None)?;
        }
        return Ok(());
    }

    let writer =
        ParquetCatalogWriter::from_config(processor.config())?.with_max_workers(max_workers);
    progress.set_message("Writing Parquet tables...");
    let summary = writer.load(&run.bundle)?;

    if let Some(path) = &report {
        write_report(path, &run, Some(&summary))?;
    }

    info!("Processing complete: {}", run.counts.summary());
    if run.rows_skipped() > 0 {
        info!("{} source rows were skipped", run.rows_skipped());
    }
    progress.println(&format!(
        "Wrote {} tables to {}",
        summary.tables.len(),
        writer.output_dir().display()
    ));

    Ok(())
}

fn write_report(path: &Path, run: &CatalogRun, load: Option<&LoadSummary>) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, &RunReport { run, load })
        .map_err(|e| ProcessingError::InvalidFormat(format!("Cannot write report: {}", e)))?;
    info!("Run report written to {}", path.display());
    Ok(())
}

fn info_tables(output_dir: &Path) -> Result<()> {
    println!("Catalog tables in {}", output_dir.display());

    let writer = ParquetCatalogWriter::new(output_dir);
    let tables = writer.table_infos()?;

    if tables.iter().all(|(_, info)| info.is_none()) {
        return Err(ProcessingError::MissingData(format!(
            "No catalog tables found in {}",
            output_dir.display()
        )));
    }

    for (table, info) in tables {
        match info {
            Some(info) => println!("  {:<18} {}", table, info.summary()),
            None => println!("  {:<18} missing", table),
        }
    }

    Ok(())
}
