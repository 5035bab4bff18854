use crate::config::EtlConfig;
use crate::error::Result;
use crate::models::{CatalogBundle, CatalogCounts, MeasurementRow, RegistryRow};
use crate::processors::{
    CatalogChecker, ExtractionReport, IntegrityReport, MeasurementExtractor, MergeReport,
    RegistryExtractor, StationMerger,
};
use crate::readers::{CsvRowReader, RowOutcome};
use crate::utils::progress::ProgressReporter;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Outcome of one extract, merge and check pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogRun {
    #[serde(skip)]
    pub bundle: CatalogBundle,
    pub counts: CatalogCounts,
    pub registry: ExtractionReport,
    pub measurements: ExtractionReport,
    pub merge: MergeReport,
    pub integrity: IntegrityReport,
}

impl CatalogRun {
    pub fn rows_skipped(&self) -> usize {
        self.registry.rows_skipped() + self.measurements.rows_skipped()
    }
}

pub struct CatalogProcessor {
    config: EtlConfig,
}

impl CatalogProcessor {
    pub fn new(config: EtlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    fn reader(&self) -> Result<CsvRowReader> {
        Ok(CsvRowReader::new()
            .with_delimiter(self.config.delimiter_byte()?)
            .with_mmap(self.config.use_mmap))
    }

    /// Read both sources concurrently, then reconcile them
    pub async fn process(&self, progress: Option<&ProgressReporter>) -> Result<CatalogRun> {
        if let Some(p) = progress {
            p.set_message("Reading source files...");
        }

        let registry_reader = self.reader()?;
        let registry_path = self.config.registry_path.clone();
        let registry_task = tokio::task::spawn_blocking(move || {
            registry_reader.read_rows::<RegistryRow>(&registry_path)
        });

        let measurement_reader = self.reader()?;
        let measurement_path = self.config.measurement_path.clone();
        let measurement_task = tokio::task::spawn_blocking(move || {
            measurement_reader.read_rows::<MeasurementRow>(&measurement_path)
        });

        let (registry_rows, measurement_rows) = tokio::try_join!(registry_task, measurement_task)?;

        Ok(self.reconcile(registry_rows?, measurement_rows?, progress))
    }

    /// Extract both views, merge them and check the result
    pub fn reconcile(
        &self,
        registry_rows: Vec<RowOutcome<RegistryRow>>,
        measurement_rows: Vec<RowOutcome<MeasurementRow>>,
        progress: Option<&ProgressReporter>,
    ) -> CatalogRun {
        if let Some(p) = progress {
            p.set_message("Extracting stations and measurements...");
        }

        let registry = RegistryExtractor::from_config(&self.config).extract(registry_rows);
        let measurements = MeasurementExtractor::new().extract(measurement_rows);
        let registry_report = registry.report.clone();
        let measurement_report = measurements.report.clone();

        if let Some(p) = progress {
            p.set_message("Merging station views...");
        }

        let merger = StationMerger::from_config(&self.config);
        let (bundle, merge) = merger.merge(registry, measurements);

        if let Some(p) = progress {
            p.set_message("Checking catalog integrity...");
        }

        let checker = CatalogChecker::new(
            merger.default_municipality(),
            merger.default_environment_type(),
        );
        let integrity = checker.check(&bundle);
        info!(
            "Integrity check: {} violations ({} blocking)",
            integrity.violations.len(),
            integrity.fatal_violations().count()
        );

        if let Some(p) = progress {
            p.finish_with_message("Processing complete");
        }

        CatalogRun {
            counts: bundle.counts(),
            bundle,
            registry: registry_report,
            measurements: measurement_report,
            merge,
            integrity,
        }
    }
}
