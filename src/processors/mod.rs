pub mod catalog_checker;
pub mod catalog_processor;
pub mod extraction;
pub mod measurement_extractor;
pub mod registry_extractor;
pub mod station_merger;
pub mod surrogate_keys;

pub use catalog_checker::{CatalogChecker, CatalogViolation, IntegrityReport, ViolationType};
pub use catalog_processor::{CatalogProcessor, CatalogRun};
pub use extraction::{extract, ExtractionReport};
pub use measurement_extractor::{MeasurementData, MeasurementExtractor};
pub use registry_extractor::{RegistryData, RegistryExtractor};
pub use station_merger::{MergeReport, StationMerger};
pub use surrogate_keys::SurrogateKeys;
