pub mod catalog;
pub mod measurement;
pub mod pollutant;
pub mod reference;
pub mod rows;
pub mod station;

pub use catalog::{CatalogBundle, CatalogCounts};
pub use measurement::Measurement;
pub use pollutant::{Pollutant, PollutantType};
pub use reference::{EnvironmentType, Municipality};
pub use rows::{MeasurementRow, RegistryRow};
pub use station::{MeasurementStation, Station};
