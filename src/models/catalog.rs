use serde::{Deserialize, Serialize};

use crate::models::{EnvironmentType, Measurement, Municipality, Pollutant, Station};

/// Everything a run hands to the load step, in output order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogBundle {
    pub stations: Vec<Station>,
    pub pollutants: Vec<Pollutant>,
    pub measurements: Vec<Measurement>,
    pub municipalities: Vec<Municipality>,
    pub environment_types: Vec<EnvironmentType>,
}

/// Row counts of a bundle, used for logging and run reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCounts {
    pub stations: usize,
    pub pollutants: usize,
    pub measurements: usize,
    pub municipalities: usize,
    pub environment_types: usize,
}

impl CatalogBundle {
    pub fn counts(&self) -> CatalogCounts {
        CatalogCounts {
            stations: self.stations.len(),
            pollutants: self.pollutants.len(),
            measurements: self.measurements.len(),
            municipalities: self.municipalities.len(),
            environment_types: self.environment_types.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty() && self.measurements.is_empty()
    }
}

impl CatalogCounts {
    pub fn summary(&self) -> String {
        format!(
            "{} stations, {} pollutants, {} measurements, {} municipalities, {} environment types",
            self.stations,
            self.pollutants,
            self.measurements,
            self.municipalities,
            self.environment_types
        )
    }
}
