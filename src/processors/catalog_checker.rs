use crate::models::CatalogBundle;
use crate::utils::constants::MAX_HOUR;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub total_stations: usize,
    pub total_measurements: usize,
    pub violations: Vec<CatalogViolation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogViolation {
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationType {
    DuplicateStation,
    DanglingMunicipality,
    DanglingEnvironmentType,
    UnknownMeasurementStation,
    DuplicateReferenceKey,
    DuplicateReferenceName,
    MissingDefault,
    HourOutOfRange,
    CoordinatesOutOfRange,
    /// Measurement code that is not the code of any pollutant row
    UnlistedPollutantCode,
}

impl ViolationType {
    /// Whether the bundle must not be loaded with this violation present.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ViolationType::CoordinatesOutOfRange | ViolationType::UnlistedPollutantCode
        )
    }
}

impl IntegrityReport {
    fn push(&mut self, violation_type: ViolationType, details: String) {
        self.violations.push(CatalogViolation {
            violation_type,
            details,
        });
    }

    pub fn fatal_violations(&self) -> impl Iterator<Item = &CatalogViolation> {
        self.violations
            .iter()
            .filter(|v| v.violation_type.is_fatal())
    }

    pub fn is_consistent(&self) -> bool {
        self.fatal_violations().next().is_none()
    }

    pub fn count(&self, violation_type: ViolationType) -> usize {
        self.violations
            .iter()
            .filter(|v| v.violation_type == violation_type)
            .count()
    }
}

/// Verifies the referential guarantees of a merged catalog.
pub struct CatalogChecker {
    default_municipality: String,
    default_environment_type: String,
}

impl CatalogChecker {
    pub fn new(default_municipality: &str, default_environment_type: &str) -> Self {
        Self {
            default_municipality: default_municipality.to_string(),
            default_environment_type: default_environment_type.to_string(),
        }
    }

    pub fn check(&self, bundle: &CatalogBundle) -> IntegrityReport {
        let mut report = IntegrityReport {
            total_stations: bundle.stations.len(),
            total_measurements: bundle.measurements.len(),
            violations: Vec::new(),
        };

        let municipality_ids = self.check_references(
            "municipality",
            bundle
                .municipalities
                .iter()
                .map(|m| (m.municipality_id, m.name.as_str())),
            &self.default_municipality,
            &mut report,
        );
        let environment_type_ids = self.check_references(
            "environment type",
            bundle
                .environment_types
                .iter()
                .map(|t| (t.environment_type_id, t.name.as_str())),
            &self.default_environment_type,
            &mut report,
        );

        let mut station_ids = HashSet::with_capacity(bundle.stations.len());
        for station in &bundle.stations {
            if !station_ids.insert(station.station_id) {
                report.push(
                    ViolationType::DuplicateStation,
                    format!("Station {} appears more than once", station.station_id),
                );
            }
            if !municipality_ids.contains(&station.municipality_id) {
                report.push(
                    ViolationType::DanglingMunicipality,
                    format!(
                        "Station {} references unknown municipality {}",
                        station.station_id, station.municipality_id
                    ),
                );
            }
            if !environment_type_ids.contains(&station.environment_type_id) {
                report.push(
                    ViolationType::DanglingEnvironmentType,
                    format!(
                        "Station {} references unknown environment type {}",
                        station.station_id, station.environment_type_id
                    ),
                );
            }
            if station.validate().is_err() {
                report.push(
                    ViolationType::CoordinatesOutOfRange,
                    format!(
                        "Station {} has coordinates ({}, {}) outside the valid range",
                        station.station_id, station.latitude, station.longitude
                    ),
                );
            }
        }

        let pollutant_codes: HashSet<&str> =
            bundle.pollutants.iter().map(|p| p.code.as_str()).collect();

        // One violation per unknown station or code rather than per measurement
        let mut unknown_stations: HashMap<u32, usize> = HashMap::new();
        let mut unlisted_codes: HashMap<&str, usize> = HashMap::new();
        for measurement in &bundle.measurements {
            if !pollutant_codes.contains(measurement.pollutant_code.as_str()) {
                *unlisted_codes
                    .entry(measurement.pollutant_code.as_str())
                    .or_default() += 1;
            }
            if !station_ids.contains(&measurement.station_id) {
                *unknown_stations.entry(measurement.station_id).or_default() += 1;
            }
            if measurement.hour > MAX_HOUR {
                report.push(
                    ViolationType::HourOutOfRange,
                    format!(
                        "Measurement for station {} on {} has hour {}",
                        measurement.station_id, measurement.date, measurement.hour
                    ),
                );
            }
        }
        let mut unknown_stations: Vec<(u32, usize)> = unknown_stations.into_iter().collect();
        unknown_stations.sort_unstable();
        for (station_id, count) in unknown_stations {
            report.push(
                ViolationType::UnknownMeasurementStation,
                format!(
                    "{} measurements reference station {} which is not in the catalog",
                    count, station_id
                ),
            );
        }

        let mut unlisted_codes: Vec<(&str, usize)> = unlisted_codes.into_iter().collect();
        unlisted_codes.sort_unstable();
        for (code, count) in unlisted_codes {
            report.push(
                ViolationType::UnlistedPollutantCode,
                format!(
                    "{} measurements use pollutant code '{}' which has no pollutant row",
                    count, code
                ),
            );
        }

        report
    }

    /// Check one reference list, returning the set of its keys
    fn check_references<'a>(
        &self,
        kind: &str,
        entries: impl Iterator<Item = (u32, &'a str)>,
        default_name: &str,
        report: &mut IntegrityReport,
    ) -> HashSet<u32> {
        let mut keys = HashSet::new();
        let mut names = HashSet::new();

        for (key, name) in entries {
            if !keys.insert(key) {
                report.push(
                    ViolationType::DuplicateReferenceKey,
                    format!("Key {} is used by more than one {}", key, kind),
                );
            }
            if !names.insert(name) {
                report.push(
                    ViolationType::DuplicateReferenceName,
                    format!("{} '{}' has more than one key", kind, name),
                );
            }
        }

        if !names.contains(default_name) {
            report.push(
                ViolationType::MissingDefault,
                format!("Default {} '{}' is missing", kind, default_name),
            );
        }

        keys
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();

        summary.push_str("=== Catalog Integrity Report ===\n");
        summary.push_str(&format!("Stations: {}\n", report.total_stations));
        summary.push_str(&format!("Measurements: {}\n", report.total_measurements));
        summary.push_str(&format!(
            "Violations: {} ({} blocking)\n",
            report.violations.len(),
            report.fatal_violations().count()
        ));

        if !report.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, violation) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {:?}: {}\n",
                    i + 1,
                    violation.violation_type,
                    violation.details
                ));
            }
        }

        summary
    }
}
