//! Reconciliation of the registry and measurement station views.
//!
//! The registry is authoritative for identity, address, lifecycle dates and
//! the municipality/environment-type assignment of every station it knows.
//! The measurement source only contributes coordinates for those stations,
//! and fully describes stations the registry has never seen.

use crate::config::EtlConfig;
use crate::models::{CatalogBundle, EnvironmentType, Municipality, Station};
use crate::processors::{MeasurementData, RegistryData, SurrogateKeys};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Decisions taken while merging, for logging and run reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub registry_stations: usize,
    pub measurement_stations: usize,
    /// Registry stations whose coordinates came from the measurement view
    pub coordinates_updated: usize,
    /// Stations only the measurement source knows
    pub stations_added: usize,
    /// References that had to fall back to a default entity
    pub fallback_resolutions: usize,
    /// Default names that had to be added to the reference lists
    pub defaults_added: Vec<String>,
}

pub struct StationMerger {
    default_municipality: String,
    default_environment_type: String,
}

impl StationMerger {
    pub fn new(default_municipality: &str, default_environment_type: &str) -> Self {
        Self {
            default_municipality: default_municipality.to_string(),
            default_environment_type: default_environment_type.to_string(),
        }
    }

    pub fn from_config(config: &EtlConfig) -> Self {
        Self::new(
            &config.default_municipality,
            &config.default_environment_type,
        )
    }

    pub fn default_municipality(&self) -> &str {
        &self.default_municipality
    }

    pub fn default_environment_type(&self) -> &str {
        &self.default_environment_type
    }

    /// Merge both views into the output bundle
    pub fn merge(
        &self,
        registry: RegistryData,
        measurements: MeasurementData,
    ) -> (CatalogBundle, MergeReport) {
        let RegistryData {
            stations: registry_stations,
            mut municipality_ids,
            mut environment_type_ids,
            station_municipalities,
            station_environment_types,
            ..
        } = registry;

        let mut report = MergeReport {
            registry_stations: registry_stations.len(),
            measurement_stations: measurements.stations.len(),
            ..MergeReport::default()
        };

        let default_municipality_id =
            ensure_default(&mut municipality_ids, &self.default_municipality, &mut report);
        let default_environment_type_id = ensure_default(
            &mut environment_type_ids,
            &self.default_environment_type,
            &mut report,
        );

        let mut stations: Vec<Station> = Vec::with_capacity(
            registry_stations.len() + measurements.stations.len(),
        );
        let mut positions: HashMap<u32, usize> = HashMap::with_capacity(stations.capacity());

        for station in registry_stations {
            if positions.contains_key(&station.station_id) {
                continue;
            }
            positions.insert(station.station_id, stations.len());
            stations.push(station);
        }

        for observed in &measurements.stations {
            if let Some(&position) = positions.get(&observed.station_id) {
                stations[position] = stations[position].with_coordinates_from(observed);
                report.coordinates_updated += 1;
                continue;
            }

            let municipality = station_municipalities
                .get(&observed.station_id)
                .map(String::as_str)
                .unwrap_or(self.default_municipality.as_str());
            let environment_type = station_environment_types
                .get(&observed.station_id)
                .map(String::as_str)
                .unwrap_or(self.default_environment_type.as_str());

            let municipality_id = resolve(
                &municipality_ids,
                municipality,
                default_municipality_id,
                observed.station_id,
                &mut report,
            );
            let environment_type_id = resolve(
                &environment_type_ids,
                environment_type,
                default_environment_type_id,
                observed.station_id,
                &mut report,
            );

            debug!(
                "Station {} only appears in measurements, adding it",
                observed.station_id
            );
            positions.insert(observed.station_id, stations.len());
            stations.push(Station::from_measurement(
                observed,
                municipality_id,
                environment_type_id,
            ));
            report.stations_added += 1;
        }

        let municipalities = municipality_ids
            .iter()
            .map(|(name, id)| Municipality::new(id, name.to_string()))
            .collect();
        let environment_types = environment_type_ids
            .iter()
            .map(|(name, id)| EnvironmentType::new(id, name.to_string()))
            .collect();

        let bundle = CatalogBundle {
            stations,
            pollutants: measurements.pollutants,
            measurements: measurements.measurements,
            municipalities,
            environment_types,
        };

        info!(
            "Data extraction complete: {}",
            bundle.counts().summary()
        );
        info!(
            "Merged {} registry and {} measurement stations: {} coordinate updates, {} added",
            report.registry_stations,
            report.measurement_stations,
            report.coordinates_updated,
            report.stations_added
        );

        (bundle, report)
    }
}

/// Make sure `name` has a key, returning it.
fn ensure_default(keys: &mut SurrogateKeys, name: &str, report: &mut MergeReport) -> u32 {
    if let Some(key) = keys.get(name) {
        return key;
    }

    let key = keys.assign(name);
    info!("Default reference '{}' not in registry, assigned key {}", name, key);
    report.defaults_added.push(name.to_string());
    key
}

fn resolve(
    keys: &SurrogateKeys,
    name: &str,
    default_key: u32,
    station_id: u32,
    report: &mut MergeReport,
) -> u32 {
    if let Some(key) = keys.get(name) {
        return key;
    }

    warn!(
        "No key for '{}' (station {}), falling back to default key {}",
        name, station_id, default_key
    );
    report.fallback_resolutions += 1;
    default_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Measurement, MeasurementStation, Pollutant, PollutantType};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn registry_with(stations: Vec<(u32, &str, &str)>) -> RegistryData {
        let mut data = RegistryData::default();
        for (station_id, municipality, environment_type) in stations {
            let municipality_id = data.municipality_ids.assign(municipality);
            let environment_type_id = data.environment_type_ids.assign(environment_type);
            data.station_municipalities
                .insert(station_id, municipality.to_string());
            data.station_environment_types
                .insert(station_id, environment_type.to_string());
            data.stations.push(Station::from_registry(
                station_id,
                format!("Registry address {}", station_id),
                10.0,
                20.0,
                NaiveDate::from_ymd_opt(1990, 4, 1),
                NaiveDate::from_ymd_opt(2020, 12, 31),
                municipality_id,
                environment_type_id,
            ));
        }
        data
    }

    fn observed(station_id: u32, latitude: f64, longitude: f64) -> MeasurementStation {
        MeasurementStation {
            station_id,
            address: format!("Measurement address {}", station_id),
            latitude,
            longitude,
            x_coord: 300_000.0,
            y_coord: 5_000_000.0,
        }
    }

    fn measurements_with(stations: Vec<MeasurementStation>) -> MeasurementData {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let measurements = stations
            .iter()
            .map(|s| Measurement::new(s.station_id, date, 0, "O3".to_string(), 30))
            .collect();
        MeasurementData {
            stations,
            pollutants: vec![Pollutant::from(PollutantType::O3)],
            measurements,
            ..MeasurementData::default()
        }
    }

    fn merger() -> StationMerger {
        StationMerger::new("Montréal", "Urbain")
    }

    #[test]
    fn test_registry_station_takes_measurement_coordinates() {
        let (bundle, report) = merger().merge(
            registry_with(vec![(1, "Laval", "Urbain")]),
            measurements_with(vec![observed(1, 11.0, 21.0)]),
        );

        assert_eq!(bundle.stations.len(), 1);
        let station = &bundle.stations[0];
        assert_eq!((station.latitude, station.longitude), (11.0, 21.0));
        assert_eq!((station.x_coord, station.y_coord), (300_000.0, 5_000_000.0));
        assert_eq!(station.open_date, NaiveDate::from_ymd_opt(1990, 4, 1));
        assert_eq!(station.close_date, NaiveDate::from_ymd_opt(2020, 12, 31));
        assert_eq!(station.address, "Registry address 1");
        assert_eq!(report.coordinates_updated, 1);
        assert_eq!(report.stations_added, 0);
    }

    #[test]
    fn test_measurement_only_station_gets_defaults() {
        let (bundle, report) = merger().merge(
            registry_with(vec![(1, "Laval", "Urbain")]),
            measurements_with(vec![observed(1, 11.0, 21.0), observed(2, 45.0, -73.0)]),
        );

        assert_eq!(bundle.stations.len(), 2);

        let montreal = bundle
            .municipalities
            .iter()
            .find(|m| m.name == "Montréal")
            .expect("default municipality present");
        let urbain = bundle
            .environment_types
            .iter()
            .find(|t| t.name == "Urbain")
            .expect("default environment type present");

        let added = &bundle.stations[1];
        assert_eq!(added.station_id, 2);
        assert_eq!(added.municipality_id, montreal.municipality_id);
        assert_eq!(added.environment_type_id, urbain.environment_type_id);
        assert_eq!(added.address, "Measurement address 2");
        assert_eq!(added.open_date, None);
        assert_eq!(report.stations_added, 1);
        assert_eq!(report.defaults_added, vec!["Montréal".to_string()]);
    }

    #[test]
    fn test_defaults_take_next_free_key() {
        let (bundle, _) = merger().merge(
            registry_with(vec![(1, "Laval", "Rural"), (2, "Longueuil", "Rural")]),
            MeasurementData::default(),
        );

        assert_eq!(
            bundle.municipalities,
            vec![
                Municipality::new(1, "Laval".to_string()),
                Municipality::new(2, "Longueuil".to_string()),
                Municipality::new(3, "Montréal".to_string()),
            ]
        );
        assert_eq!(
            bundle.environment_types,
            vec![
                EnvironmentType::new(1, "Rural".to_string()),
                EnvironmentType::new(2, "Urbain".to_string()),
            ]
        );
    }

    #[test]
    fn test_defaults_on_empty_registry_use_key_one() {
        let (bundle, report) = merger().merge(
            RegistryData::default(),
            measurements_with(vec![observed(9, 45.0, -73.0)]),
        );

        assert_eq!(
            bundle.municipalities,
            vec![Municipality::new(1, "Montréal".to_string())]
        );
        assert_eq!(
            bundle.environment_types,
            vec![EnvironmentType::new(1, "Urbain".to_string())]
        );
        assert_eq!(bundle.stations[0].municipality_id, 1);
        assert_eq!(bundle.stations[0].environment_type_id, 1);
        assert_eq!(report.fallback_resolutions, 0);
    }

    #[test]
    fn test_existing_default_is_not_duplicated() {
        let (bundle, report) = merger().merge(
            registry_with(vec![(1, "Laval", "Urbain"), (2, "Montréal", "Urbain")]),
            MeasurementData::default(),
        );

        assert_eq!(bundle.municipalities.len(), 2);
        assert_eq!(bundle.environment_types.len(), 1);
        assert!(report.defaults_added.is_empty());
    }

    #[test]
    fn test_association_without_key_falls_back() {
        let mut registry = registry_with(vec![(1, "Laval", "Urbain")]);
        // Association left behind for a station whose registry row was dropped
        registry
            .station_municipalities
            .insert(5, "Terrebonne".to_string());

        let (bundle, report) = merger().merge(
            registry,
            measurements_with(vec![observed(5, 45.7, -73.6)]),
        );

        let added = bundle.stations.iter().find(|s| s.station_id == 5).unwrap();
        let montreal_id = bundle
            .municipalities
            .iter()
            .find(|m| m.name == "Montréal")
            .map(|m| m.municipality_id);
        assert_eq!(Some(added.municipality_id), montreal_id);
        assert_eq!(report.fallback_resolutions, 1);
        assert!(!bundle.municipalities.iter().any(|m| m.name == "Terrebonne"));
    }

    #[test]
    fn test_canonical_order() {
        let (bundle, _) = merger().merge(
            registry_with(vec![(30, "Laval", "Urbain"), (10, "Laval", "Urbain")]),
            measurements_with(vec![
                observed(99, 45.0, -73.0),
                observed(10, 45.1, -73.1),
                observed(50, 45.2, -73.2),
            ]),
        );

        let ids: Vec<u32> = bundle.stations.iter().map(|s| s.station_id).collect();
        assert_eq!(ids, vec![30, 10, 99, 50]);
    }

    #[test]
    fn test_measurement_source_never_changes_references() {
        let (bundle, _) = merger().merge(
            registry_with(vec![(1, "Laval", "Industriel")]),
            measurements_with(vec![observed(1, 11.0, 21.0)]),
        );

        assert_eq!(bundle.stations[0].municipality_id, 1);
        assert_eq!(bundle.stations[0].environment_type_id, 1);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let build = || {
            merger().merge(
                registry_with(vec![(3, "Laval", "Urbain"), (1, "Montréal", "Résidentiel")]),
                measurements_with(vec![observed(7, 1.0, 2.0), observed(3, 3.0, 4.0)]),
            )
        };

        assert_eq!(build(), build());
    }
}
