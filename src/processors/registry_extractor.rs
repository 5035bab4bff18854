use crate::config::EtlConfig;
use crate::models::{RegistryRow, Station};
use crate::processors::extraction::{extract, ExtractionReport};
use crate::processors::SurrogateKeys;
use crate::readers::RowOutcome;
use crate::utils::constants::{DEFAULT_ENVIRONMENT_TYPE, DEFAULT_MUNICIPALITY};
use crate::utils::dates::parse_date_or_none;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Station identity and administrative attributes from the registry.
#[derive(Debug, Clone, Default)]
pub struct RegistryData {
    /// Registry order, one entry per station id (first occurrence wins).
    pub stations: Vec<Station>,
    pub municipality_ids: SurrogateKeys,
    pub environment_type_ids: SurrogateKeys,
    /// Station id to the raw municipality name it was registered under.
    pub station_municipalities: HashMap<u32, String>,
    /// Station id to the raw environment-type name it was registered under.
    pub station_environment_types: HashMap<u32, String>,
    pub report: ExtractionReport,
}

pub struct RegistryExtractor {
    default_municipality: String,
    default_environment_type: String,
}

impl RegistryExtractor {
    pub const SOURCE: &'static str = "registry";

    pub fn new() -> Self {
        Self::with_defaults(DEFAULT_MUNICIPALITY, DEFAULT_ENVIRONMENT_TYPE)
    }

    /// Blank municipality and environment-type cells resolve to these names.
    pub fn with_defaults(default_municipality: &str, default_environment_type: &str) -> Self {
        Self {
            default_municipality: default_municipality.to_string(),
            default_environment_type: default_environment_type.to_string(),
        }
    }

    pub fn from_config(config: &EtlConfig) -> Self {
        Self::with_defaults(
            &config.default_municipality,
            &config.default_environment_type,
        )
    }

    pub fn extract(&self, rows: Vec<RowOutcome<RegistryRow>>) -> RegistryData {
        let mut stations = Vec::new();
        let mut seen_stations = HashSet::new();
        let mut municipality_ids = SurrogateKeys::new();
        let mut environment_type_ids = SurrogateKeys::new();
        let mut station_municipalities = HashMap::new();
        let mut station_environment_types = HashMap::new();

        let report = extract(Self::SOURCE, rows, |row: &RegistryRow| {
            let municipality = name_or_default(
                &row.municipality,
                &self.default_municipality,
                "MUNICIPALITE",
                row.station_id,
            );
            let environment_type = name_or_default(
                &row.environment_type,
                &self.default_environment_type,
                "TYPE_MILIEU",
                row.station_id,
            );

            let municipality_id = municipality_ids.assign(municipality);
            let environment_type_id = environment_type_ids.assign(environment_type);

            if !seen_stations.insert(row.station_id) {
                warn!(
                    "Duplicate registry entry for station {}, keeping the first one",
                    row.station_id
                );
                return Ok(());
            }

            station_municipalities.insert(row.station_id, municipality.to_string());
            station_environment_types.insert(row.station_id, environment_type.to_string());

            stations.push(Station::from_registry(
                row.station_id,
                row.address.clone(),
                row.latitude,
                row.longitude,
                parse_date_or_none(row.open_date.as_deref()),
                parse_date_or_none(row.close_date.as_deref()),
                municipality_id,
                environment_type_id,
            ));

            Ok(())
        });

        info!(
            "Processed {} unique stations, {} municipalities, and {} environment types",
            stations.len(),
            municipality_ids.len(),
            environment_type_ids.len()
        );

        RegistryData {
            stations,
            municipality_ids,
            environment_type_ids,
            station_municipalities,
            station_environment_types,
            report,
        }
    }
}

impl Default for RegistryExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn name_or_default<'a>(value: &'a str, default: &'a str, column: &str, station_id: u32) -> &'a str {
    let value = value.trim();
    if value.is_empty() {
        warn!(
            "Blank {} for station {}, using '{}'",
            column, station_id, default
        );
        return default;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::{RowIssue, SourceRow};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn row(
        station_id: u32,
        municipality: &str,
        environment_type: &str,
        open_date: Option<&str>,
    ) -> RegistryRow {
        RegistryRow {
            station_id,
            station_name: Some(format!("Station {}", station_id)),
            address: format!("{} rue Principale", station_id),
            municipality: municipality.to_string(),
            environment_type: environment_type.to_string(),
            open_date: open_date.map(str::to_string),
            close_date: None,
            latitude: 45.5,
            longitude: -73.6,
        }
    }

    fn outcomes(rows: Vec<RegistryRow>) -> Vec<RowOutcome<RegistryRow>> {
        rows.into_iter()
            .enumerate()
            .map(|(i, record)| {
                Ok(SourceRow {
                    line: i as u64 + 2,
                    record,
                })
            })
            .collect()
    }

    #[test]
    fn test_surrogate_keys_in_first_seen_order() {
        let data = RegistryExtractor::new().extract(outcomes(vec![
            row(1, "Laval", "Urbain", None),
            row(2, "Montréal", "Résidentiel", None),
            row(3, "Laval", "Résidentiel", None),
        ]));

        assert_eq!(data.municipality_ids.get("Laval"), Some(1));
        assert_eq!(data.municipality_ids.get("Montréal"), Some(2));
        assert_eq!(data.environment_type_ids.get("Urbain"), Some(1));
        assert_eq!(data.environment_type_ids.get("Résidentiel"), Some(2));

        let ids: Vec<(u32, u32, u32)> = data
            .stations
            .iter()
            .map(|s| (s.station_id, s.municipality_id, s.environment_type_id))
            .collect();
        assert_eq!(ids, vec![(1, 1, 1), (2, 2, 2), (3, 1, 2)]);

        assert_eq!(data.station_municipalities[&3], "Laval");
        assert_eq!(data.station_environment_types[&1], "Urbain");
        assert_eq!(data.report.rows_kept, 3);
    }

    #[test]
    fn test_duplicate_station_keeps_first() {
        let mut duplicate = row(1, "Longueuil", "Industriel", None);
        duplicate.address = "Duplicate address".to_string();

        let data = RegistryExtractor::new().extract(outcomes(vec![
            row(1, "Laval", "Urbain", None),
            duplicate,
        ]));

        assert_eq!(data.stations.len(), 1);
        assert_eq!(data.stations[0].address, "1 rue Principale");
        assert_eq!(data.station_municipalities[&1], "Laval");
        // Names on the duplicate row are still observed
        assert_eq!(data.municipality_ids.get("Longueuil"), Some(2));
    }

    #[test]
    fn test_dates_parsed_or_none() {
        let mut closed = row(2, "Laval", "Urbain", Some("1980-06-15"));
        closed.close_date = Some("2001-02-30".to_string());

        let data = RegistryExtractor::new().extract(outcomes(vec![
            row(1, "Laval", "Urbain", Some("")),
            closed,
        ]));

        assert_eq!(data.stations[0].open_date, None);
        assert_eq!(data.stations[1].open_date, NaiveDate::from_ymd_opt(1980, 6, 15));
        assert_eq!(data.stations[1].close_date, None);
        assert_eq!(data.report.rows_skipped(), 0);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let mut rows = outcomes(vec![
            row(1, "Laval", "Urbain", None),
            row(4, "Laval", "Urbain", None),
        ]);
        rows.insert(
            1,
            Err(RowIssue::new(
                3,
                "x,broken".to_string(),
                "invalid digit".to_string(),
            )),
        );

        let data = RegistryExtractor::new().extract(rows);

        let ids: Vec<u32> = data.stations.iter().map(|s| s.station_id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(data.report.rows_read, 3);
        assert_eq!(data.report.rows_skipped(), 1);
        assert_eq!(data.report.issues[0].line, 3);
        assert_eq!(data.municipality_ids.len(), 1);
    }

    #[test]
    fn test_blank_names_resolve_to_defaults() {
        let mut blank = row(2, "  ", "", Some("1990-01-01"));
        blank.address = "Registry address".to_string();

        let data = RegistryExtractor::with_defaults("Montréal", "Urbain").extract(outcomes(vec![
            row(1, "Laval", "Résidentiel", None),
            blank,
        ]));

        assert_eq!(data.report.rows_skipped(), 0);
        assert_eq!(data.stations.len(), 2);

        let station = &data.stations[1];
        assert_eq!(station.address, "Registry address");
        assert_eq!(station.open_date, NaiveDate::from_ymd_opt(1990, 1, 1));
        assert_eq!(station.municipality_id, data.municipality_ids.get("Montréal").unwrap());
        assert_eq!(
            station.environment_type_id,
            data.environment_type_ids.get("Urbain").unwrap()
        );
        assert_eq!(data.station_municipalities[&2], "Montréal");
        assert_eq!(data.station_environment_types[&2], "Urbain");
        assert!(!data.municipality_ids.contains(""));
    }

    #[test]
    fn test_projection_defaults_to_zero() {
        let data = RegistryExtractor::new().extract(outcomes(vec![row(7, "Laval", "Urbain", None)]));

        assert_eq!(data.stations[0].x_coord, 0.0);
        assert_eq!(data.stations[0].y_coord, 0.0);
        assert_eq!(data.stations[0].latitude, 45.5);
    }
}
