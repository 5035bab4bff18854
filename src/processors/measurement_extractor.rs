use crate::models::{Measurement, MeasurementRow, MeasurementStation, Pollutant, PollutantType};
use crate::processors::extraction::{extract, ExtractionReport};
use crate::readers::RowOutcome;
use crate::utils::dates::parse_date;
use std::collections::HashSet;
use tracing::{info, warn};
use validator::Validate;

/// Station coordinates, pollutant catalog and hourly facts from the
/// measurement source.
#[derive(Debug, Clone, Default)]
pub struct MeasurementData {
    /// First-seen order, one entry per station id.
    pub stations: Vec<MeasurementStation>,
    /// First-seen order, one entry per distinct source code.
    pub pollutants: Vec<Pollutant>,
    /// Every accepted row, in source order.
    pub measurements: Vec<Measurement>,
    pub report: ExtractionReport,
}

pub struct MeasurementExtractor;

impl MeasurementExtractor {
    pub const SOURCE: &'static str = "measurement";

    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, rows: Vec<RowOutcome<MeasurementRow>>) -> MeasurementData {
        let mut stations = Vec::new();
        let mut seen_stations = HashSet::new();
        let mut pollutants = Vec::new();
        let mut seen_codes = HashSet::new();
        let mut measurements = Vec::new();

        let report = extract(Self::SOURCE, rows, |row: &MeasurementRow| {
            // Validate first so a rejected row leaves no trace
            let code = row.pollutant_code.trim();
            let measurement = Measurement::new(
                row.station_id,
                parse_date(&row.date)?,
                row.hour,
                code.to_string(),
                row.value,
            );
            measurement.validate()?;

            if seen_stations.insert(row.station_id) {
                stations.push(MeasurementStation {
                    station_id: row.station_id,
                    address: row.address.clone(),
                    latitude: row.latitude,
                    longitude: row.longitude,
                    x_coord: row.x,
                    y_coord: row.y,
                });
            }

            if seen_codes.insert(code.to_string()) {
                let kind = PollutantType::from_code(code);
                if !kind.is_known() {
                    warn!("Unrecognized pollutant code '{}', recorded as unknown", code);
                }
                pollutants.push(Pollutant::from(kind));
            }

            measurements.push(measurement);
            Ok(())
        });

        info!(
            "Processed {} stations, {} pollutants, and {} measurements",
            stations.len(),
            pollutants.len(),
            measurements.len()
        );

        MeasurementData {
            stations,
            pollutants,
            measurements,
            report,
        }
    }
}

impl Default for MeasurementExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::{RowIssue, SourceRow};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn row(station_id: u32, code: &str, date: &str, hour: u8) -> MeasurementRow {
        MeasurementRow {
            station_id,
            address: format!("{} boulevard Saint-Laurent", station_id),
            latitude: 45.5 + station_id as f64 * 0.01,
            longitude: -73.6,
            x: 299_000.0 + station_id as f64,
            y: 5_040_000.0,
            pollutant_code: code.to_string(),
            value: 20 + hour as i32,
            date: date.to_string(),
            hour,
        }
    }

    fn outcomes(rows: Vec<MeasurementRow>) -> Vec<RowOutcome<MeasurementRow>> {
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
    fn test_stations_first_seen_and_measurements_kept() {
        let mut moved = row(80, "PM", "2024-01-31", 1);
        moved.latitude = 0.0;

        let data = MeasurementExtractor::new().extract(outcomes(vec![
            row(80, "O3", "2024-01-31", 0),
            row(3, "O3", "2024-01-31", 0),
            moved,
            row(80, "O3", "2024-01-31", 0),
        ]));

        let ids: Vec<u32> = data.stations.iter().map(|s| s.station_id).collect();
        assert_eq!(ids, vec![80, 3]);
        // First row for a station supplies its coordinates
        assert_eq!(data.stations[0].latitude, 45.5 + 80.0 * 0.01);
        assert_eq!(data.stations[0].x_coord, 299_080.0);

        // Duplicate natural keys are not collapsed here
        assert_eq!(data.measurements.len(), 4);
        assert_eq!(data.measurements[0], data.measurements[3]);
        assert_eq!(
            data.measurements[2].date,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
    }

    #[test]
    fn test_pollutants_resolved_once_per_code() {
        let data = MeasurementExtractor::new().extract(outcomes(vec![
            row(1, "O3", "2024-01-31", 0),
            row(1, "no2", "2024-01-31", 1),
            row(1, "O3", "2024-01-31", 2),
            row(1, "XYZ", "2024-01-31", 3),
        ]));

        assert_eq!(
            data.pollutants,
            vec![
                Pollutant::from(PollutantType::O3),
                Pollutant::from(PollutantType::No2),
                Pollutant::from(PollutantType::Unknown),
            ]
        );
        assert_eq!(data.pollutants[2].description, "Inconnu");
        assert_eq!(data.measurements[1].pollutant_code, "no2");
        assert_eq!(data.measurements[3].pollutant_code, "XYZ");
        assert_eq!(data.report.rows_skipped(), 0);
    }

    #[test]
    fn test_invalid_rows_are_skipped_without_side_effects() {
        let mut rows = outcomes(vec![
            row(1, "O3", "2024-01-31", 0),
            row(2, "CO", "31/01/2024", 0),
            row(3, "SO2", "2024-01-31", 24),
            row(1, "O3", "2024-01-31", 1),
        ]);
        rows.push(Err(RowIssue::new(
            6,
            "abc,somewhere".to_string(),
            "invalid digit found in string".to_string(),
        )));

        let data = MeasurementExtractor::new().extract(rows);

        assert_eq!(data.measurements.len(), 2);
        assert_eq!(data.stations.len(), 1);
        assert_eq!(data.pollutants.len(), 1);
        assert_eq!(data.report.rows_read, 5);
        assert_eq!(data.report.rows_kept, 2);
        let skipped_lines: Vec<u64> = data.report.issues.iter().map(|i| i.line).collect();
        assert_eq!(skipped_lines, vec![3, 4, 6]);
    }
}
