use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Canonical station record, keyed by `station_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Station {
    pub station_id: u32,

    pub address: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    /// Projected easting; zero when only the registry knows the station.
    pub x_coord: f64,

    /// Projected northing; zero when only the registry knows the station.
    pub y_coord: f64,

    pub open_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,

    pub municipality_id: u32,
    pub environment_type_id: u32,
}

impl Station {
    /// Build a station as described by the registry, where projected
    /// coordinates are unknown.
    #[allow(clippy::too_many_arguments)]
    pub fn from_registry(
        station_id: u32,
        address: String,
        latitude: f64,
        longitude: f64,
        open_date: Option<NaiveDate>,
        close_date: Option<NaiveDate>,
        municipality_id: u32,
        environment_type_id: u32,
    ) -> Self {
        Self {
            station_id,
            address,
            latitude,
            longitude,
            x_coord: 0.0,
            y_coord: 0.0,
            open_date,
            close_date,
            municipality_id,
            environment_type_id,
        }
    }

    /// Build a station known only from the measurement source.
    pub fn from_measurement(
        observed: &MeasurementStation,
        municipality_id: u32,
        environment_type_id: u32,
    ) -> Self {
        Self {
            station_id: observed.station_id,
            address: observed.address.clone(),
            latitude: observed.latitude,
            longitude: observed.longitude,
            x_coord: observed.x_coord,
            y_coord: observed.y_coord,
            open_date: None,
            close_date: None,
            municipality_id,
            environment_type_id,
        }
    }

    /// Copy of this station with all four coordinate fields taken from
    /// the measurement view. Identity, address, dates and references stay.
    pub fn with_coordinates_from(&self, observed: &MeasurementStation) -> Self {
        Self {
            latitude: observed.latitude,
            longitude: observed.longitude,
            x_coord: observed.x_coord,
            y_coord: observed.y_coord,
            ..self.clone()
        }
    }
}

/// The partial station view carried by the measurement source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementStation {
    pub station_id: u32,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub x_coord: f64,
    pub y_coord: f64,
}
