//! Typed rows as they come out of the two source files.
//!
//! Field names follow the source headers; columns not listed here are
//! ignored when decoding.

use serde::{Deserialize, Serialize};

/// A row of the historical station registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryRow {
    #[serde(rename = "ID_STATION")]
    pub station_id: u32,

    #[serde(rename = "NOM_STATION", default)]
    pub station_name: Option<String>,

    #[serde(rename = "ADRESSE")]
    pub address: String,

    #[serde(rename = "MUNICIPALITE")]
    pub municipality: String,

    #[serde(rename = "TYPE_MILIEU")]
    pub environment_type: String,

    #[serde(rename = "DATE_OUVERTURE", default)]
    pub open_date: Option<String>,

    #[serde(rename = "DATE_FERMETURE", default)]
    pub close_date: Option<String>,

    #[serde(rename = "LATITUDE")]
    pub latitude: f64,

    #[serde(rename = "LONGITUDE")]
    pub longitude: f64,
}

/// A row of the hourly measurement dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    #[serde(rename = "stationId")]
    pub station_id: u32,

    #[serde(rename = "adresse")]
    pub address: String,

    pub latitude: f64,
    pub longitude: f64,

    #[serde(rename = "X")]
    pub x: f64,

    #[serde(rename = "Y")]
    pub y: f64,

    #[serde(rename = "polluant")]
    pub pollutant_code: String,

    #[serde(rename = "valeur")]
    pub value: i32,

    /// `YYYY-MM-DD`
    pub date: String,

    #[serde(rename = "heure")]
    pub hour: u8,
}
