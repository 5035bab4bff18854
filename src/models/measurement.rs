use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One hourly reading. The natural key is `(station_id, date, hour)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Measurement {
    pub station_id: u32,
    pub date: NaiveDate,

    #[validate(range(min = 0, max = 23))]
    pub hour: u8,

    /// Pollutant code as it appears in the source row, trimmed. It is not
    /// normalized, so `o3` or an unrecognized code has no matching row in
    /// the pollutant table; the catalog check reports such codes without
    /// blocking the load.
    pub pollutant_code: String,

    pub value: i32,
}

impl Measurement {
    pub fn new(
        station_id: u32,
        date: NaiveDate,
        hour: u8,
        pollutant_code: String,
        value: i32,
    ) -> Self {
        Self {
            station_id,
            date,
            hour,
            pollutant_code,
            value,
        }
    }

    pub fn natural_key(&self) -> (u32, NaiveDate, u8) {
        (self.station_id, self.date, self.hour)
    }
}
