use crate::error::Result;
use crate::utils::constants::SOURCE_DATE_FORMAT;
use chrono::NaiveDate;
use tracing::warn;

/// Parse a `YYYY-MM-DD` date, failing on anything else.
///
/// # Examples
/// ```
/// use rsqa_processor::utils::dates::parse_date;
///
/// let date = parse_date("2024-03-01").unwrap();
/// assert_eq!(date.to_string(), "2024-03-01");
/// assert!(parse_date("01/03/2024").is_err());
/// ```
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value.trim(), SOURCE_DATE_FORMAT)?)
}

/// Parse an optional date column. Blank yields `None`; an unparseable
/// value is logged and also yields `None`.
pub fn parse_date_or_none(value: Option<&str>) -> Option<NaiveDate> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;

    match parse_date(value) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Failed to parse date '{}' ({}), using none", value, e);
            None
        }
    }
}
