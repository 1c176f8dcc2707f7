use crate::resolvers::error::TemperatureError;
use crate::structs::Coordinate;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

pub const WEATHER_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";

/// Hourly timestamps in the series come back as `2025-08-05T14:00`.
const SERIES_HOUR_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// The temperature reported at the hour closest to the capture time.
///
/// Both units always travel together; there is no state in which one unit
/// resolved and the other did not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    pub celsius: f64,
    pub fahrenheit: f64,
}

impl Temperature {
    pub fn from_celsius(celsius: f64) -> Self {
        Self {
            celsius,
            fahrenheit: celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlySeries,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    time: Vec<String>,
    /// Future hours of the current day come back as `null`.
    temperature_2m: Vec<Option<f64>>,
}

/// Fetches the hourly temperature series around the capture date and picks
/// the entry closest to the capture instant.
///
/// The series spans the trailing month through the current day, in UTC.
/// Ties between two equally distant hours resolve to the earliest entry.
pub async fn fetch_historic_temperature(
    client: &Client,
    endpoint: &str,
    coordinate: Coordinate,
    taken_at: DateTime<Utc>,
) -> Result<Temperature, TemperatureError> {
    let response: ForecastResponse = client
        .get(endpoint)
        .query(&[
            ("latitude", coordinate.latitude.to_string()),
            ("longitude", coordinate.longitude.to_string()),
            ("hourly", "temperature_2m".to_string()),
            ("timezone", "UTC".to_string()),
            ("past_days", "31".to_string()),
            ("forecast_days", "1".to_string()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    closest_hour(&response.hourly, taken_at)
        .map(Temperature::from_celsius)
        .ok_or(TemperatureError::NoUsableEntry)
}

/// Returns the Celsius value whose hour minimizes |hour − taken_at|.
///
/// Entries with an unparseable timestamp or a null temperature are skipped;
/// a length mismatch between the two columns invalidates the whole series.
fn closest_hour(series: &HourlySeries, taken_at: DateTime<Utc>) -> Option<f64> {
    if series.time.len() != series.temperature_2m.len() {
        return None;
    }

    let mut best: Option<(i64, f64)> = None;
    for (time, temperature) in series.time.iter().zip(&series.temperature_2m) {
        let Some(temperature) = temperature else {
            continue;
        };
        let Ok(hour) = NaiveDateTime::parse_from_str(time, SERIES_HOUR_FORMAT) else {
            continue;
        };
        let distance = (hour.and_utc() - taken_at).num_seconds().abs();
        // Strict `<` keeps the earliest entry on a tie.
        if best.is_none_or(|(best_distance, _)| distance < best_distance) {
            best = Some((distance, *temperature));
        }
    }

    best.map(|(_, temperature)| temperature)
}
