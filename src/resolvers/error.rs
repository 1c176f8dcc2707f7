use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("geocoding service reported: {0}")]
    Geocode(String),

    #[error("elevation response contained no results")]
    EmptyElevation,
}

#[derive(Error, Debug)]
pub enum TemperatureError {
    #[error("weather service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("hourly series contained no usable entry")]
    NoUsableEntry,
}
