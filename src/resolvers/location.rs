use crate::resolvers::error::LocationError;
use crate::structs::Coordinate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const REVERSE_GEOCODE_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";
pub const ELEVATION_ENDPOINT: &str = "https://api.open-elevation.com/api/v1/lookup";

const FEET_PER_METER: f64 = 3.28084;

/// A reverse-geocoded place: a single-line display name plus the raw
/// address attributes the geocoding service returned, with an `elevation`
/// entry appended when the elevation lookup succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlace {
    pub name: String,
    pub address: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ReverseGeocodeResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Map<String, Value>,
    /// Nominatim reports "Unable to geocode" through this key with a 200.
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    results: Vec<ElevationResult>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    elevation: f64,
}

/// Resolves a coordinate to a named place with address attributes.
///
/// Two sequential calls: reverse geocoding first, and only once that
/// succeeded the elevation lookup, so one completion carries both.
/// Elevation failure is partial: the resolved address is kept and only the
/// `elevation` entry is missing. Geocoding failure is the error case.
pub async fn resolve_place(
    client: &Client,
    geocode_endpoint: &str,
    elevation_endpoint: &str,
    coordinate: Coordinate,
) -> Result<ResolvedPlace, LocationError> {
    let response: ReverseGeocodeResponse = client
        .get(geocode_endpoint)
        .query(&[
            ("lat", coordinate.latitude.to_string()),
            ("lon", coordinate.longitude.to_string()),
            ("format", "jsonv2".to_string()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if let Some(message) = response.error {
        return Err(LocationError::Geocode(message));
    }

    let mut address = response.address;
    let name = format_place_name(response.name.as_deref(), &address);

    match fetch_elevation(client, elevation_endpoint, coordinate).await {
        Ok(meters) => {
            address.insert(
                "elevation".to_string(),
                Value::String(format_elevation(meters)),
            );
        }
        Err(err) => {
            tracing::debug!(%err, "elevation lookup failed, keeping address without it");
        }
    }

    Ok(ResolvedPlace { name, address })
}

async fn fetch_elevation(
    client: &Client,
    endpoint: &str,
    coordinate: Coordinate,
) -> Result<f64, LocationError> {
    let response: ElevationResponse = client
        .get(endpoint)
        .query(&[(
            "locations",
            format!("{},{}", coordinate.latitude, coordinate.longitude),
        )])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    response
        .results
        .first()
        .map(|result| result.elevation)
        .ok_or(LocationError::EmptyElevation)
}

/// Joins name, locality, administrative area, and country into one line,
/// suppressing a name that merely repeats the locality.
fn format_place_name(name: Option<&str>, address: &Map<String, Value>) -> String {
    let locality = ["city", "town", "village", "hamlet"]
        .iter()
        .find_map(|key| address.get(*key).and_then(Value::as_str));

    let mut components: Vec<&str> = Vec::new();
    if let Some(name) = name
        && !name.is_empty()
        && Some(name) != locality
    {
        components.push(name);
    }
    if let Some(locality) = locality {
        components.push(locality);
    }
    if let Some(state) = address.get("state").and_then(Value::as_str) {
        components.push(state);
    }
    if let Some(country) = address.get("country").and_then(Value::as_str) {
        components.push(country);
    }

    if components.is_empty() {
        "Unknown Location".to_string()
    } else {
        components.join(", ")
    }
}

fn format_elevation(meters: f64) -> String {
    format!("{meters:.0}m / {:.0}ft", meters * FEET_PER_METER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn address_of(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("address fixtures are objects"),
        }
    }

    #[test]
    fn test_place_name_joins_available_components() {
        let address = address_of(json!({
            "city": "Napoli",
            "state": "Campania",
            "country": "Italy"
        }));

        assert_eq!(
            format_place_name(Some("Massa di Somma"), &address),
            "Massa di Somma, Napoli, Campania, Italy"
        );
    }

    #[test]
    fn test_place_name_suppresses_name_equal_to_locality() {
        let address = address_of(json!({
            "city": "Amsterdam",
            "state": "North Holland",
            "country": "Netherlands"
        }));

        assert_eq!(
            format_place_name(Some("Amsterdam"), &address),
            "Amsterdam, North Holland, Netherlands"
        );
    }

    #[test]
    fn test_place_name_falls_back_when_nothing_is_known() {
        assert_eq!(format_place_name(None, &Map::new()), "Unknown Location");
        assert_eq!(format_place_name(Some(""), &Map::new()), "Unknown Location");
    }

    #[test]
    fn test_elevation_is_formatted_in_meters_and_feet() {
        assert_eq!(format_elevation(512.0), "512m / 1680ft");
        assert_eq!(format_elevation(0.0), "0m / 0ft");
    }

    #[tokio::test]
    async fn test_elevation_failure_keeps_resolved_address() {
        let geocode_body = json!({
            "name": "Vesuvio",
            "address": {
                "county": "Napoli",
                "state": "Campania",
                "country": "Italy",
                "country_code": "it"
            }
        })
        .to_string();
        let geocode = stub_http_server(geocode_body).await;
        // Elevation endpoint points at a closed port, so that call fails.
        let client = Client::new();

        let place = resolve_place(
            &client,
            &format!("http://{geocode}/reverse"),
            "http://127.0.0.1:9/lookup",
            Coordinate {
                latitude: 40.821,
                longitude: 14.426,
            },
        )
        .await
        .expect("geocoding succeeded");

        assert_eq!(place.name, "Vesuvio, Campania, Italy");
        assert_eq!(place.address.get("county"), Some(&json!("Napoli")));
        assert!(place.address.get("elevation").is_none());
    }

    #[tokio::test]
    async fn test_service_error_body_is_a_geocode_failure() {
        let geocode = stub_http_server(json!({"error": "Unable to geocode"}).to_string()).await;
        let client = Client::new();

        let result = resolve_place(
            &client,
            &format!("http://{geocode}/reverse"),
            "http://127.0.0.1:9/lookup",
            Coordinate {
                latitude: 0.0,
                longitude: 0.0,
            },
        )
        .await;

        assert!(matches!(result, Err(LocationError::Geocode(_))));
    }

    /// Serves one canned JSON body per connection on a loopback port.
    async fn stub_http_server(body: String) -> std::net::SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let body = body.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let _ = stream.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                });
            }
        });
        addr
    }
}
