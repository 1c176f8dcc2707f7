//! Projection of the live record set into the stable export schema.
//!
//! The projection is a pure function over a snapshot, so it can run while
//! resolver completions keep mutating the store. Used for both the file
//! export and the `/specimens.json` route.

use crate::structs::{PhotoRecord, Resolution};
use serde::Serialize;
use serde_json::{Map, Value};

/// Shown for a field whose lookup has not finished yet.
pub const PENDING_LABEL: &str = "Searching...";
/// Shown for a temperature whose lookup finished without a value.
pub const NO_TEMPERATURE_LABEL: &str = "N/A";
/// Shown for a location whose lookup finished without a value.
pub const NO_LOCATION_LABEL: &str = "Unknown";

const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One record in its external serialization.
///
/// `qrCode` and `address` disappear entirely when there is nothing resolved
/// to put in them; every other field always carries a defined string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    #[serde(rename = "photoID")]
    pub photo_id: String,
    pub date_time_original: String,
    pub latitude: String,
    pub longitude: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    pub temperature_c: String,
    pub temperature_f: String,
    pub notes: String,
    pub collector: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Map<String, Value>>,
}

impl ExportRecord {
    fn from_record(record: &PhotoRecord) -> Self {
        let (latitude, longitude) = match record.coordinate {
            Some(coordinate) => (
                format!("{:.5}", coordinate.latitude),
                format!("{:.5}", coordinate.longitude),
            ),
            None => (String::new(), String::new()),
        };

        let qr_code = match &record.qr {
            Resolution::Resolved(payload) if !payload.is_empty() => Some(payload.clone()),
            _ => None,
        };

        let (temperature_c, temperature_f) = match &record.temperature {
            Resolution::Pending => (PENDING_LABEL.to_string(), PENDING_LABEL.to_string()),
            Resolution::Resolved(temperature) => (
                format!("{:.1}", temperature.celsius),
                format!("{:.1}", temperature.fahrenheit),
            ),
            Resolution::Unresolved => (
                NO_TEMPERATURE_LABEL.to_string(),
                NO_TEMPERATURE_LABEL.to_string(),
            ),
        };

        let location = match &record.place {
            Resolution::Pending => PENDING_LABEL.to_string(),
            Resolution::Resolved(place) => place.name.clone(),
            Resolution::Unresolved => NO_LOCATION_LABEL.to_string(),
        };
        let address = record
            .place
            .as_resolved()
            .map(|place| place.address.clone());

        Self {
            photo_id: record.photo_id.clone(),
            date_time_original: record.taken_at.format(DISPLAY_TIMESTAMP_FORMAT).to_string(),
            latitude,
            longitude,
            qr_code,
            temperature_c,
            temperature_f,
            notes: record.notes.clone(),
            collector: record.collector.clone(),
            location,
            address,
        }
    }
}

/// Projects a record snapshot into export form, preserving order.
pub fn export_records(records: &[PhotoRecord]) -> Vec<ExportRecord> {
    records.iter().map(ExportRecord::from_record).collect()
}

/// Encodes a record snapshot as the JSON array both consumers receive.
/// An empty snapshot encodes as `[]`.
pub fn encode_records(records: &[PhotoRecord]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&export_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::location::ResolvedPlace;
    use crate::resolvers::temperature::Temperature;
    use crate::structs::Coordinate;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn record() -> PhotoRecord {
        PhotoRecord::pending(
            "photo-1",
            Utc.with_ymd_and_hms(2025, 10, 14, 14, 30, 45).unwrap(),
            Some(Coordinate {
                latitude: 40.8208875277778,
                longitude: -14.4228166666667,
            }),
        )
    }

    #[test]
    fn test_empty_qr_omits_the_key_and_payload_includes_it() {
        let mut with_payload = record();
        with_payload.qr = Resolution::Resolved("SPECIMEN-0042".to_string());
        let mut without = record();
        without.qr = Resolution::Unresolved;
        let mut empty_payload = record();
        empty_payload.qr = Resolution::Resolved(String::new());

        let encoded = |r: &PhotoRecord| {
            serde_json::to_value(&export_records(std::slice::from_ref(r))[0]).unwrap()
        };

        assert_eq!(encoded(&with_payload)["qrCode"], json!("SPECIMEN-0042"));
        assert!(encoded(&without).get("qrCode").is_none());
        assert!(encoded(&empty_payload).get("qrCode").is_none());
    }

    #[test]
    fn test_coordinates_render_as_five_decimal_strings() {
        let exported = ExportRecord::from_record(&record());

        assert_eq!(exported.latitude, "40.82089");
        assert_eq!(exported.longitude, "-14.42282");
        assert_eq!(exported.date_time_original, "2025-10-14 14:30:45");
    }

    #[test]
    fn test_missing_coordinate_renders_empty_strings() {
        let mut record = record();
        record.coordinate = None;
        let exported = ExportRecord::from_record(&record);

        assert_eq!(exported.latitude, "");
        assert_eq!(exported.longitude, "");
    }

    #[test]
    fn test_pending_and_absent_stay_distinct_in_the_export() {
        let pending = ExportRecord::from_record(&record());
        assert_eq!(pending.temperature_c, PENDING_LABEL);
        assert_eq!(pending.temperature_f, PENDING_LABEL);
        assert_eq!(pending.location, PENDING_LABEL);

        let mut unresolved = record();
        unresolved.temperature = Resolution::Unresolved;
        unresolved.place = Resolution::Unresolved;
        let unresolved = ExportRecord::from_record(&unresolved);
        assert_eq!(unresolved.temperature_c, NO_TEMPERATURE_LABEL);
        assert_eq!(unresolved.temperature_f, NO_TEMPERATURE_LABEL);
        assert_eq!(unresolved.location, NO_LOCATION_LABEL);
        assert!(unresolved.address.is_none());
    }

    #[test]
    fn test_resolved_temperature_carries_both_units() {
        let mut record = record();
        record.temperature = Resolution::Resolved(Temperature::from_celsius(26.0));
        let exported = ExportRecord::from_record(&record);

        assert_eq!(exported.temperature_c, "26.0");
        assert_eq!(exported.temperature_f, "78.8");
    }

    #[test]
    fn test_address_map_round_trips_without_escaping_slashes() {
        let mut record = record();
        let mut address = Map::new();
        address.insert("road".to_string(), json!("Via Vesuvio 3/5"));
        address.insert("elevation".to_string(), json!("512m / 1680ft"));
        address.insert("tags".to_string(), json!(["volcanic", {"zone": 4}]));
        record.place = Resolution::Resolved(ResolvedPlace {
            name: "Massa di Somma, Campania, Italy".to_string(),
            address,
        });

        let bytes = encode_records(std::slice::from_ref(&record)).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains(r#""elevation":"512m / 1680ft""#));
        assert!(text.contains("Via Vesuvio 3/5"));
        assert!(!text.contains(r"\/"));

        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reparsed[0]["address"]["tags"][1]["zone"], json!(4));
    }

    #[test]
    fn test_empty_snapshot_encodes_as_empty_array() {
        assert_eq!(encode_records(&[]).unwrap(), b"[]");
    }
}
