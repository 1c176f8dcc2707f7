use crate::collectors::CollectorStore;
use crate::error::EnricherError;
use crate::export;
use crate::resolvers::{location, qr, temperature};
use crate::server::SnapshotSource;
use crate::store::{FieldUpdate, RecordEdit, RecordStore};
use crate::structs::{PhotoRecord, PhotoSelection, Resolution};
use async_trait::async_trait;
use bon::bon;
use std::sync::Mutex;
use std::time::Duration;

/// The main entry point for the photo enrichment pipeline.
///
/// Holds the shared HTTP client, the resolver endpoints, and the handle to
/// the record store task. Designed to be created once and reused for every
/// photo the user selects.
///
/// Use the builder pattern to construct an instance:
/// ```rust
/// # use photo_enricher::{PhotoEnricher, EnricherError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), EnricherError> {
/// let enricher = PhotoEnricher::builder()
///     .request_timeout_secs(5) // Optionally configure parameters
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct PhotoEnricher {
    store: RecordStore,
    http: reqwest::Client,
    geocode_endpoint: String,
    elevation_endpoint: String,
    weather_endpoint: String,
    collectors: Option<Mutex<CollectorStore>>,
}

#[bon]
impl PhotoEnricher {
    /// Constructs a `PhotoEnricher` via a builder pattern.
    ///
    /// # Builder Arguments
    ///
    /// * `request_timeout_secs: u64` - (Default: `10`) Bound on every outgoing
    ///   network call, so a dead service resolves as a failure instead of a
    ///   hung lookup.
    /// * `geocode_endpoint` / `elevation_endpoint` / `weather_endpoint` -
    ///   Service URLs, overridable mainly for tests.
    /// * `collectors: Option<CollectorStore>` - The persisted collector-name
    ///   store; accepted names are appended to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    #[builder]
    pub fn new(
        #[builder(default = 10)] request_timeout_secs: u64,
        #[builder(default = location::REVERSE_GEOCODE_ENDPOINT.to_string())]
        geocode_endpoint: String,
        #[builder(default = location::ELEVATION_ENDPOINT.to_string())] elevation_endpoint: String,
        #[builder(default = temperature::WEATHER_ENDPOINT.to_string())] weather_endpoint: String,
        collectors: Option<CollectorStore>,
    ) -> Result<Self, EnricherError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("photo_enricher/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()?;
        Ok(Self {
            store: RecordStore::spawn(),
            http,
            geocode_endpoint,
            elevation_endpoint,
            weather_endpoint,
            collectors,
        })
    }

    /// Submits a photo for enrichment.
    ///
    /// Creates a pending record and fans out the lookups: the QR scan always
    /// runs (on the blocking pool, it is CPU-bound); location and temperature
    /// resolution only when a coordinate is present, concurrently and in no
    /// particular order. Each completion is merged into the record by the
    /// store task; failures merge as unresolved values and never surface as
    /// errors.
    ///
    /// Selecting an identifier that is already selected restarts its run;
    /// completions of the superseded run are discarded on arrival.
    pub async fn select(&self, selection: PhotoSelection) {
        let PhotoSelection {
            photo_id,
            coordinate,
            taken_at,
            image,
        } = selection;
        tracing::info!(
            photo_id = %photo_id,
            has_coordinate = coordinate.is_some(),
            "photo selected"
        );

        let record = PhotoRecord::pending(photo_id.clone(), taken_at, coordinate);
        let generation = self.store.select(record).await;

        let store = self.store.clone();
        let qr_photo_id = photo_id.clone();
        tokio::spawn(async move {
            let payload = tokio::task::spawn_blocking(move || qr::decode_payload(&image))
                .await
                .unwrap_or_default();
            store
                .merge(
                    &qr_photo_id,
                    generation,
                    FieldUpdate::Qr(Resolution::from_option(payload)),
                )
                .await;
        });

        let Some(coordinate) = coordinate else {
            return;
        };

        let store = self.store.clone();
        let client = self.http.clone();
        let geocode_endpoint = self.geocode_endpoint.clone();
        let elevation_endpoint = self.elevation_endpoint.clone();
        let place_photo_id = photo_id.clone();
        tokio::spawn(async move {
            let place = match location::resolve_place(
                &client,
                &geocode_endpoint,
                &elevation_endpoint,
                coordinate,
            )
            .await
            {
                Ok(place) => Resolution::Resolved(place),
                Err(err) => {
                    tracing::debug!(photo_id = %place_photo_id, %err, "location unresolved");
                    Resolution::Unresolved
                }
            };
            store
                .merge(&place_photo_id, generation, FieldUpdate::Place(place))
                .await;
        });

        let store = self.store.clone();
        let client = self.http.clone();
        let weather_endpoint = self.weather_endpoint.clone();
        tokio::spawn(async move {
            let temperature = match temperature::fetch_historic_temperature(
                &client,
                &weather_endpoint,
                coordinate,
                taken_at,
            )
            .await
            {
                Ok(temperature) => Resolution::Resolved(temperature),
                Err(err) => {
                    tracing::debug!(photo_id = %photo_id, %err, "temperature unresolved");
                    Resolution::Unresolved
                }
            };
            store
                .merge(&photo_id, generation, FieldUpdate::Temperature(temperature))
                .await;
        });
    }

    /// Removes a photo's record. In-flight lookups are not cancelled; their
    /// late completions are discarded when they arrive.
    pub async fn deselect(&self, photo_id: &str) {
        tracing::info!(photo_id = %photo_id, "photo deselected");
        self.store.deselect(photo_id).await;
    }

    /// A consistent snapshot of the current records, in selection order.
    pub async fn records(&self) -> Vec<PhotoRecord> {
        self.store.snapshot().await
    }

    pub async fn update_notes(&self, photo_id: &str, notes: impl Into<String>) {
        self.store
            .edit(photo_id, RecordEdit::Notes(notes.into()))
            .await;
    }

    /// Writes the collector name onto the record and remembers it as a
    /// future suggestion.
    pub async fn update_collector(&self, photo_id: &str, name: &str) {
        self.store
            .edit(photo_id, RecordEdit::Collector(name.to_string()))
            .await;
        if let Some(collectors) = &self.collectors
            && let Ok(mut collectors) = collectors.lock()
            && let Err(err) = collectors.add(name)
        {
            tracing::warn!(%err, "failed to persist collector name");
        }
    }

    /// Previously accepted collector names, sorted.
    pub fn collector_suggestions(&self) -> Vec<String> {
        self.collectors
            .as_ref()
            .and_then(|collectors| collectors.lock().ok().map(|collectors| collectors.all()))
            .unwrap_or_default()
    }

    /// Encodes the current record set for the file-save dialog. A failed
    /// encode aborts only this attempt; the in-memory records are untouched.
    pub async fn export_json(&self) -> Result<Vec<u8>, EnricherError> {
        let snapshot = self.store.snapshot().await;
        Ok(export::encode_records(&snapshot)?)
    }
}

#[async_trait]
impl SnapshotSource for PhotoEnricher {
    async fn snapshot_json(&self) -> Vec<u8> {
        match self.export_json().await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(%err, "export snapshot failed, serving empty list");
                b"[]".to_vec()
            }
        }
    }
}
