//! # Photo Enricher
//!
//! Augment photos selected from a personal library with derived metadata and
//! serve the aggregated records as printable specimen labels.
//!
//! For every selected photo the enrichment pipeline fans out three independent
//! lookups, merges whatever completes into a shared per-photo record, and
//! tolerates any subset of the lookups failing:
//!
//! - **QR payload**: a multi-symbology barcode scan of the photo bitmap,
//!   keeping only QR results.
//! - **Location**: reverse geocoding to a display name plus a structured
//!   address map, followed by an elevation lookup.
//! - **Historic temperature**: the hourly temperature closest to the capture
//!   time, in Celsius and Fahrenheit.
//!
//! The current record set is exported as a stable JSON schema, either as bytes
//! for a file-save dialog or live over the embedded HTTP server, which also
//! serves the bundled label-printing web client.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use photo_enricher::enricher::PhotoEnricher;
//! use photo_enricher::server::LabelServer;
//! use photo_enricher::structs::{Coordinate, PhotoSelection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), photo_enricher::EnricherError> {
//!     let enricher = Arc::new(PhotoEnricher::builder().build()?);
//!
//!     let mut server = LabelServer::serve()
//!         .source(enricher.clone())
//!         .call()
//!         .await?;
//!
//!     let photo = image::open("photo-0001.jpg").map_err(std::io::Error::other)?;
//!     enricher
//!         .select(PhotoSelection {
//!             photo_id: "photo-0001".into(),
//!             coordinate: Some(Coordinate {
//!                 latitude: 40.82088,
//!                 longitude: 14.42281,
//!             }),
//!             taken_at: Utc::now(),
//!             image: photo,
//!         })
//!         .await;
//!
//!     // ... the enriched records are now live on http://localhost:8000 ...
//!
//!     server.stop().await;
//!     Ok(())
//! }
//! ```

pub mod collectors;
pub mod enricher;
pub mod error;
pub mod export;
pub mod resolvers;
pub mod server;
pub mod store;
pub mod structs;

pub use crate::enricher::PhotoEnricher;
pub use crate::error::EnricherError;
pub use crate::structs::{Coordinate, PhotoRecord, PhotoSelection, Resolution};
