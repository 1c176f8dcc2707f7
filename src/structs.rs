use crate::resolvers::location::ResolvedPlace;
use crate::resolvers::temperature::Temperature;
use chrono::{DateTime, Utc};
use image::DynamicImage;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// The tri-state of one enrichment field.
///
/// `Pending` means the lookup was launched and has not finished yet;
/// `Unresolved` means it finished without producing a value. The two are
/// never conflated, all the way through export and display.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Resolution<T> {
    #[default]
    Pending,
    Resolved(T),
    Unresolved,
}

impl<T> Resolution<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Resolution::Pending)
    }

    pub fn as_resolved(&self) -> Option<&T> {
        match self {
            Resolution::Resolved(value) => Some(value),
            _ => None,
        }
    }

    /// `Some` becomes `Resolved`, `None` becomes `Unresolved`.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(value) => Resolution::Resolved(value),
            None => Resolution::Unresolved,
        }
    }
}

/// One photo submitted for enrichment.
#[derive(Debug)]
pub struct PhotoSelection {
    /// Stable identifier from the photo library.
    pub photo_id: String,
    pub coordinate: Option<Coordinate>,
    /// The exact capture instant.
    pub taken_at: DateTime<Utc>,
    /// Decoded bitmap for barcode recognition. Recognition works best when
    /// the long edge is at least 1024px.
    pub image: DynamicImage,
}

/// The per-photo aggregate of identity plus derived metadata.
///
/// Created as all-pending on selection and persisting until explicit
/// deselection. Resolver completions fill in one field each, exactly once
/// per run.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub photo_id: String,
    pub taken_at: DateTime<Utc>,
    pub coordinate: Option<Coordinate>,
    pub qr: Resolution<String>,
    pub place: Resolution<ResolvedPlace>,
    pub temperature: Resolution<Temperature>,
    pub notes: String,
    pub collector: String,
}

impl PhotoRecord {
    /// A fresh record with every enrichment field pending.
    pub fn pending(
        photo_id: impl Into<String>,
        taken_at: DateTime<Utc>,
        coordinate: Option<Coordinate>,
    ) -> Self {
        Self {
            photo_id: photo_id.into(),
            taken_at,
            coordinate,
            qr: Resolution::Pending,
            place: Resolution::Pending,
            temperature: Resolution::Pending,
            notes: String::new(),
            collector: String::new(),
        }
    }
}
