//! Persisted collector-name suggestions.
//!
//! A deliberately small file-backed store: loaded once at startup, appended
//! to whenever a new collector name is accepted, cleared only on explicit
//! request. Constructed explicitly and handed to whoever needs it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectorStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("preference encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The on-disk shape: a deduplicated set of previously used names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorPreferences {
    collector_values: BTreeSet<String>,
}

/// File-backed store of collector names.
#[derive(Debug)]
pub struct CollectorStore {
    path: PathBuf,
    preferences: CollectorPreferences,
}

impl CollectorStore {
    /// Loads preferences from `path`. A missing or unreadable file starts
    /// the store empty rather than failing; nothing is written until the
    /// first accepted name.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let preferences = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(preferences) => preferences,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "corrupt collector preferences, starting empty");
                    CollectorPreferences::default()
                }
            },
            Err(_) => CollectorPreferences::default(),
        };
        Self { path, preferences }
    }

    /// Records an accepted collector name. Whitespace is trimmed; empty and
    /// already-known names are ignored without touching the file.
    pub fn add(&mut self, name: &str) -> Result<(), CollectorStoreError> {
        let trimmed = name.trim();
        if trimmed.is_empty() || self.preferences.collector_values.contains(trimmed) {
            return Ok(());
        }
        self.preferences
            .collector_values
            .insert(trimmed.to_string());
        self.save()
    }

    /// All known names, sorted.
    pub fn all(&self) -> Vec<String> {
        self.preferences.collector_values.iter().cloned().collect()
    }

    /// Forgets every name and persists the empty set.
    pub fn clear(&mut self) -> Result<(), CollectorStoreError> {
        self.preferences = CollectorPreferences::default();
        self.save()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), CollectorStoreError> {
        let bytes = serde_json::to_vec(&self.preferences)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}
