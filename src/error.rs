use thiserror::Error;

/// The primary error type for the photo-enricher crate.
#[derive(Error, Debug)]
pub enum EnricherError {
    #[error("HTTP client construction failed")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Custom Module Errors ---
    #[error("Export encoding failed: {0}")]
    Export(#[from] serde_json::Error),

    #[error("Collector preferences failed: {0}")]
    Collectors(#[from] crate::collectors::CollectorStoreError),
}
