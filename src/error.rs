use std::path::PathBuf;

use thiserror::Error;

/// Failures scoped to a single game-data file. None of these abort an
/// ingestion run; the orchestrator logs them and moves on to the next file.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("storeData section missing in {}", path.display())]
    MissingStoreData { path: PathBuf },

    #[error("storeData element <{element}> missing or empty in {}", path.display())]
    MissingField {
        path: PathBuf,
        element: &'static str,
    },

    #[error("value {value:?} of {element} is not an integer in {}", path.display())]
    InvalidNumber {
        path: PathBuf,
        element: String,
        value: String,
    },

    #[error("failed to parse xml {}: {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("unbalanced xml in {}: {detail}", path.display())]
    Malformed { path: PathBuf, detail: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to convert texture {}: {detail}", path.display())]
    ImageConversion { path: PathBuf, detail: String },
}

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    IntegrityConflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}
