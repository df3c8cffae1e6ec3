//! Error taxonomy for the ingest runtime.
//!
//! Most of these never leave the component that raised them: fetch and parse
//! failures degrade to empty results, import failures roll back one batch.
//! Only browser acquisition is fatal to a run.

use bazaar_core::EntityKind;

/// Errors raised inside the acquisition pipeline.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("import of {kind} failed: {message}")]
    Import { kind: EntityKind, message: String },

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl IngestError {
    pub fn network(url: &str, message: impl ToString) -> Self {
        Self::Network {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn navigation(url: &str, message: impl ToString) -> Self {
        Self::Navigation {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn import(kind: EntityKind, message: impl ToString) -> Self {
        Self::Import {
            kind,
            message: message.to_string(),
        }
    }
}

impl From<rusqlite::Error> for IngestError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<std::io::Error> for IngestError {
    fn from(e: std::io::Error) -> Self {
        Self::Artifact(e.to_string())
    }
}

/// Convenience result type.
pub type IngestResult<T> = Result<T, IngestError>;
