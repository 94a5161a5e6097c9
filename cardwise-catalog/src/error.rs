use std::path::PathBuf;
use thiserror::Error;

/// Structural problems that stop a catalog, wallet, or statement from loading.
///
/// Field-level problems never surface here; those degrade inside the records.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{what} must be a JSON array of records")]
    NotAnArray { what: String },

    #[error("duplicate card id in catalog: {0}")]
    DuplicateCard(String),

    #[error("unknown card id: {0}")]
    UnknownCard(String),

    #[error("purchase file is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("reading purchases: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}
