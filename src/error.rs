use thiserror::Error;

#[derive(Error, Debug)]
pub enum FactdeskError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Error uploading images: {0}")]
    Upload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("factdesk is not initialized; run `factdesk init --email <address>` first")]
    NotInitialized,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FactdeskError>;
