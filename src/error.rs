use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Cache database error: {source}")]
    Database {
        #[from]
        source: rusqlite::Error,
    },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
