//! Error types for Minisheet core.

use minisheet_engine::EngineError;
use thiserror::Error;

/// Errors that can occur in the Minisheet application
#[derive(Error, Debug)]
pub enum MinisheetError {
    #[error("Invalid cell key: {0}")]
    InvalidKey(String),

    #[error("Selection must be a single row or a single column")]
    UnsupportedShape,

    #[error("Select cells first")]
    EmptySelection,

    #[error("Formula error: {0}")]
    Formula(String),

    #[error("Remote call failed: {0}")]
    RemoteCallFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<EngineError> for MinisheetError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidKey(key) => MinisheetError::InvalidKey(key),
            EngineError::Formula(message) => MinisheetError::Formula(message),
        }
    }
}

impl From<calamine::Error> for MinisheetError {
    fn from(err: calamine::Error) -> Self {
        MinisheetError::Workbook(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for MinisheetError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        MinisheetError::Workbook(err.to_string())
    }
}

impl From<reqwest::Error> for MinisheetError {
    fn from(err: reqwest::Error) -> Self {
        MinisheetError::RemoteCallFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MinisheetError>;
