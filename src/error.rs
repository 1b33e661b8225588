//! Error types for the drive_data crate.

use thiserror::Error;

use crate::models::ExportFormat;

/// Errors that can occur when loading build data from Google Drive.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Required local configuration is missing or unusable. Fatal to the
    /// authentication attempt; never retried automatically.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The remote API reported a logical error. The message is passed
    /// through verbatim.
    #[error("Google Drive error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("File does not exist: {0}")]
    DoesNotExist(String),

    #[error("Copy failed: {0}")]
    Create(String),

    /// The file has no export link for the requested format. Raised
    /// locally, before the export fetch.
    #[error("No {format} export available for '{title}'")]
    UnsupportedExportFormat { format: ExportFormat, title: String },

    /// Connectivity failure (DNS, refused connection, timeout), as
    /// opposed to a logical API error. Triggers the fallback cache.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Invalid URL or ID: {0}")]
    InvalidUrlOrId(String),

    #[error("Failed to parse spreadsheet: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JWT encoding error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl DriveError {
    /// True for connectivity failures, false for logical API errors.
    pub fn is_transport(&self) -> bool {
        matches!(self, DriveError::Transport(_))
    }

    /// Errors that no amount of re-authentication will fix.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DriveError::Configuration(_) | DriveError::UnsupportedExportFormat { .. }
        )
    }
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;
