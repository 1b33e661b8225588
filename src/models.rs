//! Data models for the Google Drive API and local credential files.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DriveError;

/// Metadata for a file in Google Drive, as returned by the files.get
/// endpoint. Handles are cached per identifier for the life of the
/// process; there is no expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    pub id: String,
    /// The document title.
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Canonical link for humans.
    #[serde(default)]
    pub web_view_link: Option<String>,
    /// Export MIME type -> retrieval URL.
    #[serde(default)]
    pub export_links: HashMap<String, String>,
}

impl FileHandle {
    /// The export URL for a format, if the service offers one for this
    /// file.
    pub fn export_url(&self, format: ExportFormat) -> Option<&str> {
        self.export_links.get(format.mime()).map(String::as_str)
    }
}

/// Target format for a document export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Full spreadsheet with all worksheets (binary).
    Xlsx,
    /// Plain text.
    Txt,
    /// HTML.
    Html,
    /// Plain text holding ArchieML markup.
    Archieml,
}

impl ExportFormat {
    /// The MIME type the export link is keyed by.
    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Txt | ExportFormat::Archieml => "text/plain",
            ExportFormat::Html => "text/html",
        }
    }

    /// File extension used for saved exports and cache entries.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Txt => "txt",
            ExportFormat::Html => "html",
            ExportFormat::Archieml => "archieml",
        }
    }

    /// True for formats that must be written without text-mode
    /// transformation.
    pub fn is_binary(&self) -> bool {
        matches!(self, ExportFormat::Xlsx)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = DriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "txt" | "text" => Ok(ExportFormat::Txt),
            "html" => Ok(ExportFormat::Html),
            "archieml" | "aml" => Ok(ExportFormat::Archieml),
            other => Err(DriveError::Configuration(format!(
                "Unknown export format '{other}' (expected xlsx, txt, html or archieml)"
            ))),
        }
    }
}

/// Result of a file-copy request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopiedFile {
    pub id: String,
    pub url: Option<String>,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// Service account key material from a JSON key file.
#[derive(Debug, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: Option<String>,
}

/// The `installed` section of a client_secrets.json file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub installed: InstalledSecrets,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstalledSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub auth_uri: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

/// Token persisted between interactive runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
