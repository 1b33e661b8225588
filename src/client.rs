//! Google Drive API client: file metadata, exports, copies.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::sync::RwLock;

use crate::auth::Authenticator;
use crate::error::{DriveError, Result};
use crate::models::{ApiErrorResponse, CopiedFile, ExportFormat, FileHandle};

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Client for fetching documents and spreadsheets from Google Drive.
///
/// File metadata is memoized per identifier for the life of the client;
/// a build process is short-lived, so there is no expiry.
pub struct DriveClient {
    auth: Authenticator,
    http: Client,
    base_url: String,
    handles: RwLock<HashMap<String, FileHandle>>,
}

impl DriveClient {
    /// Create a new DriveClient around an authenticated resolver.
    pub fn new(auth: Authenticator) -> Self {
        Self::with_base_url(auth, DRIVE_API_BASE)
    }

    /// Create a client against a non-default API endpoint (tests, API
    /// proxies).
    pub fn with_base_url(auth: Authenticator, base_url: impl Into<String>) -> Self {
        Self {
            auth,
            http: Client::new(),
            base_url: base_url.into(),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// True iff the underlying credentials are key-based (no human
    /// present).
    pub fn is_server_mode(&self) -> bool {
        self.auth.is_server_mode()
    }

    /// Drop cached/persisted credentials and authenticate again.
    pub async fn reauthenticate(&self) -> Result<()> {
        self.auth.reauthenticate().await
    }

    /// Get file metadata by ID, from the per-process cache when
    /// available.
    pub async fn find(&self, file_id: &str) -> Result<FileHandle> {
        if let Some(handle) = self.handles.read().await.get(file_id) {
            return Ok(handle.clone());
        }

        let token = self.auth.get_access_token().await?;
        let response = self
            .http
            .get(format!("{}/files/{}", self.base_url, file_id))
            .bearer_auth(&token)
            .query(&[
                ("supportsAllDrives", "true"),
                ("fields", "id, name, mimeType, webViewLink, exportLinks"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = error_detail(response).await;
            return Err(if status == 404 {
                DriveError::DoesNotExist(message)
            } else {
                DriveError::Api { status, message }
            });
        }

        let handle: FileHandle = response.json().await?;
        self.handles
            .write()
            .await
            .insert(file_id.to_string(), handle.clone());
        Ok(handle)
    }

    /// Export a file in the given format and return the raw bytes.
    ///
    /// A format the service offers no export link for fails with
    /// [`DriveError::UnsupportedExportFormat`] before any export fetch.
    pub async fn export(&self, file_id: &str, format: ExportFormat) -> Result<Vec<u8>> {
        let handle = self.find(file_id).await?;
        let url = handle
            .export_url(format)
            .ok_or_else(|| DriveError::UnsupportedExportFormat {
                format,
                title: handle.name.clone(),
            })?
            .to_string();

        let token = self.auth.get_access_token().await?;
        let response = self.http.get(&url).bearer_auth(&token).send().await?;

        if !response.status().is_success() {
            let (status, message) = error_detail(response).await;
            return Err(DriveError::Api { status, message });
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Export a file to disk and return the written path.
    ///
    /// With no explicit path the bytes go to a named temp file carrying
    /// the format's extension; the file is kept and the caller is
    /// responsible for deleting it. Bytes are written as-is in both
    /// cases, so binary exports survive untouched.
    pub async fn export_to_file(
        &self,
        file_id: &str,
        format: ExportFormat,
        path: Option<&Path>,
    ) -> Result<PathBuf> {
        let bytes = self.export(file_id, format).await?;

        match path {
            Some(path) => {
                std::fs::write(path, &bytes)?;
                Ok(path.to_path_buf())
            }
            None => {
                let mut file = tempfile::Builder::new()
                    .prefix("gdoc")
                    .suffix(&format!(".{}", format.extension()))
                    .tempfile()?;
                file.write_all(&bytes)?;
                let (_, path) = file.keep().map_err(|e| DriveError::Io(e.error))?;
                Ok(path)
            }
        }
    }

    /// Export a text-based format and decode it as UTF-8.
    pub async fn doc(&self, file_id: &str, format: ExportFormat) -> Result<String> {
        let bytes = self.export(file_id, format).await?;
        String::from_utf8(bytes).map_err(|e| {
            DriveError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    /// Copy a file, optionally retitling it. Copies stay private to the
    /// authenticated account; sharing is a deliberate follow-up action.
    pub async fn copy(&self, file_id: &str, title: Option<&str>) -> Result<CopiedFile> {
        let token = self.auth.get_access_token().await?;

        let mut body = serde_json::Map::new();
        if let Some(title) = title {
            body.insert("name".to_string(), serde_json::Value::String(title.into()));
        }

        let response = self
            .http
            .post(format!("{}/files/{}/copy", self.base_url, file_id))
            .bearer_auth(&token)
            .query(&[
                ("supportsAllDrives", "true"),
                ("fields", "id, name, webViewLink"),
            ])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let (_, message) = error_detail(response).await;
            return Err(DriveError::Create(message));
        }

        let handle: FileHandle = response.json().await?;
        Ok(CopiedFile {
            id: handle.id,
            url: handle.web_view_link,
        })
    }
}

/// Pull the status and remote error message out of a failed response.
/// The remote message is passed through verbatim when the body parses
/// as a Google error payload.
async fn error_detail(response: reqwest::Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(api_error) => (api_error.error.code, api_error.error.message),
        Err(_) => (status, body),
    }
}
