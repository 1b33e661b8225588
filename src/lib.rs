//! drive_data - Google Drive documents and spreadsheets as build data.
//!
//! This library fetches spreadsheets and documents from Google Drive
//! and turns them into build-time data for a static site:
//! - Spreadsheet sheets become key/value "microcopy" maps or arrays of
//!   header-keyed records
//! - Documents export as plain text, HTML, or parsed ArchieML
//! - Exports are cached locally so a build survives losing the network
//!
//! # Example
//!
//! ```no_run
//! use drive_data::{Authenticator, DriveClient, DriveConfig, ExportFormat, Loader, RetryPolicy};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DriveConfig::from_env();
//!     let auth = Authenticator::connect(&config).await?;
//!     let client = DriveClient::new(auth);
//!
//!     let loader = Loader::new(client, "data", RetryPolicy::interactive());
//!     let copy = loader.load("1vIICbbfHJ8lYSthiDW", ExportFormat::Xlsx).await?;
//!     println!("{}", serde_json::to_string_pretty(&copy.into_value())?);
//!
//!     Ok(())
//! }
//! ```

pub mod archieml;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod shaper;
pub mod url_parser;

// Re-exports for convenience
pub use auth::{AuthMode, Authenticator};
pub use client::DriveClient;
pub use config::DriveConfig;
pub use error::{DriveError, Result};
pub use loader::{LoadedData, Loader, RetryPolicy, SlotConfig, SlotSpec};
pub use models::{CopiedFile, ExportFormat, FileHandle};
pub use url_parser::extract_id;
