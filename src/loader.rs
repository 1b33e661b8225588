//! Build-data loading: named slots, the fallback cache, and the retry
//! policy around interactive re-authentication.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::archieml;
use crate::client::DriveClient;
use crate::error::{DriveError, Result};
use crate::models::ExportFormat;
use crate::shaper;
use crate::url_parser::extract_id;

/// Slot name used when a single file is configured without one.
pub const DEFAULT_SLOT: &str = "drive";

fn default_format() -> ExportFormat {
    ExportFormat::Xlsx
}

/// How the host names the data it wants loaded: one file for the
/// default slot, or a mapping of slot names to files.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SlotConfig {
    Single {
        /// File ID or pasted URL.
        file: String,
        #[serde(default = "default_format")]
        format: ExportFormat,
    },
    /// Slot name -> file ID/URL string, or an object with `file` and
    /// optionally `format`.
    Named(Map<String, Value>),
}

/// A resolved data slot: where to store, what to fetch, in which
/// format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSpec {
    pub slot: String,
    pub file_id: String,
    pub format: ExportFormat,
}

impl SlotConfig {
    /// Flatten the configuration into a uniform slot list, resolving
    /// pasted URLs to bare file IDs. Runs once at startup.
    pub fn resolve(&self) -> Result<Vec<SlotSpec>> {
        match self {
            SlotConfig::Single { file, format } => Ok(vec![SlotSpec {
                slot: DEFAULT_SLOT.to_string(),
                file_id: extract_id(file)?,
                format: *format,
            }]),
            SlotConfig::Named(entries) => {
                let mut specs = Vec::with_capacity(entries.len());
                for (slot, entry) in entries {
                    let (file, format) = match entry {
                        Value::String(file) => (file.clone(), default_format()),
                        Value::Object(fields) => {
                            let file = fields
                                .get("file")
                                .and_then(Value::as_str)
                                .ok_or_else(|| {
                                    DriveError::Configuration(format!(
                                        "Slot '{slot}' is missing a 'file' entry"
                                    ))
                                })?
                                .to_string();
                            let format = match fields.get("format").and_then(Value::as_str) {
                                Some(name) => name.parse()?,
                                None => default_format(),
                            };
                            (file, format)
                        }
                        other => {
                            return Err(DriveError::Configuration(format!(
                                "Slot '{slot}' must map to a file ID or an object, got {other}"
                            )))
                        }
                    };
                    specs.push(SlotSpec {
                        slot: slot.clone(),
                        file_id: extract_id(&file)?,
                        format,
                    });
                }
                Ok(specs)
            }
        }
    }
}

/// Asks the user whether to re-authenticate after a failed fetch.
///
/// Injected into the retry policy so the loop is testable without a
/// console.
pub trait UserPrompt: Send + Sync {
    fn confirm_retry(&self, message: &str) -> bool;
}

/// Console prompt for interactive runs.
pub struct StdinPrompt;

impl UserPrompt for StdinPrompt {
    fn confirm_retry(&self, message: &str) -> bool {
        eprintln!("\n{message}");
        eprint!("Re-authenticate and try again? [y/N] ");
        io::stderr().flush().ok();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

/// Never retries. Used in server mode and in tests.
pub struct NoPrompt;

impl UserPrompt for NoPrompt {
    fn confirm_retry(&self, _message: &str) -> bool {
        false
    }
}

/// Bounded, user-confirmed retry. Declining counts as cancellation.
pub struct RetryPolicy {
    max_attempts: u32,
    prompt: Box<dyn UserPrompt>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, prompt: Box<dyn UserPrompt>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            prompt,
        }
    }

    /// Up to three attempts, confirmed on the console.
    pub fn interactive() -> Self {
        Self::new(3, Box::new(StdinPrompt))
    }

    /// A single attempt, no prompting.
    pub fn none() -> Self {
        Self::new(1, Box::new(NoPrompt))
    }

    fn should_retry(&self, attempt: u32, message: &str) -> bool {
        attempt < self.max_attempts && self.prompt.confirm_retry(message)
    }
}

/// Data loaded for one slot, shaped per its format.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedData {
    /// Shaped spreadsheet: sheet title -> key/value map or record list.
    Workbook(Map<String, Value>),
    /// Parsed ArchieML document.
    Document(Map<String, Value>),
    Text(String),
    Html(String),
}

impl LoadedData {
    fn from_bytes(format: ExportFormat, bytes: &[u8]) -> Result<Self> {
        Ok(match format {
            ExportFormat::Xlsx => {
                LoadedData::Workbook(shaper::shape_workbook(&shaper::parse_xlsx(bytes)?))
            }
            ExportFormat::Archieml => {
                LoadedData::Document(archieml::parse(&String::from_utf8_lossy(bytes)))
            }
            ExportFormat::Txt => LoadedData::Text(String::from_utf8_lossy(bytes).into_owned()),
            ExportFormat::Html => LoadedData::Html(String::from_utf8_lossy(bytes).into_owned()),
        })
    }

    /// The JSON value stored into the host's data namespace.
    pub fn into_value(self) -> Value {
        match self {
            LoadedData::Workbook(map) | LoadedData::Document(map) => Value::Object(map),
            LoadedData::Text(text) | LoadedData::Html(text) => Value::String(text),
        }
    }
}

/// Fetches configured slots, shapes them, and keeps local copies so a
/// build can survive the remote service being unreachable.
pub struct Loader {
    client: DriveClient,
    data_dir: PathBuf,
    retry: RetryPolicy,
}

impl Loader {
    pub fn new(client: DriveClient, data_dir: impl Into<PathBuf>, retry: RetryPolicy) -> Self {
        Self {
            client,
            data_dir: data_dir.into(),
            retry,
        }
    }

    /// Where the raw export for a file is cached.
    pub fn cache_path(&self, file_id: &str, format: ExportFormat) -> PathBuf {
        self.data_dir
            .join(format!("{file_id}.{}", format.extension()))
    }

    /// Fetch and shape one file, refreshing its cache entry on success.
    pub async fn load(&self, file_id: &str, format: ExportFormat) -> Result<LoadedData> {
        let bytes = self.client.export(file_id, format).await?;
        let data = LoadedData::from_bytes(format, &bytes)?;

        if let Err(e) = self.write_cache(file_id, format, &bytes) {
            tracing::warn!("Failed to cache {file_id}: {e}");
        }
        Ok(data)
    }

    /// Read a previously cached export and run the same shaping a fresh
    /// download would get. `None` means no cache entry exists.
    pub fn load_cached(&self, file_id: &str, format: ExportFormat) -> Result<Option<LoadedData>> {
        let path = self.cache_path(file_id, format);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        LoadedData::from_bytes(format, &bytes).map(Some)
    }

    /// Load one file under the documented failure policy.
    ///
    /// Server mode never prompts: a failure is logged and the cache is
    /// the only recourse. Interactive mode offers bounded re-auth
    /// retries through the injected prompt. When all attempts are spent
    /// the cache is tried; `None` signals absence, never a crash.
    pub async fn load_with_fallback(
        &self,
        file_id: &str,
        format: ExportFormat,
    ) -> Option<LoadedData> {
        let mut attempt = 1;
        loop {
            match self.load(file_id, format).await {
                Ok(data) => return Some(data),
                Err(e) if e.is_fatal() => {
                    tracing::error!("Cannot load {file_id}: {e}");
                    break;
                }
                Err(e) => {
                    let kind = if e.is_transport() {
                        "Connection problem"
                    } else {
                        "Google Drive reported an error"
                    };
                    tracing::error!("{kind} while fetching {file_id}: {e}");

                    if self.client.is_server_mode() {
                        break;
                    }
                    let message = format!(
                        "Failed to fetch {file_id}: {e}\nYour credentials may have expired."
                    );
                    if !self.retry.should_retry(attempt, &message) {
                        break;
                    }
                    attempt += 1;
                    if let Err(auth_err) = self.client.reauthenticate().await {
                        tracing::error!("Re-authentication failed: {auth_err}");
                        break;
                    }
                }
            }
        }

        match self.load_cached(file_id, format) {
            Ok(Some(data)) => {
                tracing::info!("Using cached copy of {file_id}");
                Some(data)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Cached copy of {file_id} is unusable: {e}");
                None
            }
        }
    }

    /// Load every slot into a single data map. A failing slot is logged
    /// and skipped; it never aborts the others. Each loaded slot is
    /// also written out as pretty-printed JSON under the data
    /// directory.
    pub async fn load_all(&self, slots: &[SlotSpec]) -> Map<String, Value> {
        let mut data = Map::new();
        for spec in slots {
            match self.load_with_fallback(&spec.file_id, spec.format).await {
                Some(loaded) => {
                    tracing::info!("Loaded slot '{}' from {}", spec.slot, spec.file_id);
                    let value = loaded.into_value();
                    if let Err(e) = self.write_backup(&spec.slot, &value) {
                        tracing::warn!("Failed to write backup for '{}': {e}", spec.slot);
                    }
                    data.insert(spec.slot.clone(), value);
                }
                None => {
                    tracing::warn!("No data for slot '{}' ({})", spec.slot, spec.file_id);
                }
            }
        }
        data
    }

    fn write_cache(&self, file_id: &str, format: ExportFormat, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::write(self.cache_path(file_id, format), bytes)?;
        Ok(())
    }

    fn write_backup(&self, slot: &str, value: &Value) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.data_dir.join(format!("{slot}.json"));
        fs::write(path, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_slot_resolves_to_default_name() {
        let config: SlotConfig =
            serde_json::from_value(json!({"file": "1abcDEF", "format": "txt"})).unwrap();
        let specs = config.resolve().unwrap();
        assert_eq!(
            specs,
            vec![SlotSpec {
                slot: DEFAULT_SLOT.to_string(),
                file_id: "1abcDEF".to_string(),
                format: ExportFormat::Txt,
            }]
        );
    }

    #[test]
    fn test_single_slot_defaults_to_xlsx() {
        let config: SlotConfig = serde_json::from_value(json!({"file": "1abcDEF"})).unwrap();
        assert_eq!(config.resolve().unwrap()[0].format, ExportFormat::Xlsx);
    }

    #[test]
    fn test_named_slots_keep_order_and_accept_urls() {
        let config: SlotConfig = serde_json::from_value(json!({
            "archive": "https://docs.google.com/spreadsheets/d/1vIICbbf/edit#gid=0",
            "about": {"file": "1lH-Nr_8UBO", "format": "archieml"}
        }))
        .unwrap();
        let specs = config.resolve().unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].slot, "archive");
        assert_eq!(specs[0].file_id, "1vIICbbf");
        assert_eq!(specs[0].format, ExportFormat::Xlsx);
        assert_eq!(specs[1].slot, "about");
        assert_eq!(specs[1].format, ExportFormat::Archieml);
    }

    #[test]
    fn test_named_slot_missing_file_is_configuration_error() {
        let config: SlotConfig =
            serde_json::from_value(json!({"about": {"format": "txt"}})).unwrap();
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, DriveError::Configuration(_)));
    }

    #[test]
    fn test_loaded_data_from_text_bytes() {
        let data = LoadedData::from_bytes(ExportFormat::Txt, b"hello world").unwrap();
        assert_eq!(data, LoadedData::Text("hello world".to_string()));
        assert_eq!(data.into_value(), json!("hello world"));
    }

    #[test]
    fn test_loaded_data_from_archieml_bytes() {
        let data = LoadedData::from_bytes(ExportFormat::Archieml, b"key: value").unwrap();
        assert_eq!(data.into_value(), json!({"key": "value"}));
    }

    #[test]
    fn test_retry_policy_bounds_attempts() {
        struct AlwaysYes;
        impl UserPrompt for AlwaysYes {
            fn confirm_retry(&self, _message: &str) -> bool {
                true
            }
        }

        let policy = RetryPolicy::new(2, Box::new(AlwaysYes));
        assert!(policy.should_retry(1, "try again?"));
        assert!(!policy.should_retry(2, "try again?"));
    }

    #[test]
    fn test_retry_policy_decline_is_cancellation() {
        let policy = RetryPolicy::new(5, Box::new(NoPrompt));
        assert!(!policy.should_retry(1, "try again?"));
    }
}
