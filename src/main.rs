//! drive_data CLI - Load Google Drive content into build data.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use drive_data::{
    extract_id, Authenticator, DriveClient, DriveConfig, ExportFormat, Loader, RetryPolicy,
    SlotConfig,
};

/// CLI for loading Google Drive spreadsheets and documents as site data.
#[derive(Parser)]
#[command(name = "drive_data")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Where the interactive OAuth token is persisted between runs.
    #[arg(long, env = "GOOGLE_DRIVE_OAUTH")]
    credentials: Option<PathBuf>,

    /// Path to client_secrets.json for interactive auth.
    #[arg(long, env = "GOOGLE_CLIENT_SECRETS")]
    client_secrets: Option<PathBuf>,

    /// Account to impersonate with a service account.
    #[arg(long, env = "GOOGLE_OAUTH_PERSON")]
    person: Option<String>,

    /// Service account issuer (client email).
    #[arg(long, env = "GOOGLE_OAUTH_ISSUER")]
    issuer: Option<String>,

    /// Path to a service account JSON key file.
    #[arg(long, env = "GOOGLE_OAUTH_KEYFILE")]
    keyfile: Option<PathBuf>,

    /// Inline PEM private key, as an alternative to a key file.
    #[arg(long, env = "GOOGLE_OAUTH_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Directory for cached exports and JSON backups.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load configured data slots and print the combined JSON.
    Load {
        /// JSON file mapping slot names to file IDs/URLs.
        #[arg(long, conflicts_with = "file")]
        config: Option<PathBuf>,

        /// Single file ID or URL, stored under the default slot.
        #[arg(long)]
        file: Option<String>,

        /// Export format for --file.
        #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
        format: ExportFormat,
    },

    /// Export a file to disk.
    Export {
        /// File URL or ID.
        file: String,

        #[arg(long, value_enum)]
        format: ExportFormat,

        /// Destination path; a kept temp file is used when omitted.
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Copy a file within Drive.
    Copy {
        /// File URL or ID.
        file: String,

        /// Title for the copy; the original title is kept when omitted.
        #[arg(long)]
        title: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = build_config(&cli);

    let auth = Authenticator::connect(&config)
        .await
        .context("Failed to authenticate with Google Drive")?;
    let client = DriveClient::new(auth);

    match cli.command {
        Commands::Load {
            config: config_path,
            file,
            format,
        } => {
            let slot_config = match (config_path, file) {
                (Some(path), None) => {
                    let content = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read slot config {:?}", path))?;
                    serde_json::from_str::<SlotConfig>(&content)
                        .with_context(|| format!("Invalid slot config in {:?}", path))?
                }
                (None, Some(file)) => SlotConfig::Single { file, format },
                _ => anyhow::bail!("Pass exactly one of --config or --file"),
            };
            let slots = slot_config.resolve()?;

            let retry = if client.is_server_mode() {
                RetryPolicy::none()
            } else {
                RetryPolicy::interactive()
            };
            let loader = Loader::new(client, cli.data_dir.clone(), retry);

            let data = loader.load_all(&slots).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(data))?
            );
        }

        Commands::Export { file, format, out } => {
            let file_id =
                extract_id(&file).with_context(|| format!("Invalid file URL or ID: {}", file))?;

            let path = client
                .export_to_file(&file_id, format, out.as_deref())
                .await
                .with_context(|| format!("Failed to export file: {}", file_id))?;

            println!("Saved to: {:?}", path);
        }

        Commands::Copy { file, title } => {
            let file_id =
                extract_id(&file).with_context(|| format!("Invalid file URL or ID: {}", file))?;

            let copied = client
                .copy(&file_id, title.as_deref())
                .await
                .with_context(|| format!("Failed to copy file: {}", file_id))?;

            println!("Copied as {}", copied.id);
            if let Some(url) = copied.url {
                println!("{url}");
            }
        }
    }

    Ok(())
}

/// clap already resolved the environment for every flag, so the
/// defaults are the only thing taken from [`DriveConfig::default`].
fn build_config(cli: &Cli) -> DriveConfig {
    let mut config = DriveConfig::default();
    if let Some(path) = &cli.credentials {
        config.credentials_path = path.clone();
    }
    if let Some(path) = &cli.client_secrets {
        config.client_secrets_path = path.clone();
    }
    config.person = cli.person.clone();
    config.issuer = cli.issuer.clone();
    config.key_path = cli.keyfile.clone();
    config.private_key = cli.private_key.clone();
    config
}
