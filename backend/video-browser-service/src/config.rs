/// Configuration management for video-browser-service
///
/// Command-line flags (each with an environment fallback) are parsed once
/// at startup into an immutable `Config`.
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::catalog::{VideoSuffixes, DEFAULT_VIDEO_SUFFIX};
use crate::storage::gcs::DEFAULT_API_BASE;
use crate::storage::ServiceAccountKey;

/// Bucket holding the videos
pub const BUCKET_NAME: &str = "videos.example.com";
/// Project owning the bucket
pub const PROJECT_ID: &str = "video-browser";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no signing identity: pass --google-access-id or a credentials file with client_email")]
    MissingAccessId,

    #[error("failed to read credentials: {0}")]
    Credentials(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Lists and plays videos stored in a Cloud Storage bucket
#[derive(Debug, Clone, Parser)]
#[command(name = "video-browser-service", version)]
pub struct Cli {
    /// Service account JSON key; empty to use the compute metadata server
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS", default_value = "key.json")]
    pub creds: String,

    /// IP of host to run webserver on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to run webserver on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Service account email used as the signing identity
    #[arg(long, env = "GOOGLE_ACCESS_ID")]
    pub google_access_id: Option<String>,

    /// PEM file with the private key for URL signing
    #[arg(long, env = "PEM_FILENAME", default_value = "key.pem")]
    pub pem_filename: PathBuf,

    /// Directory holding index.html and play.html
    #[arg(long, env = "TEMPLATES_DIR", default_value = "templates")]
    pub templates_dir: PathBuf,

    #[arg(long, env = "BUCKET_NAME", default_value = BUCKET_NAME)]
    pub bucket: String,

    #[arg(long, env = "PROJECT_ID", default_value = PROJECT_ID)]
    pub project_id: String,

    /// Storage JSON API endpoint
    #[arg(long, env = "STORAGE_API_BASE", default_value = DEFAULT_API_BASE)]
    pub storage_api_base: String,

    /// Object name suffix that marks a video (repeatable)
    #[arg(long = "video-suffix", default_value = DEFAULT_VIDEO_SUFFIX)]
    pub video_suffixes: Vec<String>,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub gcs: GcsConfig,
    pub signing: SigningConfig,
    pub templates: TemplateConfig,
    pub catalog: CatalogConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

#[derive(Clone, Debug)]
pub struct GcsConfig {
    pub bucket: String,
    pub project_id: String,
    /// `None` selects the metadata server for access tokens
    pub credentials_path: Option<PathBuf>,
    pub api_base: String,
}

#[derive(Clone, Debug)]
pub struct SigningConfig {
    pub google_access_id: String,
    pub pem_filename: PathBuf,
}

#[derive(Clone, Debug)]
pub struct TemplateConfig {
    pub dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub video_suffixes: VideoSuffixes,
}

impl AppConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Parse process arguments and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(Cli::parse())
    }

    /// Resolve parsed flags, reading the credentials file when the signing
    /// identity has to come from it
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let credentials_path = match cli.creds.trim() {
            "" => None,
            path => Some(PathBuf::from(path)),
        };

        let google_access_id = match (cli.google_access_id, credentials_path.as_ref()) {
            (Some(id), _) if !id.trim().is_empty() => id,
            (_, Some(path)) => {
                ServiceAccountKey::from_file(path)
                    .map_err(|e| ConfigError::Credentials(e.to_string()))?
                    .client_email
            }
            (_, None) => return Err(ConfigError::MissingAccessId),
        };

        Ok(Config {
            app: AppConfig {
                host: cli.host,
                port: cli.port,
                log_format: cli.log_format,
            },
            gcs: GcsConfig {
                bucket: cli.bucket,
                project_id: cli.project_id,
                credentials_path,
                api_base: cli.storage_api_base,
            },
            signing: SigningConfig {
                google_access_id,
                pem_filename: cli.pem_filename,
            },
            templates: TemplateConfig {
                dir: cli.templates_dir,
            },
            catalog: CatalogConfig {
                video_suffixes: VideoSuffixes::new(cli.video_suffixes),
            },
        })
    }
}
