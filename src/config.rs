//! Configuration file handling.
//!
//! The configuration file is stored at `$SPEND_DASH_HOME/config.json` and records where the
//! statement-parsing backend lives.

use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

const APP_NAME: &str = "spend-dash";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";

/// Where the backend listens when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to the home directory and from there it loads `config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_url_override: Option<String>,
}

impl Config {
    /// Creates the home directory, if needed, and writes an initial `config.json` pointing at
    /// `api_url`.
    ///
    /// # Errors
    /// - Returns an error if `api_url` is not a URL or if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, api_url: &str) -> Result<Self> {
        validate_url(api_url)?;
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        let config_path = root.join(CONFIG_JSON);
        if config_path.is_file() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }

        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;
        debug!("Created {}", config_path.display());

        Ok(Self {
            root,
            config_path,
            config_file,
            api_url_override: None,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        if !maybe_relative.is_dir() {
            bail!(
                "The home directory is missing '{}', run 'spend-dash init' first",
                maybe_relative.display()
            );
        }
        let root = utils::canonicalize(&maybe_relative).await?;
        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!(
                "The config file is missing '{}', run 'spend-dash init' first",
                config_path.display()
            )
        }
        let config_file = ConfigFile::load(&config_path).await?;
        Ok(Self {
            root,
            config_path,
            config_file,
            api_url_override: None,
        })
    }

    /// Uses `api_url` instead of the stored URL for this run. Nothing is written to disk.
    pub fn with_api_url(mut self, api_url: Option<&str>) -> Result<Self> {
        if let Some(url) = api_url {
            validate_url(url)?;
            debug!("Using API URL '{url}' from the command line");
            self.api_url_override = Some(url.to_string());
        }
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn api_url(&self) -> &str {
        self.api_url_override
            .as_deref()
            .unwrap_or(&self.config_file.api_url)
    }
}

fn validate_url(api_url: &str) -> Result<()> {
    let url = Url::parse(api_url).with_context(|| format!("Invalid API URL '{api_url}'"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("The API URL must use http or https, got '{api_url}'");
    }
    Ok(())
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "spend-dash",
///   "config_version": 1,
///   "api_url": "http://localhost:8000"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "spend-dash"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the statement-parsing backend
    #[serde(default = "default_api_url")]
    api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: default_api_url(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        validate_url(&config.api_url)?;
        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}
