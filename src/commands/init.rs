use crate::commands::Out;
use crate::config::DEFAULT_API_URL;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory and an initial `config.json`.
///
/// # Arguments
/// - `home` - The directory that will hold the configuration, e.g. `$HOME/spend-dash`
/// - `api_url` - The base URL of the backend. `http://localhost:8000` when `None`.
///
/// # Errors
/// - Returns an error if the URL is invalid, a config already exists, or file operations fail.
pub async fn init(home: &Path, api_url: Option<&str>) -> Result<Out<()>> {
    let config = Config::create(home, api_url.unwrap_or(DEFAULT_API_URL))
        .await
        .context("Unable to create the home directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created '{}' using the backend at {}",
        config.config_path().display(),
        config.api_url()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let out = init(&home, None).await.unwrap();
        assert!(out.message().contains("http://localhost:8000"));
        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
    }

    #[tokio::test]
    async fn test_init_twice_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        init(dir.path(), Some("http://127.0.0.1:9000")).await.unwrap();
        let err = init(dir.path(), None).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Config));
    }
}
