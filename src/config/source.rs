//! Where configurations come from

use super::{Config, ConfigError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Produces validated configurations on demand.
///
/// Called once at startup and again on every reload. An error at startup is
/// fatal; an error on reload leaves the running generation untouched.
#[async_trait]
pub trait ConfigSource: Send + Sync + 'static {
    /// Loads and validates a fresh configuration
    async fn load(&self) -> Result<Config, ConfigError>;
}

/// Reads the configuration from a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Creates a source reading `path` on every load
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the configuration file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn check_directories(&self, config: &Config) -> Result<(), ConfigError> {
        for task in &config.tasks {
            let reason = match tokio::fs::metadata(&task.working_dir).await {
                Ok(meta) if meta.is_dir() => continue,
                Ok(_) => "not a directory".to_string(),
                Err(err) => err.to_string(),
            };
            return Err(ConfigError::WorkingDirectory {
                task: task.name.clone(),
                path: task.working_dir.clone(),
                reason,
            });
        }

        tokio::fs::create_dir_all(&config.log_dir)
            .await
            .map_err(|source| ConfigError::LogDirectory {
                path: config.log_dir.clone(),
                source,
            })
    }
}

#[async_trait]
impl ConfigSource for JsonFileSource {
    async fn load(&self) -> Result<Config, ConfigError> {
        if self.path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            return Err(ConfigError::Format(self.path.clone()));
        }

        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ConfigError::Read {
                path: self.path.clone(),
                source,
            })?;

        let config: Config = serde_json::from_str(&data).map_err(|err| ConfigError::Parse {
            path: self.path.clone(),
            reason: err.to_string(),
        })?;

        config.validate()?;
        self.check_directories(&config).await?;
        Ok(config)
    }
}
