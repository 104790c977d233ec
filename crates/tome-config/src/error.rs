use std::{io, path::PathBuf};

use thiserror::Error;

use crate::templates::TemplateError;

/// Error type for tome-config operations
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Template error: {0}")]
  Template(#[from] TemplateError),

  #[error("Failed to read config file {}: {source}", path.display())]
  Read {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to write {}: {source}", path.display())]
  Write {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to parse JSON config from {}: {source}", path.display())]
  Json {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("Failed to parse TOML config from {}: {source}", path.display())]
  Toml {
    path:   PathBuf,
    #[source]
    source: toml::de::Error,
  },
}
