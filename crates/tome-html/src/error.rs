use std::io;

use thiserror::Error;

/// Error type for tome-html operations
#[derive(Debug, Error)]
pub enum HtmlError {
  #[error("Template error: {0}")]
  Template(#[from] tera::Error),

  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
}
