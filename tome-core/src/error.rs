//! Error types shared by the composition pipeline and its collaborators.
use std::io;

use thiserror::Error;

/// Failure to retrieve one note's content.
///
/// The composer recovers from these locally; a single unreadable note never
/// fails the whole book.
#[derive(Debug, Error)]
pub enum ReadError {
  #[error("note not found: {0}")]
  NotFound(String),

  #[error("note is not valid UTF-8: {0}")]
  InvalidUtf8(String),

  #[error("failed to read {path}: {source}")]
  Io {
    path:   String,
    #[source]
    source: io::Error,
  },
}

/// Failure to enumerate a folder.
#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("folder not found: {0}")]
  NotFound(String),

  #[error("not a folder: {0}")]
  NotAFolder(String),

  #[error("failed to list {path}: {source}")]
  Io {
    path:   String,
    #[source]
    source: io::Error,
  },
}

/// Failure of the recursive walk itself. Unlike [`ReadError`] these abort
/// the composition; no partial document is produced.
#[derive(Debug, Error)]
pub enum CompositionError {
  #[error("failed to enumerate folder {path}: {source}")]
  Provider {
    path:   String,
    #[source]
    source: ProviderError,
  },

  #[error("folder nesting exceeds {limit} levels at {path}")]
  TooDeep { path: String, limit: usize },

  #[error("folder {0} is contained in itself")]
  Cycle(String),

  #[error("cannot compose {0}: not a folder")]
  NotAFolder(String),
}

/// Failure of the artifact storage used for snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("artifact already exists: {0}")]
  AlreadyExists(String),

  #[error("artifact not found: {0}")]
  NotFound(String),

  #[error("invalid artifact path: {0}")]
  InvalidPath(String),

  #[error("storage I/O error at {path}: {source}")]
  Io {
    path:   String,
    #[source]
    source: io::Error,
  },
}

/// Failure to render a single chunk or page. Swallowed by the delivery
/// controller, which reports it through the surface and carries on.
#[derive(Debug, Error)]
pub enum RenderError {
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  #[error("render error: {0}")]
  Other(String),
}
