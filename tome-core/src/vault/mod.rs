//! Access to the note store.
//!
//! The composer only ever sees these traits. Paths are `/`-separated,
//! relative to the vault root, and `/` (or the empty string) is the root.
//!
//! The traits return plain `impl Future` and do not require `Send`;
//! implementors are free to write `async fn`.
use std::future::Future;

use jiff::Timestamp;
use serde::Serialize;

use crate::error::{ProviderError, ReadError, StorageError};

#[cfg(feature = "fs")] mod fs;
mod memory;

#[cfg(feature = "fs")] pub use fs::FsVault;
pub use memory::MemoryVault;

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
  pub name:      String,
  /// Full vault path; empty means "parent path joined with `name`".
  pub path:      String,
  pub is_folder: bool,
}

impl TreeEntry {
  #[must_use]
  pub fn folder(name: impl Into<String>, path: impl Into<String>) -> Self {
    Self {
      name:      name.into(),
      path:      path.into(),
      is_folder: true,
    }
  }

  #[must_use]
  pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
    Self {
      name:      name.into(),
      path:      path.into(),
      is_folder: false,
    }
  }
}

/// One entry of an artifact folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactEntry {
  pub name:      String,
  pub path:      String,
  pub is_folder: bool,
  pub modified:  Option<Timestamp>,
}

/// Reads note bodies.
pub trait ContentReader {
  /// Read the full text of the note at `path`.
  fn read(&self, path: &str) -> impl Future<Output = Result<String, ReadError>>;
}

/// Enumerates folders.
pub trait FolderProvider {
  /// Direct children of the folder at `path`, in display order.
  fn list_children(
    &self,
    path: &str,
  ) -> impl Future<Output = Result<Vec<TreeEntry>, ProviderError>>;
}

/// Write-once storage for named artifacts such as snapshots.
pub trait ArtifactStorage {
  fn exists(&self, path: &str) -> impl Future<Output = bool>;

  /// Create a folder. Succeeds if it already exists.
  fn create_folder(
    &self,
    path: &str,
  ) -> impl Future<Output = Result<(), StorageError>>;

  /// Create a new file holding `contents`.
  ///
  /// Fails with [`StorageError::AlreadyExists`] instead of overwriting, and
  /// leaves nothing behind when the write fails part way.
  fn create_file(
    &self,
    path: &str,
    contents: &str,
  ) -> impl Future<Output = Result<(), StorageError>>;

  fn read_file(
    &self,
    path: &str,
  ) -> impl Future<Output = Result<String, StorageError>>;

  /// Direct children of `folder`. A missing folder is
  /// [`StorageError::NotFound`].
  fn list_artifacts(
    &self,
    folder: &str,
  ) -> impl Future<Output = Result<Vec<ArtifactEntry>, StorageError>>;
}

/// Everything a book session needs from its store.
pub trait Vault: FolderProvider + ContentReader + ArtifactStorage {}

impl<T: FolderProvider + ContentReader + ArtifactStorage> Vault for T {}

/// Display order for a listing: folders first, then by name ignoring case.
pub(crate) fn sort_entries(entries: &mut [TreeEntry]) {
  entries.sort_by(|a, b| {
    b.is_folder
      .cmp(&a.is_folder)
      .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
      .then_with(|| a.name.cmp(&b.name))
  });
}
