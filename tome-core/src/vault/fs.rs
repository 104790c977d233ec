use std::{
  io,
  path::{Path, PathBuf},
};

use jiff::Timestamp;
use log::{debug, trace};
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use super::{
  ArtifactEntry,
  ArtifactStorage,
  ContentReader,
  FolderProvider,
  TreeEntry,
  sort_entries,
};
use crate::{
  error::{ProviderError, ReadError, StorageError},
  utils::{join_path, trim_path},
};

/// A vault backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsVault {
  root:        PathBuf,
  show_hidden: bool,
}

impl FsVault {
  /// Open the vault rooted at `root`. Hidden entries (leading `.`) are
  /// skipped in folder listings.
  #[must_use]
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root:        root.into(),
      show_hidden: false,
    }
  }

  /// Include hidden entries in folder listings.
  #[must_use]
  pub const fn with_hidden(mut self, show_hidden: bool) -> Self {
    self.show_hidden = show_hidden;
    self
  }

  #[must_use]
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Map a vault path onto the filesystem. Paths that try to escape the root
  /// through `..` are rejected.
  #[must_use]
  pub fn resolve(&self, path: &str) -> Option<PathBuf> {
    let mut full = self.root.clone();
    for segment in trim_path(path).split('/') {
      match segment {
        "" | "." => {},
        ".." => return None,
        segment => full.push(segment),
      }
    }
    Some(full)
  }

  /// Every markdown note below `path`, in filesystem walk order.
  #[must_use]
  pub fn collect_markdown_files(&self, path: &str) -> Vec<PathBuf> {
    let Some(start) = self.resolve(path) else {
      return Vec::new();
    };
    let show_hidden = self.show_hidden;

    let mut files = Vec::with_capacity(100);
    for entry in WalkDir::new(&start)
      .follow_links(false)
      .into_iter()
      .filter_entry(|e| show_hidden || e.depth() == 0 || !is_hidden(e.path()))
      .filter_map(Result::ok)
    {
      let path = entry.path();
      if entry.file_type().is_file()
        && path.extension().is_some_and(|ext| ext == "md")
      {
        files.push(path.to_owned());
      }
    }

    trace!("Found {} markdown files under {}", files.len(), start.display());
    files
  }
}

fn is_hidden(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|name| name.to_str())
    .is_some_and(|name| name.starts_with('.'))
}

fn storage_io(path: &str, source: io::Error) -> StorageError {
  match source.kind() {
    io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
    io::ErrorKind::AlreadyExists => {
      StorageError::AlreadyExists(path.to_string())
    },
    _ => {
      StorageError::Io {
        path: path.to_string(),
        source,
      }
    },
  }
}

impl ContentReader for FsVault {
  async fn read(&self, path: &str) -> Result<String, ReadError> {
    let full = self
      .resolve(path)
      .ok_or_else(|| ReadError::NotFound(path.to_string()))?;

    let bytes = tokio::fs::read(&full).await.map_err(|source| {
      if source.kind() == io::ErrorKind::NotFound {
        ReadError::NotFound(path.to_string())
      } else {
        ReadError::Io {
          path: path.to_string(),
          source,
        }
      }
    })?;

    String::from_utf8(bytes).map_err(|_| ReadError::InvalidUtf8(path.to_string()))
  }
}

impl FolderProvider for FsVault {
  async fn list_children(
    &self,
    path: &str,
  ) -> Result<Vec<TreeEntry>, ProviderError> {
    let full = self
      .resolve(path)
      .ok_or_else(|| ProviderError::NotFound(path.to_string()))?;

    let metadata = tokio::fs::metadata(&full).await.map_err(|source| {
      if source.kind() == io::ErrorKind::NotFound {
        ProviderError::NotFound(path.to_string())
      } else {
        ProviderError::Io {
          path: path.to_string(),
          source,
        }
      }
    })?;
    if !metadata.is_dir() {
      return Err(ProviderError::NotAFolder(path.to_string()));
    }

    let io_err = |source| {
      ProviderError::Io {
        path: path.to_string(),
        source,
      }
    };
    let mut dir = tokio::fs::read_dir(&full).await.map_err(io_err)?;
    let mut entries = Vec::new();
    while let Some(entry) = dir.next_entry().await.map_err(io_err)? {
      let name = entry.file_name().to_string_lossy().into_owned();
      if !self.show_hidden && name.starts_with('.') {
        continue;
      }
      let is_folder = entry
        .file_type()
        .await
        .is_ok_and(|file_type| file_type.is_dir());
      entries.push(TreeEntry {
        path: join_path(path, &name),
        name,
        is_folder,
      });
    }

    sort_entries(&mut entries);
    Ok(entries)
  }
}

impl ArtifactStorage for FsVault {
  async fn exists(&self, path: &str) -> bool {
    match self.resolve(path) {
      Some(full) => tokio::fs::try_exists(full).await.unwrap_or(false),
      None => false,
    }
  }

  async fn create_folder(&self, path: &str) -> Result<(), StorageError> {
    let full = self
      .resolve(path)
      .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?;
    tokio::fs::create_dir_all(&full)
      .await
      .map_err(|source| storage_io(path, source))?;
    debug!("Created folder {}", full.display());
    Ok(())
  }

  async fn create_file(
    &self,
    path: &str,
    contents: &str,
  ) -> Result<(), StorageError> {
    let full = self
      .resolve(path)
      .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?;

    let mut file = tokio::fs::OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(&full)
      .await
      .map_err(|source| storage_io(path, source))?;

    let written = async {
      file.write_all(contents.as_bytes()).await?;
      file.sync_all().await
    }
    .await;

    if let Err(source) = written {
      drop(file);
      if let Err(e) = tokio::fs::remove_file(&full).await {
        debug!("Could not remove partial artifact {}: {e}", full.display());
      }
      return Err(StorageError::Io {
        path: path.to_string(),
        source,
      });
    }

    debug!("Wrote {} bytes to {}", contents.len(), full.display());
    Ok(())
  }

  async fn read_file(&self, path: &str) -> Result<String, StorageError> {
    let full = self
      .resolve(path)
      .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?;
    tokio::fs::read_to_string(&full)
      .await
      .map_err(|source| storage_io(path, source))
  }

  async fn list_artifacts(
    &self,
    folder: &str,
  ) -> Result<Vec<ArtifactEntry>, StorageError> {
    let full = self
      .resolve(folder)
      .ok_or_else(|| StorageError::InvalidPath(folder.to_string()))?;

    let mut dir = tokio::fs::read_dir(&full)
      .await
      .map_err(|source| storage_io(folder, source))?;
    let mut entries = Vec::new();
    while let Some(entry) = dir
      .next_entry()
      .await
      .map_err(|source| storage_io(folder, source))?
    {
      let name = entry.file_name().to_string_lossy().into_owned();
      let metadata = entry.metadata().await.ok();
      let modified = metadata
        .as_ref()
        .and_then(|m| m.modified().ok())
        .and_then(|t| Timestamp::try_from(t).ok());
      entries.push(ArtifactEntry {
        path: join_path(folder, &name),
        is_folder: metadata.as_ref().is_some_and(std::fs::Metadata::is_dir),
        name,
        modified,
      });
    }
    Ok(entries)
  }
}
