use std::{
  cell::{Cell, RefCell},
  collections::{BTreeMap, BTreeSet},
};

use jiff::Timestamp;

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
  utils::{base_name, join_path, trim_path},
};

/// An in-memory vault.
///
/// Folder listings skip hidden entries, like the filesystem vault does.
/// Used by tests and by anything that wants to compose a book without
/// touching the disk. Modification times come from a logical clock that
/// advances by one second on every write, so listings sorted by time are
/// deterministic.
#[derive(Debug, Default)]
pub struct MemoryVault {
  folders:    RefCell<BTreeSet<String>>,
  files:      RefCell<BTreeMap<String, StoredFile>>,
  unreadable: RefCell<BTreeSet<String>>,
  unlistable: RefCell<BTreeSet<String>>,
  clock:      Cell<i64>,
}

#[derive(Debug, Clone)]
struct StoredFile {
  contents: String,
  modified: Timestamp,
}

fn parent_of(path: &str) -> &str {
  trim_path(path).rsplit_once('/').map_or("", |(parent, _)| parent)
}

impl MemoryVault {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a folder and all of its ancestors.
  pub fn insert_folder(&self, path: &str) {
    let mut folders = self.folders.borrow_mut();
    let mut current = trim_path(path);
    while !current.is_empty() {
      folders.insert(current.to_string());
      current = parent_of(current);
    }
  }

  /// Add or replace a file, creating its parent folders.
  pub fn insert_file(&self, path: &str, contents: impl Into<String>) {
    let path = trim_path(path);
    self.insert_folder(parent_of(path));
    let modified = self.tick();
    self.files.borrow_mut().insert(path.to_string(), StoredFile {
      contents: contents.into(),
      modified,
    });
  }

  /// Make reads of `path` fail.
  pub fn mark_unreadable(&self, path: &str) {
    self.unreadable.borrow_mut().insert(trim_path(path).to_string());
  }

  /// Make listings of the folder at `path` fail.
  pub fn fail_listing(&self, path: &str) {
    self.unlistable.borrow_mut().insert(trim_path(path).to_string());
  }

  fn tick(&self) -> Timestamp {
    let second = self.clock.get() + 1;
    self.clock.set(second);
    Timestamp::from_second(second).unwrap_or(Timestamp::UNIX_EPOCH)
  }

  fn is_folder(&self, path: &str) -> bool {
    let path = trim_path(path);
    path.is_empty() || self.folders.borrow().contains(path)
  }

  fn children_of(&self, path: &str) -> Vec<(String, String, bool)> {
    let parent = trim_path(path);
    let folders = self.folders.borrow();
    let files = self.files.borrow();

    folders
      .iter()
      .map(|p| (p, true))
      .chain(files.keys().map(|p| (p, false)))
      .filter(|(p, _)| parent_of(p) == parent)
      .map(|(p, is_folder)| (base_name(p).to_string(), p.clone(), is_folder))
      .collect()
  }
}

impl ContentReader for MemoryVault {
  async fn read(&self, path: &str) -> Result<String, ReadError> {
    let path = trim_path(path);
    if self.unreadable.borrow().contains(path) {
      return Err(ReadError::Io {
        path:   path.to_string(),
        source: std::io::Error::new(
          std::io::ErrorKind::PermissionDenied,
          "marked unreadable",
        ),
      });
    }
    self
      .files
      .borrow()
      .get(path)
      .map(|file| file.contents.clone())
      .ok_or_else(|| ReadError::NotFound(path.to_string()))
  }
}

impl FolderProvider for MemoryVault {
  async fn list_children(
    &self,
    path: &str,
  ) -> Result<Vec<TreeEntry>, ProviderError> {
    let key = trim_path(path);
    if self.unlistable.borrow().contains(key) {
      return Err(ProviderError::Io {
        path:   path.to_string(),
        source: std::io::Error::other("listing disabled"),
      });
    }
    if !self.is_folder(key) {
      return Err(if self.files.borrow().contains_key(key) {
        ProviderError::NotAFolder(path.to_string())
      } else {
        ProviderError::NotFound(path.to_string())
      });
    }

    let mut entries: Vec<TreeEntry> = self
      .children_of(key)
      .into_iter()
      .filter(|(name, ..)| !name.starts_with('.'))
      .map(|(name, path, is_folder)| {
        TreeEntry {
          name,
          path,
          is_folder,
        }
      })
      .collect();
    sort_entries(&mut entries);
    Ok(entries)
  }
}

impl ArtifactStorage for MemoryVault {
  async fn exists(&self, path: &str) -> bool {
    let path = trim_path(path);
    self.is_folder(path) || self.files.borrow().contains_key(path)
  }

  async fn create_folder(&self, path: &str) -> Result<(), StorageError> {
    if self.files.borrow().contains_key(trim_path(path)) {
      return Err(StorageError::AlreadyExists(path.to_string()));
    }
    self.insert_folder(path);
    Ok(())
  }

  async fn create_file(
    &self,
    path: &str,
    contents: &str,
  ) -> Result<(), StorageError> {
    let key = trim_path(path);
    if key.is_empty() {
      return Err(StorageError::InvalidPath(path.to_string()));
    }
    if self.files.borrow().contains_key(key) || self.is_folder(key) {
      return Err(StorageError::AlreadyExists(path.to_string()));
    }
    if !self.is_folder(parent_of(key)) {
      return Err(StorageError::NotFound(parent_of(key).to_string()));
    }
    self.insert_file(key, contents);
    Ok(())
  }

  async fn read_file(&self, path: &str) -> Result<String, StorageError> {
    self
      .files
      .borrow()
      .get(trim_path(path))
      .map(|file| file.contents.clone())
      .ok_or_else(|| StorageError::NotFound(path.to_string()))
  }

  async fn list_artifacts(
    &self,
    folder: &str,
  ) -> Result<Vec<ArtifactEntry>, StorageError> {
    let key = trim_path(folder);
    if !self.is_folder(key) {
      return Err(StorageError::NotFound(folder.to_string()));
    }

    let files = self.files.borrow();
    Ok(
      self
        .children_of(key)
        .into_iter()
        .map(|(name, path, is_folder)| {
          let modified = files.get(&path).map(|file| file.modified);
          ArtifactEntry {
            path: join_path(key, &name),
            name,
            is_folder,
            modified,
          }
        })
        .collect(),
    )
  }
}
