//! Named, immutable copies of a composed document.
//!
//! A snapshot is a markdown artifact with a small front-matter block
//! recording where it came from:
//!
//! ```text
//! ---
//! snapshot_name: Draft 1
//! created_date: 2025-01-31T09:30:00Z
//! source_folder: Book
//! source_path: Book
//! ---
//!
//! # Book
//! ...
//! ```
//!
//! Snapshots are never overwritten. Saving under an existing name fails.
use jiff::{Timestamp, Zoned};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::{
  error::StorageError,
  utils::{join_path, trim_path},
  vault::ArtifactStorage,
};

/// Folder snapshots are kept in unless configured otherwise.
pub const DEFAULT_SNAPSHOT_FOLDER: &str = ".snapshots";

const SNAPSHOT_SUFFIX: &str = ".md";
const DELIMITER: &str = "---";

#[derive(Debug, Error)]
pub enum SnapshotError {
  #[error("a snapshot named '{0}' already exists")]
  AlreadyExists(String),

  #[error("snapshot not found: {0}")]
  NotFound(String),

  #[error("invalid snapshot name '{0}'")]
  InvalidName(String),

  #[error("snapshot storage error: {0}")]
  Storage(#[from] StorageError),
}

/// What a snapshot was composed from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Provenance {
  /// Display name of the source folder.
  pub source_folder: String,
  /// Vault path of the source folder.
  pub source_path:   String,
}

/// Header fields of a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SnapshotMetadata {
  pub snapshot_name: String,
  pub created_date:  Option<Timestamp>,
  pub source_folder: String,
  pub source_path:   String,
}

/// A snapshot as found in its folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
  pub name:     String,
  pub path:     String,
  pub modified: Option<Timestamp>,
}

/// Default name offered for a new snapshot, e.g. `2025-01-31_09:30`.
#[must_use]
pub fn default_snapshot_name(now: &Zoned) -> String {
  now.strftime("%Y-%m-%d_%H:%M").to_string()
}

/// Check a snapshot name and return it trimmed, without a trailing `.md`
/// (the artifact suffix is added on save).
///
/// # Errors
///
/// Returns [`SnapshotError::InvalidName`] for empty names, `.` and `..`, and
/// names containing path separators or line breaks.
pub fn validate_name(name: &str) -> Result<&str, SnapshotError> {
  let trimmed = name.trim().trim_end_matches(SNAPSHOT_SUFFIX).trim_end();
  if trimmed.is_empty()
    || trimmed == "."
    || trimmed == ".."
    || trimmed.contains(['/', '\\', '\r', '\n'])
  {
    return Err(SnapshotError::InvalidName(name.to_string()));
  }
  Ok(trimmed)
}

/// Split a stored artifact into its header block (without delimiters) and
/// the document. Artifacts without a header are all document.
#[must_use]
pub fn split_artifact(raw: &str) -> (Option<&str>, &str) {
  let Some(rest) = raw.strip_prefix("---\n") else {
    return (None, raw);
  };

  let (header, body) = if let Some(body) = rest.strip_prefix("---\n") {
    ("", body)
  } else if let Some(end) = rest.find("\n---\n") {
    (&rest[..end], &rest[end + 5..])
  } else {
    return (None, raw);
  };

  (Some(header), body.strip_prefix('\n').unwrap_or(body))
}

fn parse_metadata(header: &str) -> SnapshotMetadata {
  let mut metadata = SnapshotMetadata::default();
  for line in header.lines() {
    let Some((key, value)) = line.split_once(':') else {
      continue;
    };
    let value = value.trim();
    match key.trim() {
      "snapshot_name" => metadata.snapshot_name = value.to_string(),
      "created_date" => metadata.created_date = value.parse().ok(),
      "source_folder" => metadata.source_folder = value.to_string(),
      "source_path" => metadata.source_path = value.to_string(),
      other => debug!("Ignoring unknown snapshot header field '{other}'"),
    }
  }
  metadata
}

fn header_value(value: &str) -> String {
  value.replace(['\r', '\n'], " ")
}

fn render_artifact(
  name: &str,
  created: Timestamp,
  provenance: &Provenance,
  document: &str,
) -> String {
  format!(
    "{DELIMITER}\nsnapshot_name: {name}\ncreated_date: {created}\nsource_folder: \
     {}\nsource_path: {}\n{DELIMITER}\n\n{document}",
    header_value(&provenance.source_folder),
    header_value(&provenance.source_path),
  )
}

/// Saves, loads and lists snapshots in one folder of an
/// [`ArtifactStorage`].
#[derive(Debug)]
pub struct SnapshotStore<'a, A> {
  storage: &'a A,
  folder:  String,
}

impl<'a, A: ArtifactStorage> SnapshotStore<'a, A> {
  #[must_use]
  pub fn new(storage: &'a A, folder: &str) -> Self {
    let folder = trim_path(folder);
    Self {
      storage,
      folder: if folder.is_empty() {
        DEFAULT_SNAPSHOT_FOLDER.to_string()
      } else {
        folder.to_string()
      },
    }
  }

  #[must_use]
  pub fn folder(&self) -> &str {
    &self.folder
  }

  /// Artifact path for a snapshot name, or the identifier itself when it is
  /// already a path.
  #[must_use]
  pub fn artifact_path(&self, identifier: &str) -> String {
    let id = identifier.trim();
    if id.contains('/') {
      return trim_path(id).to_string();
    }
    if id.ends_with(SNAPSHOT_SUFFIX) {
      join_path(&self.folder, id)
    } else {
      join_path(&self.folder, &format!("{id}{SNAPSHOT_SUFFIX}"))
    }
  }

  /// Save `document` as a new snapshot called `name`.
  ///
  /// # Errors
  ///
  /// Fails with [`SnapshotError::InvalidName`], with
  /// [`SnapshotError::AlreadyExists`] when the name is taken, or with
  /// [`SnapshotError::Storage`] when writing fails. Nothing is left behind
  /// on failure.
  pub async fn save(
    &self,
    name: &str,
    document: &str,
    provenance: &Provenance,
  ) -> Result<SnapshotEntry, SnapshotError> {
    self.save_at(name, document, provenance, Timestamp::now()).await
  }

  /// [`Self::save`] with an explicit creation time.
  ///
  /// # Errors
  ///
  /// See [`Self::save`].
  pub async fn save_at(
    &self,
    name: &str,
    document: &str,
    provenance: &Provenance,
    created: Timestamp,
  ) -> Result<SnapshotEntry, SnapshotError> {
    let name = validate_name(name)?;
    let path = join_path(&self.folder, &format!("{name}{SNAPSHOT_SUFFIX}"));

    if self.storage.exists(&path).await {
      return Err(SnapshotError::AlreadyExists(name.to_string()));
    }
    if !self.storage.exists(&self.folder).await {
      debug!("Creating snapshot folder {}", self.folder);
      self.storage.create_folder(&self.folder).await?;
    }

    let contents = render_artifact(name, created, provenance, document);
    self
      .storage
      .create_file(&path, &contents)
      .await
      .map_err(|e| {
        match e {
          StorageError::AlreadyExists(_) => {
            SnapshotError::AlreadyExists(name.to_string())
          },
          other => SnapshotError::Storage(other),
        }
      })?;

    info!("Saved snapshot '{name}' to {path}");
    Ok(SnapshotEntry {
      name: name.to_string(),
      path,
      modified: Some(created),
    })
  }

  /// Load the document stored under a snapshot name or artifact path.
  ///
  /// # Errors
  ///
  /// Returns [`SnapshotError::NotFound`] when there is no such snapshot.
  pub async fn load(&self, identifier: &str) -> Result<String, SnapshotError> {
    let raw = self.read_raw(identifier).await?;
    Ok(split_artifact(&raw).1.to_string())
  }

  /// Load a snapshot together with its header fields.
  ///
  /// # Errors
  ///
  /// See [`Self::load`].
  pub async fn load_with_metadata(
    &self,
    identifier: &str,
  ) -> Result<(SnapshotMetadata, String), SnapshotError> {
    let raw = self.read_raw(identifier).await?;
    let (header, body) = split_artifact(&raw);
    let metadata = header.map(parse_metadata).unwrap_or_default();
    Ok((metadata, body.to_string()))
  }

  /// Snapshots in the folder, newest first. A folder that does not exist
  /// yet holds no snapshots.
  ///
  /// # Errors
  ///
  /// Returns [`SnapshotError::Storage`] when the folder cannot be listed.
  pub async fn list(&self) -> Result<Vec<SnapshotEntry>, SnapshotError> {
    if !self.storage.exists(&self.folder).await {
      return Ok(Vec::new());
    }
    let artifacts = match self.storage.list_artifacts(&self.folder).await {
      Ok(artifacts) => artifacts,
      Err(StorageError::NotFound(_)) => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };

    let mut entries: Vec<SnapshotEntry> = artifacts
      .into_iter()
      .filter(|a| !a.is_folder)
      .filter_map(|a| {
        let name = a.name.strip_suffix(SNAPSHOT_SUFFIX)?.to_string();
        Some(SnapshotEntry {
          name,
          path: a.path,
          modified: a.modified,
        })
      })
      .collect();

    entries.sort_by(|a, b| {
      b.modified
        .cmp(&a.modified)
        .then_with(|| a.name.cmp(&b.name))
    });
    Ok(entries)
  }

  async fn read_raw(&self, identifier: &str) -> Result<String, SnapshotError> {
    if identifier.trim().is_empty() {
      return Err(SnapshotError::NotFound(identifier.to_string()));
    }
    let path = self.artifact_path(identifier);
    self.storage.read_file(&path).await.map_err(|e| {
      match e {
        StorageError::NotFound(_) | StorageError::InvalidPath(_) => {
          SnapshotError::NotFound(identifier.to_string())
        },
        other => SnapshotError::Storage(other),
      }
    })
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]
  use super::*;
  use crate::vault::MemoryVault;

  fn provenance() -> Provenance {
    Provenance {
      source_folder: "Book".to_string(),
      source_path:   "Library/Book".to_string(),
    }
  }

  #[test]
  fn test_default_name_format() {
    let now: Zoned = "2025-01-31T09:05:00[UTC]".parse().unwrap();
    assert_eq!(default_snapshot_name(&now), "2025-01-31_09:05");
  }

  #[test]
  fn test_validate_name() {
    assert_eq!(validate_name("  Draft 1 ").unwrap(), "Draft 1");
    assert_eq!(validate_name("notes.md").unwrap(), "notes");
    for bad in ["", "   ", ".", "..", ".md", "a/b", "a\\b", "two\nlines"] {
      assert!(
        matches!(validate_name(bad), Err(SnapshotError::InvalidName(_))),
        "{bad:?} should be rejected"
      );
    }
  }

  #[test]
  fn test_split_artifact() {
    let (header, body) = split_artifact("---\na: 1\n---\n\nbody\n");
    assert_eq!(header, Some("a: 1"));
    assert_eq!(body, "body\n");

    assert_eq!(split_artifact("no header"), (None, "no header"));
    assert_eq!(split_artifact("---\n---\n\nx"), (Some(""), "x"));
    assert_eq!(split_artifact("---\nunterminated"), (None, "---\nunterminated"));
  }

  #[tokio::test]
  async fn test_round_trip_is_exact() {
    let vault = MemoryVault::new();
    let store = SnapshotStore::new(&vault, ".snapshots");
    let document = "# Book\n\n---\n\nA thematic break above.\n\n";

    let entry = store.save("Draft", document, &provenance()).await.unwrap();
    assert_eq!(entry.path, ".snapshots/Draft.md");
    assert_eq!(store.load("Draft").await.unwrap(), document);
    assert_eq!(store.load(".snapshots/Draft.md").await.unwrap(), document);
    assert_eq!(store.load("Draft.md").await.unwrap(), document);
  }

  #[tokio::test]
  async fn test_metadata_recorded() {
    let vault = MemoryVault::new();
    let store = SnapshotStore::new(&vault, "snaps");
    let created: Timestamp = "2025-02-01T10:00:00Z".parse().unwrap();
    store
      .save_at("First", "text", &provenance(), created)
      .await
      .unwrap();

    let raw = vault.read_file("snaps/First.md").await.unwrap();
    assert!(raw.starts_with("---\nsnapshot_name: First\ncreated_date: 2025-02-01T10:00:00Z\n"));

    let (metadata, body) = store.load_with_metadata("First").await.unwrap();
    assert_eq!(body, "text");
    assert_eq!(metadata, SnapshotMetadata {
      snapshot_name: "First".to_string(),
      created_date:  Some(created),
      source_folder: "Book".to_string(),
      source_path:   "Library/Book".to_string(),
    });
  }

  #[tokio::test]
  async fn test_name_collision_keeps_original() {
    let vault = MemoryVault::new();
    let store = SnapshotStore::new(&vault, DEFAULT_SNAPSHOT_FOLDER);
    store.save("Same", "one", &provenance()).await.unwrap();

    let err = store.save("Same", "two", &provenance()).await.unwrap_err();
    assert!(matches!(err, SnapshotError::AlreadyExists(name) if name == "Same"));
    assert_eq!(store.load("Same").await.unwrap(), "one");
  }

  #[tokio::test]
  async fn test_missing_snapshot() {
    let vault = MemoryVault::new();
    let store = SnapshotStore::new(&vault, "");
    assert_eq!(store.folder(), DEFAULT_SNAPSHOT_FOLDER);
    assert!(matches!(
      store.load("ghost").await,
      Err(SnapshotError::NotFound(_))
    ));
    assert!(matches!(store.load("  ").await, Err(SnapshotError::NotFound(_))));
  }

  #[tokio::test]
  async fn test_list_newest_first() {
    let vault = MemoryVault::new();
    let store = SnapshotStore::new(&vault, "snaps");
    assert!(store.list().await.unwrap().is_empty());

    store.save("older", "1", &provenance()).await.unwrap();
    store.save("newer", "2", &provenance()).await.unwrap();
    vault.insert_file("snaps/notes.txt", "not a snapshot");
    vault.insert_folder("snaps/nested");

    let names: Vec<String> =
      store.list().await.unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["newer", "older"]);
  }

  #[tokio::test]
  async fn test_listed_name_opens_snapshot() {
    let vault = MemoryVault::new();
    let store = SnapshotStore::new(&vault, DEFAULT_SNAPSHOT_FOLDER);
    let entry = store.save("notes.md", "body", &provenance()).await.unwrap();
    assert_eq!(entry.path, ".snapshots/notes.md");
    assert_eq!(entry.name, "notes");

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "notes");
    assert_eq!(store.load(&listed[0].name).await.unwrap(), "body");
    assert_eq!(store.load("notes.md").await.unwrap(), "body");

    let err = store.save("notes", "again", &provenance()).await.unwrap_err();
    assert!(matches!(err, SnapshotError::AlreadyExists(_)));
  }

  #[tokio::test]
  async fn test_headerless_artifact_loads_whole() {
    let vault = MemoryVault::new();
    vault.insert_file("snaps/plain.md", "just text");
    let store = SnapshotStore::new(&vault, "snaps");
    assert_eq!(store.load("plain").await.unwrap(), "just text");
    let (metadata, _) = store.load_with_metadata("plain").await.unwrap();
    assert_eq!(metadata, SnapshotMetadata::default());
  }
}
