//! One open book: a vault, a delivery controller and what is being shown.
use std::cell::{Cell, RefCell};

use log::{debug, info};
use thiserror::Error;

use crate::{
  compose::compose_path,
  delivery::{DeliveryController, DeliveryOptions, Outcome, RenderSurface},
  error::CompositionError,
  snapshot::{
    DEFAULT_SNAPSHOT_FOLDER,
    Provenance,
    SnapshotEntry,
    SnapshotError,
    SnapshotStore,
  },
  tree::{ROOT_PATH, ROOT_TITLE, is_root_path, note_title},
  utils::{base_name, trim_path},
  vault::Vault,
};

#[derive(Debug, Error)]
pub enum SessionError {
  #[error(transparent)]
  Composition(#[from] CompositionError),

  #[error(transparent)]
  Snapshot(#[from] SnapshotError),

  #[error("nothing to save: no book is open")]
  NothingToSave,
}

/// What the session is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  Folder { path: String, title: String },
  Snapshot { name: String, provenance: Provenance },
}

impl Source {
  /// Title shown in page headers.
  #[must_use]
  pub fn title(&self) -> &str {
    match self {
      Self::Folder { title, .. } => title,
      Self::Snapshot { name, .. } => name,
    }
  }

  /// Provenance recorded when this content is saved as a snapshot. A
  /// snapshot of a snapshot keeps the original source.
  #[must_use]
  pub fn provenance(&self) -> Provenance {
    match self {
      Self::Folder { path, title } => {
        Provenance {
          source_folder: title.clone(),
          source_path:   path.clone(),
        }
      },
      Self::Snapshot { provenance, .. } => provenance.clone(),
    }
  }
}

/// Title of the book composed from the folder at `path`.
#[must_use]
pub fn folder_title(path: &str) -> String {
  if is_root_path(path) {
    ROOT_TITLE.to_string()
  } else {
    base_name(path).to_string()
  }
}

/// Ties a [`Vault`] to a [`DeliveryController`].
#[derive(Debug)]
pub struct BookSession<V, S> {
  vault:           V,
  controller:      DeliveryController<S>,
  snapshot_folder: String,
  source:          RefCell<Option<Source>>,
  generation:      Cell<u64>,
}

impl<V: Vault, S: RenderSurface> BookSession<V, S> {
  #[must_use]
  pub fn new(vault: V, surface: S, options: DeliveryOptions) -> Self {
    Self {
      vault,
      controller: DeliveryController::new(surface, options),
      snapshot_folder: DEFAULT_SNAPSHOT_FOLDER.to_string(),
      source: RefCell::new(None),
      generation: Cell::new(0),
    }
  }

  #[must_use]
  pub fn with_snapshot_folder(mut self, folder: impl Into<String>) -> Self {
    self.snapshot_folder = folder.into();
    self
  }

  pub const fn vault(&self) -> &V {
    &self.vault
  }

  pub const fn controller(&self) -> &DeliveryController<S> {
    &self.controller
  }

  #[must_use]
  pub fn source(&self) -> Option<Source> {
    self.source.borrow().clone()
  }

  #[must_use]
  pub fn snapshots(&self) -> SnapshotStore<'_, V> {
    SnapshotStore::new(&self.vault, &self.snapshot_folder)
  }

  fn next_generation(&self) -> u64 {
    let generation = self.generation.get().wrapping_add(1);
    self.generation.set(generation);
    generation
  }

  /// Compose the folder at `path` and start delivering it.
  ///
  /// If another open starts before this composition finishes, this one is
  /// dropped and [`Outcome::Stale`] returned.
  ///
  /// # Errors
  ///
  /// Returns [`SessionError::Composition`] when the folder cannot be walked.
  /// The surface then shows an error region instead of a book.
  pub async fn open_folder(&self, path: &str) -> Result<Outcome, SessionError> {
    let generation = self.next_generation();
    let path = if is_root_path(path) {
      ROOT_PATH
    } else {
      trim_path(path)
    };
    info!("Opening folder {path}");

    let composed = compose_path(&self.vault, path).await;
    if generation != self.generation.get() {
      debug!("Dropping composition of {path}, superseded by a newer request");
      return Ok(Outcome::Stale);
    }

    match composed {
      Ok(document) => {
        let title = folder_title(path);
        *self.source.borrow_mut() = Some(Source::Folder {
          path:  path.to_string(),
          title: title.clone(),
        });
        Ok(self.controller.load(document, &title).await)
      },
      Err(e) => {
        *self.source.borrow_mut() = None;
        self.controller.show_error(&format!("Error rendering book: {e}"));
        Err(e.into())
      },
    }
  }

  /// Load a saved snapshot into the view.
  ///
  /// # Errors
  ///
  /// Returns [`SessionError::Snapshot`] when the snapshot cannot be read.
  /// Whatever was shown before stays in place.
  pub async fn open_snapshot(
    &self,
    identifier: &str,
  ) -> Result<Outcome, SessionError> {
    let generation = self.generation.get();

    let (metadata, document) =
      match self.snapshots().load_with_metadata(identifier).await {
        Ok(loaded) => loaded,
        Err(e) => {
          self
            .controller
            .surface()
            .notify(&format!("Failed to open snapshot: {e}"));
          return Err(e.into());
        },
      };
    if generation != self.generation.get() {
      return Ok(Outcome::Stale);
    }
    // Only a snapshot that loaded replaces a composition still running.
    self.next_generation();

    let name = if metadata.snapshot_name.is_empty() {
      note_title(base_name(identifier.trim())).to_string()
    } else {
      metadata.snapshot_name
    };
    info!("Opened snapshot '{name}'");
    *self.source.borrow_mut() = Some(Source::Snapshot {
      name:       name.clone(),
      provenance: Provenance {
        source_folder: metadata.source_folder,
        source_path:   metadata.source_path,
      },
    });
    Ok(self.controller.load(document, &name).await)
  }

  /// Save what is being shown as a new snapshot.
  ///
  /// # Errors
  ///
  /// Returns [`SessionError::NothingToSave`] when no book is open, and
  /// [`SessionError::Snapshot`] when saving fails (including a name that is
  /// already taken).
  pub async fn save_snapshot(
    &self,
    name: &str,
  ) -> Result<SnapshotEntry, SessionError> {
    let Some(document) = self.controller.document() else {
      return Err(SessionError::NothingToSave);
    };
    let provenance = self
      .source
      .borrow()
      .as_ref()
      .map(Source::provenance)
      .unwrap_or_default();

    let entry = self.snapshots().save(name, &document, &provenance).await?;
    self
      .controller
      .surface()
      .notify(&format!("Snapshot saved: {}", entry.name));
    Ok(entry)
  }

  /// Saved snapshots, newest first.
  ///
  /// # Errors
  ///
  /// Returns [`SessionError::Snapshot`] when the folder cannot be listed.
  pub async fn list_snapshots(&self) -> Result<Vec<SnapshotEntry>, SessionError> {
    Ok(self.snapshots().list().await?)
  }

  /// Re-deliver the current document with new options.
  pub async fn apply_options(&self, options: DeliveryOptions) -> Outcome {
    self.controller.update_options(options).await
  }

  /// Close the book. Compositions still running are dropped when they
  /// finish.
  pub fn close(&self) {
    self.next_generation();
    *self.source.borrow_mut() = None;
    self.controller.close();
  }
}
