#![allow(dead_code, reason = "Not every test binary uses every helper")]
use std::{
  cell::{Cell, RefCell},
  collections::BTreeSet,
};

use tome_core::{
  ProviderError,
  ReadError,
  RenderError,
  StorageError,
  delivery::{Navigation, RenderBlock, RenderSurface},
  vault::{
    ArtifactEntry,
    ArtifactStorage,
    ContentReader,
    FolderProvider,
    MemoryVault,
    TreeEntry,
  },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Clear,
  Render(RenderBlock),
  Error(String),
  Notice(String),
  Navigation(Navigation),
}

/// A surface that records everything it is asked to do.
///
/// When `yielding`, every render suspends once before completing, which lets
/// tests interleave triggers with an in-flight render.
#[derive(Debug, Default)]
pub struct RecordingSurface {
  events:   RefCell<Vec<Event>>,
  failing:  RefCell<BTreeSet<usize>>,
  yielding: Cell<bool>,
}

impl RecordingSurface {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn yielding() -> Self {
    let surface = Self::default();
    surface.yielding.set(true);
    surface
  }

  /// Make renders of the unit with this index fail.
  pub fn fail_index(&self, index: usize) {
    self.failing.borrow_mut().insert(index);
  }

  pub fn heal(&self) {
    self.failing.borrow_mut().clear();
  }

  pub fn events(&self) -> Vec<Event> {
    self.events.borrow().clone()
  }

  /// Blocks rendered since the last clear.
  pub fn visible(&self) -> Vec<RenderBlock> {
    let events = self.events.borrow();
    let start = events
      .iter()
      .rposition(|e| matches!(e, Event::Clear | Event::Error(_)))
      .map_or(0, |i| i + 1);
    events[start..]
      .iter()
      .filter_map(|e| {
        match e {
          Event::Render(block) => Some(block.clone()),
          _ => None,
        }
      })
      .collect()
  }

  pub fn visible_indices(&self) -> Vec<usize> {
    self.visible().iter().map(|b| b.index).collect()
  }

  pub fn render_count(&self) -> usize {
    self
      .events
      .borrow()
      .iter()
      .filter(|e| matches!(e, Event::Render(_)))
      .count()
  }

  pub fn notices(&self) -> Vec<String> {
    self
      .events
      .borrow()
      .iter()
      .filter_map(|e| {
        match e {
          Event::Notice(text) => Some(text.clone()),
          _ => None,
        }
      })
      .collect()
  }

  pub fn last_error(&self) -> Option<String> {
    self.events.borrow().iter().rev().find_map(|e| {
      match e {
        Event::Error(text) => Some(text.clone()),
        _ => None,
      }
    })
  }

  pub fn last_navigation(&self) -> Option<Navigation> {
    self.events.borrow().iter().rev().find_map(|e| {
      match e {
        Event::Navigation(nav) => Some(nav.clone()),
        _ => None,
      }
    })
  }
}

impl RenderSurface for RecordingSurface {
  fn clear(&self) {
    self.events.borrow_mut().push(Event::Clear);
  }

  async fn render(&self, block: RenderBlock) -> Result<(), RenderError> {
    if self.yielding.get() {
      tokio::task::yield_now().await;
    }
    if self.failing.borrow().contains(&block.index) {
      return Err(RenderError::Other(format!("cannot draw unit {}", block.index)));
    }
    self.events.borrow_mut().push(Event::Render(block));
    Ok(())
  }

  fn show_error(&self, message: &str) {
    self.events.borrow_mut().push(Event::Error(message.to_string()));
  }

  fn notify(&self, message: &str) {
    self.events.borrow_mut().push(Event::Notice(message.to_string()));
  }

  fn update_navigation(&self, navigation: &Navigation) {
    self
      .events
      .borrow_mut()
      .push(Event::Navigation(navigation.clone()));
  }
}

/// A document of `n` numbered lines.
/// A [`MemoryVault`] whose note reads suspend once, so a composition can be
/// interleaved with other session calls.
#[derive(Debug, Default)]
pub struct SlowVault {
  pub inner: MemoryVault,
}

impl ContentReader for SlowVault {
  async fn read(&self, path: &str) -> Result<String, ReadError> {
    tokio::task::yield_now().await;
    self.inner.read(path).await
  }
}

impl FolderProvider for SlowVault {
  async fn list_children(
    &self,
    path: &str,
  ) -> Result<Vec<TreeEntry>, ProviderError> {
    self.inner.list_children(path).await
  }
}

impl ArtifactStorage for SlowVault {
  async fn exists(&self, path: &str) -> bool {
    self.inner.exists(path).await
  }

  async fn create_folder(&self, path: &str) -> Result<(), StorageError> {
    self.inner.create_folder(path).await
  }

  async fn create_file(
    &self,
    path: &str,
    contents: &str,
  ) -> Result<(), StorageError> {
    self.inner.create_file(path, contents).await
  }

  async fn read_file(&self, path: &str) -> Result<String, StorageError> {
    self.inner.read_file(path).await
  }

  async fn list_artifacts(
    &self,
    folder: &str,
  ) -> Result<Vec<ArtifactEntry>, StorageError> {
    self.inner.list_artifacts(folder).await
  }
}

pub fn numbered_lines(n: usize) -> String {
  (1..=n)
    .map(|i| format!("line {i}"))
    .collect::<Vec<_>>()
    .join("\n")
}
