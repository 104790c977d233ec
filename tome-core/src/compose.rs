//! Depth-first composition of a folder tree into one markdown document.
//!
//! For each folder the output is its heading, then each note in the folder
//! (a heading one level deeper and the note's renormalized body), then each
//! subfolder recursively. Notes come before subfolders regardless of how the
//! provider interleaves them; within each group the provider's order is kept.
use log::{debug, warn};

use crate::{
  error::CompositionError,
  normalize::{heading, normalize},
  tree::{FolderNode, MAX_DEPTH, build_tree, note_title},
  vault::{ContentReader, FolderProvider},
};

/// Placeholder written in place of a note that could not be read.
#[must_use]
pub fn unreadable_placeholder(name: &str) -> String {
  format!("*Could not load content for {name}*\n\n")
}

/// Composes books by reading notes through a [`ContentReader`].
#[derive(Debug)]
pub struct Composer<'a, R> {
  reader:    &'a R,
  max_depth: usize,
}

impl<'a, R: ContentReader> Composer<'a, R> {
  #[must_use]
  pub const fn new(reader: &'a R) -> Self {
    Self {
      reader,
      max_depth: MAX_DEPTH,
    }
  }

  /// Limit how deep the walk may go before failing.
  #[must_use]
  pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
    self.max_depth = max_depth;
    self
  }

  /// Compose `folder` with its heading at `header_level`.
  ///
  /// Notes that cannot be read are replaced by a placeholder and logged;
  /// they never fail the composition.
  ///
  /// # Errors
  ///
  /// Returns [`CompositionError::NotAFolder`] when `folder` is a file, and
  /// [`CompositionError::TooDeep`] or [`CompositionError::Cycle`] when the
  /// tree is malformed.
  pub async fn compose(
    &self,
    folder: &FolderNode,
    header_level: usize,
  ) -> Result<String, CompositionError> {
    if !folder.is_folder() {
      return Err(CompositionError::NotAFolder(folder.path().to_string()));
    }

    let mut out = String::new();
    let mut ancestors = Vec::new();
    self
      .compose_folder(folder, header_level.max(1), &mut ancestors, &mut out)
      .await?;

    debug!(
      "Composed {} ({} bytes)",
      folder.display_name(),
      out.len()
    );
    Ok(out)
  }

  async fn compose_folder<'n>(
    &self,
    folder: &'n FolderNode,
    level: usize,
    ancestors: &mut Vec<&'n str>,
    out: &mut String,
  ) -> Result<(), CompositionError> {
    if ancestors.len() >= self.max_depth {
      return Err(CompositionError::TooDeep {
        path:  folder.path().to_string(),
        limit: self.max_depth,
      });
    }
    if ancestors.contains(&folder.path()) {
      return Err(CompositionError::Cycle(folder.path().to_string()));
    }

    out.push_str(&heading(level, folder.display_name()));

    let (subfolders, files): (Vec<&FolderNode>, Vec<&FolderNode>) =
      folder.children().iter().partition(|child| child.is_folder());

    for file in files.into_iter().filter(|file| file.is_note()) {
      out.push_str(&heading(level + 1, note_title(file.name())));
      match self.reader.read(file.path()).await {
        Ok(content) => {
          let base = u8::try_from(level + 2).unwrap_or(u8::MAX);
          out.push_str(&normalize(&content, base));
        },
        Err(e) => {
          warn!("Could not load content for {}: {e}", file.path());
          out.push_str(&unreadable_placeholder(note_title(file.name())));
        },
      }
    }

    ancestors.push(folder.path());
    for subfolder in subfolders {
      Box::pin(self.compose_folder(subfolder, level + 1, ancestors, out))
        .await?;
    }
    ancestors.pop();

    Ok(())
  }
}

/// Compose `folder` with its heading at level 1.
///
/// # Errors
///
/// See [`Composer::compose`].
pub async fn compose<R: ContentReader>(
  reader: &R,
  folder: &FolderNode,
) -> Result<String, CompositionError> {
  Composer::new(reader).compose(folder, 1).await
}

/// Build the tree at `path` through `vault` and compose it.
///
/// # Errors
///
/// Returns [`CompositionError::Provider`] when any folder cannot be listed,
/// plus everything [`Composer::compose`] can return.
pub async fn compose_path<V: FolderProvider + ContentReader>(
  vault: &V,
  path: &str,
) -> Result<String, CompositionError> {
  let tree = build_tree(vault, path).await?;
  compose(vault, &tree).await
}
