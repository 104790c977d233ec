//! The folder tree the composer walks.
//!
//! A [`FolderNode`] is either a folder with ordered children or a leaf file.
//! Trees come from one place only, [`build_tree`], which converts a
//! [`FolderProvider`]'s flat listings at the boundary.
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
  error::CompositionError,
  utils::{base_name, join_path, trim_path},
  vault::FolderProvider,
};

/// Identifier of the vault root.
pub const ROOT_PATH: &str = "/";

/// Heading text used for the vault root.
pub const ROOT_TITLE: &str = "Vault";

/// Suffix identifying markdown notes.
pub const NOTE_SUFFIX: &str = ".md";

/// Deepest folder nesting accepted before a walk is rejected.
pub const MAX_DEPTH: usize = 256;

/// A node of the folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FolderNode {
  Folder {
    name:     String,
    path:     String,
    #[serde(default)]
    children: Vec<Self>,
  },
  File {
    name: String,
    path: String,
  },
}

impl FolderNode {
  /// Create a folder node.
  #[must_use]
  pub fn folder(
    name: impl Into<String>,
    path: impl Into<String>,
    children: Vec<Self>,
  ) -> Self {
    Self::Folder {
      name: name.into(),
      path: path.into(),
      children,
    }
  }

  /// Create a file node.
  #[must_use]
  pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
    Self::File {
      name: name.into(),
      path: path.into(),
    }
  }

  #[must_use]
  pub fn name(&self) -> &str {
    match self {
      Self::Folder { name, .. } | Self::File { name, .. } => name,
    }
  }

  #[must_use]
  pub fn path(&self) -> &str {
    match self {
      Self::Folder { path, .. } | Self::File { path, .. } => path,
    }
  }

  /// Children of a folder; empty for files.
  #[must_use]
  pub fn children(&self) -> &[Self] {
    match self {
      Self::Folder { children, .. } => children,
      Self::File { .. } => &[],
    }
  }

  #[must_use]
  pub const fn is_folder(&self) -> bool {
    matches!(self, Self::Folder { .. })
  }

  /// Whether this node is the vault root.
  #[must_use]
  pub fn is_root(&self) -> bool {
    is_root_path(self.path())
  }

  /// Whether this is a markdown note.
  #[must_use]
  pub fn is_note(&self) -> bool {
    matches!(self, Self::File { name, .. } if name.ends_with(NOTE_SUFFIX))
  }

  /// Name shown in headings and titles: [`ROOT_TITLE`] for the root, the
  /// node name otherwise.
  #[must_use]
  pub fn display_name(&self) -> &str {
    if self.is_root() {
      ROOT_TITLE
    } else {
      self.name()
    }
  }

  /// Find the folder with the given path in this subtree.
  #[must_use]
  pub fn find_folder(&self, path: &str) -> Option<&Self> {
    if !self.is_folder() {
      return None;
    }
    if self.path() == path {
      return Some(self);
    }
    self
      .children()
      .iter()
      .filter(|child| child.is_folder())
      .find_map(|child| child.find_folder(path))
  }

  /// Paths of every markdown note in this subtree, depth-first.
  #[must_use]
  pub fn note_paths(&self) -> Vec<&str> {
    let mut paths = Vec::new();
    self.collect_note_paths(&mut paths);
    paths
  }

  fn collect_note_paths<'a>(&'a self, paths: &mut Vec<&'a str>) {
    for child in self.children() {
      if child.is_folder() {
        child.collect_note_paths(paths);
      } else if child.is_note() {
        paths.push(child.path());
      }
    }
  }
}

/// Whether `path` identifies the vault root.
#[must_use]
pub fn is_root_path(path: &str) -> bool {
  trim_path(path).is_empty()
}

/// Strip [`NOTE_SUFFIX`] from a note's file name.
#[must_use]
pub fn note_title(name: &str) -> &str {
  name.strip_suffix(NOTE_SUFFIX).unwrap_or(name)
}

/// Build the tree rooted at `path` by listing folders through `provider`.
///
/// Children keep the provider's order. Failing to list any folder fails the
/// whole build, as does nesting deeper than [`MAX_DEPTH`] or a folder that
/// reappears among its own descendants.
///
/// # Errors
///
/// Returns [`CompositionError`] on provider failure, excessive depth or a
/// cycle.
pub async fn build_tree<P: FolderProvider>(
  provider: &P,
  path: &str,
) -> Result<FolderNode, CompositionError> {
  let root_path = if is_root_path(path) {
    ROOT_PATH.to_string()
  } else {
    trim_path(path).to_string()
  };
  let name = if is_root_path(&root_path) {
    ROOT_TITLE.to_string()
  } else {
    base_name(&root_path).to_string()
  };

  let mut ancestors = Vec::new();
  let node = build_folder(provider, name, root_path, &mut ancestors).await?;
  debug!("Built folder tree for {path}");
  Ok(node)
}

async fn build_folder<P: FolderProvider>(
  provider: &P,
  name: String,
  path: String,
  ancestors: &mut Vec<String>,
) -> Result<FolderNode, CompositionError> {
  if ancestors.len() >= MAX_DEPTH {
    return Err(CompositionError::TooDeep {
      path,
      limit: MAX_DEPTH,
    });
  }
  if ancestors.contains(&path) {
    return Err(CompositionError::Cycle(path));
  }

  let entries = provider.list_children(&path).await.map_err(|source| {
    CompositionError::Provider {
      path: path.clone(),
      source,
    }
  })?;
  trace!("Listed {} entries under {path}", entries.len());

  ancestors.push(path.clone());
  let mut children = Vec::with_capacity(entries.len());
  for entry in entries {
    let child_path = if entry.path.is_empty() {
      join_path(&path, &entry.name)
    } else {
      entry.path
    };
    if entry.is_folder {
      children.push(
        Box::pin(build_folder(provider, entry.name, child_path, ancestors))
          .await?,
      );
    } else {
      children.push(FolderNode::file(entry.name, child_path));
    }
  }
  ancestors.pop();

  Ok(FolderNode::Folder {
    name,
    path,
    children,
  })
}
