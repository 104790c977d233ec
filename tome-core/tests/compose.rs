#![allow(clippy::unwrap_used, reason = "Fine in tests")]
use std::fs;

use tempfile::tempdir;
use tome_core::{
  CompositionError,
  ProviderError,
  compose,
  compose_path,
  normalize::heading_level,
  tree::{FolderNode, build_tree},
  vault::{FsVault, MemoryVault},
};

fn two_level_vault() -> MemoryVault {
  let vault = MemoryVault::new();
  vault.insert_file("Book/Intro.md", "# Hello\nWorld");
  vault.insert_file("Book/Ch1/A.md", "# One");
  vault
}

#[tokio::test]
async fn composes_two_level_folder() {
  let vault = two_level_vault();
  let doc = compose_path(&vault, "/Book").await.unwrap();
  assert_eq!(
    doc,
    "# Book\n\n## Intro\n\n### Hello\nWorld\n\n## Ch1\n\n### A\n\n#### One\n\n"
  );
}

#[tokio::test]
async fn composition_is_deterministic() {
  let vault = two_level_vault();
  vault.insert_file("Book/Ch2/B.md", "## Deep\ntext");
  let first = compose_path(&vault, "Book").await.unwrap();
  let second = compose_path(&vault, "Book").await.unwrap();
  assert_eq!(first, second);
}

#[tokio::test]
async fn root_is_titled_vault() {
  let vault = two_level_vault();
  let doc = compose_path(&vault, "/").await.unwrap();
  assert!(doc.starts_with("# Vault\n\n## Book\n\n"));
}

#[tokio::test]
async fn heading_levels_never_shallower_than_parent() {
  let vault = MemoryVault::new();
  vault.insert_file("A/note.md", "# t\n## u\n###### v");
  vault.insert_file("A/B/C/D/deep.md", "# x\n### y");
  let doc = compose_path(&vault, "A").await.unwrap();

  let levels: Vec<usize> = doc.lines().filter_map(heading_level).collect();
  assert_eq!(levels[0], 1);
  assert!(levels.iter().all(|&level| (1..=6).contains(&level)));
  // A, note, t, u, v, B, C, D, deep, x, y
  assert_eq!(levels, vec![1, 2, 3, 4, 6, 2, 3, 4, 5, 6, 6]);
}

#[tokio::test]
async fn non_markdown_files_are_skipped() {
  let vault = MemoryVault::new();
  vault.insert_file("Book/cover.png", "binary");
  vault.insert_file("Book/Only.md", "text");
  let doc = compose_path(&vault, "Book").await.unwrap();
  assert_eq!(doc, "# Book\n\n## Only\n\ntext\n\n");
}

#[tokio::test]
async fn empty_folder_emits_heading_only() {
  let vault = MemoryVault::new();
  vault.insert_folder("Empty");
  assert_eq!(compose_path(&vault, "Empty").await.unwrap(), "# Empty\n\n");
}

#[tokio::test]
async fn listing_failure_aborts_composition() {
  let vault = two_level_vault();
  vault.fail_listing("Book/Ch1");
  let err = compose_path(&vault, "Book").await.unwrap_err();
  assert!(matches!(
    err,
    CompositionError::Provider { ref path, source: ProviderError::Io { .. } } if path == "Book/Ch1"
  ));
}

#[tokio::test]
async fn missing_folder_is_a_provider_error() {
  let vault = MemoryVault::new();
  let err = compose_path(&vault, "Nowhere").await.unwrap_err();
  assert!(matches!(
    err,
    CompositionError::Provider {
      source: ProviderError::NotFound(_),
      ..
    }
  ));
}

#[tokio::test]
async fn build_tree_keeps_provider_order() {
  let vault = two_level_vault();
  let tree = build_tree(&vault, "Book").await.unwrap();
  let names: Vec<&str> = tree.children().iter().map(FolderNode::name).collect();
  assert_eq!(names, vec!["Ch1", "Intro.md"]);
  assert_eq!(tree.note_paths(), vec!["Book/Ch1/A.md", "Book/Intro.md"]);

  // Notes still come before subfolders in the composed output.
  let doc = compose(&vault, &tree).await.unwrap();
  let intro = doc.find("## Intro").unwrap();
  let ch1 = doc.find("## Ch1").unwrap();
  assert!(intro < ch1);
}

#[tokio::test]
async fn composes_from_disk() {
  let dir = tempdir().unwrap();
  let book = dir.path().join("Book");
  fs::create_dir_all(book.join("Ch1")).unwrap();
  fs::create_dir_all(book.join(".trash")).unwrap();
  fs::write(book.join("Intro.md"), "# Hello\nWorld").unwrap();
  fs::write(book.join("Ch1/A.md"), "# One").unwrap();
  fs::write(book.join(".trash/Old.md"), "# Gone").unwrap();

  let vault = FsVault::new(dir.path());
  let doc = compose_path(&vault, "Book").await.unwrap();
  assert_eq!(
    doc,
    "# Book\n\n## Intro\n\n### Hello\nWorld\n\n## Ch1\n\n### A\n\n#### One\n\n"
  );
  assert_eq!(vault.collect_markdown_files("Book").len(), 2);
}
