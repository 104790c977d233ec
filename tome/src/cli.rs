use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tome_core::DeliveryMode;

/// Command line interface for tome
#[derive(Parser, Debug)]
#[command(author, version, about = "tome: read a folder of notes as a book")]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Commands,

  /// Enable verbose debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Vault directory containing the notes
  #[arg(long, global = true, default_value = ".")]
  pub vault: PathBuf,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times) Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(
    short = 'c',
    long = "config-file",
    global = true,
    action = clap::ArgAction::Append
  )]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", global = true, action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the tome CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Initialize a new tome configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "tome.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },

  /// Compose a folder into one markdown document.
  Compose {
    /// Vault folder to compose. Defaults to the last selected folder, or the
    /// vault root.
    folder: Option<String>,

    /// Write the document to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Read a book in the terminal, one chunk or page at a time.
  Read {
    /// Vault folder to read.
    folder: Option<String>,

    /// Read a saved snapshot instead of a folder.
    #[arg(short, long, conflicts_with = "folder")]
    snapshot: Option<String>,

    /// Delivery mode (infinite-scroll, continuous-scroll, single-page,
    /// two-page). Overrides the configured view.
    #[arg(short, long)]
    mode: Option<DeliveryMode>,
  },

  /// Render a whole book to a standalone HTML file.
  Export {
    /// Vault folder to export.
    folder: Option<String>,

    /// Export a saved snapshot instead of a folder.
    #[arg(short, long, conflicts_with = "folder")]
    snapshot: Option<String>,

    /// Layout of the exported book. Overrides the configured view.
    #[arg(short, long)]
    mode: Option<DeliveryMode>,

    /// Path of the HTML file to write.
    #[arg(short, long, default_value = "book.html")]
    output: PathBuf,
  },

  /// Save, open and list snapshots.
  #[command(subcommand)]
  Snapshot(SnapshotCommand),
}

/// Snapshot subcommands.
#[derive(Subcommand, Debug)]
pub enum SnapshotCommand {
  /// Compose a folder and save the result as a snapshot.
  Save {
    /// Vault folder to snapshot.
    folder: Option<String>,

    /// Snapshot name. Defaults to the current date and time.
    #[arg(short, long)]
    name: Option<String>,
  },

  /// Print a saved snapshot.
  Open {
    /// Snapshot name or vault path.
    name: String,

    /// Write the document to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// List saved snapshots, newest first.
  List {
    /// Print the list as JSON.
    #[arg(long)]
    json: bool,
  },
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn test_cli_is_consistent() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
      "tome",
      "read",
      "Book",
      "--mode",
      "two-page",
      "--vault",
      "notes",
      "--config",
      "show_header_footer=false",
    ])
    .unwrap();

    assert_eq!(cli.vault, PathBuf::from("notes"));
    assert_eq!(cli.config_overrides, vec!["show_header_footer=false"]);
    assert!(matches!(
      cli.command,
      Commands::Read {
        ref folder,
        mode: Some(DeliveryMode::TwoPage),
        snapshot: None,
      } if folder.as_deref() == Some("Book")
    ));
  }

  #[test]
  fn test_unknown_mode_is_rejected() {
    let err =
      Cli::try_parse_from(["tome", "read", "--mode", "sideways"]).unwrap_err();
    assert!(err.to_string().contains("sideways"));
  }

  #[test]
  fn test_snapshot_subcommands() {
    let cli =
      Cli::try_parse_from(["tome", "snapshot", "list", "--json"]).unwrap();
    assert!(matches!(
      cli.command,
      Commands::Snapshot(SnapshotCommand::List { json: true })
    ));
  }
}
