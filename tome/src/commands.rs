//! Command handlers. Each takes the loaded settings and talks to the vault
//! through a [`BookSession`] or the snapshot store.
use std::{
  fs,
  io::{self, Write},
  path::Path,
};

use color_eyre::eyre::{Context, Result, bail};
use jiff::Zoned;
use log::{debug, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tome_config::Settings;
use tome_core::{
  BookSession,
  DeliveryMode,
  DeliveryOptions,
  Outcome,
  RenderError,
  RenderSurface,
  SnapshotStore,
  compose_path,
  delivery::{FocusContext, Key, RenderBlock},
  snapshot::default_snapshot_name,
  tree::ROOT_PATH,
  vault::{FsVault, Vault},
};
use tome_html::HtmlSurface;

/// What a book is made from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  Folder(String),
  Snapshot(String),
}

/// Create a default configuration file.
///
/// # Errors
///
/// Returns an error if the file exists and `force` is not set, or if it
/// cannot be written.
pub fn init(output: &Path, format: &str, force: bool) -> Result<()> {
  if output.exists() && !force {
    bail!(
      "Configuration file already exists: {}. Use --force to overwrite.",
      output.display()
    );
  }

  if let Some(parent) = output.parent()
    && !parent.as_os_str().is_empty()
    && !parent.exists()
  {
    fs::create_dir_all(parent).wrap_err_with(|| {
      format!("Failed to create directory: {}", parent.display())
    })?;
    info!("Created directory: {}", parent.display());
  }

  Settings::generate_default_config(format, output).wrap_err_with(|| {
    format!("Failed to generate configuration file: {}", output.display())
  })?;

  info!(
    "Configuration file created successfully. Edit it to customize how books \
     are shown."
  );
  Ok(())
}

/// Settings plus the vault they apply to.
#[derive(Debug)]
pub struct App {
  pub settings: Settings,
  pub vault:    FsVault,
}

impl App {
  /// # Errors
  ///
  /// Returns an error if the vault directory does not exist.
  pub fn new(settings: Settings, vault_root: &Path) -> Result<Self> {
    if !vault_root.is_dir() {
      bail!("Vault directory does not exist: {}", vault_root.display());
    }
    debug!("Using vault at {}", vault_root.display());
    Ok(Self {
      settings,
      vault: FsVault::new(vault_root),
    })
  }

  /// The folder to work on: the one given, else the last selected one, else
  /// the vault root.
  #[must_use]
  pub fn folder(&self, folder: Option<&str>) -> String {
    folder
      .or(self.settings.last_selected_folder.as_deref())
      .unwrap_or(ROOT_PATH)
      .to_string()
  }

  #[must_use]
  pub fn target(&self, folder: Option<&str>, snapshot: Option<&str>) -> Target {
    snapshot.map_or_else(
      || Target::Folder(self.folder(folder)),
      |name| Target::Snapshot(name.to_string()),
    )
  }

  /// Delivery options from the settings, with `mode` replacing the
  /// configured view when given.
  #[must_use]
  pub fn options(&self, mode: Option<DeliveryMode>) -> DeliveryOptions {
    let mut settings = self.settings.clone();
    if let Some(mode) = mode {
      settings.set_delivery_mode(mode);
    }
    settings.delivery_options()
  }

  pub fn session<S: RenderSurface>(
    &self,
    surface: S,
    options: DeliveryOptions,
  ) -> BookSession<FsVault, S> {
    BookSession::new(self.vault.clone(), surface, options)
      .with_snapshot_folder(self.settings.snapshots.folder.clone())
  }

  pub fn snapshots(&self) -> SnapshotStore<'_, FsVault> {
    SnapshotStore::new(&self.vault, &self.settings.snapshots.folder)
  }
}

/// Write `content` to `output`, or to stdout without one.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
  if let Some(path) = output {
    fs::write(path, content)
      .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
  } else {
    let mut stdout = io::stdout().lock();
    stdout
      .write_all(content.as_bytes())
      .and_then(|()| stdout.flush())
      .wrap_err("Failed to write to stdout")?;
  }
  Ok(())
}

/// Compose a folder into one markdown document.
///
/// # Errors
///
/// Returns an error if the folder cannot be composed.
pub async fn compose(app: &App, folder: &str) -> Result<String> {
  let notes = app.vault.collect_markdown_files(folder).len();
  info!("Composing {notes} notes from '{folder}'");
  compose_path(&app.vault, folder)
    .await
    .wrap_err_with(|| format!("Failed to compose folder '{folder}'"))
}

/// Load `target` into `session`.
///
/// # Errors
///
/// Returns an error if the folder cannot be composed or the snapshot read.
pub async fn open<V: Vault, S: RenderSurface>(
  session: &BookSession<V, S>,
  target: &Target,
) -> Result<Outcome> {
  match target {
    Target::Folder(path) => {
      session
        .open_folder(path)
        .await
        .wrap_err_with(|| format!("Failed to open folder '{path}'"))
    },
    Target::Snapshot(name) => {
      session
        .open_snapshot(name)
        .await
        .wrap_err_with(|| format!("Failed to open snapshot '{name}'"))
    },
  }
}

/// Drive an open session from line-based input until it ends or `q` is
/// entered.
///
/// An empty line or `n` shows more, `p` goes back; `ArrowLeft` and
/// `ArrowRight` act as keys do in page views.
///
/// # Errors
///
/// Returns an error if reading the input fails.
pub async fn read_loop<V: Vault, S: RenderSurface, R: AsyncBufRead + Unpin>(
  session: &BookSession<V, S>,
  input: R,
) -> Result<()> {
  let controller = session.controller();
  let mut lines = input.lines();

  while let Some(line) =
    lines.next_line().await.wrap_err("Failed to read input")?
  {
    let outcome = match line.trim() {
      "q" | "quit" => break,
      "" | "n" | "next" => controller.request_next().await,
      "p" | "prev" | "previous" => controller.request_previous().await,
      other => {
        controller
          .on_key(Key::from_name(other), FocusContext::default())
          .await
      },
    };

    match outcome {
      Outcome::Exhausted if controller.mode().is_paged() => {
        info!("No more pages in this direction");
      },
      Outcome::Exhausted => {
        info!("End of book");
        break;
      },
      Outcome::Ignored => debug!("Ignored input '{}'", line.trim()),
      Outcome::RenderFailed(e) => warn!("Rendering failed: {e}"),
      Outcome::Materialized(_) | Outcome::Busy | Outcome::Stale => {},
    }
  }
  Ok(())
}

/// Render a whole book to an HTML file.
///
/// Page views are exported as every page in order, laid out as `mode`
/// would show them.
///
/// # Errors
///
/// Returns an error if the book cannot be opened or the file written.
pub async fn export(
  app: &App,
  target: &Target,
  mode: Option<DeliveryMode>,
  output: &Path,
) -> Result<()> {
  let mut options = app.options(mode);
  let layout = options.mode;
  if layout.is_paged() {
    options.mode = DeliveryMode::ContinuousScroll;
  }

  let session = app.session(HtmlSurface::new(), options);
  open(&session, target).await?;

  let controller = session.controller();
  loop {
    match controller.request_next().await {
      Outcome::Materialized(_) => {},
      Outcome::RenderFailed(e) => bail!("Failed to render book: {e}"),
      _ => break,
    }
  }

  let title = controller.title();
  controller
    .surface()
    .write_document(output, &title, layout)
    .wrap_err_with(|| format!("Failed to export book to {}", output.display()))?;
  info!(
    "Exported '{title}' ({} blocks) to {}",
    controller.surface().blocks().len(),
    output.display()
  );
  Ok(())
}

/// Compose a folder and save it as a snapshot, named after the current time
/// unless a name is given. Returns the snapshot's vault path.
///
/// # Errors
///
/// Returns an error if composing or saving fails.
pub async fn snapshot_save(
  app: &App,
  folder: &str,
  name: Option<&str>,
) -> Result<String> {
  let name = name
    .map_or_else(|| default_snapshot_name(&Zoned::now()), str::to_string);

  let session = app.session(NullSurface, app.options(None));
  open(&session, &Target::Folder(folder.to_string())).await?;
  let entry = session
    .save_snapshot(&name)
    .await
    .wrap_err_with(|| format!("Failed to save snapshot '{name}'"))?;

  info!("Snapshot saved: {} ({})", entry.name, entry.path);
  Ok(entry.path)
}

/// The stored document of a snapshot, without its header.
///
/// # Errors
///
/// Returns an error if the snapshot does not exist or cannot be read.
pub async fn snapshot_open(app: &App, name: &str) -> Result<String> {
  app
    .snapshots()
    .load(name)
    .await
    .wrap_err_with(|| format!("Failed to open snapshot '{name}'"))
}

/// Saved snapshots, newest first, as text or JSON.
///
/// # Errors
///
/// Returns an error if the snapshot folder cannot be listed.
pub async fn snapshot_list(app: &App, json: bool) -> Result<String> {
  let entries = app
    .snapshots()
    .list()
    .await
    .wrap_err("Failed to list snapshots")?;

  if json {
    let mut out = serde_json::to_string_pretty(&entries)
      .wrap_err("Failed to serialize snapshot list")?;
    out.push('\n');
    return Ok(out);
  }

  Ok(
    entries
      .iter()
      .map(|entry| {
        let modified = entry
          .modified
          .map_or_else(|| "-".to_string(), |t| t.to_string());
        format!("{}\t{modified}\t{}\n", entry.name, entry.path)
      })
      .collect(),
  )
}

/// Surface for sessions that never display anything.
#[derive(Debug, Clone, Copy)]
struct NullSurface;

impl RenderSurface for NullSurface {
  fn clear(&self) {}

  async fn render(&self, _block: RenderBlock) -> Result<(), RenderError> {
    Ok(())
  }

  fn show_error(&self, message: &str) {
    warn!("{message}");
  }

  fn notify(&self, message: &str) {
    debug!("{message}");
  }
}
