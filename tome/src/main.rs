#![allow(
  clippy::future_not_send,
  reason = "Commands run on a current-thread runtime"
)]
use std::io;

use color_eyre::eyre::{Context, Result};
use log::LevelFilter;
use tome::{
  cli::{Cli, Commands, SnapshotCommand},
  commands::{self, App},
  terminal::TerminalSurface,
};
use tome_config::Settings;

fn main() -> Result<()> {
  color_eyre::install()?;

  // Parse command line arguments
  let cli = Cli::parse_args();

  // Initialize logging first so we can log during command handling
  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  // `init` runs before any configuration exists
  if let Commands::Init {
    output,
    format,
    force,
  } = &cli.command
  {
    return commands::init(output, format, *force);
  }

  let settings = Settings::load(&cli.config_files, &cli.config_overrides)
    .wrap_err("Failed to load configuration")?;
  let app = App::new(settings, &cli.vault)?;

  let runtime = tokio::runtime::Builder::new_current_thread()
    .build()
    .wrap_err("Failed to start async runtime")?;
  runtime.block_on(run(&app, cli.command))
}

async fn run(app: &App, command: Commands) -> Result<()> {
  match command {
    Commands::Init { .. } => Ok(()),

    Commands::Compose { folder, output } => {
      let folder = app.folder(folder.as_deref());
      let document = commands::compose(app, &folder).await?;
      commands::write_output(output.as_deref(), &document)
    },

    Commands::Read {
      folder,
      snapshot,
      mode,
    } => {
      let target = app.target(folder.as_deref(), snapshot.as_deref());
      let session =
        app.session(TerminalSurface::new(io::stdout()), app.options(mode));
      commands::open(&session, &target).await?;
      let stdin = tokio::io::BufReader::new(tokio::io::stdin());
      commands::read_loop(&session, stdin).await
    },

    Commands::Export {
      folder,
      snapshot,
      mode,
      output,
    } => {
      let target = app.target(folder.as_deref(), snapshot.as_deref());
      commands::export(app, &target, mode, &output).await
    },

    Commands::Snapshot(SnapshotCommand::Save { folder, name }) => {
      let folder = app.folder(folder.as_deref());
      commands::snapshot_save(app, &folder, name.as_deref())
        .await
        .map(|_| ())
    },

    Commands::Snapshot(SnapshotCommand::Open { name, output }) => {
      let document = commands::snapshot_open(app, &name).await?;
      commands::write_output(output.as_deref(), &document)
    },

    Commands::Snapshot(SnapshotCommand::List { json }) => {
      let listing = commands::snapshot_list(app, json).await?;
      commands::write_output(None, &listing)
    },
  }
}
