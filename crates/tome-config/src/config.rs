use std::{
  fs,
  path::{Path, PathBuf},
  sync::OnceLock,
};

use serde::{Deserialize, Serialize};
use tome_core::{
  DeliveryMode,
  DeliveryOptions,
  snapshot::DEFAULT_SNAPSHOT_FOLDER,
  split::{DEFAULT_LINES_PER_CHUNK, DEFAULT_LINES_PER_PAGE},
};

use crate::{
  error::ConfigError,
  view::{FolderFileNameDisplay, PaginatedViewType, ViewType},
};

/// How the book is cut into units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
  /// Lines per chunk in the infinite-scroll view.
  pub lines_per_chunk: usize,

  /// Lines per page in paginated views.
  pub lines_per_page: usize,

  /// Distance from the bottom, in pixels, at which scrolling views load the
  /// next unit.
  pub scroll_threshold: f64,

  /// Pages rendered up front in the continuous-scroll view.
  pub initial_pages: usize,
}

impl Default for DeliveryConfig {
  fn default() -> Self {
    let defaults = DeliveryOptions::default();
    Self {
      lines_per_chunk:  DEFAULT_LINES_PER_CHUNK,
      lines_per_page:   DEFAULT_LINES_PER_PAGE,
      scroll_threshold: defaults.scroll_threshold,
      initial_pages:    defaults.initial_pages,
    }
  }
}

/// Where snapshots are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
  /// Vault folder holding snapshot artifacts.
  pub folder: String,
}

impl Default for SnapshotConfig {
  fn default() -> Self {
    Self {
      folder: DEFAULT_SNAPSHOT_FOLDER.to_string(),
    }
  }
}

/// Reader settings.
///
/// Every field has a default, so a config file only needs to mention what it
/// changes. Settings are loaded from TOML or JSON files and adjusted with
/// `KEY=VALUE` overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Open the book as soon as a folder is selected.
  pub open_view_on_folder_click: bool,

  /// Folder opened last; reopened when no folder is given.
  pub last_selected_folder: Option<String>,

  /// Whether the folder panel is expanded.
  pub left_panel_state: bool,

  /// Scrolling or paginated reading.
  pub view_type: ViewType,

  /// Layout of the paginated view.
  pub paginated_view_type: PaginatedViewType,

  /// Show the book title above and the page number below every page.
  pub show_header_footer: bool,

  /// Which headings to show for folders and notes.
  pub folder_file_name_display: FolderFileNameDisplay,

  /// Chunk and page sizing.
  pub delivery: DeliveryConfig,

  /// Snapshot storage.
  pub snapshots: SnapshotConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      open_view_on_folder_click: false,
      last_selected_folder:      None,
      left_panel_state:          true,
      view_type:                 ViewType::default(),
      paginated_view_type:       PaginatedViewType::default(),
      show_header_footer:        true,
      folder_file_name_display:  FolderFileNameDisplay::default(),
      delivery:                  DeliveryConfig::default(),
      snapshots:                 SnapshotConfig::default(),
    }
  }
}

/// Keys accepted by [`Settings::apply_override`].
pub const OVERRIDE_KEYS: &[&str] = &[
  "open_view_on_folder_click",
  "last_selected_folder",
  "left_panel_state",
  "view_type",
  "paginated_view_type",
  "show_header_footer",
  "folder_file_name_display",
  "delivery.lines_per_chunk",
  "delivery.lines_per_page",
  "delivery.scroll_threshold",
  "delivery.initial_pages",
  "snapshots.folder",
];

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value.to_lowercase().as_str() {
    "true" | "yes" | "1" => Ok(true),
    "false" | "no" | "0" => Ok(false),
    _ => {
      Err(ConfigError::Config(format!(
        "Invalid boolean value for '{key}': '{value}'. Expected true/false, \
         yes/no, or 1/0"
      )))
    },
  }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
  value.parse().map_err(|_| {
    ConfigError::Config(format!(
      "Invalid value for '{key}': '{value}'. Expected a positive integer"
    ))
  })
}

fn parse_named<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
  T: std::str::FromStr<Err = String>,
{
  value.parse().map_err(|e: String| {
    ConfigError::Config(format!("Invalid value for '{key}': '{value}' - {e}"))
  })
}

impl Settings {
  /// Load settings from a file (TOML or JSON).
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format is
  /// unsupported.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content =
      fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
      })?;

    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
      return Err(ConfigError::Config(format!(
        "Config file has no extension: {}",
        path.display()
      )));
    };

    match ext.to_lowercase().as_str() {
      "json" => {
        serde_json::from_str(&content).map_err(|source| {
          ConfigError::Json {
            path: path.to_path_buf(),
            source,
          }
        })
      },
      "toml" => {
        toml::from_str(&content).map_err(|source| {
          ConfigError::Toml {
            path: path.to_path_buf(),
            source,
          }
        })
      },
      _ => {
        Err(ConfigError::Config(format!(
          "Unsupported config file format: {}",
          path.display()
        )))
      },
    }
  }

  /// Load settings from the given files, or a discovered one, then apply
  /// overrides and validate.
  ///
  /// Files are merged in order with [`Self::merge`]. Without any file the
  /// standard locations are searched (see [`Self::find_config_file`]), and
  /// without a discovered file the defaults are used.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be loaded, an override is malformed,
  /// or the result fails [`Self::validate`].
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let mut settings = if let Some((first, rest)) = config_files.split_first()
    {
      let mut merged = Self::from_file(first).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load config from {}: {}",
          first.display(),
          e
        ))
      })?;

      for config_path in rest {
        let additional = Self::from_file(config_path).map_err(|e| {
          ConfigError::Config(format!(
            "Failed to load config from {}: {}",
            config_path.display(),
            e
          ))
        })?;
        merged.merge(additional);
      }

      if config_files.len() > 1 {
        log::info!("Loaded and merged {} config files", config_files.len());
      }

      merged
    } else if let Some(discovered) = Self::find_config_file() {
      log::info!("Using discovered config file: {}", discovered.display());
      Self::from_file(&discovered).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load discovered config from {}: {}",
          discovered.display(),
          e
        ))
      })?
    } else {
      log::debug!("No config file found, using defaults");
      Self::default()
    };

    if !config_overrides.is_empty() {
      settings.apply_overrides(config_overrides)?;
    }

    settings.validate()?;
    Ok(settings)
  }

  /// Apply configuration overrides from `KEY=VALUE` strings, as given with
  /// `--config KEY=VALUE`.
  ///
  /// # Errors
  ///
  /// Returns an error if an override is not in `KEY=VALUE` form, the key is
  /// unknown, or the value does not parse.
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  /// Set a single field by its dotted key.
  ///
  /// # Errors
  ///
  /// Returns an error for unknown keys and unparsable values.
  pub fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<(), ConfigError> {
    match key {
      "open_view_on_folder_click" => {
        self.open_view_on_folder_click = parse_bool(key, value)?;
      },
      "last_selected_folder" => {
        self.last_selected_folder =
          (!value.is_empty()).then(|| value.to_string());
      },
      "left_panel_state" => self.left_panel_state = parse_bool(key, value)?,
      "view_type" => self.view_type = parse_named(key, value)?,
      "paginated_view_type" => {
        self.paginated_view_type = parse_named(key, value)?;
      },
      "show_header_footer" => {
        self.show_header_footer = parse_bool(key, value)?;
      },
      "folder_file_name_display" => {
        self.folder_file_name_display = parse_named(key, value)?;
      },
      "delivery.lines_per_chunk" => {
        self.delivery.lines_per_chunk = parse_usize(key, value)?;
      },
      "delivery.lines_per_page" => {
        self.delivery.lines_per_page = parse_usize(key, value)?;
      },
      "delivery.scroll_threshold" => {
        self.delivery.scroll_threshold = value.parse().map_err(|_| {
          ConfigError::Config(format!(
            "Invalid value for '{key}': '{value}'. Expected a number"
          ))
        })?;
      },
      "delivery.initial_pages" => {
        self.delivery.initial_pages = parse_usize(key, value)?;
      },
      "snapshots.folder" => self.snapshots.folder = value.to_string(),
      _ => {
        return Err(ConfigError::Config(format!(
          "Unknown configuration key: '{key}'. Supported keys: {}",
          OVERRIDE_KEYS.join(", ")
        )));
      },
    }

    log::debug!("Applied config override {key}={value}");
    Ok(())
  }

  /// Merge another set of settings into this one, the other's values taking
  /// precedence.
  ///
  /// # Merge Rules
  ///
  /// - [`Option<T>`] fields: other's [`Some`] value replaces this one
  /// - Plain fields: other's value always replaces
  /// - Nested sections are merged field by field with the same rules
  pub fn merge(&mut self, other: Self) {
    self.open_view_on_folder_click = other.open_view_on_folder_click;
    if other.last_selected_folder.is_some() {
      self.last_selected_folder = other.last_selected_folder;
    }
    self.left_panel_state = other.left_panel_state;
    self.view_type = other.view_type;
    self.paginated_view_type = other.paginated_view_type;
    self.show_header_footer = other.show_header_footer;
    self.folder_file_name_display = other.folder_file_name_display;

    self.delivery.lines_per_chunk = other.delivery.lines_per_chunk;
    self.delivery.lines_per_page = other.delivery.lines_per_page;
    self.delivery.scroll_threshold = other.delivery.scroll_threshold;
    self.delivery.initial_pages = other.delivery.initial_pages;

    self.snapshots.folder = other.snapshots.folder;
  }

  /// Check that the values make sense together.
  ///
  /// # Errors
  ///
  /// Returns a [`ConfigError::Config`] listing every problem found.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if self.delivery.lines_per_chunk == 0 {
      errors.push("delivery.lines_per_chunk must be at least 1".to_string());
    }
    if self.delivery.lines_per_page == 0 {
      errors.push("delivery.lines_per_page must be at least 1".to_string());
    }
    if self.delivery.initial_pages == 0 {
      errors.push("delivery.initial_pages must be at least 1".to_string());
    }
    if !self.delivery.scroll_threshold.is_finite()
      || self.delivery.scroll_threshold < 0.0
    {
      errors.push(format!(
        "delivery.scroll_threshold must be a non-negative number, got {}",
        self.delivery.scroll_threshold
      ));
    }

    let folder = self.snapshots.folder.trim().trim_matches('/');
    if folder.is_empty() {
      errors.push("snapshots.folder must not be empty".to_string());
    } else if folder.split('/').any(|segment| segment == "..") {
      errors.push(format!(
        "snapshots.folder must stay inside the vault: {}",
        self.snapshots.folder
      ));
    }

    if !errors.is_empty() {
      let error_message = errors.join("\n");
      return Err(ConfigError::Config(format!(
        "Configuration validation errors:\n{error_message}"
      )));
    }

    Ok(())
  }

  /// The delivery mode selected by `view_type` and `paginated_view_type`.
  #[must_use]
  pub const fn delivery_mode(&self) -> DeliveryMode {
    match (self.view_type, self.paginated_view_type) {
      (ViewType::InfiniteScroll, _) => DeliveryMode::InfiniteScroll,
      (ViewType::Paginated, PaginatedViewType::ContinuousScroll) => {
        DeliveryMode::ContinuousScroll
      },
      (ViewType::Paginated, PaginatedViewType::SinglePage) => {
        DeliveryMode::SinglePage
      },
      (ViewType::Paginated, PaginatedViewType::TwoPage) => {
        DeliveryMode::TwoPage
      },
    }
  }

  /// Select a delivery mode, updating `view_type` and, for paginated modes,
  /// `paginated_view_type`.
  pub const fn set_delivery_mode(&mut self, mode: DeliveryMode) {
    match mode {
      DeliveryMode::InfiniteScroll => self.view_type = ViewType::InfiniteScroll,
      DeliveryMode::ContinuousScroll => {
        self.view_type = ViewType::Paginated;
        self.paginated_view_type = PaginatedViewType::ContinuousScroll;
      },
      DeliveryMode::SinglePage => {
        self.view_type = ViewType::Paginated;
        self.paginated_view_type = PaginatedViewType::SinglePage;
      },
      DeliveryMode::TwoPage => {
        self.view_type = ViewType::Paginated;
        self.paginated_view_type = PaginatedViewType::TwoPage;
      },
    }
  }

  /// Options for a delivery controller built from these settings.
  #[must_use]
  pub fn delivery_options(&self) -> DeliveryOptions {
    DeliveryOptions {
      mode:               self.delivery_mode(),
      lines_per_chunk:    self.delivery.lines_per_chunk,
      lines_per_page:     self.delivery.lines_per_page,
      show_header_footer: self.show_header_footer,
      scroll_threshold:   self.delivery.scroll_threshold,
      initial_pages:      self.delivery.initial_pages,
    }
  }

  /// Search for config files in common locations
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    static RESULT: OnceLock<Option<PathBuf>> = OnceLock::new();
    RESULT
      .get_or_init(|| {
        let config_filenames = [
          "tome.toml",
          "tome.json",
          ".tome.toml",
          ".tome.json",
          ".config/tome.toml",
          ".config/tome.json",
        ];

        let current_dir = std::env::current_dir().ok()?;
        for filename in &config_filenames {
          let config_path = current_dir.join(filename);
          if config_path.exists() {
            return Some(config_path);
          }
        }

        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
          let xdg_config_dir = PathBuf::from(xdg_config_home);
          for filename in &["tome.toml", "tome.json"] {
            let config_path = xdg_config_dir.join(filename);
            if config_path.exists() {
              return Some(config_path);
            }
          }
        }

        if let Ok(home) = std::env::var("HOME") {
          let home_config_dir = PathBuf::from(home).join(".config").join("tome");
          for filename in &["config.toml", "config.json"] {
            let config_path = home_config_dir.join(filename);
            if config_path.exists() {
              return Some(config_path);
            }
          }
        }

        None
      })
      .clone()
  }

  /// Generate a default configuration file with commented explanations
  ///
  /// # Errors
  ///
  /// Returns an error if the template cannot be retrieved or the file cannot be
  /// written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let config_content = crate::templates::get_template(format)?;

    fs::write(path, config_content).map_err(|source| {
      ConfigError::Write {
        path: path.to_path_buf(),
        source,
      }
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  #![allow(
    clippy::unwrap_used,
    clippy::field_reassign_with_default,
    reason = "Fine in tests"
  )]

  use super::*;

  #[test]
  fn test_defaults_match_reader_defaults() {
    let settings = Settings::default();
    assert!(!settings.open_view_on_folder_click);
    assert!(settings.left_panel_state);
    assert!(settings.show_header_footer);
    assert_eq!(settings.delivery_mode(), DeliveryMode::InfiniteScroll);
    assert_eq!(settings.delivery_options(), DeliveryOptions::default());
    assert_eq!(settings.snapshots.folder, ".snapshots");
  }

  #[test]
  fn test_delivery_mode_mapping() {
    let mut settings = Settings::default();
    settings.paginated_view_type = PaginatedViewType::TwoPage;
    // Paginated layout only matters once the paginated view is selected.
    assert_eq!(settings.delivery_mode(), DeliveryMode::InfiniteScroll);

    settings.view_type = ViewType::Paginated;
    assert_eq!(settings.delivery_mode(), DeliveryMode::TwoPage);

    for mode in DeliveryMode::ALL {
      settings.set_delivery_mode(mode);
      assert_eq!(settings.delivery_mode(), mode);
    }
  }

  #[test]
  fn test_apply_overrides() {
    let mut settings = Settings::default();
    settings
      .apply_overrides(&[
        "view_type=paginated".to_string(),
        "paginated_view_type = single-page".to_string(),
        "show_header_footer=no".to_string(),
        "delivery.lines_per_page=30".to_string(),
        "delivery.scroll_threshold=250.5".to_string(),
        "snapshots.folder=Archive/Snapshots".to_string(),
        "last_selected_folder=Book".to_string(),
      ])
      .unwrap();

    let options = settings.delivery_options();
    assert_eq!(options.mode, DeliveryMode::SinglePage);
    assert!(!options.show_header_footer);
    assert_eq!(options.lines_per_page, 30);
    assert!((options.scroll_threshold - 250.5).abs() < f64::EPSILON);
    assert_eq!(settings.snapshots.folder, "Archive/Snapshots");
    assert_eq!(settings.last_selected_folder.as_deref(), Some("Book"));

    settings.apply_override("last_selected_folder", "").unwrap();
    assert_eq!(settings.last_selected_folder, None);
  }

  #[test]
  fn test_apply_overrides_invalid_format() {
    let mut settings = Settings::default();
    let result = settings.apply_overrides(&["no_equals_sign".to_string()]);
    assert!(
      result
        .unwrap_err()
        .to_string()
        .contains("Expected KEY=VALUE")
    );
  }

  #[test]
  fn test_apply_overrides_unknown_key() {
    let mut settings = Settings::default();
    let err = settings.apply_override("theme", "dark").unwrap_err();
    assert!(err.to_string().contains("Unknown configuration key: 'theme'"));
  }

  #[test]
  fn test_apply_overrides_invalid_values() {
    let mut settings = Settings::default();
    let err = settings.apply_override("left_panel_state", "maybe").unwrap_err();
    assert!(err.to_string().contains("Invalid boolean"));

    let err = settings
      .apply_override("delivery.lines_per_chunk", "-3")
      .unwrap_err();
    assert!(err.to_string().contains("Expected a positive integer"));

    let err = settings.apply_override("view_type", "carousel").unwrap_err();
    assert!(err.to_string().contains("unknown view type 'carousel'"));
  }

  #[test]
  fn test_merge_rules() {
    let mut base = Settings::default();
    base.last_selected_folder = Some("Book".to_string());
    base.delivery.lines_per_page = 20;

    let mut other = Settings::default();
    other.view_type = ViewType::Paginated;
    other.delivery.lines_per_page = 60;

    base.merge(other);
    assert_eq!(base.last_selected_folder.as_deref(), Some("Book"));
    assert_eq!(base.view_type, ViewType::Paginated);
    assert_eq!(base.delivery.lines_per_page, 60);
  }

  #[test]
  fn test_validate_collects_all_errors() {
    let mut settings = Settings::default();
    settings.delivery.lines_per_chunk = 0;
    settings.delivery.scroll_threshold = f64::NAN;
    settings.snapshots.folder = "../outside".to_string();

    let message = settings.validate().unwrap_err().to_string();
    assert!(message.contains("lines_per_chunk must be at least 1"));
    assert!(message.contains("scroll_threshold"));
    assert!(message.contains("must stay inside the vault"));
    assert!(Settings::default().validate().is_ok());
  }
}
