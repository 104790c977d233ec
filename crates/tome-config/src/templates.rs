use std::fmt;

/// Error type for template operations.
#[derive(Debug)]
pub enum TemplateError {
  /// The requested configuration format is not supported.
  UnsupportedFormat(String),
}

impl fmt::Display for TemplateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnsupportedFormat(format) => {
        write!(f, "Unsupported config format: {format}")
      },
    }
  }
}

impl std::error::Error for TemplateError {}

/// Default settings in TOML, with every field explained.
pub const DEFAULT_TOML_TEMPLATE: &str = r#"# tome settings

# Open the book as soon as a folder is selected
open_view_on_folder_click = false

# Folder opened when none is given on the command line
# last_selected_folder = "Notes/Book"

# Whether the folder panel starts expanded
left_panel_state = true

# "infinite-scroll" or "paginated"
view_type = "infinite-scroll"

# Layout of the paginated view: "continuous-scroll", "single-page" or "two-page"
paginated_view_type = "continuous-scroll"

# Show the book title above and "Page N of M" below every page
show_header_footer = true

# "show-both", "only-folder-name", "only-note-name" or "hide-both"
folder_file_name_display = "show-both"

[delivery]
# Lines per chunk in the infinite-scroll view
lines_per_chunk = 100

# Lines per page in paginated views
lines_per_page = 45

# Distance from the bottom, in pixels, at which scrolling views load more
scroll_threshold = 500.0

# Pages rendered up front in the continuous-scroll view
initial_pages = 3

[snapshots]
# Vault folder holding saved snapshots
folder = ".snapshots"
"#;

/// Default settings in JSON. JSON has no comments, see the TOML template for
/// what each field does.
pub const DEFAULT_JSON_TEMPLATE: &str = r#"{
  "open_view_on_folder_click": false,
  "left_panel_state": true,
  "view_type": "infinite-scroll",
  "paginated_view_type": "continuous-scroll",
  "show_header_footer": true,
  "folder_file_name_display": "show-both",
  "delivery": {
    "lines_per_chunk": 100,
    "lines_per_page": 45,
    "scroll_threshold": 500.0,
    "initial_pages": 3
  },
  "snapshots": {
    "folder": ".snapshots"
  }
}
"#;

/// Get the correct configuration template based on the requested format.
///
/// # Errors
///
/// Returns an error if the requested format is not supported.
pub fn get_template(format: &str) -> Result<&'static str, TemplateError> {
  match format.to_lowercase().as_str() {
    "toml" => Ok(DEFAULT_TOML_TEMPLATE),
    "json" => Ok(DEFAULT_JSON_TEMPLATE),
    _ => Err(TemplateError::UnsupportedFormat(format.to_string())),
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]
  use super::*;
  use crate::Settings;

  #[test]
  fn test_templates_parse_to_defaults() {
    let from_toml: Settings = toml::from_str(DEFAULT_TOML_TEMPLATE).unwrap();
    let from_json: Settings =
      serde_json::from_str(DEFAULT_JSON_TEMPLATE).unwrap();
    assert_eq!(from_toml, Settings::default());
    assert_eq!(from_json, Settings::default());
  }

  #[test]
  fn test_unknown_format() {
    let err = get_template("yaml").unwrap_err();
    assert_eq!(err.to_string(), "Unsupported config format: yaml");
  }
}
