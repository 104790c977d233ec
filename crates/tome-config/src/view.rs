use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Top-level choice between scrolling and paginated reading.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ViewType {
  #[default]
  InfiniteScroll,
  Paginated,
}

/// Layout used when [`ViewType::Paginated`] is selected.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PaginatedViewType {
  #[default]
  ContinuousScroll,
  SinglePage,
  TwoPage,
}

/// Which of the folder and note headings a book shows.
///
/// Accepted and stored, but composition currently always emits both
/// headings.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum FolderFileNameDisplay {
  #[default]
  ShowBoth,
  OnlyFolderName,
  OnlyNoteName,
  HideBoth,
}

/// Implements `as_str`, `Display` and `FromStr` over the kebab-case names
/// used in config files.
macro_rules! named_variants {
  ($ty:ident, $what:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
    impl $ty {
      pub const ALL: &'static [Self] = &[$(Self::$variant),+];

      #[must_use]
      pub const fn as_str(self) -> &'static str {
        match self {
          $(Self::$variant => $name),+
        }
      }
    }

    impl fmt::Display for $ty {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
      }
    }

    impl FromStr for $ty {
      type Err = String;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
          .iter()
          .copied()
          .find(|v| v.as_str() == wanted)
          .ok_or_else(|| {
            let names: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
            format!(
              "unknown {} '{s}', expected one of: {}",
              $what,
              names.join(", ")
            )
          })
      }
    }
  };
}

named_variants!(ViewType, "view type", {
  InfiniteScroll => "infinite-scroll",
  Paginated => "paginated",
});

named_variants!(PaginatedViewType, "paginated view type", {
  ContinuousScroll => "continuous-scroll",
  SinglePage => "single-page",
  TwoPage => "two-page",
});

named_variants!(FolderFileNameDisplay, "folder/file name display", {
  ShowBoth => "show-both",
  OnlyFolderName => "only-folder-name",
  OnlyNoteName => "only-note-name",
  HideBoth => "hide-both",
});
