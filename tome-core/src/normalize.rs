//! Heading-level renormalization for notes placed inside a book.
//!
//! A note's own heading hierarchy starts at `#`. When the note is nested under
//! folder and file headings, every heading marker is shifted down so that the
//! note's top-level heading lands at `base_level`. Levels deeper than
//! [`MAX_HEADING_LEVEL`] saturate instead of wrapping.
//!
//! Normalization is *not* idempotent: applying it twice shifts
//! headings twice.
use std::sync::LazyLock;

use regex::Regex;

use crate::utils::never_matching_regex;

/// Deepest heading level markdown supports.
pub const MAX_HEADING_LEVEL: usize = 6;

/// A trimmed line that is a heading: a run of `#` followed by whitespace or
/// the end of the line.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(#+)(?:\s+(.*))?$").unwrap_or_else(|e| {
    log::error!("Failed to compile HEADING_RE regex: {e}");
    never_matching_regex()
  })
});

/// Level of the heading on `line`, if the line is a heading.
///
/// Leading and trailing whitespace is ignored. The returned level is the raw
/// marker length and may exceed [`MAX_HEADING_LEVEL`].
#[must_use]
pub fn heading_level(line: &str) -> Option<usize> {
  HEADING_RE
    .captures(line.trim())
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str().len())
}

/// Format a heading at `level` (capped at [`MAX_HEADING_LEVEL`]) followed by
/// a blank line.
#[must_use]
pub fn heading(level: usize, text: &str) -> String {
  let marker = "#".repeat(level.clamp(1, MAX_HEADING_LEVEL));
  format!("{marker} {text}\n\n")
}

/// Shift every heading in `content` so that a level-1 heading becomes
/// `base_level`.
///
/// Non-heading lines pass through untouched. Every line is terminated by a
/// newline and one blank line is appended, so consecutive notes never run
/// into each other. Blank input yields an empty string.
///
/// # Examples
///
/// ```
/// use tome_core::normalize::normalize;
///
/// assert_eq!(normalize("# Title\n## Sub\ntext", 2), "## Title\n### Sub\ntext\n\n");
/// assert_eq!(normalize("   \n", 2), "");
/// ```
#[must_use]
pub fn normalize(content: &str, base_level: u8) -> String {
  if content.trim().is_empty() {
    return String::new();
  }

  let base = usize::from(base_level.max(1));
  let mut out = String::with_capacity(content.len() + content.len() / 8 + 1);

  for line in content.split('\n') {
    match shift_heading(line, base) {
      Some(shifted) => out.push_str(&shifted),
      None => out.push_str(line),
    }
    out.push('\n');
  }

  out.push('\n');
  out
}

/// Rewrite a single heading line, or `None` if `line` is not a heading.
fn shift_heading(line: &str, base: usize) -> Option<String> {
  let caps = HEADING_RE.captures(line.trim())?;
  let original_level = caps.get(1)?.as_str().len();
  let text = caps.get(2).map_or("", |m| m.as_str().trim());

  let level = (base + original_level - 1).min(MAX_HEADING_LEVEL);
  let marker = "#".repeat(level);

  Some(if text.is_empty() {
    marker
  } else {
    format!("{marker} {text}")
  })
}
