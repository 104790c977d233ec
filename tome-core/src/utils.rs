/// Create a regex that never matches anything.
///
/// This is used as a fallback pattern when a regex fails to compile, so a
/// broken pattern degrades to "no match" instead of a panic.
///
/// # Panics
///
/// Panics if `[^\s\S]` fails to compile, which it cannot.
#[must_use]
pub fn never_matching_regex() -> regex::Regex {
  #[allow(clippy::expect_used, reason = "Constant pattern")]
  regex::Regex::new(r"[^\s\S]").expect("constant fallback pattern compiles")
}

/// Strip leading and trailing separators from a vault path. The vault root
/// (`/` or the empty string) becomes the empty string.
#[must_use]
pub fn trim_path(path: &str) -> &str {
  path.trim_matches('/')
}

/// Join a vault path and a child name with `/`, treating the root specially.
#[must_use]
pub fn join_path(parent: &str, name: &str) -> String {
  let parent = trim_path(parent);
  if parent.is_empty() {
    name.to_string()
  } else {
    format!("{parent}/{name}")
  }
}

/// Last `/`-separated segment of a vault path.
#[must_use]
pub fn base_name(path: &str) -> &str {
  let path = trim_path(path);
  path.rsplit('/').next().unwrap_or(path)
}
