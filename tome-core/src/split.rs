//! Line-count splitting of a composed document.
//!
//! Both splitters cut on `\n` and rejoin each slice with `\n`, so joining the
//! returned pieces with `\n` always reproduces the input exactly.
use serde::Serialize;

/// Lines per chunk in infinite-scroll delivery.
pub const DEFAULT_LINES_PER_CHUNK: usize = 100;

/// Lines per page in paginated delivery.
pub const DEFAULT_LINES_PER_PAGE: usize = 45;

/// A contiguous run of lines for scroll delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
  pub text:  String,
  /// Zero-based position in the split.
  pub index: usize,
}

/// A fixed-height page for paginated delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
  pub content:     String,
  /// One-based page number.
  pub page_number: usize,
  pub total_pages: usize,
}

/// Number of lines in `document`, counting a trailing empty line after a
/// final newline. The empty document has zero lines.
#[must_use]
pub fn line_count(document: &str) -> usize {
  if document.is_empty() {
    0
  } else {
    document.split('\n').count()
  }
}

/// Split `document` into chunks of `lines_per_chunk` lines. The last chunk
/// may be shorter. An empty document yields no chunks.
#[must_use]
pub fn split_into_chunks(document: &str, lines_per_chunk: usize) -> Vec<Chunk> {
  if document.is_empty() {
    return Vec::new();
  }

  slices(document, lines_per_chunk)
    .into_iter()
    .enumerate()
    .map(|(index, text)| Chunk { text, index })
    .collect()
}

/// Split `document` into pages of `lines_per_page` lines.
///
/// Every page carries the same `total_pages`. An empty document yields a
/// single empty page so that a page view always has something to show.
#[must_use]
pub fn split_into_pages(document: &str, lines_per_page: usize) -> Vec<Page> {
  if document.is_empty() {
    return vec![Page {
      content:     String::new(),
      page_number: 1,
      total_pages: 1,
    }];
  }

  let contents = slices(document, lines_per_page);
  let total_pages = contents.len();
  contents
    .into_iter()
    .enumerate()
    .map(|(i, content)| {
      Page {
        content,
        page_number: i + 1,
        total_pages,
      }
    })
    .collect()
}

/// Header shown above each page.
#[must_use]
pub fn page_header(title: &str) -> String {
  title.to_string()
}

/// Footer shown below each page.
#[must_use]
pub fn page_footer(page_number: usize, total_pages: usize) -> String {
  format!("Page {page_number} of {total_pages}")
}

fn slices(document: &str, size: usize) -> Vec<String> {
  let size = size.max(1);
  let lines: Vec<&str> = document.split('\n').collect();
  lines.chunks(size).map(|lines| lines.join("\n")).collect()
}
