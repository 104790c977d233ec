use comrak::Options;

/// Options for rendering book content: GitHub flavoured extensions, raw HTML
/// passed through with the GFM tag filter applied.
#[must_use]
pub fn book_options() -> Options<'static> {
  let mut options = Options::default();
  options.extension.table = true;
  options.extension.footnotes = true;
  options.extension.strikethrough = true;
  options.extension.tasklist = true;
  options.extension.autolink = true;
  options.extension.tagfilter = true;
  options.render.r#unsafe = true;
  // Composed books repeat note titles, generated ids would collide.
  options.extension.header_ids = None;
  options
}

/// Convert one chunk or page of markdown to HTML.
///
/// Chunks and pages are cut at line boundaries, so a block may start or end
/// in the middle of a list or fenced code block; comrak closes whatever is
/// left open.
#[must_use]
pub fn markdown_to_html(markdown: &str) -> String {
  comrak::markdown_to_html(markdown, &book_options())
}
