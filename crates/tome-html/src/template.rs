use log::debug;
use serde::Serialize;
use tera::{Context, Tera};
use tome_core::delivery::Navigation;

use crate::{HtmlBlock, HtmlError};

pub const BOOK_TEMPLATE: &str = include_str!("../templates/book.html");
pub const BOOK_CSS: &str = include_str!("../templates/book.css");

/// Everything the book template needs.
#[derive(Debug, Serialize)]
pub struct BookPage<'a> {
  pub title:      &'a str,
  /// CSS class selecting the layout, one of the delivery mode names.
  pub layout:     &'a str,
  pub blocks:     &'a [HtmlBlock],
  pub error:      Option<&'a str>,
  pub notices:    &'a [String],
  pub navigation: Option<&'a Navigation>,
  pub stylesheet: &'a str,
}

/// Render a standalone HTML document for a book.
///
/// # Errors
///
/// Returns an error if the template fails to parse or render.
pub fn render_book(page: &BookPage<'_>) -> Result<String, HtmlError> {
  let mut tera = Tera::default();
  tera.add_raw_template("book.html", BOOK_TEMPLATE)?;

  let context = Context::from_serialize(page)?;
  let html = tera.render("book.html", &context)?;
  debug!(
    "Rendered '{}' with {} blocks ({} bytes)",
    page.title,
    page.blocks.len(),
    html.len()
  );
  Ok(html)
}
