//! The display side of delivery.
use std::future::Future;

use serde::Serialize;

use crate::error::RenderError;

/// Where a block goes on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Slot {
  /// Appended below everything already shown.
  Stream,
  /// The only page of a single-page view.
  Single,
  /// Left half of a two-page spread.
  Left,
  /// Right half of a two-page spread.
  Right,
}

/// Content above or below a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "text")]
pub enum Margin {
  Text(String),
  /// Empty space of the same height as a text margin, so page bodies stay
  /// aligned when headers and footers are turned off.
  Spacer,
}

impl Margin {
  #[must_use]
  pub fn text(&self) -> Option<&str> {
    match self {
      Self::Text(text) => Some(text),
      Self::Spacer => None,
    }
  }
}

/// Header, footer and numbering around a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFrame {
  pub header:      Margin,
  pub footer:      Margin,
  pub page_number: usize,
  pub total_pages: usize,
}

/// One unit of the document handed to the surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderBlock {
  pub markdown: String,
  pub slot:     Slot,
  /// Present for pages, absent for scroll chunks.
  pub frame:    Option<PageFrame>,
  /// Zero-based index of the chunk or page.
  pub index:    usize,
}

/// State of the previous/next controls of a page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
  pub label:        Option<String>,
  pub can_previous: bool,
  pub can_next:     bool,
}

/// Something that can show a book.
///
/// Rendering a block is asynchronous and may fail; everything else is
/// immediate. Implementations use interior mutability since the controller
/// only holds a shared reference.
pub trait RenderSurface {
  /// Remove everything shown so far.
  fn clear(&self);

  /// Render one block of markdown.
  fn render(
    &self,
    block: RenderBlock,
  ) -> impl Future<Output = Result<(), RenderError>>;

  /// Replace the content with an error region.
  fn show_error(&self, message: &str);

  /// Show a transient notice without disturbing the content.
  fn notify(&self, message: &str);

  /// Reflect the current navigation state. Surfaces without page controls
  /// can ignore this.
  fn update_navigation(&self, _navigation: &Navigation) {}
}

impl<S: RenderSurface> RenderSurface for &S {
  fn clear(&self) {
    (**self).clear();
  }

  fn render(
    &self,
    block: RenderBlock,
  ) -> impl Future<Output = Result<(), RenderError>> {
    (**self).render(block)
  }

  fn show_error(&self, message: &str) {
    (**self).show_error(message);
  }

  fn notify(&self, message: &str) {
    (**self).notify(message);
  }

  fn update_navigation(&self, navigation: &Navigation) {
    (**self).update_navigation(navigation);
  }
}
