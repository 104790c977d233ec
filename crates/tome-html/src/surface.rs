use std::{cell::RefCell, fs, path::Path};

use html_escape::encode_text;
use log::{debug, trace};
use serde::Serialize;
use tome_core::{
  DeliveryMode,
  RenderError,
  RenderSurface,
  delivery::{Margin, Navigation, RenderBlock, Slot},
};

use crate::{
  HtmlError,
  markdown::markdown_to_html,
  template::{BOOK_CSS, BookPage, render_book},
};

/// A rendered chunk or page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlBlock {
  pub index:       usize,
  pub slot:        Slot,
  pub html:        String,
  /// Whether the block is a page with a header and footer area.
  pub framed:      bool,
  /// Header text; `None` on a framed page leaves an empty spacer.
  pub header:      Option<String>,
  pub footer:      Option<String>,
  pub page_number: Option<usize>,
  pub total_pages: Option<usize>,
}

impl HtmlBlock {
  fn from_render_block(block: RenderBlock) -> Self {
    let html = markdown_to_html(&block.markdown);
    let (header, footer, page_number, total_pages) = match &block.frame {
      Some(frame) => {
        (
          frame.header.text().map(str::to_string),
          frame.footer.text().map(str::to_string),
          Some(frame.page_number),
          Some(frame.total_pages),
        )
      },
      None => (None, None, None, None),
    };
    Self {
      index: block.index,
      slot: block.slot,
      html,
      framed: block.frame.is_some(),
      header,
      footer,
      page_number,
      total_pages,
    }
  }

  /// The block as an HTML fragment, without the surrounding document.
  #[must_use]
  pub fn to_fragment(&self) -> String {
    if !self.framed {
      return format!(
        "<section class=\"chunk\" data-index=\"{}\">\n{}</section>\n",
        self.index, self.html
      );
    }

    let margin = |class: &str, text: Option<&String>| {
      text.map_or_else(
        || format!("<div class=\"{class} spacer\"></div>\n"),
        |text| format!("<div class=\"{class}\">{}</div>\n", encode_text(text)),
      )
    };
    format!(
      "<article class=\"page slot-{}\" data-index=\"{}\">\n{}<div \
       class=\"page-body\">\n{}</div>\n{}</article>\n",
      slot_name(self.slot),
      self.index,
      margin("page-header", self.header.as_ref()),
      self.html,
      margin("page-footer", self.footer.as_ref()),
    )
  }
}

const fn slot_name(slot: Slot) -> &'static str {
  match slot {
    Slot::Stream => "stream",
    Slot::Single => "single",
    Slot::Left => "left",
    Slot::Right => "right",
  }
}

#[derive(Debug, Default)]
struct SurfaceState {
  blocks:     Vec<HtmlBlock>,
  error:      Option<String>,
  notices:    Vec<String>,
  navigation: Option<Navigation>,
  detached:   bool,
}

/// Render surface producing HTML.
///
/// Blocks are converted as they arrive and kept in display order; a page
/// view only ever holds the current page or spread since the controller
/// clears the surface before each one.
#[derive(Debug, Default)]
pub struct HtmlSurface {
  state: RefCell<SurfaceState>,
}

impl HtmlSurface {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Mark the surface as gone; further renders fail until [`Self::attach`].
  pub fn detach(&self) {
    self.state.borrow_mut().detached = true;
  }

  pub fn attach(&self) {
    self.state.borrow_mut().detached = false;
  }

  #[must_use]
  pub fn blocks(&self) -> Vec<HtmlBlock> {
    self.state.borrow().blocks.clone()
  }

  #[must_use]
  pub fn error(&self) -> Option<String> {
    self.state.borrow().error.clone()
  }

  #[must_use]
  pub fn notices(&self) -> Vec<String> {
    self.state.borrow().notices.clone()
  }

  #[must_use]
  pub fn navigation(&self) -> Option<Navigation> {
    self.state.borrow().navigation.clone()
  }

  /// The visible content as an HTML fragment: the error region if one is
  /// shown, the rendered blocks otherwise.
  #[must_use]
  pub fn fragment(&self) -> String {
    let state = self.state.borrow();
    if let Some(error) = &state.error {
      return format!(
        "<div class=\"error-region\" role=\"alert\">{}</div>\n",
        encode_text(error)
      );
    }
    state.blocks.iter().map(HtmlBlock::to_fragment).collect()
  }

  /// Render the visible content as a standalone HTML document.
  ///
  /// `mode` selects the layout; a two-page layout pairs consecutive pages
  /// side by side. The page bar is only included for page views, which are
  /// the only ones with a position label.
  ///
  /// # Errors
  ///
  /// Returns an error if the book template fails to render.
  pub fn to_document(
    &self,
    title: &str,
    mode: DeliveryMode,
  ) -> Result<String, HtmlError> {
    let state = self.state.borrow();
    render_book(&BookPage {
      title,
      layout: mode.as_str(),
      blocks: &state.blocks,
      error: state.error.as_deref(),
      notices: &state.notices,
      navigation: state
        .navigation
        .as_ref()
        .filter(|navigation| navigation.label.is_some()),
      stylesheet: BOOK_CSS,
    })
  }

  /// Write the standalone document to `path`.
  ///
  /// # Errors
  ///
  /// Returns an error if rendering fails or the file cannot be written.
  pub fn write_document(
    &self,
    path: &Path,
    title: &str,
    mode: DeliveryMode,
  ) -> Result<(), HtmlError> {
    let html = self.to_document(title, mode)?;
    fs::write(path, html)?;
    debug!("Wrote '{title}' to {}", path.display());
    Ok(())
  }
}

impl RenderSurface for HtmlSurface {
  fn clear(&self) {
    let mut state = self.state.borrow_mut();
    state.blocks.clear();
    state.error = None;
  }

  async fn render(&self, block: RenderBlock) -> Result<(), RenderError> {
    if self.state.borrow().detached {
      return Err(RenderError::Other("surface detached".to_string()));
    }
    trace!("Rendering block {} into {:?}", block.index, block.slot);
    let block = HtmlBlock::from_render_block(block);
    self.state.borrow_mut().blocks.push(block);
    Ok(())
  }

  fn show_error(&self, message: &str) {
    let mut state = self.state.borrow_mut();
    state.blocks.clear();
    state.navigation = None;
    state.error = Some(message.to_string());
  }

  fn notify(&self, message: &str) {
    self.state.borrow_mut().notices.push(message.to_string());
  }

  fn update_navigation(&self, navigation: &Navigation) {
    self.state.borrow_mut().navigation = Some(navigation.clone());
  }
}
