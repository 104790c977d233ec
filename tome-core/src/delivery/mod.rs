//! Progressive delivery of a composed document to a [`RenderSurface`].
//!
//! The controller owns one view's state: the document, its split into units
//! (chunks or pages), the cursor, and how many units are already on the
//! surface. All methods take `&self`; the state lives in cells because the
//! controller is driven from a single-threaded event loop where a render can
//! be suspended while another trigger arrives.
//!
//! Two guarantees hold across suspension points:
//!
//! - at most one materialization runs per document version, so duplicate
//!   triggers return [`Outcome::Busy`] instead of rendering a unit twice;
//! - every document change bumps an epoch, and work that finishes under an
//!   older epoch returns [`Outcome::Stale`] without touching the state.
use std::{
  cell::{Cell, RefCell},
  fmt,
  rc::Rc,
  str::FromStr,
};

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::{
  error::RenderError,
  split::{
    Chunk,
    DEFAULT_LINES_PER_CHUNK,
    DEFAULT_LINES_PER_PAGE,
    Page,
    page_footer,
    page_header,
    split_into_chunks,
    split_into_pages,
  },
};

pub mod input;
pub mod surface;

pub use input::{FocusContext, Key, ScrollMetrics};
pub use surface::{
  Margin,
  Navigation,
  PageFrame,
  RenderBlock,
  RenderSurface,
  Slot,
};

/// Distance from the bottom, in pixels, below which scrolling loads more.
pub const DEFAULT_SCROLL_THRESHOLD: f64 = 500.0;

/// Pages rendered up front in continuous-scroll mode.
pub const DEFAULT_INITIAL_PAGES: usize = 3;

/// How a document is handed out.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMode {
  /// Fixed-size chunks appended as the reader nears the bottom.
  #[default]
  InfiniteScroll,
  /// One page at a time, navigation replaces it.
  SinglePage,
  /// Two facing pages, navigation moves by two.
  TwoPage,
  /// Framed pages appended as the reader nears the bottom.
  ContinuousScroll,
}

impl DeliveryMode {
  pub const ALL: [Self; 4] = [
    Self::InfiniteScroll,
    Self::SinglePage,
    Self::TwoPage,
    Self::ContinuousScroll,
  ];

  /// Modes with explicit previous/next navigation.
  #[must_use]
  pub const fn is_paged(self) -> bool {
    matches!(self, Self::SinglePage | Self::TwoPage)
  }

  /// Modes that grow as the reader scrolls.
  #[must_use]
  pub const fn is_scrolling(self) -> bool {
    !self.is_paged()
  }

  /// Modes whose units are pages rather than chunks.
  #[must_use]
  pub const fn uses_pages(self) -> bool {
    !matches!(self, Self::InfiniteScroll)
  }

  /// Pages moved per navigation step.
  #[must_use]
  pub const fn step(self) -> usize {
    match self {
      Self::TwoPage => 2,
      _ => 1,
    }
  }

  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::InfiniteScroll => "infinite-scroll",
      Self::SinglePage => "single-page",
      Self::TwoPage => "two-page",
      Self::ContinuousScroll => "continuous-scroll",
    }
  }
}

impl fmt::Display for DeliveryMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DeliveryMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|mode| mode.as_str() == s)
      .ok_or_else(|| {
        format!(
          "unknown delivery mode '{s}', expected one of: {}",
          Self::ALL.map(Self::as_str).join(", ")
        )
      })
  }
}

/// Per-view delivery settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOptions {
  pub mode:               DeliveryMode,
  pub lines_per_chunk:    usize,
  pub lines_per_page:     usize,
  pub show_header_footer: bool,
  pub scroll_threshold:   f64,
  pub initial_pages:      usize,
}

impl Default for DeliveryOptions {
  fn default() -> Self {
    Self {
      mode:               DeliveryMode::default(),
      lines_per_chunk:    DEFAULT_LINES_PER_CHUNK,
      lines_per_page:     DEFAULT_LINES_PER_PAGE,
      show_header_footer: true,
      scroll_threshold:   DEFAULT_SCROLL_THRESHOLD,
      initial_pages:      DEFAULT_INITIAL_PAGES,
    }
  }
}

impl DeliveryOptions {
  #[must_use]
  pub fn with_mode(mode: DeliveryMode) -> Self {
    Self {
      mode,
      ..Self::default()
    }
  }
}

/// Result of a delivery operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// The unit with this index is now on the surface. For page views this is
  /// the page the cursor points at.
  Materialized(usize),
  /// Nothing left in the requested direction.
  Exhausted,
  /// Another materialization for this document is still running.
  Busy,
  /// The document changed while this one was running; its result was
  /// discarded.
  Stale,
  /// The request does not apply in the current mode or state.
  Ignored,
  /// The surface failed to render a unit. The failure has been reported
  /// through [`RenderSurface::notify`].
  RenderFailed(String),
}

/// A read-only copy of the controller's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryState {
  pub mode:               DeliveryMode,
  /// Next chunk to append in scroll views; first page shown in page views.
  pub cursor:             usize,
  pub materialized_count: usize,
  pub unit_count:         usize,
  pub epoch:              u64,
}

#[derive(Debug, Clone, Default)]
enum Units {
  #[default]
  None,
  Chunks(Rc<[Chunk]>),
  Pages(Rc<[Page]>),
}

impl Units {
  fn len(&self) -> usize {
    match self {
      Self::None => 0,
      Self::Chunks(chunks) => chunks.len(),
      Self::Pages(pages) => pages.len(),
    }
  }
}

/// Clears the in-flight marker when a materialization ends, unless a newer
/// document has already claimed it.
struct InFlight<'a> {
  marker: &'a Cell<Option<u64>>,
  epoch:  u64,
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    if self.marker.get() == Some(self.epoch) {
      self.marker.set(None);
    }
  }
}

/// Drives one view of one document.
pub struct DeliveryController<S> {
  surface:      S,
  options:      RefCell<DeliveryOptions>,
  document:     RefCell<Option<Rc<str>>>,
  title:        RefCell<String>,
  units:        RefCell<Units>,
  cursor:       Cell<usize>,
  materialized: Cell<usize>,
  epoch:        Cell<u64>,
  in_flight:    Cell<Option<u64>>,
}

impl<S> fmt::Debug for DeliveryController<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DeliveryController")
      .field("options", &self.options.borrow())
      .field("title", &self.title.borrow())
      .field("cursor", &self.cursor.get())
      .field("materialized", &self.materialized.get())
      .field("epoch", &self.epoch.get())
      .finish_non_exhaustive()
  }
}

impl<S: RenderSurface> DeliveryController<S> {
  #[must_use]
  pub fn new(surface: S, options: DeliveryOptions) -> Self {
    Self {
      surface,
      options: RefCell::new(options),
      document: RefCell::new(None),
      title: RefCell::new(String::new()),
      units: RefCell::new(Units::None),
      cursor: Cell::new(0),
      materialized: Cell::new(0),
      epoch: Cell::new(0),
      in_flight: Cell::new(None),
    }
  }

  pub const fn surface(&self) -> &S {
    &self.surface
  }

  #[must_use]
  pub fn options(&self) -> DeliveryOptions {
    self.options.borrow().clone()
  }

  #[must_use]
  pub fn mode(&self) -> DeliveryMode {
    self.options.borrow().mode
  }

  /// The document currently being delivered.
  #[must_use]
  pub fn document(&self) -> Option<Rc<str>> {
    self.document.borrow().clone()
  }

  #[must_use]
  pub fn title(&self) -> String {
    self.title.borrow().clone()
  }

  #[must_use]
  pub fn state(&self) -> DeliveryState {
    DeliveryState {
      mode:               self.mode(),
      cursor:             self.cursor.get(),
      materialized_count: self.materialized.get(),
      unit_count:         self.units.borrow().len(),
      epoch:              self.epoch.get(),
    }
  }

  /// Replace the document and show its beginning.
  ///
  /// Scroll views get their first chunk, or the first few pages in
  /// continuous mode; page views get page 1 (and 2).
  pub async fn load(&self, document: impl Into<Rc<str>>, title: &str) -> Outcome {
    let document = document.into();
    debug!(
      "Loading '{title}' ({} bytes) in {} mode",
      document.len(),
      self.mode()
    );
    *self.document.borrow_mut() = Some(document);
    *self.title.borrow_mut() = title.to_string();
    self.rematerialize().await
  }

  /// Switch to new options, re-splitting the current document without
  /// recomposing it.
  pub async fn update_options(&self, options: DeliveryOptions) -> Outcome {
    debug!("Updating delivery options: {options:?}");
    *self.options.borrow_mut() = options;
    if self.document.borrow().is_none() {
      self.bump_epoch();
      self.surface.clear();
      return Outcome::Ignored;
    }
    self.rematerialize().await
  }

  /// Drop the document and show an error region instead.
  pub fn show_error(&self, message: &str) {
    warn!("{message}");
    self.reset(None);
    self.surface.show_error(message);
  }

  /// Release the document. Work still in flight for it is discarded when it
  /// completes.
  pub fn close(&self) {
    debug!("Closing view '{}'", self.title.borrow());
    self.reset(None);
    self.title.borrow_mut().clear();
    self.surface.clear();
  }

  /// The single "show more" trigger: appends in scroll views, moves forward
  /// in page views.
  pub async fn request_next(&self) -> Outcome {
    if self.document.borrow().is_none() {
      return Outcome::Ignored;
    }
    if self.mode().is_paged() {
      self.next().await
    } else {
      self.materialize_next().await
    }
  }

  /// Move back in page views. Scroll views never unload content.
  pub async fn request_previous(&self) -> Outcome {
    if self.mode().is_paged() {
      self.previous().await
    } else {
      Outcome::Ignored
    }
  }

  /// Append the next unit in a scroll view.
  pub async fn materialize_next(&self) -> Outcome {
    if !self.mode().is_scrolling() || self.document.borrow().is_none() {
      return Outcome::Ignored;
    }
    let Some(guard) = self.begin() else {
      trace!("Dropping trigger, materialization already in flight");
      return Outcome::Busy;
    };
    let outcome = self.append_unit(guard.epoch, self.materialized.get()).await;
    if matches!(outcome, Outcome::Materialized(_)) {
      self.surface.update_navigation(&self.navigation());
    }
    outcome
  }

  /// Go to the next page (or spread).
  pub async fn next(&self) -> Outcome {
    if !self.mode().is_paged() {
      return Outcome::Ignored;
    }
    if !self.can_go_next() {
      return Outcome::Exhausted;
    }
    let Some(guard) = self.begin() else {
      return Outcome::Busy;
    };
    let last = self.units.borrow().len().saturating_sub(1);
    let target = (self.cursor.get() + self.mode().step()).min(last);
    self.show_page(guard.epoch, target).await
  }

  /// Go to the previous page (or spread).
  pub async fn previous(&self) -> Outcome {
    if !self.mode().is_paged() {
      return Outcome::Ignored;
    }
    if !self.can_go_previous() {
      return Outcome::Exhausted;
    }
    let Some(guard) = self.begin() else {
      return Outcome::Busy;
    };
    let target = self.cursor.get().saturating_sub(self.mode().step());
    self.show_page(guard.epoch, target).await
  }

  /// React to a scroll event; loads more once the reader is close enough to
  /// the bottom.
  pub async fn on_scroll(&self, metrics: ScrollMetrics) -> Outcome {
    let (mode, threshold) = {
      let options = self.options.borrow();
      (options.mode, options.scroll_threshold)
    };
    if self.document.borrow().is_none()
      || !mode.is_scrolling()
      || !metrics.is_near_bottom(threshold)
    {
      return Outcome::Ignored;
    }
    if !self.can_go_next() {
      return Outcome::Exhausted;
    }
    self.request_next().await
  }

  /// React to a key press in a page view.
  pub async fn on_key(&self, key: Key, focus: FocusContext) -> Outcome {
    if !self.mode().is_paged() || !focus.accepts_navigation() {
      return Outcome::Ignored;
    }
    match key {
      Key::ArrowLeft => self.previous().await,
      Key::ArrowRight => self.next().await,
      Key::Other => Outcome::Ignored,
    }
  }

  /// Whether another unit can be shown: the next page in page views, the
  /// next unmaterialized unit in scroll views.
  #[must_use]
  pub fn can_go_next(&self) -> bool {
    let len = self.units.borrow().len();
    if self.mode().is_paged() {
      self.cursor.get() + 1 < len
    } else {
      self.materialized.get() < len
    }
  }

  #[must_use]
  pub fn can_go_previous(&self) -> bool {
    self.mode().is_paged() && self.cursor.get() > 0
  }

  /// Position label of a page view, e.g. `Page 2 of 5` or `Pages 1-2 of 5`.
  #[must_use]
  pub fn page_label(&self) -> Option<String> {
    let mode = self.mode();
    let len = self.units.borrow().len();
    if !mode.is_paged() || len == 0 {
      return None;
    }
    let c = self.cursor.get();
    Some(if mode == DeliveryMode::TwoPage && c + 1 < len {
      format!("Pages {}-{} of {len}", c + 1, c + 2)
    } else {
      format!("Page {} of {len}", c + 1)
    })
  }

  #[must_use]
  pub fn navigation(&self) -> Navigation {
    Navigation {
      label:        self.page_label(),
      can_previous: self.can_go_previous(),
      can_next:     self.can_go_next(),
    }
  }

  fn bump_epoch(&self) -> u64 {
    let epoch = self.epoch.get().wrapping_add(1);
    self.epoch.set(epoch);
    epoch
  }

  /// Start a new epoch with the cursor at the top. `Some` installs freshly
  /// split units for the current document; `None` drops the document too.
  fn reset(&self, units: Option<Units>) {
    self.bump_epoch();
    self.cursor.set(0);
    self.materialized.set(0);
    if units.is_none() {
      *self.document.borrow_mut() = None;
    }
    *self.units.borrow_mut() = units.unwrap_or_default();
  }

  fn begin(&self) -> Option<InFlight<'_>> {
    let epoch = self.epoch.get();
    if self.in_flight.get() == Some(epoch) {
      return None;
    }
    self.in_flight.set(Some(epoch));
    Some(InFlight {
      marker: &self.in_flight,
      epoch,
    })
  }

  fn split(&self, document: &str) -> Units {
    let options = self.options.borrow();
    if options.mode.uses_pages() {
      Units::Pages(split_into_pages(document, options.lines_per_page).into())
    } else {
      Units::Chunks(split_into_chunks(document, options.lines_per_chunk).into())
    }
  }

  /// Re-split the current document and show its beginning under a new
  /// epoch.
  async fn rematerialize(&self) -> Outcome {
    let Some(document) = self.document() else {
      return Outcome::Ignored;
    };
    let units = self.split(&document);
    trace!("Split document into {} units", units.len());
    self.reset(Some(units));
    self.surface.clear();

    let Some(guard) = self.begin() else {
      return Outcome::Busy;
    };
    let epoch = guard.epoch;
    let mode = self.mode();

    let outcome = if mode.is_paged() {
      self.show_page(epoch, 0).await
    } else {
      let initial = if mode == DeliveryMode::ContinuousScroll {
        self.options.borrow().initial_pages.max(1)
      } else {
        1
      };
      let mut outcome = Outcome::Exhausted;
      for _ in 0..initial {
        outcome = self.append_unit(epoch, self.materialized.get()).await;
        if !matches!(outcome, Outcome::Materialized(_)) {
          break;
        }
      }
      outcome
    };

    if epoch == self.epoch.get() {
      self.surface.update_navigation(&self.navigation());
    }
    outcome
  }

  fn frame(&self, page: &Page) -> PageFrame {
    let (header, footer) = if self.options.borrow().show_header_footer {
      (
        Margin::Text(page_header(&self.title.borrow())),
        Margin::Text(page_footer(page.page_number, page.total_pages)),
      )
    } else {
      (Margin::Spacer, Margin::Spacer)
    };
    PageFrame {
      header,
      footer,
      page_number: page.page_number,
      total_pages: page.total_pages,
    }
  }

  fn block(&self, index: usize, slot: Slot) -> Option<RenderBlock> {
    let units = self.units.borrow().clone();
    match units {
      Units::None => None,
      Units::Chunks(chunks) => {
        chunks.get(index).map(|chunk| {
          RenderBlock {
            markdown: chunk.text.clone(),
            slot,
            frame: None,
            index,
          }
        })
      },
      Units::Pages(pages) => {
        pages.get(index).map(|page| {
          RenderBlock {
            markdown: page.content.clone(),
            slot,
            frame: Some(self.frame(page)),
            index,
          }
        })
      },
    }
  }

  async fn append_unit(&self, epoch: u64, index: usize) -> Outcome {
    let Some(block) = self.block(index, Slot::Stream) else {
      return Outcome::Exhausted;
    };

    let result = self.surface.render(block).await;
    if epoch != self.epoch.get() {
      debug!("Discarding unit {index} rendered for a replaced document");
      return Outcome::Stale;
    }

    match result {
      Ok(()) => {
        self.materialized.set(index + 1);
        self.cursor.set(index + 1);
        trace!("Materialized unit {index}");
        Outcome::Materialized(index)
      },
      Err(e) => self.render_failed(index, &e),
    }
  }

  /// Replace the page area with the page (or spread) starting at `target`.
  /// The cursor moves even if rendering fails, so navigation is never stuck
  /// on a broken page.
  async fn show_page(&self, epoch: u64, target: usize) -> Outcome {
    let mode = self.mode();
    let len = self.units.borrow().len();

    let mut blocks = Vec::with_capacity(2);
    if mode == DeliveryMode::TwoPage {
      blocks.extend(self.block(target, Slot::Left));
      if target + 1 < len {
        blocks.extend(self.block(target + 1, Slot::Right));
      }
    } else {
      blocks.extend(self.block(target, Slot::Single));
    }
    if blocks.is_empty() {
      return Outcome::Exhausted;
    }

    self.surface.clear();
    let mut failure = None;
    let mut shown = 0;
    for block in blocks {
      let index = block.index;
      let result = self.surface.render(block).await;
      if epoch != self.epoch.get() {
        debug!("Discarding page {index} rendered for a replaced document");
        return Outcome::Stale;
      }
      match result {
        Ok(()) => shown += 1,
        Err(e) => failure = Some(self.render_failed(index, &e)),
      }
    }

    self.cursor.set(target);
    self.materialized.set(shown);
    self.surface.update_navigation(&self.navigation());
    failure.unwrap_or(Outcome::Materialized(target))
  }

  fn render_failed(&self, index: usize, error: &RenderError) -> Outcome {
    let unit = if self.mode().uses_pages() {
      format!("page {}", index + 1)
    } else {
      format!("section {}", index + 1)
    };
    warn!("Failed to render {unit}: {error}");
    self.surface.notify(&format!("Could not render {unit}: {error}"));
    Outcome::RenderFailed(error.to_string())
  }
}
