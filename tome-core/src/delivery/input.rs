//! User input the controller reacts to.

/// Scroll position of a scrolling view, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
  pub scroll_top:    f64,
  pub scroll_height: f64,
  pub client_height: f64,
}

impl ScrollMetrics {
  /// Distance between the bottom of the viewport and the end of the content.
  #[must_use]
  pub fn distance_to_bottom(&self) -> f64 {
    self.scroll_height - self.scroll_top - self.client_height
  }

  #[must_use]
  pub fn is_near_bottom(&self, threshold: f64) -> bool {
    self.distance_to_bottom() < threshold
  }
}

/// Keys with a meaning in page views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
  ArrowLeft,
  ArrowRight,
  Other,
}

impl Key {
  /// Map a key name as reported by the host (`"ArrowLeft"`, ...).
  #[must_use]
  pub fn from_name(name: &str) -> Self {
    match name {
      "ArrowLeft" => Self::ArrowLeft,
      "ArrowRight" => Self::ArrowRight,
      _ => Self::Other,
    }
  }
}

/// Where keyboard focus is when a key arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusContext {
  /// Whether the view is still attached to the host.
  pub attached:      bool,
  /// Whether focus is inside a text input or an editable region.
  pub in_text_input: bool,
}

impl Default for FocusContext {
  fn default() -> Self {
    Self {
      attached:      true,
      in_text_input: false,
    }
  }
}

impl FocusContext {
  /// Whether page keys should act.
  #[must_use]
  pub const fn accepts_navigation(&self) -> bool {
    self.attached && !self.in_text_input
  }
}
