//! HTML output for tome books.
//!
//! [`HtmlSurface`] is a [`tome_core::RenderSurface`] that turns every block
//! the delivery controller hands it into HTML with `comrak`, keeps page
//! frames and spreads intact, and can write the result out as a standalone
//! document.
#![allow(
  clippy::future_not_send,
  reason = "Render surfaces run on a single-threaded event loop"
)]

pub mod error;
pub mod markdown;
pub mod surface;
pub mod template;

pub use error::HtmlError;
pub use markdown::markdown_to_html;
pub use surface::{HtmlBlock, HtmlSurface};
