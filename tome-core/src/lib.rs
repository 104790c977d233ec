//! # tome - folders of notes, read as a book
//!
//! `tome-core` turns a hierarchy of markdown notes into one continuous
//! document and hands it out piece by piece to whatever is displaying it.
//!
//! ## Quick Start
//!
//! ```rust
//! use tome_core::{normalize::normalize, split::split_into_pages};
//!
//! // A note's own headings are pushed below the headings that introduce it.
//! let body = normalize("# Hello\nWorld", 3);
//! assert_eq!(body, "### Hello\nWorld\n\n");
//!
//! // The composed document is then cut into pages of a fixed line count.
//! let pages = split_into_pages(&body, 2);
//! assert_eq!(pages.len(), 2);
//! assert_eq!(pages[0].total_pages, 2);
//! ```
//!
//! ## Pipeline
//!
//! - [`tree`]: the folder/file model and the conversion from a
//!   [`vault::FolderProvider`]
//! - [`compose`]: depth-first concatenation with heading renormalization
//! - [`split`]: line-count chunks and pages
//! - [`delivery`]: the per-view state machine that materializes units into a
//!   [`delivery::RenderSurface`]
//! - [`snapshot`]: immutable, named copies of a composed document
//! - [`session`]: one open view tying the above together
//!
//! Everything that touches the outside world goes through the traits in
//! [`vault`] and [`delivery::surface`]. The model is single-threaded and
//! cooperative, so none of those traits require `Send`.
#![allow(
  clippy::future_not_send,
  reason = "Delivery runs on a single-threaded event loop"
)]

pub mod compose;
pub mod delivery;
pub mod error;
pub mod normalize;
pub mod session;
pub mod snapshot;
pub mod split;
pub mod tree;
mod utils;
pub mod vault;

pub use crate::{
  compose::{Composer, compose, compose_path},
  delivery::{
    DeliveryController,
    DeliveryMode,
    DeliveryOptions,
    Outcome,
    RenderSurface,
  },
  error::{CompositionError, ProviderError, ReadError, RenderError, StorageError},
  normalize::normalize,
  session::{BookSession, SessionError},
  snapshot::{Provenance, SnapshotError, SnapshotStore},
  split::{Chunk, Page, split_into_chunks, split_into_pages},
  tree::FolderNode,
};
