//! Expose tome's command handlers for use in integration tests. The library
//! crates (`tome-core`, `tome-config`, `tome-html`) are the supported API.
#![allow(
  clippy::future_not_send,
  reason = "Commands run on a current-thread runtime"
)]
pub mod cli;
pub mod commands;
pub mod terminal;
