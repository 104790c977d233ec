use std::{
  cell::{Cell, RefCell},
  io::Write,
};

use tome_core::{
  RenderError,
  RenderSurface,
  delivery::{Margin, Navigation, RenderBlock},
};

const RULE_WIDTH: usize = 60;

fn rule(label: Option<&str>) -> String {
  match label {
    Some(label) => {
      let fill = RULE_WIDTH.saturating_sub(label.chars().count() + 4);
      format!("── {label} {}", "─".repeat(fill))
    },
    None => "─".repeat(RULE_WIDTH),
  }
}

/// Render surface writing markdown to a terminal (or any writer).
///
/// Page margins become rules carrying the header and footer text; spacers
/// become bare rules so every page has the same shape.
#[derive(Debug)]
pub struct TerminalSurface<W: Write> {
  out:   RefCell<W>,
  dirty: Cell<bool>,
}

impl<W: Write> TerminalSurface<W> {
  pub const fn new(out: W) -> Self {
    Self {
      out:   RefCell::new(out),
      dirty: Cell::new(false),
    }
  }

  pub fn into_inner(self) -> W {
    self.out.into_inner()
  }

  fn write_line(&self, line: &str) {
    // Only reachable when the writer is gone, nothing left to report to.
    let _ = writeln!(self.out.borrow_mut(), "{line}");
  }
}

impl<W: Write> RenderSurface for TerminalSurface<W> {
  fn clear(&self) {
    if self.dirty.replace(false) {
      self.write_line("");
      self.write_line(&"═".repeat(RULE_WIDTH));
      self.write_line("");
    }
  }

  async fn render(&self, block: RenderBlock) -> Result<(), RenderError> {
    let mut out = self.out.borrow_mut();
    match &block.frame {
      Some(frame) => {
        writeln!(out, "{}", rule(frame.header.text()))?;
        write!(out, "{}", block.markdown)?;
        if !block.markdown.ends_with('\n') {
          writeln!(out)?;
        }
        let footer = match &frame.footer {
          Margin::Text(text) => rule(Some(text)),
          Margin::Spacer => rule(None),
        };
        writeln!(out, "{footer}")?;
      },
      None => {
        write!(out, "{}", block.markdown)?;
        if !block.markdown.ends_with('\n') {
          writeln!(out)?;
        }
      },
    }
    out.flush()?;
    self.dirty.set(true);
    Ok(())
  }

  fn show_error(&self, message: &str) {
    self.clear();
    self.write_line(&format!("!! {message}"));
    self.dirty.set(true);
  }

  fn notify(&self, message: &str) {
    self.write_line(&format!("-- {message}"));
  }

  fn update_navigation(&self, navigation: &Navigation) {
    if let Some(label) = &navigation.label {
      let previous = if navigation.can_previous { "[p]revious" } else { "" };
      let next = if navigation.can_next { "[n]ext" } else { "" };
      self.write_line(&format!("[{label}] {previous} {next} [q]uit"));
    }
  }
}
