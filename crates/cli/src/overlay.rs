use std::io::{self, Write};

/// Display surface for the last-action label.
///
/// The controller owns exactly one overlay and writes whole-string updates;
/// `clear` must be idempotent.
pub trait Overlay {
    fn show(&mut self, text: &str);
    fn clear(&mut self);
}

/// Single in-place-updated terminal line on stderr.
///
/// Stderr keeps the overlay out of the way of anything piping stdout, and
/// matches where the log output goes.
pub struct StatusLine {
    active: bool,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLine {
    pub fn new() -> Self {
        Self { active: false }
    }

    fn redraw(&self, text: &str) {
        let mut err = io::stderr();
        // \r + erase-line, then the fresh text; no trailing newline so the
        // next update overwrites in place.
        let _ = write!(err, "\r\x1b[2K{text}");
        let _ = err.flush();
    }
}

impl Overlay for StatusLine {
    fn show(&mut self, text: &str) {
        self.redraw(text);
        self.active = true;
    }

    fn clear(&mut self) {
        if self.active {
            self.redraw("");
            self.active = false;
        }
    }
}

impl Drop for StatusLine {
    fn drop(&mut self) {
        self.clear();
    }
}
