use std::path::PathBuf;

use tracing::debug;

/// Source of the current browser URL, re-read on every poll tick.
///
/// Torn swaps attack targets without a full page reload, so the controller
/// never caches what these yield.
pub trait PageContext {
    fn current_url(&self) -> Option<String>;
}

impl PageContext for Box<dyn PageContext> {
    fn current_url(&self) -> Option<String> {
        (**self).current_url()
    }
}

/// Fixed URL taken from the command line.
pub struct StaticPage {
    url: String,
}

impl StaticPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl PageContext for StaticPage {
    fn current_url(&self) -> Option<String> {
        Some(self.url.clone())
    }
}

/// URL kept current in a file (first line), re-read on every call.
pub struct PageFile {
    path: PathBuf,
}

impl PageFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PageContext for PageFile {
    fn current_url(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let url = content.lines().next().unwrap_or("").trim().to_string();
                if url.is_empty() {
                    None
                } else {
                    Some(url)
                }
            }
            Err(e) => {
                debug!("Could not read URL file {}: {e}", self.path.display());
                None
            }
        }
    }
}
