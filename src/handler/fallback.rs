//! Prerendered fallback resolution
//!
//! When a request has neither a dynamic route nor an exact file, the client
//! tree is walked for a prerendered page whose route equals the request:
//! `blog/post-1/index.html` answers `/blog/post-1` and `/blog/post-1/`,
//! `about.html` answers `/about`.
//!
//! The walk is depth-first in the order the file system enumerates directory
//! entries, and the first matching page wins. That order is not specified by
//! the OS, so two pages claiming the same route resolve non-deterministically
//! across platforms. Nothing is cached; every miss walks the tree again.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, ReadDir};

pub const PAGE_EXTENSION: &str = "html";
const INDEX_FILE: &str = "index.html";

/// Lazy depth-first walk yielding every `.html` file under a root.
///
/// A subdirectory is fully descended as soon as it is encountered, before
/// the remaining entries of its parent.
pub struct PrerenderedFiles {
    root: PathBuf,
    stack: Vec<ReadDir>,
    started: bool,
}

impl PrerenderedFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stack: Vec::new(),
            started: false,
        }
    }

    /// Next page file, or `None` once the tree is exhausted
    pub async fn next(&mut self) -> io::Result<Option<PathBuf>> {
        if !self.started {
            self.started = true;
            self.stack.push(fs::read_dir(&self.root).await?);
        }

        while let Some(dir) = self.stack.last_mut() {
            let Some(entry) = dir.next_entry().await? else {
                self.stack.pop();
                continue;
            };

            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                self.stack.push(fs::read_dir(&path).await?);
            } else if is_page(&path) {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

fn is_page(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(&format!(".{PAGE_EXTENSION}")))
}

/// Route-equivalent path of a page: `x/index.html` → `x`, `x/about.html` → `x/about`
pub fn route_of(page: &Path) -> PathBuf {
    if page.file_name().is_some_and(|n| n == INDEX_FILE) {
        return page.parent().map(Path::to_path_buf).unwrap_or_default();
    }
    page.with_extension("")
}

/// Find the first page whose route is a component-wise suffix of `local`.
///
/// `local` and every candidate share the client root as prefix, so a match
/// means the whole route lines up segment by segment.
pub async fn find_fallback(client_root: &Path, local: &Path) -> io::Result<Option<PathBuf>> {
    let mut pages = PrerenderedFiles::new(client_root);
    while let Some(page) = pages.next().await? {
        if local.ends_with(route_of(&page)) {
            return Ok(Some(page));
        }
    }
    Ok(None)
}
