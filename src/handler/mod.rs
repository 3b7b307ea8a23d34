//! Request handler module
//!
//! Decides which artifact answers a request: the render engine, an exact
//! static file, or a prerendered fallback page.

pub mod fallback;
pub mod router;
pub mod static_files;

pub use router::{Dispatcher, Resolution};
