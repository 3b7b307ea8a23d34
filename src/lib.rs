//! Deployment adapter for server-rendered sites.
//!
//! The build side ([`build`]) re-bundles the framework's server entry into a
//! single module and removes the chunks that made obsolete. The runtime side
//! ([`exports`], [`server`], [`handler`]) serves each request by rendering a
//! matched route, or else the prerendered static file for the path.

pub mod build;
pub mod config;
pub mod error;
pub mod exports;
pub mod handler;
pub mod http;
pub mod logger;
pub mod render;
pub mod server;

pub use build::{AdapterDescriptor, BuildTarget, Bundler, CommandBundler, Integration};
pub use config::{merge_all, merge_config, BuildConfig, Options};
pub use error::{AdapterError, Result};
pub use exports::Exports;
pub use handler::{Dispatcher, Resolution};
pub use render::{ClientAddress, RenderEngine, RenderRequest, StaticSiteEngine};
pub use server::ServerHandle;
