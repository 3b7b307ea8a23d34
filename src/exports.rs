//! Runtime surface handed to the host: `start`, `stop`, `running`, `handle`.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Options;
use crate::error::Result;
use crate::http::HttpResponse;
use crate::logger;
use crate::render::{RenderEngine, RenderRequest};
use crate::server::{self, ServerHandle};

/// Names of the operations [`Exports`] provides, as advertised to the host
pub const EXPORT_NAMES: [&str; 4] = ["stop", "handle", "start", "running"];

/// The four runtime operations, bound to one engine and one set of options.
///
/// Owns at most one listener at a time.
pub struct Exports {
    engine: Arc<dyn RenderEngine>,
    options: Options,
    client_root: PathBuf,
    server: Option<ServerHandle>,
}

impl Exports {
    pub fn new(engine: Arc<dyn RenderEngine>, options: Options, client_root: PathBuf) -> Self {
        Self {
            engine,
            options,
            client_root,
            server: None,
        }
    }

    /// Start the listener unless `options.start` is false or one is already running.
    pub fn start(&mut self) -> Result<()> {
        if self.running() {
            logger::log_warning("start called while the listener is already running");
            return Ok(());
        }
        self.server = server::start(
            Arc::clone(&self.engine),
            &self.options,
            self.client_root.clone(),
        )?;
        Ok(())
    }

    /// Stop the listener if one is running. Safe to call repeatedly.
    pub async fn stop(&mut self) {
        if let Some(mut handle) = self.server.take() {
            handle.stop().await;
        }
    }

    pub fn running(&self) -> bool {
        self.server.as_ref().is_some_and(ServerHandle::running)
    }

    /// Bound address of the running listener
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.server.as_ref().map(ServerHandle::local_addr)
    }

    /// Render a request directly, bypassing the listener and static lookup.
    pub async fn handle(&self, request: RenderRequest) -> Result<HttpResponse> {
        self.engine.render(request).await
    }
}
