// Listener lifecycle module
// start / stop / running for the dispatcher's TCP listener

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::connection::serve_connection;
use super::listener::create_listener;
use crate::config::Options;
use crate::error::Result;
use crate::handler::Dispatcher;
use crate::logger;
use crate::render::RenderEngine;

/// Owned handle to a running listener.
///
/// Dropping the handle without calling [`ServerHandle::stop`] still signals
/// the accept loop to exit, but does not wait for it.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Address actually bound (resolves port 0)
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Close the listener and wait for the accept loop to exit. Idempotent.
    ///
    /// Connections already accepted finish on their own tasks.
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.shutdown.notify_one();
        if let Err(e) = task.await {
            logger::log_error(&format!("Accept loop on {} ended abnormally: {e}", self.local_addr));
        }
        logger::log_server_stopped(&self.local_addr);
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.shutdown.notify_one();
        }
    }
}

/// Bind `options.hostname:options.port` and serve the dispatcher on it.
///
/// Returns `Ok(None)` without binding anything when `options.start` is false.
/// Must be called from within a Tokio runtime.
pub fn start(
    engine: Arc<dyn RenderEngine>,
    options: &Options,
    client_root: PathBuf,
) -> Result<Option<ServerHandle>> {
    if !options.start {
        logger::log_server_disabled();
        return Ok(None);
    }

    let listener = create_listener(options.socket_addr()?)?;
    let local_addr = listener.local_addr()?;
    logger::log_server_start(&local_addr, &client_root);

    let dispatcher = Arc::new(Dispatcher::new(engine, client_root, options.logging.clone()));
    let shutdown = Arc::new(Notify::new());
    let task = tokio::spawn(accept_loop(listener, dispatcher, Arc::clone(&shutdown)));

    Ok(Some(ServerHandle {
        local_addr,
        shutdown,
        task: Some(task),
    }))
}

async fn accept_loop(listener: TcpListener, dispatcher: Arc<Dispatcher>, shutdown: Arc<Notify>) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        serve_connection(stream, peer_addr, Arc::clone(&dispatcher));
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::StaticSiteEngine;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn local_options() -> Options {
        Options {
            hostname: "127.0.0.1".to_string(),
            port: 0,
            ..Options::default()
        }
    }

    fn engine() -> Arc<dyn RenderEngine> {
        Arc::new(StaticSiteEngine::default())
    }

    #[tokio::test]
    async fn test_start_disabled() {
        let options = Options {
            start: false,
            ..local_options()
        };
        let handle = start(engine(), &options, PathBuf::from("client")).unwrap();
        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn test_start_then_stop_twice() {
        let dir = tempfile::tempdir().unwrap();
        let mut handle = start(engine(), &local_options(), dir.path().to_path_buf())
            .unwrap()
            .unwrap();
        assert!(handle.running());
        assert_ne!(handle.local_addr().port(), 0);

        handle.stop().await;
        assert!(!handle.running());
        handle.stop().await;
        assert!(!handle.running());
    }

    #[tokio::test]
    async fn test_serves_prerendered_page_over_tcp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("blog/post-1")).unwrap();
        std::fs::write(dir.path().join("blog/post-1/index.html"), "<h1>post</h1>").unwrap();

        let mut handle = start(engine(), &local_options(), dir.path().to_path_buf())
            .unwrap()
            .unwrap();

        let mut stream = tokio::net::TcpStream::connect(handle.local_addr()).await.unwrap();
        stream
            .write_all(b"GET /blog/post-1/ HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let text = String::from_utf8_lossy(&raw);

        assert!(text.starts_with("HTTP/1.1 200 OK"));
        assert!(text.contains("text/html"));
        assert!(text.ends_with("<h1>post</h1>"));

        handle.stop().await;
    }
}
