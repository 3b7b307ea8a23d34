// Connection handling module
// Serves one accepted TCP connection with the dispatcher

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::handler::Dispatcher;
use crate::http;
use crate::logger;

/// Serve a connection in its own task.
///
/// Each request on the connection is dispatched independently. Errors from
/// the dispatcher (a failing render, an unreadable file) become a plain 500
/// and are logged; the connection stays usable.
pub fn serve_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let dispatcher = Arc::clone(&dispatcher);
            async move {
                let response = match dispatcher.handle_request(req, Some(peer_addr)).await {
                    Ok(response) => response,
                    Err(e) => {
                        logger::log_error(&format!("Request from {peer_addr} failed: {e}"));
                        http::build_500_response()
                    }
                };
                Ok::<_, Infallible>(response)
            }
        });

        let conn = http1::Builder::new()
            .keep_alive(true)
            .serve_connection(io, service);

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
    });
}
