// Listener module
// Binds the TCP listener the dispatcher is served on

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

use crate::error::{AdapterError, Result};

const BACKLOG: i32 = 1024;

/// Create a `TcpListener` bound to `addr`.
///
/// `SO_REUSEADDR` is set so a restart can rebind while old sockets sit in
/// `TIME_WAIT`. `SO_REUSEPORT` is deliberately left off: a second listener on
/// a port that is already in use must fail with `ListenerBind`.
///
/// Must be called from within a Tokio runtime.
pub fn create_listener(addr: std::net::SocketAddr) -> Result<TcpListener> {
    let bind_err = |source| AdapterError::ListenerBind { addr, source };

    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(bind_err)?;
    socket.set_reuse_address(true).map_err(bind_err)?;
    socket.set_nonblocking(true).map_err(bind_err)?;
    socket.bind(&addr.into()).map_err(bind_err)?;
    socket.listen(BACKLOG).map_err(bind_err)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener).map_err(bind_err)
}
