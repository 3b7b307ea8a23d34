// Server module entry point
// Listener binding, connection serving and the start/stop lifecycle

pub mod connection;
pub mod lifecycle;
pub mod listener;
pub mod signal;

pub use lifecycle::{start, ServerHandle};
pub use listener::create_listener;
