// Server module entry
// Listener setup, connection serving and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

// Rust does not allow `loop` as a module name (keyword)
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used items
pub use connection::{serve_request, ServerOptions};
pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;
pub use signal::start_signal_handler;
