// Server loop module
// Accepts connections until shutdown is requested

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::{accept_connection, ServerOptions};
use crate::logger;
use crate::routing::Router;

/// Accept connections and serve them with `router` until `shutdown` is notified.
///
/// Connections are spawned with `spawn_local`, so this must run inside a
/// `tokio::task::LocalSet`. In-flight connections are not awaited on
/// shutdown.
pub async fn start_server_loop(
    listener: TcpListener,
    router: Arc<Router>,
    options: ServerOptions,
    shutdown: Arc<Notify>,
) {
    let options = Arc::new(options);
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &router,
                            &options,
                            &active_connections,
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                logger::log_shutdown("Listener closed, no longer accepting connections");
                break;
            }
        }
    }
}
