// Connection handling module
// Serves one TCP connection with hyper and writes the access log

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;

use crate::config::Config;
use crate::http::HttpResponse;
use crate::logger::{self, AccessLogEntry};
use crate::routing::Router;

/// Per-connection behavior, derived from configuration once at startup
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub keep_alive: bool,
    /// Upper bound for a whole connection; `None` lets slow bodies wait forever
    pub connection_timeout: Option<Duration>,
    pub max_connections: Option<u64>,
    pub access_log: bool,
    pub access_log_format: String,
}

impl ServerOptions {
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.performance.connection_timeout;
        Self {
            keep_alive: config.performance.keep_alive,
            connection_timeout: (timeout > 0).then(|| Duration::from_secs(timeout)),
            max_connections: config.performance.max_connections,
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
        }
    }
}

/// Accept a connection, enforcing the connection limit.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address, reported as `origin`
/// * `router` - Route table shared by all connections
/// * `options` - Connection and logging options
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    router: &Arc<Router>,
    options: &Arc<ServerOptions>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = options.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(router),
        Arc::clone(options),
        Arc::clone(conn_counter),
    );
}

/// Serve a single connection in a task spawned on the current `LocalSet`.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    router: Arc<Router>,
    options: Arc<ServerOptions>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(options.keep_alive);

        let service_options = Arc::clone(&options);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let router = Arc::clone(&router);
                let options = Arc::clone(&service_options);
                async move {
                    Ok::<_, Infallible>(serve_request(&router, &options, req, Some(peer_addr)).await)
                }
            }),
        );

        match options.connection_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => logger::log_connection_error(&err),
                Err(_) => logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    limit.as_secs()
                )),
            },
            None => {
                if let Err(err) = conn.await {
                    logger::log_connection_error(&err);
                }
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Route one request and write its access log line
pub async fn serve_request<B>(
    router: &Router,
    options: &ServerOptions,
    req: Request<B>,
    remote_addr: Option<SocketAddr>,
) -> HttpResponse
where
    B: Body,
    B::Error: fmt::Display,
{
    let started = Instant::now();
    let entry = options
        .access_log
        .then(|| AccessLogEntry::from_request(&req, remote_addr));

    let response = router.handle(req, remote_addr).await;

    if let Some(mut entry) = entry {
        let body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.complete(response.status().as_u16(), body_bytes, started.elapsed());
        logger::log_access(&entry, &options.access_log_format);
    }

    response
}
