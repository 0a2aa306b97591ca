use std::sync::Arc;
use tokio::sync::Notify;

use mirror_lab::config::{AppState, Config};
use mirror_lab::{handler, logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument overrides the listen port
    let port_arg = std::env::args().nth(1);
    let cfg = Config::load()?.with_port_arg(port_arg.as_deref())?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    let state = Arc::new(AppState::new(&cfg));
    let router = Arc::new(handler::build_router(&state));

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    logger::log_server_start(&listener.local_addr()?, &cfg);

    // Connections are spawned with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(
            listener,
            router,
            server::ServerOptions::from_config(&cfg),
            shutdown,
        ))
        .await;

    Ok(())
}
