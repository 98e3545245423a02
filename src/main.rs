use std::sync::Arc;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod media;
mod server;
mod stats;

use server::{bind_listener, shutdown_signal, start_server_loop};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_info(&format!("[CONFIG] Using {workers} worker threads"));
    } else {
        logger::log_info("[CONFIG] Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = bind_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg));
    let shutdown = shutdown_signal()?;

    if !state.media_root.is_dir() {
        logger::log_warning(&format!(
            "Media directory {} does not exist; track requests will return 404",
            state.media_root.display()
        ));
    }

    logger::log_server_start(&addr, &cfg);

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(start_server_loop(listener, state, shutdown))
        .await
}
