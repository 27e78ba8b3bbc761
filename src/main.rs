use cors_devserver::config::Config;
use cors_devserver::{logger, server, Server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file path, defaults and environment apply either way
    let config_path = std::env::args().nth(1);
    let cfg = Config::load(config_path.as_deref())?;
    logger::init(&cfg)?;

    // Build the Tokio runtime, thread count from `server.workers`
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let server = Server::bind(cfg)?;

    let state = server.state();
    logger::log_server_start(&server.local_addr(), &state.root, &state.config);

    server.run_until(server::shutdown_signal()).await?;
    Ok(())
}
