use pixvault_core::Config;

// mimalloc keeps fragmentation low for the many short-lived upload buffers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    // Telemetry, directories, media backend, routes
    let (_state, router) = pixvault_api::setup::initialize_app(config.clone()).await?;

    pixvault_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
