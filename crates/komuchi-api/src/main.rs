use komuchi_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (state, router) = komuchi_api::setup::initialize_app(config.clone()).await?;

    komuchi_api::setup::server::start_server(&config, router).await?;

    // The server has drained; stop the job queue before exiting.
    if let Some(worker) = &state.worker {
        worker.queue.shutdown().await;
    }

    Ok(())
}
