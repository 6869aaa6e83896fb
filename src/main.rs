use yt_batch_uploader::auth::AuthProvider;
use yt_batch_uploader::config;
use yt_batch_uploader::errors::AppResult;
use yt_batch_uploader::uploader::{QueueDriver, YouTubeClient};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting yt-batch-uploader");

    if let Err(e) = run().await {
        log::error!("Fatal: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let config = config::load_config()?;

    let auth =
        AuthProvider::from_client_secrets(&config.client_secrets_file, &config.token_cache_file)
            .await?;
    let client = YouTubeClient::new(auth)?;

    let mut driver = QueueDriver::new(config, client);
    driver.run().await?;
    Ok(())
}
