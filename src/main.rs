use std::{sync::Arc, time::Duration};

use filmshelf::{AppState, config::Config, db, store::Store, youtube::YoutubeClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,filmshelf=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = wreq::Client::builder().timeout(Duration::from_secs(30)).build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let store = Store::new(db);

    let youtube = YoutubeClient::new(
        http.clone(),
        config.youtube_api_key.clone(),
        config.youtube_base_url.clone(),
        config.youtube_rps,
        config.video_timeout,
    );

    let state = Arc::new(AppState { config: config.clone(), http, store, youtube: Arc::new(youtube) });
    let app = filmshelf::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
