use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

/// Upper bound on session lifetime, ten years.
const MAX_SESSION_TTL_DAYS: i64 = 3650;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub youtube_api_key: String,
    pub youtube_base_url: String,
    pub youtube_rps: u32,
    pub video_timeout: Duration,
    pub metadata_timeout: Duration,
    /// User allowed to edit and delete films.
    pub admin_user_id: String,
    pub session_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://filmshelf.db?mode=rwc".to_string());

        let youtube_api_key = std::env::var("YOUTUBE_API_KEY").unwrap_or_default();
        let youtube_base_url = std::env::var("YOUTUBE_BASE_URL")
            .unwrap_or_else(|_| "https://youtube.googleapis.com/youtube/v3".to_string());

        let youtube_rps: u32 =
            std::env::var("YOUTUBE_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        let video_timeout_secs: u64 =
            std::env::var("VIDEO_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(10);

        let metadata_timeout_secs: u64 = std::env::var("METADATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let admin_user_id = std::env::var("ADMIN_USER_ID").unwrap_or_default();

        let session_ttl_days = session_ttl_days(std::env::var("SESSION_TTL_DAYS").ok());

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            youtube_api_key,
            youtube_base_url,
            youtube_rps,
            video_timeout: Duration::from_secs(video_timeout_secs),
            metadata_timeout: Duration::from_secs(metadata_timeout_secs),
            admin_user_id,
            session_ttl_days,
        })
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        !self.admin_user_id.is_empty() && self.admin_user_id == user_id
    }
}

fn session_ttl_days(raw: Option<String>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(30)
        .clamp(1, MAX_SESSION_TTL_DAYS)
}
