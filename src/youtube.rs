use std::{fmt, num::NonZeroU32, sync::Arc, time::Duration};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::Deserialize;
use tracing::debug;
use url::Url;
use wreq::header::ACCEPT;

use crate::models::VideoMetadata;

const VIDEO_ID_LEN: usize = 11;

/// An 11-character YouTube video identifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VideoId(String);

impl VideoId {
    /// Accepts a bare identifier only. Use [`extract_video_id`] for URLs.
    pub fn parse(s: &str) -> Option<Self> {
        (s.len() == VIDEO_ID_LEN && s.chars().all(is_id_char)).then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

const PATH_MARKERS: &[&str] =
    &["youtu.be/", "youtube.com/embed/", "youtube.com/v/", "youtube.com/shorts/"];
const WATCH_MARKER: &str = "youtube.com/watch?";

/// Pulls the video id out of a YouTube URL or a bare id. Pure string matching.
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    let input = input.trim();
    if input.len() < VIDEO_ID_LEN {
        return None;
    }
    if let Some(id) = VideoId::parse(input) {
        return Some(id);
    }
    if !input.contains("youtu") {
        return None;
    }

    for marker in PATH_MARKERS {
        if let Some(pos) = input.find(marker) {
            if let Some(id) = take_id(&input[pos + marker.len()..]) {
                return Some(id);
            }
        }
    }

    let pos = input.find(WATCH_MARKER)?;
    let query = &input[pos + WATCH_MARKER.len()..];
    let query = query.split('#').next().unwrap_or_default();
    query.split('&').find_map(|pair| pair.strip_prefix("v=")).and_then(take_id)
}

/// True for absolute http(s) URLs on a YouTube host. Bare ids are not URLs.
pub fn is_youtube_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let host = url.host_str().unwrap_or_default();
    host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com")
}

fn take_id(rest: &str) -> Option<VideoId> {
    let end = rest.find(|c: char| !is_id_char(c)).unwrap_or(rest.len());
    VideoId::parse(&rest[..end])
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid video id")]
    InvalidVideoId,

    #[error("video API returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("video API key is not configured")]
    MissingApiKey,

    #[error("video API request timed out")]
    Timeout,

    #[error("video API request failed: {0}")]
    Request(wreq::Error),
}

impl From<wreq::Error> for FetchError {
    fn from(err: wreq::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Request(err) }
    }
}

pub struct YoutubeClient {
    client: wreq::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl YoutubeClient {
    pub fn new(
        client: wreq::Client,
        api_key: String,
        base_url: String,
        rps: u32,
        timeout: Duration,
    ) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("no YOUTUBE_API_KEY provided, video auto-fill is disabled");
        }

        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        Self { client, api_key, base_url, timeout, limiter }
    }

    /// Looks up one video. `Ok(None)` means the API answered but knows no such video.
    /// Never retries.
    pub async fn fetch_video(&self, video_id: &str) -> Result<Option<VideoMetadata>, FetchError> {
        let id = VideoId::parse(video_id).ok_or(FetchError::InvalidVideoId)?;
        if self.api_key.trim().is_empty() {
            return Err(FetchError::MissingApiKey);
        }

        let url = format!("{}/videos", self.base_url.trim_end_matches('/'));
        let request = self.client.get(url).header(ACCEPT, "application/json").query(&[
            ("part", "snippet,contentDetails,statistics"),
            ("id", id.as_str()),
            ("key", self.api_key.as_str()),
        ]);

        debug!(video_id = %id, "fetching video metadata");

        let resp: VideosResponse = tokio::time::timeout(self.timeout, async {
            self.limiter.until_ready().await;
            let resp = request.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Upstream { status: status.as_u16() });
            }
            Ok::<_, FetchError>(resp.json::<VideosResponse>().await?)
        })
        .await
        .map_err(|_| FetchError::Timeout)??;

        let video = resp.items.into_iter().next().map(VideoMetadata::from);
        debug!(video_id = %id, found = video.is_some(), "video metadata fetched");
        Ok(video)
    }
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Snippet {
    title: String,
    description: String,
    channel_title: String,
    published_at: String,
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

impl From<VideoItem> for VideoMetadata {
    fn from(item: VideoItem) -> Self {
        let Snippet { title, description, channel_title, published_at, thumbnails } = item.snippet;
        let thumbnail_url =
            thumbnails.high.or(thumbnails.medium).or(thumbnails.default).map(|t| t.url);
        Self {
            id: item.id,
            title,
            description,
            thumbnail_url,
            published_at,
            channel_title,
            view_count: item.statistics.view_count,
            like_count: item.statistics.like_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::Query,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
    };
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_ids_from_known_shapes() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ#t=10",
            "dQw4w9WgXcQ",
            "  dQw4w9WgXcQ  ",
        ];
        for case in cases {
            assert_eq!(
                extract_video_id(case).as_ref().map(VideoId::as_str),
                Some("dQw4w9WgXcQ"),
                "{case}"
            );
        }
    }

    #[test]
    fn rejects_everything_else() {
        let cases = [
            "",
            "short",
            "https://example.com",
            "https://vimeo.com/123456789012",
            "https://www.youtube.com/watch?v=tooShort",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQextra",
            "https://www.youtube.com/channel/UCabcdefghijk",
            "dQw4w9WgXc!",
        ];
        for case in cases {
            assert_eq!(extract_video_id(case), None, "{case}");
        }
    }

    #[test]
    fn only_youtube_hosts_count_as_youtube_urls() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_youtube_url(" http://m.youtube.com/shorts/dQw4w9WgXcQ "));

        assert!(!is_youtube_url("dQw4w9WgXcQ"));
        assert!(!is_youtube_url("youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!is_youtube_url("https://notyoutube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!is_youtube_url("https://vimeo.com/youtu.be/dQw4w9WgXcQ"));
        assert!(!is_youtube_url("ftp://youtube.com/watch?v=dQw4w9WgXcQ"));
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn client(base_url: String, timeout: Duration) -> YoutubeClient {
        throttled_client(base_url, timeout, 100)
    }

    fn throttled_client(base_url: String, timeout: Duration, rps: u32) -> YoutubeClient {
        YoutubeClient::new(
            wreq::Client::builder().build().unwrap(),
            "test-key".to_string(),
            base_url,
            rps,
            timeout,
        )
    }

    async fn videos(Query(q): Query<HashMap<String, String>>) -> Response {
        assert_eq!(q.get("key").map(String::as_str), Some("test-key"));
        assert_eq!(q.get("part").map(String::as_str), Some("snippet,contentDetails,statistics"));
        match q.get("id").map(String::as_str) {
            Some("dQw4w9WgXcQ") => Json(json!({
                "items": [{
                    "id": "dQw4w9WgXcQ",
                    "snippet": {
                        "title": "Backcountry Lines",
                        "description": "Deep days",
                        "channelTitle": "Ski Co",
                        "publishedAt": "2024-01-15T10:00:00Z",
                        "thumbnails": {
                            "default": { "url": "https://i.ytimg.com/default.jpg" },
                            "high": { "url": "https://i.ytimg.com/high.jpg" }
                        }
                    },
                    "statistics": { "viewCount": "1234", "likeCount": "56" }
                }]
            }))
            .into_response(),
            Some("errorerror1") => StatusCode::FORBIDDEN.into_response(),
            _ => Json(json!({ "items": [] })).into_response(),
        }
    }

    #[tokio::test]
    async fn fetches_and_maps_a_video() {
        let base = serve(Router::new().route("/videos", get(videos))).await;
        let yt = client(base, Duration::from_secs(5));

        let video = yt.fetch_video("dQw4w9WgXcQ").await.unwrap().unwrap();

        assert_eq!(video.title, "Backcountry Lines");
        assert_eq!(video.channel_title, "Ski Co");
        assert_eq!(video.thumbnail_url.as_deref(), Some("https://i.ytimg.com/high.jpg"));
        assert_eq!(video.view_count.as_deref(), Some("1234"));
    }

    #[tokio::test]
    async fn missing_video_is_not_an_error() {
        let base = serve(Router::new().route("/videos", get(videos))).await;
        let yt = client(base, Duration::from_secs(5));

        assert!(yt.fetch_video("aaaaaaaaaaa").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upstream_status_is_reported() {
        let base = serve(Router::new().route("/videos", get(videos))).await;
        let yt = client(base, Duration::from_secs(5));

        let err = yt.fetch_video("errorerror1").await.unwrap_err();
        assert!(matches!(err, FetchError::Upstream { status: 403 }), "{err:?}");
    }

    #[tokio::test]
    async fn invalid_id_fails_before_any_request() {
        let yt = client("http://127.0.0.1:1".to_string(), Duration::from_secs(5));

        let err = yt.fetch_video("https://youtu.be/dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidVideoId));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let app = Router::new().route(
            "/videos",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "items": [] }))
            }),
        );
        let base = serve(app).await;
        let yt = client(base, Duration::from_millis(100));

        let err = yt.fetch_video("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout), "{err:?}");
    }

    #[tokio::test]
    async fn rate_limit_wait_counts_toward_the_timeout() {
        let base = serve(Router::new().route("/videos", get(videos))).await;
        let yt = throttled_client(base, Duration::from_millis(200), 1);

        assert!(yt.fetch_video("dQw4w9WgXcQ").await.unwrap().is_some());

        // The next permit is about a second away.
        let err = yt.fetch_video("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout), "{err:?}");
    }
}
