use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;
use wreq::header::{CONTENT_TYPE, USER_AGENT};

use crate::models::PageMetadata;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const TITLE_SELECTORS: &[&str] = &["meta[property='og:title']", "meta[name='twitter:title']"];
const AUTHOR_SELECTORS: &[&str] = &[
    "meta[name='author']",
    "meta[property='article:author']",
    "meta[name='twitter:creator']",
];
const ICON_SELECTORS: &[&str] = &[
    "link[rel='icon']",
    "link[rel='shortcut icon']",
    "link[rel='apple-touch-icon']",
    "link[rel='apple-touch-icon-precomposed']",
];

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("Unsupported URL protocol \"{0}\"")]
    UnsupportedScheme(String),

    #[error("Failed to fetch URL: HTTP {0}")]
    Status(u16),

    #[error("URL does not point to an HTML page")]
    NotHtml,

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to fetch URL: {0}")]
    Request(wreq::Error),
}

impl From<wreq::Error> for MetadataError {
    fn from(err: wreq::Error) -> Self {
        if err.is_timeout() { MetadataError::Timeout } else { MetadataError::Request(err) }
    }
}

/// Parses and checks a user-supplied page URL. Only http and https are fetched.
pub fn parse_page_url(raw: &str) -> Result<Url, MetadataError> {
    let url = Url::parse(raw.trim()).map_err(|_| MetadataError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(MetadataError::UnsupportedScheme(other.to_string())),
    }
}

/// Fetches a page and extracts title, author and favicon. Every failure is reported.
pub async fn fetch_page_metadata(
    client: &wreq::Client,
    raw_url: &str,
    timeout: Duration,
) -> Result<PageMetadata, MetadataError> {
    let url = parse_page_url(raw_url)?;
    let html = fetch_html(client, &url, timeout).await?;
    Ok(extract_metadata(&html, &url))
}

/// Like [`fetch_page_metadata`], but once the URL is syntactically valid it always
/// produces something usable, falling back to values derived from the hostname.
pub async fn fetch_or_fallback(
    client: &wreq::Client,
    raw_url: &str,
    timeout: Duration,
) -> Result<PageMetadata, MetadataError> {
    let url = parse_page_url(raw_url)?;
    match fetch_html(client, &url, timeout).await {
        Ok(html) => Ok(extract_metadata(&html, &url)),
        Err(err) => {
            warn!(url = %url, error = %err, "page metadata unavailable, using fallback");
            Ok(PageMetadata { error: Some(err.to_string()), ..fallback(&url) })
        },
    }
}

async fn fetch_html(client: &wreq::Client, url: &Url, timeout: Duration) -> Result<String, MetadataError> {
    debug!(url = %url, "fetching page metadata");

    tokio::time::timeout(timeout, async {
        let resp = client.get(url.as_str()).header(USER_AGENT, BROWSER_USER_AGENT).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MetadataError::Status(status.as_u16()));
        }

        let is_html = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text/html"));
        if !is_html {
            return Err(MetadataError::NotHtml);
        }

        Ok::<_, MetadataError>(resp.text().await?)
    })
    .await
    .map_err(|_| MetadataError::Timeout)?
}

/// Best-effort extraction, trying each source in order and ending at hostname-derived values.
pub fn extract_metadata(html: &str, page: &Url) -> PageMetadata {
    let doc = Html::parse_document(html);

    let title = first_content(&doc, TITLE_SELECTORS)
        .or_else(|| first_text(&doc, "title"))
        .unwrap_or_else(|| hostname(page));

    let author = first_content(&doc, AUTHOR_SELECTORS).unwrap_or_default();

    let favicon = ICON_SELECTORS
        .iter()
        .filter_map(|s| first_attr(&doc, s, "href"))
        .find_map(|href| origin_url(page).join(&href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| default_favicon(page));

    PageMetadata { title, author, favicon, error: None }
}

pub fn fallback(page: &Url) -> PageMetadata {
    PageMetadata {
        title: hostname(page),
        author: String::new(),
        favicon: default_favicon(page),
        error: None,
    }
}

fn hostname(page: &Url) -> String {
    page.host_str().unwrap_or_default().to_string()
}

fn origin_url(page: &Url) -> Url {
    let mut origin = page.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

fn default_favicon(page: &Url) -> String {
    format!("{}/favicon.ico", page.origin().ascii_serialization())
}

fn first_content(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|s| first_attr(doc, s, "content"))
}

fn first_attr(doc: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let el = doc.select(&selector).next()?;
    let text = el.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::header, routing::get};

    use super::*;

    fn page(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn prefers_open_graph_then_twitter_then_title() {
        let html = r#"<html><head>
            <title>Plain title</title>
            <meta name="twitter:title" content="Twitter title">
            <meta property="og:title" content="  OG title ">
        </head></html>"#;
        assert_eq!(extract_metadata(html, &page("https://a.test/x")).title, "OG title");

        let html = r#"<head><title>Plain title</title><meta name="twitter:title" content="Twitter title"></head>"#;
        assert_eq!(extract_metadata(html, &page("https://a.test/x")).title, "Twitter title");

        let html = r#"<head><meta property="og:title" content=""><title> Plain title </title></head>"#;
        assert_eq!(extract_metadata(html, &page("https://a.test/x")).title, "Plain title");

        let meta = extract_metadata("<p>nothing</p>", &page("https://a.test/x"));
        assert_eq!(meta.title, "a.test");
        assert_eq!(meta.author, "");
        assert_eq!(meta.favicon, "https://a.test/favicon.ico");
    }

    #[test]
    fn author_fallback_order() {
        let html = r#"<head>
            <meta name="twitter:creator" content="@rider">
            <meta property="article:author" content="Article Author">
        </head>"#;
        assert_eq!(extract_metadata(html, &page("https://a.test/")).author, "Article Author");
    }

    #[test]
    fn resolves_icon_links_against_the_origin() {
        let cases = [
            (r#"<link rel="icon" href="/static/icon.png">"#, "https://a.test/static/icon.png"),
            (r#"<link rel="icon" href="//cdn.test/i.png">"#, "https://cdn.test/i.png"),
            (r#"<link rel="shortcut icon" href="fav.ico">"#, "https://a.test/fav.ico"),
            (
                r#"<link rel="apple-touch-icon" href="http://img.test/t.png">"#,
                "http://img.test/t.png",
            ),
        ];
        for (html, expected) in cases {
            let meta = extract_metadata(html, &page("https://a.test/deep/path?q=1"));
            assert_eq!(meta.favicon, expected, "{html}");
        }
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(matches!(
            parse_page_url("ftp://a.test/file"),
            Err(MetadataError::UnsupportedScheme(s)) if s == "ftp"
        ));
        assert!(matches!(parse_page_url("not a url"), Err(MetadataError::InvalidUrl)));
    }

    fn client() -> wreq::Client {
        wreq::Client::builder().build().unwrap()
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn fetches_a_live_page() {
        let app = Router::new().route(
            "/film",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                    r#"<head><meta property="og:title" content="Street Edit"><meta name="author" content="Ski Co"></head>"#,
                )
            }),
        );
        let base = serve(app).await;

        let meta = fetch_page_metadata(&client(), &format!("{base}/film"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(meta.title, "Street Edit");
        assert_eq!(meta.author, "Ski Co");
        assert_eq!(meta.favicon, format!("{base}/favicon.ico"));
    }

    #[tokio::test]
    async fn non_html_is_rejected() {
        let app = Router::new().route("/data", get(|| async { axum::Json(vec![1, 2, 3]) }));
        let base = serve(app).await;

        let err = fetch_page_metadata(&client(), &format!("{base}/data"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::NotHtml), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_host_falls_back_to_hostname() {
        let meta = fetch_or_fallback(&client(), "http://127.0.0.1:1/some/page", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(meta.title, "127.0.0.1");
        assert_eq!(meta.favicon, "http://127.0.0.1:1/favicon.ico");
        assert!(meta.error.is_some());
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let err =
            fetch_page_metadata(&client(), &format!("http://{addr}/"), Duration::from_millis(200))
                .await
                .unwrap_err();
        assert!(matches!(err, MetadataError::Timeout), "{err:?}");
    }
}
