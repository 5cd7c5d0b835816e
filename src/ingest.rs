//! Turning user input and video metadata into film records.

use jiff::{Timestamp, civil::Date};
use serde::Deserialize;
use url::Url;

use crate::{
    categories,
    error::{AppResult, FieldErrors},
    models::{FilmDraft, FilmInput, VideoMetadata},
};

/// Maps video metadata onto a film draft. Total: never fails, bad numbers become zero.
pub fn draft_from_video(video: &VideoMetadata) -> FilmDraft {
    FilmDraft {
        url: String::new(),
        title: video.title.clone(),
        description: video.description.clone(),
        thumbnail: video.thumbnail_url.clone(),
        published_at: parse_published_at(&video.published_at),
        author: video.channel_title.clone(),
        view_count: video.view_count.as_deref().map(parse_count),
        like_count: video.like_count.as_deref().map(parse_count),
        categories: Vec::new(),
    }
}

/// Parses a count reported as text. Anything that is not a non-negative integer maps to 0.
pub fn parse_count(raw: &str) -> i64 {
    raw.trim().parse::<u64>().map(|n| i64::try_from(n).unwrap_or(i64::MAX)).unwrap_or(0)
}

fn parse_published_at(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Some(ts.to_zoned(jiff::tz::TimeZone::UTC).date());
    }
    raw.parse::<Date>().ok()
}

pub fn is_http_url(raw: &str) -> bool {
    Url::parse(raw).map(|u| matches!(u.scheme(), "http" | "https")).unwrap_or(false)
}

/// A count as sent by a form: a JSON number or numeric text.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LooseCount {
    Number(i64),
    Text(String),
}

/// Raw film submission. Unknown fields are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilmForm {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub published_at: Option<String>,
    pub author: Option<String>,
    pub view_count: Option<LooseCount>,
    pub like_count: Option<LooseCount>,
    pub categories: Vec<String>,
}

impl FilmForm {
    pub fn validate(self) -> AppResult<FilmInput> {
        let mut errors = FieldErrors::default();

        let url = non_empty(self.url).unwrap_or_default();
        if url.is_empty() {
            errors.add("url", "URL is required");
        } else if !is_http_url(&url) {
            errors.add("url", "Please enter a valid URL");
        }

        let title = non_empty(self.title).unwrap_or_default();
        if title.is_empty() {
            errors.add("title", "Title is required");
        }

        let thumbnail = non_empty(self.thumbnail);
        if thumbnail.as_deref().is_some_and(|t| !is_http_url(t)) {
            errors.add("thumbnail", "Please enter a valid URL");
        }

        let published_at = match non_empty(self.published_at) {
            None => None,
            Some(raw) => match raw.parse::<Date>() {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("publishedAt", "Please enter a valid date (YYYY-MM-DD)");
                    None
                },
            },
        };

        let view_count = validate_count(self.view_count, "viewCount", &mut errors);
        let like_count = validate_count(self.like_count, "likeCount", &mut errors);

        let mut picked: Vec<String> = Vec::with_capacity(self.categories.len());
        for value in self.categories {
            let value = value.trim().to_string();
            if !categories::is_known(&value) {
                errors.add("categories", format!("Unknown category \"{value}\""));
            } else if !picked.contains(&value) {
                picked.push(value);
            }
        }

        errors.finish(FilmInput {
            title,
            url,
            description: non_empty(self.description),
            thumbnail,
            published_at,
            author: non_empty(self.author),
            view_count,
            like_count,
            categories: picked,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_count(value: Option<LooseCount>, field: &str, errors: &mut FieldErrors) -> Option<i64> {
    let n = match value? {
        LooseCount::Number(n) => n,
        LooseCount::Text(text) if text.trim().is_empty() => return None,
        LooseCount::Text(text) => match text.trim().parse::<i64>() {
            Ok(n) => n,
            Err(_) => {
                errors.add(field, "Must be a whole number");
                return None;
            },
        },
    };
    if n < 0 {
        errors.add(field, "Must be zero or greater");
        return None;
    }
    Some(n)
}
