use jiff::{Timestamp, civil::Date};
use serde::Serialize;

/// A bookmarked film as shown to readers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub published_at: Option<Date>,
    pub author: Option<String>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub categories: Vec<String>,
    pub created_by: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Validated film fields ready to be persisted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilmInput {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub published_at: Option<Date>,
    pub author: Option<String>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub categories: Vec<String>,
}

/// Pre-filled film form produced from video metadata. `url` is left blank
/// and `categories` empty; both stay under the user's control.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmDraft {
    pub url: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub published_at: Option<Date>,
    pub author: String,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub categories: Vec<String>,
}

/// Video details as reported by the video host. Counts arrive as strings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub published_at: String,
    pub channel_title: String,
    pub view_count: Option<String>,
    pub like_count: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageMetadata {
    pub title: String,
    pub author: String,
    pub favicon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileInput {
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub expires_at: Timestamp,
}
