use std::sync::Arc;

use axum::{
    Json,
    extract::{Form, Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::{
    AppState, auth,
    categories::{CATEGORIES, Category},
    error::{AppError, AppResult, FieldErrors},
    ingest::{self, FilmForm},
    models::{Film, FilmDraft, PageMetadata, User},
    page_meta,
    search::{self, EmptyState, FilmQuery, Listing},
    store::NewUser,
    templates, youtube,
};

pub async fn health() -> &'static str {
    "ok"
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let q = FilmQuery::from_pairs(pairs);
    match state.store.list_films().await {
        Ok(films) => {
            let listing = search::apply(films, &q);
            Html(templates::index_page(&listing).into_inner()).into_response()
        },
        Err(err) => html_error(err),
    }
}

pub async fn film_detail(State(state): State<Arc<AppState>>, Path(id): Path<i32>) -> Response {
    match state.store.get_film(id).await {
        Ok(Some(film)) => Html(templates::film_page(&film).into_inner()).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Html(
                templates::message_page("Film not found", "This film does not exist or was removed.")
                    .into_inner(),
            ),
        )
            .into_response(),
        Err(err) => html_error(err),
    }
}

fn html_error(err: AppError) -> Response {
    let status = err.status();
    tracing::error!(error = %err, "page render failed");
    let page = templates::message_page("Error", &err.public_message());
    (status, Html(page.into_inner())).into_response()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    #[serde(flatten)]
    listing: Listing,
    empty_state: Option<EmptyState>,
}

pub async fn list_films(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<ListingResponse>> {
    let q = FilmQuery::from_pairs(pairs);
    let listing = search::apply(state.store.list_films().await?, &q);
    let empty_state = listing.empty_state();
    Ok(Json(ListingResponse { listing, empty_state }))
}

pub async fn get_film(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Film>> {
    let film = state.store.get_film(id).await?.ok_or_else(film_not_found)?;
    Ok(Json(film))
}

pub async fn create_film(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<FilmForm>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Film>)> {
    let session = auth::require_session(&state.store, &jar).await?;
    let Json(form) = payload?;
    let input = form.validate()?;
    let film = state.store.insert_film(&input, &session.user_id).await?;
    Ok((StatusCode::CREATED, Json(film)))
}

pub async fn update_film(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i32>,
    payload: Result<Json<FilmForm>, JsonRejection>,
) -> AppResult<Json<Film>> {
    auth::require_admin(&state.store, &jar, &state.config).await?;
    let Json(form) = payload?;
    let input = form.validate()?;
    let film = state.store.update_film(id, &input).await?.ok_or_else(film_not_found)?;
    Ok(Json(film))
}

pub async fn delete_film(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    auth::require_admin(&state.store, &jar, &state.config).await?;
    if !state.store.delete_film(id).await? {
        return Err(film_not_found());
    }
    tracing::info!(film_id = id, "film deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn film_not_found() -> AppError {
    AppError::NotFound("Film not found".to_string())
}

pub async fn list_categories() -> Json<&'static [Category]> {
    Json(CATEGORIES)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VideoRequest {
    url: Option<String>,
    /// Client-side input sequence number, echoed back so stale answers can be dropped.
    seq: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoResponse {
    film_data: FilmDraft,
    #[serde(skip_serializing_if = "Option::is_none")]
    seq: Option<u64>,
}

pub async fn youtube_metadata(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return video_error(rejection.into(), None),
    };
    let seq = req.seq;
    match video_draft(&state, req.url.unwrap_or_default()).await {
        Ok(film_data) => Json(VideoResponse { film_data, seq }).into_response(),
        Err(err) => video_error(err, seq),
    }
}

fn video_error(err: AppError, seq: Option<u64>) -> Response {
    let status = err.status();
    if status.is_server_error() {
        warn!(error = %err, "video auto-fill failed");
    } else {
        debug!(error = %err, "video auto-fill rejected");
    }
    let mut body = json!({ "error": err.public_message() });
    if let Some(seq) = seq {
        body["seq"] = json!(seq);
    }
    (status, Json(body)).into_response()
}

async fn video_draft(state: &AppState, url: String) -> AppResult<FilmDraft> {
    let url = url.trim().to_string();
    if url.is_empty() {
        return Err(AppError::BadRequest("Valid URL is required".to_string()));
    }

    if !youtube::is_youtube_url(&url) {
        return Err(AppError::BadRequest("Only YouTube URLs are supported".to_string()));
    }
    let video_id = youtube::extract_video_id(&url).ok_or(AppError::InvalidVideoId)?;

    let video = state
        .youtube
        .fetch_video(video_id.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    let mut draft = ingest::draft_from_video(&video);
    draft.url = url;
    Ok(draft)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UrlRequest {
    url: Option<String>,
}

fn required_url(req: UrlRequest) -> AppResult<String> {
    req.url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("URL is required".to_string()))
}

pub async fn page_metadata(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> AppResult<Json<PageMetadata>> {
    let Json(req) = payload?;
    let url = required_url(req)?;
    let meta =
        page_meta::fetch_page_metadata(&state.http, &url, state.config.metadata_timeout).await?;
    Ok(Json(meta))
}

pub async fn bookmark_metadata(
    State(state): State<Arc<AppState>>,
    Query(req): Query<UrlRequest>,
) -> AppResult<Json<PageMetadata>> {
    let url = required_url(req)?;
    let meta = page_meta::fetch_or_fallback(&state.http, &url, state.config.metadata_timeout).await?;
    Ok(Json(meta))
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<auth::SignUpForm>,
) -> AppResult<(CookieJar, (StatusCode, Json<User>))> {
    let form = form.validate()?;

    if state.store.find_user_by_email(&form.email).await?.is_some() {
        let mut errors = FieldErrors::default();
        errors.add("email", "An account with this email already exists");
        return Err(AppError::Validation(errors));
    }

    let password_hash = auth::hash_password(&form.password)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    let user = state
        .store
        .insert_user(NewUser { name: &form.name, email: &form.email, password_hash: &password_hash })
        .await?;

    let jar = start_session(&state, jar, &user.id).await?;
    Ok((jar, (StatusCode::CREATED, Json(user))))
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<auth::SignInForm>,
) -> AppResult<(CookieJar, Json<User>)> {
    let email = form.email.trim().to_lowercase();
    let Some(row) = state.store.find_user_by_email(&email).await? else {
        return Err(AppError::Unauthorized);
    };
    let Some(hash) = row.password_hash.as_deref() else {
        return Err(AppError::Unauthorized);
    };
    let valid = auth::verify_password(&form.password, hash)
        .map_err(|e| anyhow::anyhow!("stored password hash is unreadable: {e}"))?;
    if !valid {
        debug!(user_id = %row.id, "wrong password");
        return Err(AppError::Unauthorized);
    }

    let jar = start_session(&state, jar, &row.id).await?;
    Ok((jar, Json(User::from(row))))
}

async fn start_session(state: &AppState, jar: CookieJar, user_id: &str) -> AppResult<CookieJar> {
    let ttl_days = state.config.session_ttl_days;
    let session = state.store.insert_session(user_id, ttl_days * 86_400).await?;
    debug!(user_id = %user_id, "session started");
    Ok(jar.add(auth::session_cookie(session.token, ttl_days)))
}

pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    if let Some(cookie) = jar.get(auth::SESSION_COOKIE) {
        state.store.delete_session(cookie.value()).await?;
    }
    Ok((jar.remove(auth::removal_cookie()), StatusCode::NO_CONTENT))
}

pub async fn account(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Json<User>> {
    let session = auth::require_session(&state.store, &jar).await?;
    let user = state
        .store
        .get_user(&session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn update_account(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<auth::ProfileForm>, JsonRejection>,
) -> AppResult<Json<User>> {
    let session = auth::require_session(&state.store, &jar).await?;
    let Json(form) = payload?;
    let input = form.validate()?;

    if let Some(other) = state.store.find_user_by_email(&input.email).await? {
        if other.id != session.user_id {
            let mut errors = FieldErrors::default();
            errors.add("email", "An account with this email already exists");
            return Err(AppError::Validation(errors));
        }
    }

    let user = state
        .store
        .update_user(&session.user_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}
