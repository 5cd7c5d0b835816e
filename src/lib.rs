pub mod auth;
pub mod categories;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ingest;
pub mod models;
pub mod page_meta;
pub mod routes;
pub mod search;
pub mod store;
pub mod templates;
pub mod youtube;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::Config, store::Store, youtube::YoutubeClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: wreq::Client,
    pub store: Store,
    pub youtube: Arc<YoutubeClient>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/films/{id}", get(routes::film_detail))
        .route("/health", get(routes::health))
        .route("/api/films", get(routes::list_films).post(routes::create_film))
        .route(
            "/api/films/{id}",
            get(routes::get_film).put(routes::update_film).delete(routes::delete_film),
        )
        .route("/api/categories", get(routes::list_categories))
        .route("/api/youtube", post(routes::youtube_metadata))
        .route("/api/metadata", post(routes::page_metadata))
        .route("/api/bookmark-metadata", get(routes::bookmark_metadata))
        .route("/api/account", get(routes::account).put(routes::update_account))
        .route("/auth/sign-up", post(routes::sign_up))
        .route("/auth/sign-in", post(routes::sign_in))
        .route("/auth/sign-out", post(routes::sign_out))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
