use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    application::{
        comments::CommentService,
        error::HttpError,
        identity::LoginService,
        posts::PostDirectory,
        repos::StoreHealth,
        snapshots::{SnapshotError, SnapshotService},
    },
    presentation::views::{
        IndexTemplate, PostCard, render_error_response, render_not_found_response,
        render_template_response,
    },
};

use super::{
    auth, comments, db_health_response,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub snapshots: SnapshotService,
    pub posts: PostDirectory,
    pub comments: CommentService,
    pub login: LoginService,
    pub health: Arc<dyn StoreHealth>,
    pub google_client_id: Option<String>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/posts/{id}", get(post_detail))
        .route("/comments/add", post(comments::add_comment))
        .route("/comments/{post_id}", get(comments::list_comments))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
        .route("/_health/db", get(public_health))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn index(State(state): State<HttpState>) -> Response {
    match state.posts.summaries().await {
        Ok(summaries) => render_template_response(
            IndexTemplate {
                posts: summaries.into_iter().map(PostCard::from).collect(),
            },
            StatusCode::OK,
        ),
        Err(err) => render_error_response(HttpError::from(err)),
    }
}

async fn post_detail(State(state): State<HttpState>, Path(id): Path<String>) -> Response {
    match state.snapshots.get(&id).await {
        Ok(snapshot) => Html(snapshot.html.clone()).into_response(),
        Err(SnapshotError::NotFound { .. }) => render_not_found_response(),
        Err(err) => render_error_response(HttpError::from(err)),
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.health_check().await)
}

async fn fallback() -> Response {
    render_not_found_response()
}
