mod auth;
mod comments;
mod middleware;
mod public;

pub use auth::SESSION_COOKIE;
pub use public::{HttpState, build_router};

use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
