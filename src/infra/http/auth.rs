use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use gazette_api_types::{LoginRequest, SessionResponse, SessionUserResponse};

use crate::{
    application::error::HttpError,
    presentation::views::{LoginTemplate, render_template_response},
};

use super::public::HttpState;

pub const SESSION_COOKIE: &str = "gazette_session";

fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE).map(Cookie::value)
}

/// Signed-in visitors go straight to the home page.
pub(super) async fn login_page(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if state.login.current_user(session_token(&jar)).is_some() {
        return Redirect::to("/").into_response();
    }
    render_template_response(
        LoginTemplate {
            google_client_id: state.google_client_id.clone(),
        },
        StatusCode::OK,
    )
}

/// Exchanges a provider credential for a session cookie. A failed sign-in
/// leaves any existing session untouched.
pub(super) async fn login(
    State(state): State<HttpState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Redirect), HttpError> {
    let (_, token) = state.login.login(&request.credential).await?;
    if let Some(previous) = session_token(&jar) {
        state.login.logout(previous);
    }

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok((jar.add(cookie), Redirect::to("/")))
}

pub(super) async fn logout(State(state): State<HttpState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(token) = session_token(&jar) {
        state.login.logout(token);
    }
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/"),
    )
}

pub(super) async fn session(State(state): State<HttpState>, jar: CookieJar) -> Json<SessionResponse> {
    let user = state
        .login
        .current_user(session_token(&jar))
        .map(|user| SessionUserResponse {
            name: user.name,
            email: user.email,
            photo: user.photo,
        });
    Json(SessionResponse { user })
}
