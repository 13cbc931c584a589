use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use metrics::counter;
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

const TARGET: &str = "gazette::http::response";

/// Which part of the site a request belongs to, with the post it concerns
/// when the path names one.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: String,
    pub area: &'static str,
    pub post_id: Option<String>,
}

impl RequestContext {
    fn for_path(path: &str) -> Self {
        let (area, post_id) = classify_path(path);
        Self {
            request_id: Uuid::new_v4().to_string(),
            area,
            post_id,
        }
    }
}

/// Splits a request path into its area and, for `/posts/{id}` and
/// `/comments/{id}`, the post id segment. `/comments/add` names no post.
fn classify_path(path: &str) -> (&'static str, Option<String>) {
    let mut segments = path.trim_start_matches('/').splitn(2, '/');
    let head = segments.next().unwrap_or_default();
    let rest = segments.next().filter(|rest| !rest.is_empty());

    match (head, rest) {
        ("", None) => ("index", None),
        ("posts", rest) => ("posts", rest.map(str::to_string)),
        ("comments", Some("add")) => ("comments", None),
        ("comments", rest) => ("comments", rest.map(str::to_string)),
        ("login" | "logout" | "session", _) => ("auth", None),
        ("_health", _) => ("health", None),
        _ => ("other", None),
    }
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext::for_path(request.uri().path());
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(|| RequestContext::for_path(uri.path()));

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let class = if status.is_server_error() { "5xx" } else { "4xx" };
        counter!("gazette_http_failed_total", "area" => ctx.area, "class" => class).increment(1);

        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());
        let post_id = ctx.post_id.as_deref().unwrap_or("");

        if status.is_server_error() {
            error!(
                target: TARGET,
                status = status.as_u16(),
                method = %method,
                area = ctx.area,
                post_id,
                path = %uri.path(),
                elapsed_ms,
                source,
                detail = %detail,
                chain = ?messages,
                request_id = %ctx.request_id,
                "request failed",
            );
        } else {
            warn!(
                target: TARGET,
                status = status.as_u16(),
                method = %method,
                area = ctx.area,
                post_id,
                path = %uri.path(),
                elapsed_ms,
                source,
                detail = %detail,
                request_id = %ctx.request_id,
                "client request error",
            );
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_and_comment_paths_carry_the_post_id() {
        assert_eq!(
            classify_path("/posts/first-light"),
            ("posts", Some("first-light".to_string()))
        );
        assert_eq!(
            classify_path("/comments/first-light"),
            ("comments", Some("first-light".to_string()))
        );
        assert_eq!(classify_path("/comments/add"), ("comments", None));
    }

    #[test]
    fn other_paths_have_no_post_id() {
        assert_eq!(classify_path("/"), ("index", None));
        assert_eq!(classify_path("/login"), ("auth", None));
        assert_eq!(classify_path("/session"), ("auth", None));
        assert_eq!(classify_path("/_health/db"), ("health", None));
        assert_eq!(classify_path("/nope/x"), ("other", None));
        assert_eq!(classify_path("/posts/"), ("posts", None));
    }
}
