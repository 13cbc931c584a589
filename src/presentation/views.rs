use crate::{
    application::error::{ErrorReport, HttpError},
    domain::entities::{PostRecord, PostSummaryRecord},
};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use url::form_urlencoded;

pub const SITE_TITLE: &str = "Gazette";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response() -> Response {
    let mut response = render_template_response(
        ErrorTemplate {
            view: ErrorPageView::not_found(),
        },
        StatusCode::NOT_FOUND,
    );
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Renders the error page for a failed request, keeping the report of the
/// original error so the response logger can see it.
pub fn render_error_response(error: HttpError) -> Response {
    let status = error.status();
    let report = error.into_response().extensions_mut().remove::<ErrorReport>();
    let mut response = render_template_response(
        ErrorTemplate {
            view: ErrorPageView::unavailable(status),
        },
        status,
    );
    if let Some(report) = report {
        report.attach(&mut response);
    }
    response
}

/// Renders the full HTML document for a post. The output only depends on the
/// post itself, so it can be cached and served to every visitor.
pub fn render_post_document(post: &PostRecord) -> Result<String, AskamaError> {
    PostTemplate {
        view: PostView::from(post),
    }
    .render()
}

pub struct PostView {
    pub id: String,
    pub name: String,
    pub paragraphs: Vec<String>,
    pub image: Option<String>,
}

impl From<&PostRecord> for PostView {
    fn from(post: &PostRecord) -> Self {
        let paragraphs = post
            .body
            .split("\n\n")
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            id: post.id.clone(),
            name: post.name.clone(),
            paragraphs,
            image: post.has_image().then(|| post.img.clone()),
        }
    }
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: PostView,
}

pub struct PostCard {
    pub href: String,
    pub name: String,
}

impl From<PostSummaryRecord> for PostCard {
    fn from(summary: PostSummaryRecord) -> Self {
        Self {
            href: post_href(&summary.id),
            name: summary.name,
        }
    }
}

/// Path of a post page with the id encoded as a single segment.
pub fn post_href(id: &str) -> String {
    // form encoding escapes a literal `+`, so any `+` left stands for a space
    let segment: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("/posts/{}", segment.replace('+', "%20"))
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub google_client_id: Option<String>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist.".to_string(),
        }
    }

    pub fn unavailable(status: StatusCode) -> Self {
        Self {
            title: status
                .canonical_reason()
                .unwrap_or("Something went wrong")
                .to_string(),
            message: "This page could not be loaded right now. Please try again shortly."
                .to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: ErrorPageView,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(body: &str, img: &str) -> PostRecord {
        PostRecord {
            id: "first-light".to_string(),
            name: "First <Light>".to_string(),
            body: body.to_string(),
            img: img.to_string(),
        }
    }

    #[test]
    fn post_document_carries_id_and_escaped_title() {
        let html = render_post_document(&post("Hello.", "")).expect("render");
        assert!(html.contains(r#"data-post-id="first-light""#));
        assert!(html.contains("First &#60;Light&#62;") || html.contains("First &lt;Light&gt;"));
        assert!(!html.contains("<img class=\"post-image\""));
    }

    #[test]
    fn post_view_splits_paragraphs_and_keeps_image() {
        let view = PostView::from(&post("One.\n\n\n\nTwo.\n\n", "https://img.example/a.png"));
        assert_eq!(view.paragraphs, vec!["One.", "Two."]);
        assert_eq!(view.image.as_deref(), Some("https://img.example/a.png"));
    }

    #[test]
    fn post_links_encode_the_id() {
        assert_eq!(post_href("first-light"), "/posts/first-light");
        assert_eq!(post_href("a/b?c#d"), "/posts/a%2Fb%3Fc%23d");
        assert_eq!(post_href("two words+more"), "/posts/two%20words%2Bmore");

        let card = PostCard::from(PostSummaryRecord {
            id: "x/y".to_string(),
            name: "XY".to_string(),
        });
        assert_eq!(card.href, "/posts/x%2Fy");
    }

    #[test]
    fn not_found_response_attaches_report() {
        let response = render_not_found_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }

    #[test]
    fn error_response_keeps_status_and_report() {
        let error = HttpError::new(
            "tests",
            StatusCode::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable",
            "pool timed out",
        );
        let response = render_error_response(error);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let report = response.extensions().get::<ErrorReport>().expect("report");
        assert_eq!(report.messages, vec!["pool timed out".to_string()]);
    }
}
