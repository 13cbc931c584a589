use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        comments::CommentError, identity::AuthFailure, repos::RepoError, snapshots::SnapshotError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

fn repo_status(error: &RepoError) -> (StatusCode, &'static str) {
    match error {
        RepoError::Unavailable { .. } | RepoError::Timeout => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable",
        ),
        RepoError::Pagination(_) => (StatusCode::BAD_REQUEST, "Invalid cursor"),
        RepoError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "Invalid request"),
        RepoError::NotFound => (StatusCode::NOT_FOUND, "Resource not found"),
        RepoError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    }
}

impl From<RepoError> for HttpError {
    fn from(error: RepoError) -> Self {
        let (status, message) = repo_status(&error);
        HttpError::from_error(
            "application::error::repo_error_to_http_error",
            status,
            message,
            &error,
        )
    }
}

impl From<SnapshotError> for HttpError {
    fn from(error: SnapshotError) -> Self {
        const SOURCE: &str = "application::error::snapshot_error_to_http_error";
        match &error {
            SnapshotError::NotFound { .. } => HttpError::from_error(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Post not found",
                &error,
            ),
            SnapshotError::Store(repo) => {
                let (status, message) = repo_status(repo);
                HttpError::from_error(SOURCE, status, message, &error)
            }
            SnapshotError::Render(_) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Template rendering failed",
                &error,
            ),
        }
    }
}

impl From<CommentError> for HttpError {
    fn from(error: CommentError) -> Self {
        match error {
            CommentError::Validation(err) => HttpError::from_error(
                "application::error::comment_error_to_http_error",
                StatusCode::BAD_REQUEST,
                "Comment requires a post id and a non-empty body",
                &err,
            ),
            CommentError::Repo(err) => err.into(),
        }
    }
}

impl From<AuthFailure> for HttpError {
    fn from(error: AuthFailure) -> Self {
        let status = match &error {
            AuthFailure::Provider(_) => StatusCode::BAD_GATEWAY,
            AuthFailure::Rejected(_) | AuthFailure::MissingCredential => StatusCode::UNAUTHORIZED,
        };
        HttpError::from_error(
            "application::error::auth_failure_to_http_error",
            status,
            "Sign-in failed",
            &error,
        )
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Domain(DomainError::Validation { .. }) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Repo(err) => repo_status(err).0,
            AppError::Infra(InfraError::Database { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Infra(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::NotFound { .. }) => "Resource not found",
            AppError::Domain(DomainError::Validation { .. }) | AppError::Validation(_) => {
                "Request could not be processed"
            }
            AppError::Repo(err) => repo_status(err).1,
            AppError::Infra(InfraError::Database { .. }) => "Service temporarily unavailable",
            AppError::Infra(InfraError::Configuration { .. }) => "Service misconfigured",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Identity { .. }) => "Identity provider unavailable",
            AppError::Infra(InfraError::Io(_)) => "I/O failure during request",
            AppError::Unexpected(_) => "Unexpected error occurred",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.presentation_message();
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = (status, message).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let error = CommentError::Validation(DomainError::validation("postId", "must not be empty"));
        let response = HttpError::from(error).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert!(report.messages[0].contains("postId"));
    }

    #[test]
    fn unavailable_store_maps_to_service_unavailable() {
        let error = SnapshotError::Store(RepoError::unavailable("connection refused"));
        assert_eq!(
            HttpError::from(error).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn rejected_login_is_unauthorized() {
        let error = AuthFailure::Rejected("audience mismatch".to_string());
        assert_eq!(HttpError::from(error).status(), StatusCode::UNAUTHORIZED);
    }
}
