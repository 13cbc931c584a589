//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::{CommentCursor, CursorPage, PageRequest, PaginationError};
use crate::domain::comments::NewComment;
use crate::domain::entities::{CommentRecord, PostRecord, PostSummaryRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("document store unavailable: {message}")]
    Unavailable { message: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Whether the failure means the store could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout)
    }
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn find_post_by_id(&self, id: &str) -> Result<Option<PostRecord>, RepoError>;

    /// Every post id currently in the store, oldest first.
    async fn list_post_ids(&self) -> Result<Vec<String>, RepoError>;

    async fn list_post_summaries(&self) -> Result<Vec<PostSummaryRecord>, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Persists the comment and returns it with its assigned id and sequence.
    async fn insert_comment(&self, comment: NewComment) -> Result<CommentRecord, RepoError>;

    /// Every comment for the post in insertion order.
    async fn list_comments_by_post(&self, post_id: &str)
    -> Result<Vec<CommentRecord>, RepoError>;

    async fn page_comments_by_post(
        &self,
        post_id: &str,
        page: PageRequest<CommentCursor>,
    ) -> Result<CursorPage<CommentRecord>, RepoError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}
