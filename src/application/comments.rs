//! Comment ingestion and listing.

use std::{num::NonZeroU32, sync::Arc};

use metrics::counter;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    application::{
        pagination::{CommentCursor, CursorPage, PageRequest},
        repos::{CommentsRepo, RepoError},
    },
    domain::{comments::NewComment, entities::CommentRecord, error::DomainError},
};

const TARGET: &str = "gazette::comments";

#[derive(Debug, Error)]
pub enum CommentError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Page size bounds for cursor listings.
#[derive(Debug, Clone, Copy)]
pub struct CommentPageLimits {
    pub default: NonZeroU32,
    pub max: NonZeroU32,
}

impl CommentPageLimits {
    pub fn clamp(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default.get())
            .clamp(1, self.max.get())
    }
}

#[derive(Clone)]
pub struct CommentService {
    repo: Arc<dyn CommentsRepo>,
    limits: CommentPageLimits,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentsRepo>, limits: CommentPageLimits) -> Self {
        Self { repo, limits }
    }

    /// Validates and stores one comment, returning its new id.
    ///
    /// Every successful call stores a new comment; identical submissions are not merged.
    pub async fn add(&self, comment: NewComment) -> Result<Uuid, CommentError> {
        let comment = comment.validate()?;
        let stored = self.repo.insert_comment(comment).await?;
        counter!("gazette_comments_added_total").increment(1);
        info!(
            target: TARGET,
            comment_id = %stored.id,
            post_id = %stored.post_id,
            "comment stored"
        );
        Ok(stored.id)
    }

    /// Every comment for the post, oldest first. Unknown post ids yield an empty list.
    pub async fn list_by_post(&self, post_id: &str) -> Result<Vec<CommentRecord>, CommentError> {
        Ok(self.repo.list_comments_by_post(post_id.trim()).await?)
    }

    pub async fn list_page(
        &self,
        post_id: &str,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<CursorPage<CommentRecord>, CommentError> {
        let cursor = cursor
            .filter(|value| !value.is_empty())
            .map(CommentCursor::decode)
            .transpose()
            .map_err(RepoError::from)?;
        let request = PageRequest::new(self.limits.clamp(limit), cursor);
        Ok(self
            .repo
            .page_comments_by_post(post_id.trim(), request)
            .await?)
    }
}
