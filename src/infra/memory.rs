//! In-process document store used when no database URL is configured.

use std::{
    sync::{
        RwLock,
        atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::{
        pagination::{CommentCursor, CursorPage, PageRequest},
        repos::{CommentsRepo, PostsRepo, RepoError, StoreHealth},
    },
    cache::lock::{rw_read, rw_write},
    domain::{
        comments::NewComment,
        entities::{CommentRecord, PostRecord, PostSummaryRecord},
    },
};

const SOURCE: &str = "infra::memory";

#[derive(Default)]
pub struct InMemoryRepositories {
    posts: RwLock<Vec<PostRecord>>,
    comments: RwLock<Vec<CommentRecord>>,
    next_seq: AtomicI64,
    unavailable: AtomicBool,
    post_lookups: AtomicUsize,
    lookup_delay: RwLock<Duration>,
}

impl InMemoryRepositories {
    pub fn with_posts(posts: Vec<PostRecord>) -> Self {
        Self {
            posts: RwLock::new(posts),
            ..Self::default()
        }
    }

    /// Adds or replaces a post by id.
    pub fn insert_post(&self, post: PostRecord) {
        let mut posts = rw_write(&self.posts, SOURCE, "insert_post");
        match posts.iter_mut().find(|existing| existing.id == post.id) {
            Some(existing) => *existing = post,
            None => posts.push(post),
        }
    }

    pub fn remove_post(&self, id: &str) {
        rw_write(&self.posts, SOURCE, "remove_post").retain(|post| post.id != id);
    }

    /// Simulates an unreachable store; every call fails with `RepoError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delays every post lookup, which widens race windows in tests.
    pub fn set_lookup_delay(&self, delay: Duration) {
        *rw_write(&self.lookup_delay, SOURCE, "set_lookup_delay") = delay;
    }

    /// Number of `find_post_by_id` calls served so far.
    pub fn post_lookups(&self) -> usize {
        self.post_lookups.load(Ordering::SeqCst)
    }

    pub fn comment_count(&self) -> usize {
        rw_read(&self.comments, SOURCE, "comment_count").len()
    }

    fn ensure_available(&self) -> Result<(), RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::unavailable("in-memory store marked unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl PostsRepo for InMemoryRepositories {
    async fn find_post_by_id(&self, id: &str) -> Result<Option<PostRecord>, RepoError> {
        self.post_lookups.fetch_add(1, Ordering::SeqCst);
        let delay = *rw_read(&self.lookup_delay, SOURCE, "find_post_by_id");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.ensure_available()?;
        Ok(rw_read(&self.posts, SOURCE, "find_post_by_id")
            .iter()
            .find(|post| post.id == id)
            .cloned())
    }

    async fn list_post_ids(&self) -> Result<Vec<String>, RepoError> {
        self.ensure_available()?;
        Ok(rw_read(&self.posts, SOURCE, "list_post_ids")
            .iter()
            .map(|post| post.id.clone())
            .collect())
    }

    async fn list_post_summaries(&self) -> Result<Vec<PostSummaryRecord>, RepoError> {
        self.ensure_available()?;
        Ok(rw_read(&self.posts, SOURCE, "list_post_summaries")
            .iter()
            .map(|post| PostSummaryRecord {
                id: post.id.clone(),
                name: post.name.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl CommentsRepo for InMemoryRepositories {
    async fn insert_comment(&self, comment: NewComment) -> Result<CommentRecord, RepoError> {
        self.ensure_available()?;
        // seq is taken under the write guard so storage order matches seq order
        let mut comments = rw_write(&self.comments, SOURCE, "insert_comment");
        let record = CommentRecord {
            id: Uuid::new_v4(),
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst) + 1,
            post_id: comment.post_id,
            author_name: comment.author_name,
            author_photo: comment.author_photo,
            body: comment.body,
            created_at: OffsetDateTime::now_utc(),
        };
        comments.push(record.clone());
        Ok(record)
    }

    async fn list_comments_by_post(
        &self,
        post_id: &str,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        self.ensure_available()?;
        Ok(rw_read(&self.comments, SOURCE, "list_comments_by_post")
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn page_comments_by_post(
        &self,
        post_id: &str,
        page: PageRequest<CommentCursor>,
    ) -> Result<CursorPage<CommentRecord>, RepoError> {
        self.ensure_available()?;
        let after = page.cursor.map(|cursor| cursor.seq()).unwrap_or(i64::MIN);
        let limit = page.limit as usize;

        let mut items: Vec<CommentRecord> = rw_read(&self.comments, SOURCE, "page_comments")
            .iter()
            .filter(|comment| comment.post_id == post_id && comment.seq > after)
            .take(limit + 1)
            .cloned()
            .collect();

        let next_cursor = if items.len() > limit {
            items.truncate(limit);
            items
                .last()
                .map(|last| CommentCursor::new(last.seq, last.id).encode())
        } else {
            None
        };

        Ok(CursorPage::new(items, next_cursor))
    }
}

#[async_trait]
impl StoreHealth for InMemoryRepositories {
    async fn health_check(&self) -> Result<(), RepoError> {
        self.ensure_available()
    }
}
