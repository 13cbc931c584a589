//! Client-side state of the comment section under a post.
//!
//! The view reads the comment list once when it is mounted and never again;
//! a posted comment only shows up after a reload. Submitting moves the form
//! from `Idle` to `Submitting` and back, and a successful submit leaves a
//! confirmation message that expires on its own.

use std::time::Duration;

use gazette_api_types::{AddCommentRequest, CommentResponse};
use tokio::time::Instant;
use tracing::warn;
use uuid::Uuid;

use crate::{client::CommentBackend, error::ClientError, session::Session};

const TARGET: &str = "gazette_client::view";

pub const CONFIRMATION_TEXT: &str = "Comment Posted! Refresh to see the comment";
pub const CONFIRMATION_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Posted(Uuid),
    /// Nobody is signed in, or a submit is already running. Nothing was sent.
    Ignored,
    Failed(ClientError),
}

#[derive(Debug)]
struct Confirmation {
    shown_at: Instant,
}

pub struct CommentView<B> {
    backend: B,
    post_id: String,
    comments: Vec<CommentResponse>,
    mounted: bool,
    state: SubmitState,
    input: String,
    confirmation: Option<Confirmation>,
}

impl<B: CommentBackend> CommentView<B> {
    pub fn new(backend: B, post_id: impl Into<String>) -> Self {
        Self {
            backend,
            post_id: post_id.into(),
            comments: Vec::new(),
            mounted: false,
            state: SubmitState::Idle,
            input: String::new(),
            confirmation: None,
        }
    }

    /// Loads the comment list. Only the first call reaches the server; a
    /// failed read is logged and leaves the list empty.
    pub async fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        match self.backend.list_comments(&self.post_id).await {
            Ok(comments) => self.comments = comments,
            Err(err) => {
                warn!(target: TARGET, post_id = %self.post_id, error = %err, "failed to load comments");
                self.comments.clear();
            }
        }
    }

    pub fn comments(&self) -> &[CommentResponse] {
        &self.comments
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// The confirmation text, while it is still within its display window.
    pub fn confirmation(&self) -> Option<&'static str> {
        self.confirmation
            .as_ref()
            .filter(|shown| shown.shown_at.elapsed() < CONFIRMATION_TTL)
            .map(|_| CONFIRMATION_TEXT)
    }

    /// Moves to `Submitting` and builds the request to send. Returns `None`
    /// without changing anything when no user is signed in or a submit is
    /// already in progress.
    pub fn begin_submit(&mut self, session: &Session) -> Option<AddCommentRequest> {
        let user = session.user()?;
        if self.state == SubmitState::Submitting {
            return None;
        }
        self.state = SubmitState::Submitting;
        Some(AddCommentRequest {
            name: user.name.clone(),
            post_id: self.post_id.clone(),
            img: user.photo.clone(),
            comment: self.input.clone(),
        })
    }

    /// Returns to `Idle`. On success the input is cleared and the
    /// confirmation starts its display window; on failure the input is kept.
    pub fn finish_submit(&mut self, result: Result<Uuid, ClientError>) -> SubmitOutcome {
        self.state = SubmitState::Idle;
        match result {
            Ok(id) => {
                self.input.clear();
                self.confirmation = Some(Confirmation {
                    shown_at: Instant::now(),
                });
                SubmitOutcome::Posted(id)
            }
            Err(err) => {
                warn!(target: TARGET, post_id = %self.post_id, error = %err, "failed to post comment");
                SubmitOutcome::Failed(err)
            }
        }
    }

    pub async fn submit(&mut self, session: &Session) -> SubmitOutcome {
        let Some(request) = self.begin_submit(session) else {
            return SubmitOutcome::Ignored;
        };
        let result = self
            .backend
            .add_comment(request)
            .await
            .map(|response| response.id);
        self.finish_submit(result)
    }
}
