//! Cursor pagination for comment listings.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct CommentCursorPayload {
    seq: i64,
    id: Uuid,
}

/// Position after the last comment of a page, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentCursor {
    seq: i64,
    id: Uuid,
}

impl CommentCursor {
    pub fn new(seq: i64, id: Uuid) -> Self {
        Self { seq, id }
    }

    pub fn seq(&self) -> i64 {
        self.seq
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn encode(&self) -> String {
        let payload = json!({ "seq": self.seq, "id": self.id });
        URL_SAFE_NO_PAD.encode(payload.to_string())
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let payload: CommentCursorPayload = serde_json::from_slice(&bytes)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        Ok(Self {
            seq: payload.seq,
            id: payload.id,
        })
    }
}

/// Cursor-aware pagination request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<C> {
    pub limit: u32,
    pub cursor: Option<C>,
}

impl<C> PageRequest<C> {
    pub fn new(limit: u32, cursor: Option<C>) -> Self {
        Self { limit, cursor }
    }
}

/// Cursor-aware page result.
#[derive(Debug, Clone, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}
