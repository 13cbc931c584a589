//! Wire types shared by the Gazette server and its clients.
//!
//! Field names follow the JSON the browser page sends and receives, so every
//! type here serializes in camelCase.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Body of `POST /comments/add`.
///
/// Missing fields deserialize as empty strings; the server decides which of
/// them are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddCommentRequest {
    pub name: String,
    pub post_id: String,
    pub img: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCommentResponse {
    pub id: Uuid,
}

/// One element of the array returned by `GET /comments/{postId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: String,
    pub name: String,
    pub img: String,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Query parameters accepted by `GET /comments/{postId}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl CommentListQuery {
    pub fn is_paged(&self) -> bool {
        self.limit.is_some() || self.cursor.is_some()
    }
}

/// Response header carrying the cursor of the next comment page.
pub const NEXT_CURSOR_HEADER: &str = "x-next-cursor";

/// Body of `POST /login`: the ID token issued by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub credential: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUserResponse {
    pub name: String,
    pub email: String,
    pub photo: String,
}

/// Body of `GET /session`. `user` is null when nobody is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: Option<SessionUserResponse>,
}
