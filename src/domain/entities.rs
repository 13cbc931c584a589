//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// A published post. Posts are read-only for this service; authoring happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: String,
    pub name: String,
    pub body: String,
    /// Image URL, or an empty string when the post carries no image.
    pub img: String,
}

impl PostRecord {
    pub fn has_image(&self) -> bool {
        !self.img.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummaryRecord {
    pub id: String,
    pub name: String,
}

/// A stored comment. Comments are immutable once written.
///
/// `seq` is the store-assigned insertion sequence and defines list ordering.
/// `post_id` is a plain string; it is never checked against the posts table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub seq: i64,
    pub post_id: String,
    pub author_name: String,
    pub author_photo: String,
    pub body: String,
    pub created_at: OffsetDateTime,
}

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub name: String,
    pub email: String,
    pub photo: String,
}
