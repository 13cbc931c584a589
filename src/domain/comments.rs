//! Comment submission rules.

use crate::domain::error::DomainError;

/// A comment as submitted, before the store assigns an id and sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: String,
    pub author_name: String,
    pub author_photo: String,
    pub body: String,
}

impl NewComment {
    /// Checks the submission and returns it with `post_id` trimmed.
    ///
    /// Only `post_id` and `body` are required. Author fields are stored as given,
    /// and whitespace-only values count as empty.
    pub fn validate(self) -> Result<Self, DomainError> {
        let post_id = self.post_id.trim();
        if post_id.is_empty() {
            return Err(DomainError::validation("postId", "must not be empty"));
        }
        if self.body.trim().is_empty() {
            return Err(DomainError::validation("comment", "must not be empty"));
        }

        Ok(Self {
            post_id: post_id.to_string(),
            ..self
        })
    }
}
