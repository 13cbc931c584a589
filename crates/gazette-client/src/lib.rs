//! Client for the Gazette comment API.
//!
//! [`CommentView`] models the comment section a reader interacts with under a
//! post; [`CommentsClient`] is the HTTP backend it talks to.

pub mod client;
pub mod error;
pub mod session;
pub mod view;

pub use client::{CommentBackend, CommentPage, CommentsClient};
pub use error::ClientError;
pub use session::{Session, User};
pub use view::{CONFIRMATION_TEXT, CommentView, SubmitOutcome, SubmitState};
