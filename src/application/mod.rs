//! Application services orchestrating domain logic.

pub mod comments;
pub mod error;
pub mod identity;
pub mod pagination;
pub mod posts;
pub mod repos;
pub mod session;
pub mod snapshots;
