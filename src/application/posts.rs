//! Post listings for the index page.

use std::sync::Arc;

use crate::{
    application::repos::{PostsRepo, RepoError},
    domain::entities::PostSummaryRecord,
};

#[derive(Clone)]
pub struct PostDirectory {
    posts: Arc<dyn PostsRepo>,
}

impl PostDirectory {
    pub fn new(posts: Arc<dyn PostsRepo>) -> Self {
        Self { posts }
    }

    pub async fn summaries(&self) -> Result<Vec<PostSummaryRecord>, RepoError> {
        self.posts.list_post_summaries().await
    }
}
