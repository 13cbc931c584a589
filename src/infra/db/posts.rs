use async_trait::async_trait;
use sqlx::FromRow;

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::{PostRecord, PostSummaryRecord};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, FromRow)]
struct PostRow {
    id: String,
    name: String,
    body: String,
    img: String,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            body: row.body,
            img: row.img,
        }
    }
}

#[derive(Debug, FromRow)]
struct PostSummaryRow {
    id: String,
    name: String,
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn find_post_by_id(&self, id: &str) -> Result<Option<PostRecord>, RepoError> {
        let pool = self.connect().await?;
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, name, body, img FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn list_post_ids(&self) -> Result<Vec<String>, RepoError> {
        let pool = self.connect().await?;
        sqlx::query_scalar::<_, String>("SELECT id FROM posts ORDER BY created_at, id")
            .fetch_all(pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_post_summaries(&self) -> Result<Vec<PostSummaryRecord>, RepoError> {
        let pool = self.connect().await?;
        let rows = sqlx::query_as::<_, PostSummaryRow>(
            "SELECT id, name FROM posts ORDER BY created_at, id",
        )
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| PostSummaryRecord {
                id: row.id,
                name: row.name,
            })
            .collect())
    }
}
