use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::{CommentCursor, CursorPage, PageRequest};
use crate::application::repos::{CommentsRepo, RepoError};
use crate::domain::comments::NewComment;
use crate::domain::entities::CommentRecord;

use super::{PostgresRepositories, map_sqlx_error};

const COMMENT_COLUMNS: &str =
    "id, seq, post_id, author_name, author_photo, body, created_at";

#[derive(Debug, FromRow)]
struct CommentRow {
    id: Uuid,
    seq: i64,
    post_id: String,
    author_name: String,
    author_photo: String,
    body: String,
    created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            seq: row.seq,
            post_id: row.post_id,
            author_name: row.author_name,
            author_photo: row.author_photo,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn insert_comment(&self, comment: NewComment) -> Result<CommentRecord, RepoError> {
        let pool = self.connect().await?;
        let sql = format!(
            "INSERT INTO comments (id, post_id, author_name, author_photo, body) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&comment.post_id)
            .bind(&comment.author_name)
            .bind(&comment.author_photo)
            .bind(&comment.body)
            .fetch_one(pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn list_comments_by_post(
        &self,
        post_id: &str,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        let pool = self.connect().await?;
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = $1 ORDER BY seq");
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(post_id)
            .fetch_all(pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn page_comments_by_post(
        &self,
        post_id: &str,
        page: PageRequest<CommentCursor>,
    ) -> Result<CursorPage<CommentRecord>, RepoError> {
        let pool = self.connect().await?;
        let limit = page.limit.max(1) as usize;
        let after = page.cursor.map(|cursor| cursor.seq()).unwrap_or(0);

        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE post_id = $1 AND seq > $2 ORDER BY seq LIMIT $3"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(post_id)
            .bind(after)
            .bind((limit + 1) as i64)
            .fetch_all(pool)
            .await
            .map_err(map_sqlx_error)?;

        let mut items: Vec<CommentRecord> = rows.into_iter().map(CommentRecord::from).collect();
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
