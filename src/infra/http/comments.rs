use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use gazette_api_types::{
    AddCommentRequest, AddCommentResponse, CommentListQuery, CommentResponse, NEXT_CURSOR_HEADER,
};

use crate::{
    application::error::HttpError,
    domain::{comments::NewComment, entities::CommentRecord},
};

use super::public::HttpState;

impl From<CommentRecord> for CommentResponse {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            post_id: record.post_id,
            name: record.author_name,
            img: record.author_photo,
            comment: record.body,
            created_at: record.created_at,
        }
    }
}

fn to_responses(records: Vec<CommentRecord>) -> Vec<CommentResponse> {
    records.into_iter().map(CommentResponse::from).collect()
}

/// Without `limit` or `cursor` the whole list is returned, oldest first.
pub(super) async fn list_comments(
    State(state): State<HttpState>,
    Path(post_id): Path<String>,
    Query(query): Query<CommentListQuery>,
) -> Result<Response, HttpError> {
    if !query.is_paged() {
        let records = state.comments.list_by_post(&post_id).await?;
        return Ok(Json(to_responses(records)).into_response());
    }

    let page = state
        .comments
        .list_page(&post_id, query.limit, query.cursor.as_deref())
        .await?;
    let mut response = Json(to_responses(page.items)).into_response();
    if let Some(cursor) = page.next_cursor
        && let Ok(value) = HeaderValue::from_str(&cursor)
    {
        response.headers_mut().insert(NEXT_CURSOR_HEADER, value);
    }
    Ok(response)
}

pub(super) async fn add_comment(
    State(state): State<HttpState>,
    Json(request): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<AddCommentResponse>), HttpError> {
    let AddCommentRequest {
        name,
        post_id,
        img,
        comment,
    } = request;
    let id = state
        .comments
        .add(NewComment {
            post_id,
            author_name: name,
            author_photo: img,
            body: comment,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(AddCommentResponse { id })))
}
