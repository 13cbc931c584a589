//! HTTP access to the comment endpoints.

use async_trait::async_trait;
use gazette_api_types::{
    AddCommentRequest, AddCommentResponse, CommentListQuery, CommentResponse, NEXT_CURSOR_HEADER,
};
use reqwest::{Client, Response};
use url::Url;

use crate::error::ClientError;

/// The two calls a comment view makes against the server.
#[async_trait]
pub trait CommentBackend: Send + Sync {
    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentResponse>, ClientError>;

    async fn add_comment(
        &self,
        request: AddCommentRequest,
    ) -> Result<AddCommentResponse, ClientError>;
}

#[derive(Debug, Clone)]
pub struct CommentPage {
    pub items: Vec<CommentResponse>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommentsClient {
    http: Client,
    base: Url,
}

impl CommentsClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ClientError::OpaqueBase(base_url.to_string()));
        }
        let http = Client::builder()
            .user_agent(concat!("gazette-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::OpaqueBase(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetches one page of comments. The server answers with the full list
    /// when neither `limit` nor `cursor` is set.
    pub async fn list_page(
        &self,
        post_id: &str,
        query: &CommentListQuery,
    ) -> Result<CommentPage, ClientError> {
        let mut url = self.endpoint(&["comments", post_id])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(cursor) = query.cursor.as_deref() {
                pairs.append_pair("cursor", cursor);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let response = ensure_success(self.http.get(url).send().await?).await?;
        let next_cursor = response
            .headers()
            .get(NEXT_CURSOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let items = response.json().await?;
        Ok(CommentPage { items, next_cursor })
    }
}

#[async_trait]
impl CommentBackend for CommentsClient {
    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentResponse>, ClientError> {
        self.list_page(post_id, &CommentListQuery::default())
            .await
            .map(|page| page.items)
    }

    async fn add_comment(
        &self,
        request: AddCommentRequest,
    ) -> Result<AddCommentResponse, ClientError> {
        let url = self.endpoint(&["comments", "add"])?;
        let response = ensure_success(self.http.post(url).json(&request).send().await?).await?;
        Ok(response.json().await?)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn comment_json(id: &str, body: &str) -> serde_json::Value {
        json!({
            "id": id,
            "postId": "p1",
            "name": "Ada",
            "img": "",
            "comment": body,
            "createdAt": "2026-01-02T03:04:05Z"
        })
    }

    #[tokio::test]
    async fn list_comments_reads_the_array() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/comments/p1");
                then.status(200).json_body(json!([
                    comment_json("00000000-0000-0000-0000-000000000001", "first"),
                    comment_json("00000000-0000-0000-0000-000000000002", "second"),
                ]));
            })
            .await;

        let client = CommentsClient::new(&server.base_url()).expect("client");
        let comments = client.list_comments("p1").await.expect("list");

        mock.assert_async().await;
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1].comment, "second");
    }

    #[tokio::test]
    async fn list_page_passes_query_and_reads_cursor_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/comments/p1")
                    .query_param("limit", "1");
                then.status(200)
                    .header(NEXT_CURSOR_HEADER, "abc")
                    .json_body(json!([comment_json(
                        "00000000-0000-0000-0000-000000000001",
                        "first"
                    )]));
            })
            .await;

        let client = CommentsClient::new(&server.base_url()).expect("client");
        let page = client
            .list_page(
                "p1",
                &CommentListQuery {
                    limit: Some(1),
                    cursor: None,
                },
            )
            .await
            .expect("page");

        mock.assert_async().await;
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn rejected_comment_surfaces_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/comments/add");
                then.status(400).body("Comment requires a post id and a non-empty body");
            })
            .await;

        let client = CommentsClient::new(&server.base_url()).expect("client");
        let err = client
            .add_comment(AddCommentRequest::default())
            .await
            .unwrap_err();

        assert!(err.is_rejection());
        assert!(err.to_string().contains("400"));
    }
}
