use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("base url `{0}` cannot carry a path")]
    OpaqueBase(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded {status}: {body}")]
    Status { status: u16, body: String },
}

impl ClientError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Status { status, .. } if (400..500).contains(status))
    }
}
