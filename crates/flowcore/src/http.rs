use crate::AuthConfig;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Outbound request issued by an api node.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: String,
    pub headers: Map<String, Value>,
    pub params: Map<String, Value>,
    pub data: Option<Value>,
    pub auth: Option<AuthConfig>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: Map::new(),
            params: Map::new(),
            data: None,
            auth: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub data: Value,
    pub headers: Map<String, Value>,
}

/// Only transport-level failures are errors; any HTTP status is a response.
#[derive(Error, Debug, Clone)]
pub enum HttpError {
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("{0}")]
    Transport(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}
