//! Client for the remote user directory.
//!
//! Users are read from a qontract-style GraphQL endpoint with a single
//! `users_v1` query. Only `org_username` and `public_gpg_key` feed the
//! reconciliation; the rest of the record travels along as metadata.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::GraphqlConfig;

const USERS_QUERY: &str = "{ users_v1 { org_username public_gpg_key name path } }";

/// A user record from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub org_username: String,
    #[serde(default)]
    pub public_gpg_key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl User {
    pub fn new(org_username: impl Into<String>, public_gpg_key: impl Into<String>) -> Self {
        Self {
            org_username: org_username.into(),
            public_gpg_key: Some(public_gpg_key.into()),
            name: None,
            path: None,
        }
    }

    /// Key content, empty when the user has none.
    pub fn gpg_key(&self) -> &str {
        self.public_gpg_key.as_deref().unwrap_or_default()
    }
}

/// Errors from the user directory.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("query returned errors: {}", .0.join("; "))]
    Query(Vec<String>),

    #[error("response has no data")]
    MissingData,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Fetch aborted by the cycle's cancellation token.
    #[error("fetch cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Http(e)
    }
}

/// Source of desired users.
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn fetch_users(&self, cancel: &CancellationToken) -> Result<Vec<User>, FetchError>;
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<UsersData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct UsersData {
    #[serde(default)]
    users_v1: Vec<User>,
}

/// Users from a GraphQL endpoint.
pub struct GraphqlUserSource {
    client: reqwest::Client,
    url: Url,
}

impl GraphqlUserSource {
    pub fn new(config: &GraphqlConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(token)
                .map_err(|e| FetchError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    async fn query(&self) -> Result<Vec<User>, FetchError> {
        debug!(url = %self.url, "Querying users");
        let response = self
            .client
            .post(self.url.clone())
            .json(&GraphqlRequest { query: USERS_QUERY })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        parse_response(response.json().await?)
    }
}

#[async_trait]
impl UserSource for GraphqlUserSource {
    async fn fetch_users(&self, cancel: &CancellationToken) -> Result<Vec<User>, FetchError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            users = self.query() => users,
        }
    }
}

fn parse_response(response: GraphqlResponse) -> Result<Vec<User>, FetchError> {
    if !response.errors.is_empty() {
        return Err(FetchError::Query(
            response.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    response
        .data
        .map(|data| data.users_v1)
        .ok_or(FetchError::MissingData)
}
