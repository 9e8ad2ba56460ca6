//! HTTP client for the saved-posts API.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Session;
use crate::constants::{CODE_ALREADY_SAVED, CODE_SAVED_POST_NOT_FOUND, CODE_USER_NOT_FOUND};
use crate::models::SavedPostRecord;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid API configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Saved-posts HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Saved-posts API error: {message} ({status})")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("Unexpected health status: {0}")]
    Unhealthy(String),
}

impl ClientError {
    fn has_code(&self, expected: &str) -> bool {
        matches!(self, ClientError::Api { code: Some(code), .. } if code == expected)
    }

    /// The server already holds the record we tried to create
    pub fn is_already_saved(&self) -> bool {
        self.has_code(CODE_ALREADY_SAVED)
    }

    /// The record we tried to delete does not exist on the server
    pub fn is_saved_post_not_found(&self) -> bool {
        self.has_code(CODE_SAVED_POST_NOT_FOUND)
    }

    pub fn is_user_not_found(&self) -> bool {
        self.has_code(CODE_USER_NOT_FOUND)
    }

    /// The server understood and refused the request; retrying will not help
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if (400..500).contains(status))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Liveness answer of `/api/health`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub storage_mode: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SavePostBody<'a> {
    post_id: &'a str,
    title: &'a str,
    category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ListBody {
    #[serde(default)]
    data: Vec<SavedPostRecord>,
}

#[derive(Debug, Deserialize)]
struct SaveBody {
    data: SavedPostRecord,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckBody {
    is_saved: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    code: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct SavedPostsApi {
    base_url: Url,
    client: reqwest::Client,
}

impl SavedPostsApi {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let trimmed = base_url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ClientError::InvalidConfiguration(
                "base URL must include http:// or https://".to_string(),
            ));
        }

        let base_url = Url::parse(trimmed.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            base_url,
            client: reqwest::Client::builder().build()?,
        })
    }

    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidConfiguration("base URL cannot be a base".to_string())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Liveness probe bounded by `timeout`
    pub async fn health(&self, timeout: Duration) -> ClientResult<HealthStatus> {
        let response = self
            .client
            .get(self.url(&["api", "health"])?)
            .timeout(timeout)
            .send()
            .await?;

        let health: HealthStatus = ensure_success(response).await?.json().await?;
        match health.status.as_str() {
            "healthy" | "success" => Ok(health),
            other => Err(ClientError::Unhealthy(other.to_string())),
        }
    }

    pub async fn list(&self, session: &Session) -> ClientResult<Vec<SavedPostRecord>> {
        let response = self
            .client
            .get(self.url(&["api", "saved-posts", session.user_id.as_str()])?)
            .bearer_auth(session.token())
            .send()
            .await?;

        let body: ListBody = ensure_success(response).await?.json().await?;
        Ok(body.data)
    }

    pub async fn save(
        &self,
        session: &Session,
        post_id: &str,
        title: &str,
        category: &str,
    ) -> ClientResult<SavedPostRecord> {
        let body = SavePostBody {
            post_id,
            title,
            category,
            email: session.email.as_deref(),
            display_name: session.display_name.as_deref(),
        };

        let response = self
            .client
            .post(self.url(&["api", "saved-posts", session.user_id.as_str()])?)
            .bearer_auth(session.token())
            .json(&body)
            .send()
            .await?;

        let body: SaveBody = ensure_success(response).await?.json().await?;
        Ok(body.data)
    }

    pub async fn unsave(&self, session: &Session, post_id: &str) -> ClientResult<()> {
        let response = self
            .client
            .delete(self.url(&["api", "saved-posts", session.user_id.as_str(), post_id])?)
            .bearer_auth(session.token())
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    pub async fn check(&self, session: &Session, post_id: &str) -> ClientResult<bool> {
        let response = self
            .client
            .get(self.url(&["api", "saved-posts", session.user_id.as_str(), post_id])?)
            .bearer_auth(session.token())
            .send()
            .await?;

        let body: CheckBody = ensure_success(response).await?.json().await?;
        Ok(body.is_saved)
    }
}

async fn ensure_success(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(parse_api_error(status, &body))
}

fn parse_api_error(status: StatusCode, body: &str) -> ClientError {
    let (code, message) = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(payload) => (payload.code, payload.message.or(payload.error)),
        Err(_) => (None, None),
    };

    let message = message
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                trimmed.to_string()
            }
        });

    ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_base_urls() {
        assert!(SavedPostsApi::new("").is_err());
        assert!(SavedPostsApi::new("api.example.com").is_err());
        assert!(SavedPostsApi::new("https://api.example.com/").is_ok());
    }

    #[test]
    fn url_segments_are_escaped() {
        let api = SavedPostsApi::new("http://localhost:8080/").unwrap();
        let url = api.url(&["api", "saved-posts", "user/1", "post 2"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/saved-posts/user%2F1/post%202"
        );
    }

    #[test]
    fn url_keeps_base_path() {
        let api = SavedPostsApi::new("https://example.com/backend").unwrap();
        let url = api.url(&["api", "health"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/backend/api/health");
    }

    #[test]
    fn parse_api_error_reads_code_and_message() {
        let error = parse_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"message":"Post already saved by this user","code":"ALREADY_SAVED"}"#,
        );
        assert!(error.is_already_saved());
        assert!(error.is_rejection());
        assert!(error.to_string().contains("Post already saved"));
    }

    #[test]
    fn parse_api_error_falls_back_to_status() {
        let error = parse_api_error(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(error, ClientError::Api { status: 502, code: None, .. }));
        assert!(!error.is_rejection());
        assert_eq!(error.to_string(), "Saved-posts API error: HTTP 502 (502)");
    }
}
