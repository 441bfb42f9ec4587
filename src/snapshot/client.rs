use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, info};

use super::lenient;
use super::mutation::{Mutation, MutationError};
use super::parse::SnapshotError;
use super::types::Snapshot;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend url '{0}'")]
    InvalidUrl(String),
    #[error("session cookie contains characters not allowed in a header")]
    InvalidCookie,
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend error: {0}")]
    Api(String),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
}

/// HTTP client for the admin backend's CGI scripts.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// `base_url` points at the directory holding the CGI scripts, e.g.
    /// `https://jlwe.example.org/cgi-bin/`.
    pub fn new(
        base_url: &str,
        session_cookie: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let base_url = parse_base_url(base_url)?;

        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie.filter(|c| !c.is_empty()) {
            let mut value = HeaderValue::from_str(cookie).map_err(|_| BackendError::InvalidCookie)?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!("jlwe-scoring/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, script: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(script)
            .map_err(|_| BackendError::InvalidUrl(format!("{}{}", self.base_url, script)))
    }

    /// Fetch a complete snapshot from `get_scores.cgi`.
    pub async fn fetch_snapshot(&self, include_non_competing: bool) -> Result<Snapshot, BackendError> {
        let mut url = self.endpoint("get_scores.cgi")?;
        if include_non_competing {
            url.query_pairs_mut().append_pair("include_non_compete", "true");
        }
        debug!("GET {}", url);

        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3);

        let http = &self.http;
        let url = &url;
        let value: Value = Retry::spawn(retry_strategy, || async move {
            http.get(url.clone())
                .send()
                .await?
                .error_for_status()?
                .json::<Value>()
                .await
        })
        .await?;

        let snapshot = Snapshot::from_value(value).map_err(|e| match e {
            SnapshotError::Backend(message) => BackendError::Api(message),
            other => BackendError::Snapshot(other),
        })?;
        info!(
            "Fetched snapshot with {} teams and {} caches",
            snapshot.teams.len(),
            snapshot.number_game_caches
        );
        Ok(snapshot)
    }

    /// Send one update. Returns the backend's confirmation message.
    ///
    /// Updates are not retried: a timeout after the server applied the change
    /// would otherwise be indistinguishable from a failure.
    pub async fn apply(&self, mutation: &Mutation) -> Result<String, BackendError> {
        mutation.validate()?;
        let url = self.endpoint(mutation.endpoint())?;
        debug!("POST {} ({})", url, mutation);

        let response: Value = self
            .http
            .post(url)
            .json(&mutation.request_body())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_envelope(&response)
    }
}

fn parse_base_url(input: &str) -> Result<Url, BackendError> {
    let mut input = input.trim().to_string();
    if !input.ends_with('/') {
        input.push('/');
    }
    let url = Url::parse(&input).map_err(|_| BackendError::InvalidUrl(input.clone()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BackendError::InvalidUrl(input));
    }
    Ok(url)
}

/// Interpret a `{success, message}` / `{success: false, error}` response.
fn parse_envelope(response: &Value) -> Result<String, BackendError> {
    let success = response.get("success").map(lenient::flag).unwrap_or(false);
    if success {
        Ok(response
            .get("message")
            .map(lenient::text)
            .unwrap_or_default())
    } else {
        let message = response
            .get("error")
            .or_else(|| response.get("message"))
            .map(lenient::text)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "request failed without an error message".to_string());
        Err(BackendError::Api(message))
    }
}
