use std::time::Duration;

use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use novaref_core::AppConfig;

use crate::error::{MetadataError, Result};

/// Plain GET client. Requests are made once, without retries; redirects
/// are followed by hand so request headers survive every hop.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_redirects: usize,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration, max_redirects: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            max_redirects,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config
                .http
                .user_agent_for(config.crossref.polite_email.as_deref()),
            Duration::from_secs(config.http.timeout_secs),
            config.doi.max_redirects,
        )
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    /// GET `url`, following 301/302/303/307/308 responses to their
    /// `Location` with the same headers, up to the redirect limit.
    pub async fn get_with_headers(&self, url: &str, headers: HeaderMap) -> Result<String> {
        let mut current =
            Url::parse(url).map_err(|e| MetadataError::InvalidUrl(url.to_string(), e.to_string()))?;
        let mut hops = 0usize;

        loop {
            let resp = self
                .client
                .get(current.clone())
                .headers(headers.clone())
                .send()
                .await?;
            let status = resp.status();

            if is_followed_redirect(status) {
                if hops >= self.max_redirects {
                    return Err(MetadataError::TooManyRedirects(
                        url.to_string(),
                        self.max_redirects,
                    ));
                }
                let location = resp
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| MetadataError::MissingLocation(current.to_string()))?;
                let next = current
                    .join(location)
                    .map_err(|e| MetadataError::InvalidUrl(location.to_string(), e.to_string()))?;
                tracing::debug!(from = %current, to = %next, status = status.as_u16(), "following redirect");
                current = next;
                hops += 1;
                continue;
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(MetadataError::ApiError(
                    current.to_string(),
                    format!("HTTP {}: {}", status.as_u16(), body.trim()),
                ));
            }

            return resp.text().await.map_err(MetadataError::Http);
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get(url).await?;
        serde_json::from_str(&text).map_err(|e| MetadataError::Parse(e.to_string()))
    }
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}
