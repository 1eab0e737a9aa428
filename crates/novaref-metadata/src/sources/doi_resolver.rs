use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use novaref_core::AppConfig;

use crate::error::{MetadataError, Result};
use crate::http::HttpClient;
use crate::identifiers::Doi;

pub const BIBTEX_MEDIA_TYPE: &str = "application/x-bibtex";

/// Fetches BibTeX for a DOI through content negotiation on the resolver.
pub struct DoiResolver {
    client: HttpClient,
    resolver_url: String,
}

impl DoiResolver {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self::with_params(
            HttpClient::from_config(config)?,
            &config.doi.resolver_url,
        ))
    }

    pub fn with_params(client: HttpClient, resolver_url: &str) -> Self {
        Self {
            client,
            resolver_url: resolver_url.to_string(),
        }
    }

    /// Raw BibTeX record as returned at the end of the redirect chain.
    pub async fn fetch_bibtex(&self, doi: &Doi) -> Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(BIBTEX_MEDIA_TYPE));

        let url = doi.url_on(&self.resolver_url);
        let body = self.client.get_with_headers(&url, headers).await?;
        let record = body.trim();
        if !record.starts_with('@') {
            return Err(MetadataError::Parse(format!(
                "response for {doi} is not a BibTeX record"
            )));
        }
        tracing::debug!(%doi, bytes = record.len(), "fetched BibTeX");
        Ok(record.to_string())
    }
}
