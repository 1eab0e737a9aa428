use serde::{Deserialize, Serialize};
use serde_json::Value;

use novaref_core::AppConfig;
use novaref_core::config::MAX_SEARCH_ROWS;

use crate::error::{MetadataError, Result};
use crate::http::HttpClient;

pub struct CrossRefSource {
    client: HttpClient,
    base_url: String,
    rows: u32,
}

impl CrossRefSource {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self::with_params(
            HttpClient::from_config(config)?,
            &config.crossref.base_url,
            config.crossref.effective_rows(),
        ))
    }

    pub fn with_params(client: HttpClient, base_url: &str, rows: u32) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rows: rows.clamp(1, MAX_SEARCH_ROWS),
        }
    }

    /// Free-text search, in the order CrossRef ranks the results.
    pub async fn search(&self, query: &str) -> Result<Vec<CrossRefWork>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MetadataError::Validation(
                "search query must not be empty".to_string(),
            ));
        }

        let url = format!(
            "{}/works?query={}&rows={}",
            self.base_url,
            urlencoding::encode(query),
            self.rows
        );
        let val: Value = self.client.get_json(&url).await?;
        let items = val["message"]["items"].as_array().ok_or_else(|| {
            MetadataError::Parse("CrossRef response has no message.items".to_string())
        })?;

        let works: Vec<CrossRefWork> = items
            .iter()
            .filter_map(|item| match CrossRefWork::from_json(item) {
                Ok(work) => Some(work),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping CrossRef item");
                    None
                }
            })
            .take(self.rows as usize)
            .collect();
        tracing::debug!(query, results = works.len(), "CrossRef search finished");
        Ok(works)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossRefWork {
    pub doi: String,
    pub title: Vec<String>,
    /// Empty when CrossRef lists no authors.
    pub authors: Vec<CrossRefAuthor>,
    pub container_title: Vec<String>,
    pub published_year: Option<i32>,
    pub work_type: String,
    pub publisher: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossRefAuthor {
    pub given: Option<String>,
    pub family: Option<String>,
}

impl CrossRefWork {
    pub fn from_json(v: &Value) -> Result<Self> {
        let doi = v["DOI"]
            .as_str()
            .ok_or_else(|| MetadataError::Parse("Missing DOI in CrossRef response".to_string()))?
            .to_string();

        let authors = v["author"]
            .as_array()
            .map(|a| a.iter().map(CrossRefAuthor::from_json).collect())
            .unwrap_or_default();

        Ok(Self {
            doi,
            title: string_list(&v["title"]),
            authors,
            container_title: string_list(&v["container-title"]),
            published_year: parse_year(v),
            work_type: v["type"].as_str().unwrap_or("unknown").to_string(),
            publisher: v["publisher"].as_str().map(|s| s.to_string()),
        })
    }

    pub fn display_title(&self) -> &str {
        self.title.first().map(String::as_str).unwrap_or("Untitled")
    }

    /// `Family` or `Family et al.`.
    pub fn author_summary(&self) -> Option<String> {
        let first = self.authors.first()?.display_name()?;
        Some(if self.authors.len() > 1 {
            format!("{first} et al.")
        } else {
            first
        })
    }

    pub fn venue(&self) -> Option<&str> {
        self.container_title.first().map(String::as_str)
    }

    /// One-line description for result pickers: authors, venue, year.
    pub fn description(&self) -> String {
        let mut parts = Vec::new();
        if let Some(authors) = self.author_summary() {
            parts.push(authors);
        }
        if let Some(venue) = self.venue() {
            parts.push(venue.to_string());
        }
        if let Some(year) = self.published_year {
            parts.push(year.to_string());
        }
        parts.join(", ")
    }
}

impl CrossRefAuthor {
    fn from_json(v: &Value) -> Self {
        Self {
            given: v["given"].as_str().map(|s| s.to_string()),
            family: v["family"].as_str().map(|s| s.to_string()),
        }
    }

    fn display_name(&self) -> Option<String> {
        self.family.clone().or_else(|| self.given.clone())
    }
}

fn string_list(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str()).map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

fn parse_year(v: &Value) -> Option<i32> {
    // CrossRef date parts: "published": {"date-parts": [[2017, 6, 12]]}
    v["published"]["date-parts"][0][0]
        .as_i64()
        .or_else(|| v["published-print"]["date-parts"][0][0].as_i64())
        .or_else(|| v["published-online"]["date-parts"][0][0].as_i64())
        .or_else(|| v["issued"]["date-parts"][0][0].as_i64())
        .map(|n| n as i32)
}
