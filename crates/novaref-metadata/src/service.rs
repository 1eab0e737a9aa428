use std::path::Path;

use novaref_core::AppConfig;

use crate::error::Result;
use crate::identifiers::Doi;
use crate::sources::{CrossRefSource, CrossRefWork, DoiResolver};
use crate::store::{InsertOutcome, contains_doi, insert_record, read_store};

/// Search, fetch and insert operations for user-initiated actions.
///
/// Calls are independent: nothing orders or cancels overlapping
/// requests, and every insert re-reads its target file.
pub struct MetadataService {
    crossref: CrossRefSource,
    resolver: DoiResolver,
}

impl MetadataService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            crossref: CrossRefSource::new(config)?,
            resolver: DoiResolver::new(config)?,
        })
    }

    pub fn with_sources(crossref: CrossRefSource, resolver: DoiResolver) -> Self {
        Self { crossref, resolver }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<CrossRefWork>> {
        self.crossref.search(query).await
    }

    /// Validate `doi` and fetch its raw BibTeX record.
    pub async fn fetch_bibtex(&self, doi: &str) -> Result<(Doi, String)> {
        let doi = Doi::parse(doi)?;
        let record = self.resolver.fetch_bibtex(&doi).await?;
        Ok((doi, record))
    }

    /// Fetch the record for `doi` and append it to `target`.
    ///
    /// A DOI already present in the target is reported without fetching.
    pub async fn insert(&self, doi: &str, target: &Path) -> Result<InsertOutcome> {
        let doi = Doi::parse(doi)?;
        if contains_doi(&read_store(target)?, &doi) {
            return Ok(InsertOutcome::AlreadyPresent {
                path: target.to_path_buf(),
            });
        }
        let record = self.resolver.fetch_bibtex(&doi).await?;
        insert_record(target, &record, &doi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use tempfile::TempDir;

    fn config_for(server: &Server) -> AppConfig {
        let mut config = AppConfig::default();
        config.crossref.base_url = server.url();
        config.doi.resolver_url = server.url();
        config.http.timeout_secs = 5;
        config
    }

    #[tokio::test]
    async fn insert_fetches_and_appends() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/10.5555/12345678")
            .match_header("accept", "application/x-bibtex")
            .with_status(200)
            .with_body("@article{Carberry_2008, title={Toward a Unified Theory}, DOI={10.5555/12345678}}")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("paper.bib");
        let service = MetadataService::new(&config_for(&server)).unwrap();

        let outcome = service.insert("https://doi.org/10.5555/12345678", &target).await.unwrap();
        assert!(matches!(outcome, InsertOutcome::Inserted { ref key, .. } if key.as_deref() == Some("Carberry_2008")));

        let entries = novaref_core::bibliography::parse_bib_file(&target);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Toward a Unified Theory"));
    }

    #[tokio::test]
    async fn insert_of_present_doi_skips_network() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("refs.bib");
        let original = "@article{c, doi = {10.5555/12345678}}\n";
        std::fs::write(&target, original).unwrap();

        let service = MetadataService::new(&config_for(&server)).unwrap();
        let outcome = service.insert("10.5555/12345678", &target).await.unwrap();

        assert_eq!(outcome, InsertOutcome::AlreadyPresent { path: target.clone() });
        assert_eq!(std::fs::read_to_string(&target).unwrap(), original);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn empty_doi_is_rejected_before_network() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let service = MetadataService::new(&config_for(&server)).unwrap();
        let err = service.fetch_bibtex("  ").await.unwrap_err();
        assert!(err.is_validation());
        m.assert_async().await;
    }
}
