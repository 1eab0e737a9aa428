use serde::{Deserialize, Serialize};

use crate::error::{MetadataError, Result};

const DOI_PREFIXES: [&str; 6] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
    "DOI:",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Doi {
    pub raw: String,
    /// Bare, lower-cased DOI (`10.xxxx/suffix`).
    pub normalized: String,
}

impl Doi {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(MetadataError::Validation("DOI must not be empty".to_string()));
        }

        let stripped = DOI_PREFIXES
            .iter()
            .find_map(|prefix| input.strip_prefix(prefix))
            .map(str::trim_start)
            .unwrap_or(input);

        // must start with "10.", contain "/", and have a non-empty suffix
        if !stripped.starts_with("10.") {
            return Err(MetadataError::InvalidDoi(input.to_string()));
        }
        let slash_pos = stripped
            .find('/')
            .ok_or_else(|| MetadataError::InvalidDoi(input.to_string()))?;
        if stripped[slash_pos + 1..].trim().is_empty() {
            return Err(MetadataError::InvalidDoi(input.to_string()));
        }

        Ok(Self {
            raw: input.to_string(),
            normalized: stripped.to_lowercase(),
        })
    }

    /// Resolution URL under `resolver` (e.g. `https://doi.org`), with each
    /// path segment percent-encoded.
    pub fn url_on(&self, resolver: &str) -> String {
        let path = self
            .normalized
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{path}", resolver.trim_end_matches('/'))
    }

    pub fn url(&self) -> String {
        self.url_on("https://doi.org")
    }
}

impl std::fmt::Display for Doi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized)
    }
}
