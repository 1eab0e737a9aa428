use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("invalid URL {0}: {1}")]
    InvalidUrl(String, String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("redirect from {0} has no Location header")]
    MissingLocation(String),

    #[error("too many redirects resolving {0} (limit {1})")]
    TooManyRedirects(String, usize),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetadataError {
    /// Rejected before any request was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidDoi(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::ApiError(..)
                | Self::MissingLocation(_)
                | Self::TooManyRedirects(..)
                | Self::Parse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
