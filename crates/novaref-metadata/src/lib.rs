//! External metadata for novaref: CrossRef search, DOI to BibTeX
//! resolution, and dedupe-on-insert into bibliography files.

pub mod error;
pub mod formats;
pub mod http;
pub mod identifiers;
pub mod service;
pub mod sources;
pub mod store;

pub use error::{MetadataError, Result};
pub use identifiers::Doi;
pub use service::MetadataService;
pub use sources::{CrossRefAuthor, CrossRefSource, CrossRefWork, DoiResolver};
pub use store::{InsertOutcome, insert_record};
