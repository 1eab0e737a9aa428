pub mod crossref;
pub mod doi_resolver;

pub use crossref::{CrossRefAuthor, CrossRefSource, CrossRefWork};
pub use doi_resolver::{BIBTEX_MEDIA_TYPE, DoiResolver};
