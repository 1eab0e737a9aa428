//! Reference index for typesetting documents: labels, bibliography files,
//! BibTeX entries and ranked completion candidates.

pub mod bibliography;
pub mod candidates;
pub mod config;
pub mod document;
pub mod error;
pub mod labels;

pub use bibliography::{BibEntry, BibTarget, locate_bibliographies, parse_bibliography, select_target};
pub use candidates::{CandidateItem, CandidateSource, SortKey, build_candidates};
pub use config::AppConfig;
pub use document::DocumentContext;
pub use error::{ExitCode, RefError, Result};
pub use labels::{IconKind, LabelOccurrence, LabelType, classify, extract_labels};
