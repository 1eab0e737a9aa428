pub mod locate;
pub mod parser;
pub mod scan;
pub mod target;

pub use locate::{BIB_EXTENSION, bibliography_references, locate_bibliographies};
pub use parser::{BibEntry, parse_bib_file, parse_bibliography, read_bibliography};
pub use target::{BibTarget, select_target};
