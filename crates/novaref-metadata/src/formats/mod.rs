pub mod bibtex;

pub use bibtex::{format_record, record_key};
