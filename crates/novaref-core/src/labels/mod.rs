pub mod catalog;
pub mod extract;

pub use catalog::{CATALOG, IconKind, LabelType, LabelTypeDescriptor, classify};
pub use extract::{LabelOccurrence, extract_labels};
