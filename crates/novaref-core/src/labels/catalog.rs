//! Static catalog of recognised label prefixes.
//!
//! Order matters: [`classify`] returns the first descriptor whose prefix
//! is a literal prefix of the label name, so a more specific prefix must
//! be listed before any shorter prefix it extends.

use serde::{Deserialize, Serialize};

/// Icon category a completion surface can use to render a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    Operator,
    File,
    Struct,
    Module,
    Snippet,
    Interface,
    Class,
    Reference,
}

/// Type of a label, derived from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabelType {
    #[serde(rename = "eq")]
    Equation,
    #[serde(rename = "fig")]
    Figure,
    #[serde(rename = "tab")]
    Table,
    #[serde(rename = "sec")]
    Section,
    #[serde(rename = "lst")]
    Listing,
    #[serde(rename = "thm")]
    Theorem,
    #[serde(rename = "lem")]
    Lemma,
    #[serde(rename = "def")]
    Definition,
    #[serde(rename = "app")]
    Appendix,
    #[serde(rename = "unknown")]
    Unknown,
}

impl LabelType {
    /// Prefix name without the trailing colon, or `"unknown"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equation => "eq",
            Self::Figure => "fig",
            Self::Table => "tab",
            Self::Section => "sec",
            Self::Listing => "lst",
            Self::Theorem => "thm",
            Self::Lemma => "lem",
            Self::Definition => "def",
            Self::Appendix => "app",
            Self::Unknown => "unknown",
        }
    }

    /// Catalog descriptor for this type; `None` for [`LabelType::Unknown`].
    pub fn descriptor(self) -> Option<&'static LabelTypeDescriptor> {
        CATALOG.iter().find(|d| d.label_type == self)
    }

    /// Human readable name shown in completion details.
    pub fn description(self) -> &'static str {
        self.descriptor().map(|d| d.description).unwrap_or("Label")
    }

    pub fn icon(self) -> IconKind {
        self.descriptor().map(|d| d.kind).unwrap_or(IconKind::Reference)
    }
}

impl std::fmt::Display for LabelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTypeDescriptor {
    pub label_type: LabelType,
    pub prefix: &'static str,
    pub description: &'static str,
    pub kind: IconKind,
    pub detail: &'static str,
}

pub static CATALOG: &[LabelTypeDescriptor] = &[
    LabelTypeDescriptor {
        label_type: LabelType::Equation,
        prefix: "eq:",
        description: "Equation",
        kind: IconKind::Operator,
        detail: "Reference to a numbered equation",
    },
    LabelTypeDescriptor {
        label_type: LabelType::Figure,
        prefix: "fig:",
        description: "Figure",
        kind: IconKind::File,
        detail: "Reference to a figure",
    },
    LabelTypeDescriptor {
        label_type: LabelType::Table,
        prefix: "tab:",
        description: "Table",
        kind: IconKind::Struct,
        detail: "Reference to a table",
    },
    LabelTypeDescriptor {
        label_type: LabelType::Section,
        prefix: "sec:",
        description: "Section",
        kind: IconKind::Module,
        detail: "Reference to a section heading",
    },
    LabelTypeDescriptor {
        label_type: LabelType::Listing,
        prefix: "lst:",
        description: "Code listing",
        kind: IconKind::Snippet,
        detail: "Reference to a code listing",
    },
    LabelTypeDescriptor {
        label_type: LabelType::Theorem,
        prefix: "thm:",
        description: "Theorem",
        kind: IconKind::Interface,
        detail: "Reference to a theorem",
    },
    LabelTypeDescriptor {
        label_type: LabelType::Lemma,
        prefix: "lem:",
        description: "Lemma",
        kind: IconKind::Interface,
        detail: "Reference to a lemma",
    },
    LabelTypeDescriptor {
        label_type: LabelType::Definition,
        prefix: "def:",
        description: "Definition",
        kind: IconKind::Class,
        detail: "Reference to a definition",
    },
    LabelTypeDescriptor {
        label_type: LabelType::Appendix,
        prefix: "app:",
        description: "Appendix",
        kind: IconKind::Module,
        detail: "Reference to an appendix",
    },
];

/// Classify a label name by the first catalog prefix it starts with.
pub fn classify(name: &str) -> LabelType {
    classify_in(CATALOG, name)
}

pub(crate) fn classify_in(catalog: &[LabelTypeDescriptor], name: &str) -> LabelType {
    catalog
        .iter()
        .find(|d| name.starts_with(d.prefix))
        .map(|d| d.label_type)
        .unwrap_or(LabelType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn cataloged_prefixes_classify() {
        assert_eq!(classify("eq:einstein"), LabelType::Equation);
        assert_eq!(classify("fig:diagram"), LabelType::Figure);
        assert_eq!(classify("tab:results"), LabelType::Table);
        assert_eq!(classify("app:proofs"), LabelType::Appendix);
    }

    #[test]
    fn unprefixed_and_unlisted_are_unknown() {
        assert_eq!(classify("intro"), LabelType::Unknown);
        assert_eq!(classify("chap:one"), LabelType::Unknown);
        // the colon is part of the prefix
        assert_eq!(classify("equation"), LabelType::Unknown);
    }

    #[test]
    fn prefixes_are_unique() {
        let prefixes: HashSet<_> = CATALOG.iter().map(|d| d.prefix).collect();
        assert_eq!(prefixes.len(), CATALOG.len());
    }

    #[test]
    fn first_match_wins_for_overlapping_prefixes() {
        let overlapping = [
            LabelTypeDescriptor {
                label_type: LabelType::Theorem,
                prefix: "th",
                description: "Theorem",
                kind: IconKind::Interface,
                detail: "",
            },
            LabelTypeDescriptor {
                label_type: LabelType::Lemma,
                prefix: "thm:",
                description: "Lemma",
                kind: IconKind::Interface,
                detail: "",
            },
        ];
        assert_eq!(classify_in(&overlapping, "thm:main"), LabelType::Theorem);
        assert_eq!(classify_in(&overlapping[1..], "thm:main"), LabelType::Lemma);
    }

    #[test]
    fn type_names_match_prefixes() {
        for d in CATALOG {
            assert_eq!(format!("{}:", d.label_type.as_str()), d.prefix);
        }
        assert_eq!(LabelType::Unknown.description(), "Label");
    }
}
