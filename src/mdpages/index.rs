//! User-facing document addressing.
//!
//! Documents are listed in store order and numbered from 1. A selector is
//! either that number or a prefix of the document's UUID (at least four hex
//! characters, hyphens optional).

use crate::model::Document;
use std::str::FromStr;
use uuid::Uuid;

const MIN_PREFIX_LEN: usize = 4;

/// A document together with its display position.
#[derive(Debug, Clone)]
pub struct DisplayDocument {
    pub index: usize,
    pub document: Document,
    pub active: bool,
}

pub fn index_documents(documents: &[Document], active_id: Uuid) -> Vec<DisplayDocument> {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| DisplayDocument {
            index: i + 1,
            document: doc.clone(),
            active: doc.id == active_id,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocSelector {
    Index(usize),
    IdPrefix(String),
}

impl std::fmt::Display for DocSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocSelector::Index(i) => write!(f, "{}", i),
            DocSelector::IdPrefix(p) => write!(f, "{}", p),
        }
    }
}

impl FromStr for DocSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('#');
        if let Ok(n) = s.parse::<usize>() {
            if n == 0 {
                return Err("Document numbers start at 1".to_string());
            }
            // Short all-digit strings are positions; longer ones may be ids.
            if s.len() < MIN_PREFIX_LEN || !looks_like_id(s) {
                return Ok(DocSelector::Index(n));
            }
        }
        if looks_like_id(s) && s.chars().filter(|c| *c != '-').count() >= MIN_PREFIX_LEN {
            return Ok(DocSelector::IdPrefix(s.to_lowercase()));
        }
        Err(format!("'{}' is neither a document number nor an id prefix", s))
    }
}

fn looks_like_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

impl DocSelector {
    /// Resolve to a document id. Ambiguous prefixes are an error.
    pub fn resolve(&self, documents: &[Document]) -> Result<Uuid, String> {
        match self {
            DocSelector::Index(n) => documents
                .get(n - 1)
                .map(|d| d.id)
                .ok_or_else(|| format!("No document #{} (there are {})", n, documents.len())),
            DocSelector::IdPrefix(prefix) => {
                let wanted: String = prefix.chars().filter(|c| *c != '-').collect();
                let matches: Vec<Uuid> = documents
                    .iter()
                    .filter(|d| d.id.simple().to_string().starts_with(&wanted))
                    .map(|d| d.id)
                    .collect();
                match matches.as_slice() {
                    [id] => Ok(*id),
                    [] => Err(format!("No document with id starting '{}'", prefix)),
                    _ => Err(format!("Id prefix '{}' matches {} documents", prefix, matches.len())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Document> {
        let mut a = Document::new("A", "");
        a.id = Uuid::parse_str("aaaa1111-0000-4000-8000-000000000000").unwrap();
        let mut b = Document::new("B", "");
        b.id = Uuid::parse_str("aaaa2222-0000-4000-8000-000000000000").unwrap();
        vec![a, b]
    }

    #[test]
    fn parses_positions_and_prefixes() {
        assert_eq!("2".parse::<DocSelector>().unwrap(), DocSelector::Index(2));
        assert_eq!("#3".parse::<DocSelector>().unwrap(), DocSelector::Index(3));
        assert_eq!(
            "AAAA2".parse::<DocSelector>().unwrap(),
            DocSelector::IdPrefix("aaaa2".into())
        );
        assert!("0".parse::<DocSelector>().is_err());
        assert!("notes".parse::<DocSelector>().is_err());
    }

    #[test]
    fn resolves_positions() {
        let docs = docs();
        assert_eq!(DocSelector::Index(2).resolve(&docs).unwrap(), docs[1].id);
        assert!(DocSelector::Index(3).resolve(&docs).is_err());
    }

    #[test]
    fn prefixes_must_be_unambiguous() {
        let docs = docs();
        assert_eq!(
            DocSelector::IdPrefix("aaaa1".into()).resolve(&docs).unwrap(),
            docs[0].id
        );
        assert!(DocSelector::IdPrefix("aaaa".into()).resolve(&docs).is_err());
        assert!(DocSelector::IdPrefix("bbbb".into()).resolve(&docs).is_err());
    }

    #[test]
    fn index_marks_the_active_document() {
        let docs = docs();
        let listed = index_documents(&docs, docs[1].id);
        assert_eq!(listed[0].index, 1);
        assert!(!listed[0].active);
        assert!(listed[1].active);
    }
}
