//! Pure conversions between persisted layouts.
//!
//! Nothing in here touches a backend: `DocumentStore::load` reads raw values,
//! hands them to these functions, and decides what to write back.

use crate::error::{MdPagesError, Result};
use crate::model::{CurrentFormat, Document, LegacyRecord, DEFAULT_NAME, WELCOME_MARKDOWN};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Wrap a legacy single-document record into the current layout.
///
/// The result always holds exactly one document, named with the default label
/// and active. Running it twice on the same record yields two equivalent
/// layouts; it never produces more than one document.
pub fn migrate(legacy: LegacyRecord, id: Uuid) -> CurrentFormat {
    let last_saved_at = legacy.last_saved.as_deref().and_then(parse_legacy_timestamp);
    let document = Document {
        id,
        name: DEFAULT_NAME.to_string(),
        content: legacy.content,
        last_saved_at,
    };
    CurrentFormat {
        documents: vec![document],
        active_id: Some(id),
    }
}

/// A fresh layout with one onboarding document.
pub fn seed() -> CurrentFormat {
    let document = Document::new(DEFAULT_NAME, WELCOME_MARKDOWN);
    let id = document.id;
    CurrentFormat {
        documents: vec![document],
        active_id: Some(id),
    }
}

/// Parse the `documents` value.
///
/// An empty collection is rejected as unreadable since the store must never be
/// empty. Duplicate ids keep their first occurrence.
pub fn parse_documents(raw: &str) -> Result<Vec<Document>> {
    let parsed: Vec<Document> = serde_json::from_str(raw)
        .map_err(|e| MdPagesError::Migration(format!("unreadable documents: {}", e)))?;

    let mut seen = HashSet::new();
    let documents: Vec<Document> = parsed
        .into_iter()
        .filter(|doc| {
            let fresh = seen.insert(doc.id);
            if !fresh {
                log::warn!("dropping duplicate document id {}", doc.id);
            }
            fresh
        })
        .collect();

    if documents.is_empty() {
        return Err(MdPagesError::Migration(
            "documents collection is empty".to_string(),
        ));
    }
    Ok(documents)
}

/// Parse the `activeDocumentId` value. Accepts a JSON string or a bare id.
pub fn parse_active_id(raw: &str) -> Option<Uuid> {
    let trimmed = raw.trim();
    serde_json::from_str::<Uuid>(trimmed)
        .ok()
        .or_else(|| Uuid::parse_str(trimmed).ok())
}

/// Pick the active document: the requested id if it resolves, else the first.
pub fn resolve_active(documents: &[Document], requested: Option<Uuid>) -> Uuid {
    requested
        .filter(|id| documents.iter().any(|d| d.id == *id))
        .unwrap_or_else(|| documents[0].id)
}

/// Legacy timestamps were stored either as RFC 3339 strings or as epoch
/// milliseconds, possibly JSON-quoted.
pub fn parse_legacy_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim().trim_matches('"');
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(millis) = trimmed.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    log::debug!("ignoring unparseable legacy timestamp {:?}", raw);
    None
}

/// Legacy content was written either raw or as a JSON string.
pub fn decode_legacy_content(raw: &str) -> String {
    match serde_json::from_str::<String>(raw) {
        Ok(decoded) => decoded,
        Err(_) => raw.to_string(),
    }
}
