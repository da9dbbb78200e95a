//! `manifest.json`: `{"books" | "content": {"<id>": {"title", "filename"}}}`.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: u32,
    pub title: String,
    pub filename: Option<String>,
}

/// Entries in no particular order. Ids that are not positive integers are
/// skipped and a missing title reads as `"Unknown"`.
pub fn parse(bytes: &[u8]) -> Result<Vec<ManifestEntry>> {
    let manifest: Value = serde_json::from_slice(bytes)
        .map_err(|err| Error::asset_io(MANIFEST_FILE, format!("not valid JSON ({err})")))?;

    let Some(items) = ["books", "content"]
        .iter()
        .find_map(|key| manifest.get(key).and_then(Value::as_object))
    else {
        warn!("manifest has neither a books nor a content map");
        return Ok(Vec::new());
    };

    let mut entries = Vec::with_capacity(items.len());
    for (raw_id, item) in items {
        let id = match raw_id.trim().parse::<u32>() {
            Ok(id) if id > 0 => id,
            _ => {
                debug!(raw_id = %raw_id, "skipping manifest entry with a bad id");
                continue;
            }
        };
        let title = item
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string();
        let filename = item
            .get("filename")
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        entries.push(ManifestEntry { id, title, filename });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn books_map() {
        let json = br#"{"books": {"11": {"title": "Alice", "filename": "11.txt"}}}"#;
        assert_eq!(
            parse(json).unwrap(),
            vec![ManifestEntry {
                id: 11,
                title: "Alice".into(),
                filename: Some("11.txt".into()),
            }]
        );
    }

    #[test]
    fn content_map_and_bad_entries() {
        let json = br#"{"content": {
            "0": {"title": "zero"},
            "-4": {"title": "negative"},
            "abc": {"title": "words"},
            "5": {"filename": "five.txt"},
            "6": "not an object"
        }}"#;
        let mut entries = parse(json).unwrap();
        entries.sort_by_key(|e| e.id);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Unknown");
        assert_eq!(entries[0].filename.as_deref(), Some("five.txt"));
        assert_eq!(entries[1].id, 6);
        assert_eq!(entries[1].filename, None);
    }

    #[test]
    fn books_wins_over_content() {
        let json = br#"{"books": {"1": {"title": "B"}}, "content": {"2": {"title": "C"}}}"#;
        let entries = parse(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "B");
    }

    #[test]
    fn no_map_is_empty() {
        assert!(parse(br#"{"other": {}}"#).unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_an_asset_error() {
        assert_matches!(parse(b"{"), Err(Error::AssetIo { .. }));
    }
}
