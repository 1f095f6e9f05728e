/// Data models for video-browser-service
///
/// This module defines structures for:
/// - BucketObject: object metadata as reported by the storage JSON API
/// - ObjectList: one page of a bucket listing
/// - CatalogEntry / PlayView: precomputed view models handed to templates
///
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ========================================
// Storage Models
// ========================================

/// Metadata for one stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketObject {
    pub name: String,
    /// RFC 3339 timestamp of the last metadata or content update
    #[serde(default)]
    pub updated: String,
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl BucketObject {
    pub fn new(name: impl Into<String>, updated: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            updated: updated.into(),
            size,
            content_type: None,
        }
    }

    /// Parsed `updated` timestamp, `None` when the service sent something unparseable
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.updated)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// One page of `objects.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectList {
    #[serde(default)]
    pub items: Vec<BucketObject>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// The JSON API encodes `size` as a decimal string; accept plain numbers too.
fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Text(String),
        Number(u64),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

// ========================================
// View Models
// ========================================

/// A video row on the listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub display_name: String,
    pub size: u64,
    pub human_size: String,
    pub updated: String,
    pub human_time: String,
    /// Relative link to the playback page
    pub play_path: String,
    /// Empty when signing failed; templates render no link then
    pub signed_url: String,
}

/// Data for the playback page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayView {
    pub name: String,
    pub display_name: String,
    pub size: u64,
    pub human_size: String,
    pub updated: String,
    pub human_time: String,
    pub content_type: Option<String>,
    pub signed_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_object_list_page() {
        let raw = r#"{
            "kind": "storage#objects",
            "nextPageToken": "abc",
            "items": [
                {"name": "clip one.mp4", "updated": "2023-01-01T00:00:00.000Z", "size": "1048576", "contentType": "video/mp4"},
                {"name": "notes.txt", "updated": "2023-06-01T00:00:00Z", "size": 12}
            ]
        }"#;

        let page: ObjectList = serde_json::from_str(raw).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].size, 1_048_576);
        assert_eq!(page.items[0].content_type.as_deref(), Some("video/mp4"));
        assert_eq!(page.items[1].size, 12);
    }

    #[test]
    fn test_empty_bucket_has_no_items_field() {
        let page: ObjectList = serde_json::from_str(r#"{"kind": "storage#objects"}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_invalid_size_is_rejected() {
        let raw = r#"{"name": "a.mp4", "updated": "2023-01-01T00:00:00Z", "size": "lots"}"#;
        assert!(serde_json::from_str::<BucketObject>(raw).is_err());
    }

    #[test]
    fn test_updated_at_parsing() {
        let obj = BucketObject::new("a.mp4", "2023-01-01T10:00:00+02:00", 1);
        let ts = obj.updated_at().unwrap();
        assert_eq!(ts.to_rfc3339(), "2023-01-01T08:00:00+00:00");

        let bad = BucketObject::new("b.mp4", "yesterday", 1);
        assert!(bad.updated_at().is_none());
    }
}
