use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Helper to deserialize id as either string or integer
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer")
        }

        fn visit_str<E>(self, value: &str) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// Processing state of a photo on the backend.
///
/// Photos move forward through `working` -> `in_progress` -> `finished`.
/// The backend rejects backwards transitions; `next()` encodes the one
/// allowed forward step from each state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PhotoState {
    Working,
    InProgress,
    Finished,
}

impl PhotoState {
    /// The next state in the forward progression, if any.
    pub fn next(self) -> Option<PhotoState> {
        match self {
            PhotoState::Working => Some(PhotoState::InProgress),
            PhotoState::InProgress => Some(PhotoState::Finished),
            PhotoState::Finished => None,
        }
    }

    /// Wire representation, matching the serde encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            PhotoState::Working => "working",
            PhotoState::InProgress => "in_progress",
            PhotoState::Finished => "finished",
        }
    }
}

impl fmt::Display for PhotoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_photo_state() -> PhotoState {
    PhotoState::Working
}

/// AI-derived metadata attached to a photo after processing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AiMetadata {
    /// Suggested caption generated by the backend
    #[serde(default)]
    pub caption: Option<String>,
    /// Suggested keywords
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Model confidence for the suggestions, 0.0..=1.0
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Version identifier of the model that produced the metadata
    #[serde(default)]
    pub model_version: Option<String>,
}

/// A photo record from the backend API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    /// Unique identifier from backend (can be string or integer)
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Original file name as uploaded
    pub file_name: String,
    /// Current processing state
    #[serde(default = "default_photo_state")]
    pub state: PhotoState,
    /// User-provided caption
    #[serde(default)]
    pub caption: Option<String>,
    /// User-provided long description
    #[serde(default)]
    pub description: Option<String>,
    /// User-provided keywords
    #[serde(default)]
    pub keywords: Vec<String>,
    /// AI metadata, present once processing has produced it
    #[serde(default)]
    pub ai: Option<AiMetadata>,
    /// SHA-256 of the uploaded bytes, as lowercase hex
    #[serde(default)]
    pub content_sha256: Option<String>,
    /// When the photo was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// When the photo was last updated
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Photo {
    /// Whether the photo has reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.state == PhotoState::Finished
    }
}

/// Partial update for a photo, sent via PATCH.
///
/// Only fields that are `Some` are serialized, so untouched fields keep
/// their server-side values.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PhotoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl PhotoPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.caption.is_none() && self.description.is_none() && self.keywords.is_none()
    }
}

/// A catalogued collectible, linking one or more photos to an item record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collectible {
    /// Unique identifier from backend (can be string or integer)
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Display name of the item
    pub name: String,
    /// Free-form category, e.g. "trading cards"
    #[serde(default)]
    pub category: Option<String>,
    /// Year of issue/manufacture
    #[serde(default)]
    pub year: Option<i32>,
    /// Condition grade
    #[serde(default)]
    pub condition: Option<String>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Photos documenting this item
    #[serde(default)]
    pub photo_ids: Vec<String>,
    /// When the record was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a new collectible record.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct NewCollectible {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub photo_ids: Vec<String>,
}

impl NewCollectible {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a collectible, sent via PATCH.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CollectiblePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_ids: Option<Vec<String>>,
}

/// The set of actions the authenticated account may perform.
///
/// Fetched from `/me/privileges`; unknown fields default to denied so a
/// short payload never grants more than the server said.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PrivilegeSet {
    #[serde(default)]
    pub can_upload: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_catalog: bool,
    #[serde(default)]
    pub is_admin: bool,
}

/// A JPEG-encoded preview image produced by the thumbnail queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    /// JPEG bytes
    pub data: Vec<u8>,
}

/// A local file discovered by the folder scanner, queued for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadCandidate {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the picked folder, used as the upload name and as
    /// the key for selection and thumbnail delivery
    pub file_name: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Preview, filled in by the thumbnail queue
    pub thumbnail: Option<Thumbnail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_state_progression() {
        assert_eq!(PhotoState::Working.next(), Some(PhotoState::InProgress));
        assert_eq!(PhotoState::InProgress.next(), Some(PhotoState::Finished));
        assert_eq!(PhotoState::Finished.next(), None);
    }

    #[test]
    fn test_photo_state_wire_format() {
        assert_eq!(
            serde_json::to_string(&PhotoState::InProgress).unwrap(),
            "\"in_progress\""
        );
        let state: PhotoState = serde_json::from_str("\"finished\"").unwrap();
        assert_eq!(state, PhotoState::Finished);
    }

    #[test]
    fn test_photo_deserialize_minimal() {
        let json = r#"{"id": "p1", "file_name": "cat.jpg"}"#;
        let photo: Photo = serde_json::from_str(json).unwrap();
        assert_eq!(photo.id, "p1");
        assert_eq!(photo.file_name, "cat.jpg");
        assert_eq!(photo.state, PhotoState::Working);
        assert!(photo.caption.is_none());
        assert!(photo.keywords.is_empty());
        assert!(photo.ai.is_none());
    }

    #[test]
    fn test_photo_deserialize_integer_id() {
        let json = r#"{"id": 42, "file_name": "dog.png", "state": "finished"}"#;
        let photo: Photo = serde_json::from_str(json).unwrap();
        assert_eq!(photo.id, "42");
        assert!(photo.is_finished());
    }

    #[test]
    fn test_photo_deserialize_full() {
        let json = r#"{
            "id": "p2",
            "file_name": "card.jpg",
            "state": "in_progress",
            "caption": "Rookie card",
            "keywords": ["baseball", "1987"],
            "ai": {"caption": "A baseball card", "keywords": ["card"], "confidence": 0.92},
            "content_sha256": "abc123",
            "created_at": "2026-01-15T10:00:00Z"
        }"#;
        let photo: Photo = serde_json::from_str(json).unwrap();
        assert_eq!(photo.caption.as_deref(), Some("Rookie card"));
        assert_eq!(photo.keywords, vec!["baseball", "1987"]);
        let ai = photo.ai.unwrap();
        assert_eq!(ai.caption.as_deref(), Some("A baseball card"));
        assert_eq!(ai.confidence, Some(0.92));
    }

    #[test]
    fn test_photo_patch_skips_unset_fields() {
        let patch = PhotoPatch::new().with_caption("Sunset");
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"caption":"Sunset"}"#);
    }

    #[test]
    fn test_photo_patch_is_empty() {
        assert!(PhotoPatch::new().is_empty());
        assert!(!PhotoPatch::new().with_keywords(vec![]).is_empty());
    }

    #[test]
    fn test_collectible_deserialize_defaults() {
        let json = r#"{"id": 7, "name": "Mint penny"}"#;
        let item: Collectible = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "7");
        assert_eq!(item.name, "Mint penny");
        assert!(item.photo_ids.is_empty());
        assert!(item.year.is_none());
    }

    #[test]
    fn test_new_collectible_serializes_compactly() {
        let draft = NewCollectible::named("Stamp");
        let json = serde_json::to_string(&draft).unwrap();
        assert_eq!(json, r#"{"name":"Stamp"}"#);
    }

    #[test]
    fn test_privilege_set_defaults_to_denied() {
        let privileges: PrivilegeSet = serde_json::from_str("{}").unwrap();
        assert!(!privileges.can_upload);
        assert!(!privileges.can_edit);
        assert!(!privileges.can_catalog);
        assert!(!privileges.is_admin);
    }

    #[test]
    fn test_privilege_set_partial_payload() {
        let privileges: PrivilegeSet =
            serde_json::from_str(r#"{"can_upload": true, "can_edit": true}"#).unwrap();
        assert!(privileges.can_upload);
        assert!(privileges.can_edit);
        assert!(!privileges.is_admin);
    }
}
