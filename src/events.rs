//! Typed events delivered over the photo event stream.
//!
//! This module defines the event types the backend pushes via
//! Server-Sent Events while photos are processed and the catalog
//! changes, plus the decoding from raw [`SseFrame`]s into them.

use serde::Deserialize;
use thiserror::Error;

use crate::models::{AiMetadata, Collectible, Photo, PhotoState};
use crate::sse::SseFrame;

/// Error decoding an event frame's JSON payload.
#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("invalid JSON for '{event_type}' event: {source}")]
    InvalidJson {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Progress report while a photo is being processed.
///
/// Sent repeatedly during server-side processing; `stage` and
/// `progress` are both optional because early pipeline steps report
/// neither.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProcessingEvent {
    /// The photo being processed
    pub photo_id: String,
    /// Human-readable pipeline stage, e.g. "analyzing"
    #[serde(default)]
    pub stage: Option<String>,
    /// Completion fraction, 0.0..=1.0
    #[serde(default)]
    pub progress: Option<f32>,
}

/// A photo moved to a new processing state.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StateChangedEvent {
    pub photo_id: String,
    pub state: PhotoState,
}

/// AI metadata became available for a photo.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetadataEvent {
    pub photo_id: String,
    pub metadata: AiMetadata,
}

/// A photo was deleted.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RemovedEvent {
    pub photo_id: String,
}

/// A collectible record was deleted.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CollectibleRemovedEvent {
    pub collectible_id: String,
}

/// All events the photo stream can carry.
///
/// Unrecognized event names decode to [`PhotoEvent::Unknown`] rather
/// than failing, so the backend can add event types without breaking
/// older clients.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoEvent {
    /// `photo.processing`
    Processing(ProcessingEvent),
    /// `photo.state`
    StateChanged(StateChangedEvent),
    /// `photo.updated`, carrying the full refreshed row
    Updated(Photo),
    /// `photo.metadata`
    MetadataReady(MetadataEvent),
    /// `photo.removed`
    Removed(RemovedEvent),
    /// `collectible.updated`, carrying the full refreshed record
    CollectibleUpdated(Collectible),
    /// `collectible.removed`
    CollectibleRemoved(CollectibleRemovedEvent),
    /// `ping` keepalive, no payload
    Ping,
    /// Anything this client version does not know
    Unknown { event: String },
}

impl PhotoEvent {
    /// Decode a parsed SSE frame into a typed event.
    ///
    /// The frame's event name selects the payload type; the payload is
    /// the frame's data parsed as JSON. A frame with no event name and
    /// no data is a keepalive.
    pub fn from_frame(frame: &SseFrame) -> Result<PhotoEvent, EventParseError> {
        let event_type = frame.event.as_deref().unwrap_or("");
        match event_type {
            "photo.processing" => {
                parse_payload(event_type, &frame.data).map(PhotoEvent::Processing)
            }
            "photo.state" => parse_payload(event_type, &frame.data).map(PhotoEvent::StateChanged),
            "photo.updated" => parse_payload(event_type, &frame.data).map(PhotoEvent::Updated),
            "photo.metadata" => {
                parse_payload(event_type, &frame.data).map(PhotoEvent::MetadataReady)
            }
            "photo.removed" => parse_payload(event_type, &frame.data).map(PhotoEvent::Removed),
            "collectible.updated" => {
                parse_payload(event_type, &frame.data).map(PhotoEvent::CollectibleUpdated)
            }
            "collectible.removed" => {
                parse_payload(event_type, &frame.data).map(PhotoEvent::CollectibleRemoved)
            }
            "ping" => Ok(PhotoEvent::Ping),
            "" if frame.data.is_empty() => Ok(PhotoEvent::Ping),
            other => {
                tracing::debug!("ignoring unknown event type: {}", other);
                Ok(PhotoEvent::Unknown {
                    event: other.to_string(),
                })
            }
        }
    }

    /// The photo this event refers to, when it refers to exactly one.
    pub fn photo_id(&self) -> Option<&str> {
        match self {
            PhotoEvent::Processing(e) => Some(&e.photo_id),
            PhotoEvent::StateChanged(e) => Some(&e.photo_id),
            PhotoEvent::Updated(photo) => Some(&photo.id),
            PhotoEvent::MetadataReady(e) => Some(&e.photo_id),
            PhotoEvent::Removed(e) => Some(&e.photo_id),
            PhotoEvent::CollectibleUpdated(_)
            | PhotoEvent::CollectibleRemoved(_)
            | PhotoEvent::Ping
            | PhotoEvent::Unknown { .. } => None,
        }
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    event_type: &str,
    data: &str,
) -> Result<T, EventParseError> {
    serde_json::from_str(data).map_err(|source| EventParseError::InvalidJson {
        event_type: event_type.to_string(),
        source,
    })
}
