//! Snapshot types held by the store.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crate::models::{Collectible, Photo, PhotoState, UploadCandidate};

/// Which main view the UI is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Library,
    Collectibles,
    Uploads,
}

/// Severity of a transient user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Error,
}

/// A transient message shown at the top of the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub message: String,
    pub kind: BannerKind,
}

/// Live progress for a photo currently being processed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhotoProgress {
    pub stage: Option<String>,
    pub percent: Option<f32>,
}

/// View selection, filtering and banner state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub active: ActiveView,
    /// When set, the library only shows photos in this state
    pub filter: Option<PhotoState>,
    pub banner: Option<Banner>,
}

/// State of the local folder picker and upload queue.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PickerState {
    /// Folder currently picked for scanning
    pub folder: Option<PathBuf>,
    /// Files found in the folder, in name order
    pub candidates: Vec<UploadCandidate>,
    /// file_name keys of candidates marked for upload
    pub selected: BTreeSet<String>,
    /// True while an upload batch is running
    pub uploading: bool,
}

/// Which photos the status poller should refresh, and where the event
/// stream got to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollingState {
    pub photo_ids: BTreeSet<String>,
    /// Last event id seen on the stream, used to resume after restarts
    pub cursor: Option<String>,
}

/// The whole client-side application state.
///
/// Cheap to clone; snapshots hand a consistent view to readers without
/// holding the store lock.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub photos: Vec<Photo>,
    pub collectibles: Vec<Collectible>,
    /// Processing progress keyed by photo id
    pub progress: HashMap<String, PhotoProgress>,
    pub view: ViewState,
    pub picker: PickerState,
    pub polling: PollingState,
}

impl AppState {
    pub fn photo(&self, photo_id: &str) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == photo_id)
    }

    pub fn collectible(&self, collectible_id: &str) -> Option<&Collectible> {
        self.collectibles.iter().find(|c| c.id == collectible_id)
    }

    /// Photos passing the active filter, in collection order.
    pub fn visible_photos(&self) -> Vec<&Photo> {
        self.photos
            .iter()
            .filter(|p| match self.view.filter {
                Some(wanted) => p.state == wanted,
                None => true,
            })
            .collect()
    }
}
